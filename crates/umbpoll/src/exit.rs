use std::fmt;
use std::io;

use umbpoll_frame::{BuildError, DecodeError, FrameError};
use umbpoll_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;
pub const INTERRUPTED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    if let TransportError::Io(source) = err {
        return io_error(context, source);
    }
    let code = match &err {
        TransportError::Connect { source, .. } if source.kind() == io::ErrorKind::TimedOut => {
            TIMEOUT
        }
        TransportError::InvalidAddress { .. } => USAGE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn build_error(context: &str, err: BuildError) -> CliError {
    CliError::new(USAGE, format!("{context}: {err}"))
}

pub fn decode_error(context: &str, err: DecodeError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::Build(err) => build_error(context, err),
        FrameError::Decode(err) => decode_error(context, err),
        FrameError::Timeout => CliError::new(TIMEOUT, format!("{context}: {err}")),
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_timeout_code() {
        assert_eq!(frame_error("receive", FrameError::Timeout).code, TIMEOUT);
        let io = io::Error::from(io::ErrorKind::WouldBlock);
        assert_eq!(frame_error("receive", FrameError::Io(io)).code, TIMEOUT);
    }

    #[test]
    fn decode_failures_are_data_invalid() {
        let err = frame_error(
            "receive",
            FrameError::Decode(DecodeError::TruncatedHeader { len: 3, needed: 12 }),
        );
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("receive: "));
    }

    #[test]
    fn connect_refused_is_transport_error() {
        let err = transport_error(
            "connect failed",
            TransportError::Connect {
                addr: "127.0.0.1:3001".parse().unwrap(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            },
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }

    #[test]
    fn hangup_before_response_is_failure() {
        assert_eq!(frame_error("receive", FrameError::ConnectionClosed).code, FAILURE);
    }

    #[test]
    fn build_errors_are_usage() {
        assert_eq!(build_error("request", BuildError::EmptyChannelList).code, USAGE);
    }
}
