use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use umbpoll_frame::{parse_identifier_list, ChecksumPolicy, Identifier};
use umbpoll_transport::DEFAULT_PORT;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod poll;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll channels from an instrument and print the readings.
    Poll(PollArgs),
    /// Print the request frame for a poll without sending it.
    Encode(EncodeArgs),
    /// Decode a hex-encoded response frame.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Poll(args) => poll::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// How to treat a response whose checksum does not match.
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum ChecksumArg {
    Enforce,
    #[default]
    Warn,
    Ignore,
}

impl From<ChecksumArg> for ChecksumPolicy {
    fn from(arg: ChecksumArg) -> Self {
        match arg {
            ChecksumArg::Enforce => ChecksumPolicy::Enforce,
            ChecksumArg::Warn => ChecksumPolicy::Warn,
            ChecksumArg::Ignore => ChecksumPolicy::Ignore,
        }
    }
}

#[derive(Args, Debug)]
pub struct PollArgs {
    /// Instrument address (IP, or IP:PORT).
    pub address: String,
    /// Device address on the instrument bus.
    pub device_id: Identifier,
    /// Channels to poll (comma-separated, e.g. 100,101,200).
    pub channels: String,
    /// TCP port used when the address carries none.
    #[arg(long, env = "UMBPOLL_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Response timeout (e.g. 510ms, 2s).
    #[arg(long, default_value = "510ms")]
    pub timeout: String,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub connect_timeout: String,
    /// Source address written into the request header.
    #[arg(long)]
    pub source: Option<Identifier>,
    /// Checksum handling for the response.
    #[arg(long, value_enum, default_value_t = ChecksumArg::Warn)]
    pub checksum: ChecksumArg,
    /// Treat a non-zero device status as a failure.
    #[arg(long)]
    pub strict_status: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Device address on the instrument bus.
    pub device_id: Identifier,
    /// Channels to request (comma-separated).
    pub channels: String,
    /// Source address written into the request header.
    #[arg(long)]
    pub source: Option<Identifier>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Response frame as hex (spaces, commas and 0x prefixes are accepted).
    pub hex: String,
    /// Checksum handling for the frame.
    #[arg(long, value_enum, default_value_t = ChecksumArg::Warn)]
    pub checksum: ChecksumArg,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_channels(input: &str) -> CliResult<Vec<Identifier>> {
    parse_identifier_list(input)
        .map_err(|err| CliError::new(USAGE, format!("invalid channel list: {err}")))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("510ms").unwrap(), Duration::from_millis(510));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("  ").unwrap_err().code, USAGE);
    }

    #[test]
    fn channel_list_errors_are_usage() {
        assert_eq!(parse_channels("100,abc").unwrap_err().code, USAGE);
        assert_eq!(parse_channels("70000").unwrap_err().code, USAGE);
        assert_eq!(parse_channels("100,101").unwrap().len(), 2);
    }

    #[test]
    fn checksum_arg_maps_to_policy() {
        assert_eq!(ChecksumPolicy::from(ChecksumArg::Enforce), ChecksumPolicy::Enforce);
        assert_eq!(ChecksumPolicy::from(ChecksumArg::default()), ChecksumPolicy::Warn);
    }
}
