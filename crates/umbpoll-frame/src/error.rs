/// Errors raised while building a request frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A poll must name at least one channel.
    #[error("channel list is empty")]
    EmptyChannelList,

    /// The channel count is serialized into a single byte.
    #[error("too many channels ({count}, max {max})")]
    TooManyChannels { count: usize, max: usize },

    /// The encoded body does not fit the one-byte length field.
    #[error("body of {len} bytes exceeds the {max}-byte length field")]
    BodyTooLong { len: usize, max: usize },
}

/// Errors raised while decoding a response frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The buffer ends before the fixed header and status/count fields.
    #[error("truncated header ({len} bytes, need {needed})")]
    TruncatedHeader { len: usize, needed: usize },

    /// The buffer ends before a declared channel record is complete.
    #[error("truncated record for channel #{channel} at offset {offset} ({available} of {needed} bytes)")]
    TruncatedChannelRecord {
        channel: usize,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A record's declared length cannot hold its fields.
    #[error("record for channel #{channel} declares {declared} bytes, type needs {required}")]
    RecordTooShort {
        channel: usize,
        declared: u8,
        required: u8,
    },

    /// The instrument reported a non-zero status byte.
    #[error("instrument returned status 0x{0:02x}")]
    NonZeroStatus(u8),

    /// The received checksum does not match the frame contents.
    #[error("checksum mismatch (computed 0x{computed:04x}, received 0x{received:04x})")]
    ChecksumMismatch { computed: u16, received: u16 },

    /// A framing marker byte is not where the layout puts it.
    #[error("invalid marker at offset {offset} (expected 0x{expected:02x}, found 0x{found:02x})")]
    InvalidMarker { offset: usize, expected: u8, found: u8 },

    /// The frame size disagrees with the header's body length.
    #[error("frame length mismatch (header declares {declared} bytes, got {actual})")]
    LengthMismatch { declared: usize, actual: usize },

    /// The body carries a command this decoder does not handle.
    #[error("unexpected command 0x{command:02x} (version 0x{version:02x})")]
    UnexpectedCommand { command: u8, version: u8 },
}

/// Errors that can occur while exchanging frames over a stream.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The request could not be built.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// The response could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// No complete response arrived within the read timeout.
    #[error("timed out waiting for response")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, FrameError>;
