//! Checksummed request/response framing for multi-channel instrument polls.
//!
//! This is the core of umbpoll. Every frame carries:
//! - An 8-byte header: start marker, version, destination, source, body length, body start
//! - A command-specific body of up to 255 bytes
//! - A body-end marker, a 2-byte CRC-16 (reflected 0x8408, via the `crc` crate) and an end marker
//!
//! Requests ask one device for a list of channels; responses carry a status
//! byte and one typed record per channel. [`FrameAssembler`] decides frame
//! completion from the declared body length, so partial delivery is handled
//! without relying on transport pauses.

pub mod assembler;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod identifier;
pub mod reader;
pub mod response;
#[cfg(feature = "async")]
pub mod tokio_codec;
pub mod value;
pub mod writer;

pub use assembler::{split_frame, FrameAssembler};
pub use checksum::{checksum, digest, verify_checksum, FRAME_CRC};
pub use codec::{
    build_poll_request, encode_frame, validate_frame, ChecksumPolicy, FrameConfig, FrameHeader,
    PollRequest, DEFAULT_RESPONSE_TIMEOUT, DEFAULT_SOURCE, FRAMING_OVERHEAD, HEADER_SIZE,
    MAX_CHANNELS, MAX_FRAME_SIZE,
};
pub use error::{BuildError, DecodeError, FrameError, Result};
pub use identifier::{parse_identifier_list, Identifier, ParseIdentifierError};
pub use reader::FrameReader;
pub use response::{decode, decode_frame, ChannelReading, PollResponse};
#[cfg(feature = "async")]
pub use tokio_codec::PollCodec;
pub use value::{type_name, ChannelValue, TYPE_FLOAT32, TYPE_UINT8};
pub use writer::FrameWriter;
