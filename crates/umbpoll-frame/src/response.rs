//! Poll responses: status plus one record per requested channel.
//!
//! Body layout after the header:
//!
//! ```text
//! ┌─────┬──────┬────────┬───────┬──────────────────────────────┐
//! │ CMD │ VERC │ STATUS │ COUNT │ COUNT × record               │
//! └─────┴──────┴────────┴───────┴──────────────────────────────┘
//!
//! record: ┌─────┬──────────┬─────────────┬─────┬───────────────┐
//!         │ LEN │ reserved │ channel (LE)│ TAG │ value (LEN-4) │
//!         └─────┴──────────┴─────────────┴─────┴───────────────┘
//! ```
//!
//! `LEN` counts the bytes after itself, so the next record starts `LEN + 1`
//! bytes later.

use bytes::{BufMut, BytesMut};

use crate::codec::{
    encode_frame, validate_frame, ChecksumPolicy, CMD_MULTI_CHANNEL, COMMAND_VERSION,
    MAX_CHANNELS, OFFSET_CHANNEL_COUNT, OFFSET_RECORDS, OFFSET_STATUS,
};
use crate::error::{BuildError, DecodeError};
use crate::identifier::Identifier;
use crate::value::{value_len, ChannelValue};

/// Reserved byte, channel id (2) and type tag.
const RECORD_PREFIX_LEN: usize = 4;

/// The body length field is a single byte.
const MAX_BODY_LEN: usize = u8::MAX as usize;

/// Trailer bytes after the body-end marker.
const CHECKSUM_AND_EOT: usize = 3;

/// One channel's reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelReading {
    pub channel_id: Identifier,
    pub value: ChannelValue,
}

impl ChannelReading {
    pub fn new(channel_id: u16, value: ChannelValue) -> Self {
        Self {
            channel_id: Identifier::new(channel_id),
            value,
        }
    }
}

/// A decoded poll response.
#[derive(Debug, Clone, PartialEq)]
pub struct PollResponse {
    pub status: u8,
    pub channels: Vec<ChannelReading>,
}

impl PollResponse {
    /// Whether the instrument reported success.
    pub fn is_ok(&self) -> bool {
        self.status == 0
    }

    /// `Err(NonZeroStatus)` when the instrument reported a problem.
    ///
    /// The channel records are decoded either way; the caller decides
    /// whether a non-zero status is fatal.
    pub fn check_status(&self) -> Result<(), DecodeError> {
        if self.status != 0 {
            return Err(DecodeError::NonZeroStatus(self.status));
        }
        Ok(())
    }

    /// Value for a channel, if the response carries it.
    pub fn get(&self, channel_id: Identifier) -> Option<&ChannelValue> {
        self.channels
            .iter()
            .find(|reading| reading.channel_id == channel_id)
            .map(|reading| &reading.value)
    }

    /// Append this response as a complete frame, as an instrument sends it.
    pub fn encode(
        &self,
        destination: Identifier,
        source: Identifier,
        dst: &mut BytesMut,
    ) -> Result<(), BuildError> {
        if self.channels.len() > MAX_CHANNELS {
            return Err(BuildError::TooManyChannels {
                count: self.channels.len(),
                max: MAX_CHANNELS,
            });
        }

        let mut body = BytesMut::new();
        body.put_u8(CMD_MULTI_CHANNEL);
        body.put_u8(COMMAND_VERSION);
        body.put_u8(self.status);
        body.put_u8(self.channels.len() as u8);
        for reading in &self.channels {
            body.put_u8((RECORD_PREFIX_LEN + reading.value.payload_len()) as u8);
            body.put_u8(0x00);
            body.put_slice(&reading.channel_id.to_le_bytes());
            reading.value.encode(&mut body);
        }

        if body.len() > MAX_BODY_LEN {
            return Err(BuildError::BodyTooLong {
                len: body.len(),
                max: MAX_BODY_LEN,
            });
        }

        encode_frame(destination, source, &body, dst);
        Ok(())
    }
}

/// Decode the status and channel records of a response buffer.
///
/// Only structure is read here; framing markers and the checksum are the
/// job of [`decode_frame`]. The header's body length is not consulted:
/// records are walked against the buffer alone, and every read is
/// bounds-checked against its end.
pub fn decode(buffer: &[u8]) -> Result<PollResponse, DecodeError> {
    if buffer.len() < OFFSET_RECORDS {
        return Err(DecodeError::TruncatedHeader {
            len: buffer.len(),
            needed: OFFSET_RECORDS,
        });
    }

    let status = buffer[OFFSET_STATUS];
    let count = usize::from(buffer[OFFSET_CHANNEL_COUNT]);
    let limit = buffer.len();

    let mut channels = Vec::with_capacity(count);
    let mut offset = OFFSET_RECORDS;
    for index in 0..count {
        if offset >= limit {
            return Err(DecodeError::TruncatedChannelRecord {
                channel: index,
                offset,
                needed: 1,
                available: 0,
            });
        }
        let declared = buffer[offset];
        let start = offset + 1;
        let end = start + usize::from(declared);
        if end > limit {
            return Err(DecodeError::TruncatedChannelRecord {
                channel: index,
                offset,
                needed: usize::from(declared),
                available: limit - start,
            });
        }

        channels.push(decode_record(index, declared, &buffer[start..end])?);
        offset = end;
    }

    Ok(PollResponse { status, channels })
}

fn decode_record(index: usize, declared: u8, record: &[u8]) -> Result<ChannelReading, DecodeError> {
    let too_short = |required: usize| DecodeError::RecordTooShort {
        channel: index,
        declared,
        required: required as u8,
    };

    if record.len() < RECORD_PREFIX_LEN {
        return Err(too_short(RECORD_PREFIX_LEN));
    }
    let channel_id = Identifier::from_le_bytes([record[1], record[2]]);
    let tag = record[3];

    let value = match value_len(tag) {
        Some(len) => {
            let required = RECORD_PREFIX_LEN + len;
            if record.len() < required {
                return Err(too_short(required));
            }
            ChannelValue::from_payload(tag, &record[RECORD_PREFIX_LEN..required])
        }
        None => ChannelValue::Unrecognized(tag),
    };

    Ok(ChannelReading { channel_id, value })
}

/// Validate a complete response frame and decode it.
pub fn decode_frame(frame: &[u8], policy: ChecksumPolicy) -> Result<PollResponse, DecodeError> {
    validate_frame(frame, policy)?;
    // Records may run into the body-end marker, never into the checksum.
    decode(&frame[..frame.len() - CHECKSUM_AND_EOT])
}
