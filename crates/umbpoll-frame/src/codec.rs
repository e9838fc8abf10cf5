use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::warn;

use crate::checksum::{checksum, verify_checksum};
use crate::error::{BuildError, DecodeError};
use crate::identifier::Identifier;

/// Start-of-header marker.
pub const SOH: u8 = 0x01;
/// Protocol version byte.
pub const PROTOCOL_VERSION: u8 = 0x10;
/// Body-start marker.
pub const STX: u8 = 0x02;
/// Body-end marker.
pub const ETX: u8 = 0x03;
/// End-of-transmission marker.
pub const EOT: u8 = 0x04;

/// Fixed header: SOH, version, destination (2), source (2), body length, STX.
pub const HEADER_SIZE: usize = 8;
/// Trailer: ETX, checksum (2), EOT.
pub const TRAILER_SIZE: usize = 4;
/// Bytes a frame carries in addition to its body.
pub const FRAMING_OVERHEAD: usize = HEADER_SIZE + TRAILER_SIZE;
/// Largest frame a one-byte body length can describe.
pub const MAX_FRAME_SIZE: usize = u8::MAX as usize + FRAMING_OVERHEAD;

/// Offset of the body length byte.
pub const OFFSET_BODY_LEN: usize = 6;
/// Offset of the first body byte (command).
pub const OFFSET_BODY: usize = HEADER_SIZE;
/// Offset of the status byte in a response.
pub const OFFSET_STATUS: usize = 10;
/// Offset of the channel count byte in a response.
pub const OFFSET_CHANNEL_COUNT: usize = 11;
/// Offset of the first channel record in a response.
pub const OFFSET_RECORDS: usize = 12;

/// Multi-channel online data request.
pub const CMD_MULTI_CHANNEL: u8 = 0x2F;
/// Command sub-version sent with every request.
pub const COMMAND_VERSION: u8 = 0x10;

/// Source address the poller identifies itself with (`09 F0` on the wire).
pub const DEFAULT_SOURCE: Identifier = Identifier::new(0xF009);

/// Maximum channels per request (the count is a single byte).
pub const MAX_CHANNELS: usize = u8::MAX as usize;

/// Receive window the instrument is expected to answer within.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(510);

/// How a received checksum mismatch is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumPolicy {
    /// Reject the frame with [`DecodeError::ChecksumMismatch`].
    Enforce,
    /// Log a warning and decode anyway.
    #[default]
    Warn,
    /// Do not check.
    Ignore,
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone, Default)]
pub struct FrameConfig {
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
    /// Checksum handling for received frames.
    pub checksum: ChecksumPolicy,
}

/// The fixed 8-byte frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,
    pub destination: Identifier,
    pub source: Identifier,
    pub body_len: u8,
}

impl FrameHeader {
    /// Parse and check the markers of a frame header.
    pub fn parse(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < HEADER_SIZE {
            return Err(DecodeError::TruncatedHeader {
                len: buf.len(),
                needed: HEADER_SIZE,
            });
        }
        expect_marker(buf, 0, SOH)?;
        expect_marker(buf, HEADER_SIZE - 1, STX)?;

        Ok(Self {
            version: buf[1],
            destination: Identifier::from_le_bytes([buf[2], buf[3]]),
            source: Identifier::from_le_bytes([buf[4], buf[5]]),
            body_len: buf[OFFSET_BODY_LEN],
        })
    }

    /// Total wire size of the frame this header starts.
    pub fn frame_len(&self) -> usize {
        usize::from(self.body_len) + FRAMING_OVERHEAD
    }
}

/// Encode a complete frame around `body`.
///
/// Wire format:
/// ```text
/// ┌─────┬─────┬──────────┬──────────┬─────┬─────┬──────────┬─────┬──────────┬─────┐
/// │ SOH │ VER │ To (2B)  │ From (2B)│ LEN │ STX │ Body     │ ETX │ CRC (2B) │ EOT │
/// │ 01  │ 10  │ LE       │ LE       │     │ 02  │ LEN bytes│ 03  │ LE       │ 04  │
/// └─────┴─────┴──────────┴──────────┴─────┴─────┴──────────┴─────┴──────────┴─────┘
/// ```
///
/// The checksum covers SOH through ETX. A body longer than 255 bytes cannot
/// be described by the length byte; its low byte is written and a warning
/// is logged.
pub fn encode_frame(destination: Identifier, source: Identifier, body: &[u8], dst: &mut BytesMut) {
    if body.len() > usize::from(u8::MAX) {
        warn!(
            body_len = body.len(),
            "body exceeds one-byte length field; declared length wraps"
        );
    }

    let start = dst.len();
    dst.reserve(FRAMING_OVERHEAD + body.len());
    dst.put_u8(SOH);
    dst.put_u8(PROTOCOL_VERSION);
    dst.put_slice(&destination.to_le_bytes());
    dst.put_slice(&source.to_le_bytes());
    dst.put_u8(body.len() as u8);
    dst.put_u8(STX);
    dst.put_slice(body);
    dst.put_u8(ETX);
    let crc = checksum(&dst[start..]);
    dst.put_u16_le(crc);
    dst.put_u8(EOT);
}

/// Check a complete frame's markers, length and checksum.
pub fn validate_frame(frame: &[u8], policy: ChecksumPolicy) -> Result<FrameHeader, DecodeError> {
    let header = FrameHeader::parse(frame)?;
    let declared = header.frame_len();
    if frame.len() != declared {
        return Err(DecodeError::LengthMismatch {
            declared,
            actual: frame.len(),
        });
    }
    expect_marker(frame, declared - TRAILER_SIZE, ETX)?;
    expect_marker(frame, declared - 1, EOT)?;

    match policy {
        ChecksumPolicy::Enforce => verify_checksum(frame)?,
        ChecksumPolicy::Warn => {
            if let Err(err) = verify_checksum(frame) {
                warn!(%err, "accepting frame with bad checksum");
            }
        }
        ChecksumPolicy::Ignore => {}
    }

    Ok(header)
}

fn expect_marker(buf: &[u8], offset: usize, expected: u8) -> Result<(), DecodeError> {
    let found = buf[offset];
    if found != expected {
        return Err(DecodeError::InvalidMarker {
            offset,
            expected,
            found,
        });
    }
    Ok(())
}

/// A multi-channel poll request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    device_id: Identifier,
    source: Identifier,
    channel_ids: Vec<Identifier>,
}

impl PollRequest {
    /// Create a request for `channel_ids`, in the order the response should list them.
    pub fn new(
        device_id: Identifier,
        channel_ids: impl Into<Vec<Identifier>>,
    ) -> Result<Self, BuildError> {
        let channel_ids = channel_ids.into();
        if channel_ids.is_empty() {
            return Err(BuildError::EmptyChannelList);
        }
        if channel_ids.len() > MAX_CHANNELS {
            return Err(BuildError::TooManyChannels {
                count: channel_ids.len(),
                max: MAX_CHANNELS,
            });
        }
        Ok(Self {
            device_id,
            source: DEFAULT_SOURCE,
            channel_ids,
        })
    }

    /// Override the source address.
    pub fn with_source(mut self, source: Identifier) -> Self {
        self.source = source;
        self
    }

    pub fn device_id(&self) -> Identifier {
        self.device_id
    }

    pub fn source(&self) -> Identifier {
        self.source
    }

    pub fn channel_ids(&self) -> &[Identifier] {
        &self.channel_ids
    }

    /// The command block: command, sub-version, count, channel ids.
    pub fn body(&self) -> BytesMut {
        let mut body = BytesMut::with_capacity(3 + 2 * self.channel_ids.len());
        body.put_u8(CMD_MULTI_CHANNEL);
        body.put_u8(COMMAND_VERSION);
        body.put_u8(self.channel_ids.len() as u8);
        for id in &self.channel_ids {
            body.put_slice(&id.to_le_bytes());
        }
        body
    }

    /// Append the full request frame to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        encode_frame(self.device_id, self.source, &self.body(), dst);
    }

    /// The full request frame.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }

    /// The total wire size of this request.
    pub fn wire_size(&self) -> usize {
        FRAMING_OVERHEAD + 3 + 2 * self.channel_ids.len()
    }

    /// Parse a request frame, as an instrument would on receipt.
    pub fn decode(frame: &[u8], policy: ChecksumPolicy) -> Result<Self, DecodeError> {
        let header = validate_frame(frame, policy)?;
        let body = &frame[OFFSET_BODY..OFFSET_BODY + usize::from(header.body_len)];
        let [command, version, count, ids @ ..] = body else {
            return Err(DecodeError::TruncatedHeader {
                len: frame.len(),
                needed: OFFSET_BODY + 3,
            });
        };
        if *command != CMD_MULTI_CHANNEL {
            return Err(DecodeError::UnexpectedCommand {
                command: *command,
                version: *version,
            });
        }
        if ids.len() != 2 * usize::from(*count) {
            return Err(DecodeError::LengthMismatch {
                declared: 2 * usize::from(*count),
                actual: ids.len(),
            });
        }

        Ok(Self {
            device_id: header.destination,
            source: header.source,
            channel_ids: ids
                .chunks_exact(2)
                .map(|pair| Identifier::from_le_bytes([pair[0], pair[1]]))
                .collect(),
        })
    }
}

/// Build a poll-request frame for `channel_ids` on `device_id`.
pub fn build_poll_request(
    device_id: Identifier,
    channel_ids: &[Identifier],
) -> Result<Bytes, BuildError> {
    Ok(PollRequest::new(device_id, channel_ids)?.to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[u16]) -> Vec<Identifier> {
        values.iter().copied().map(Identifier::new).collect()
    }

    #[test]
    fn single_channel_reference_vector() {
        let frame = build_poll_request(Identifier::new(1), &ids(&[101])).unwrap();
        assert_eq!(
            frame.as_ref(),
            &[
                0x01, 0x10, 0x01, 0x00, 0x09, 0xF0, 0x05, 0x02, 0x2F, 0x10, 0x01, 0x65, 0x00,
                0x03, 0x4E, 0x26, 0x04
            ]
        );
    }

    #[test]
    fn header_fields_match_recomputation() {
        let channels = ids(&[100, 101, 4630]);
        let frame = build_poll_request(Identifier::new(0x7001), &channels).unwrap();

        let header = FrameHeader::parse(&frame).unwrap();
        assert_eq!(header.destination, Identifier::new(0x7001));
        assert_eq!(header.source, DEFAULT_SOURCE);
        assert_eq!(usize::from(header.body_len), 3 + 2 * channels.len());
        assert_eq!(header.frame_len(), frame.len());

        let crc_at = frame.len() - 3;
        let stored = u16::from_le_bytes([frame[crc_at], frame[crc_at + 1]]);
        assert_eq!(stored, checksum(&frame[..crc_at]));
    }

    #[test]
    fn channel_order_is_preserved() {
        let frame = build_poll_request(Identifier::new(1), &ids(&[300, 100, 200])).unwrap();
        assert_eq!(&frame[11..17], &[0x2C, 0x01, 0x64, 0x00, 0xC8, 0x00]);
    }

    #[test]
    fn empty_channel_list_rejected() {
        let err = build_poll_request(Identifier::new(1), &[]).unwrap_err();
        assert_eq!(err, BuildError::EmptyChannelList);
    }

    #[test]
    fn too_many_channels_rejected() {
        let channels = vec![Identifier::new(1); 256];
        let err = build_poll_request(Identifier::new(1), &channels).unwrap_err();
        assert_eq!(err, BuildError::TooManyChannels { count: 256, max: 255 });
    }

    #[test]
    fn count_byte_matches_input_length() {
        for count in [1usize, 2, 126, 255] {
            let channels = vec![Identifier::new(100); count];
            let frame = build_poll_request(Identifier::new(1), &channels).unwrap();
            assert_eq!(usize::from(frame[10]), count);
            assert_eq!(frame.len(), FRAMING_OVERHEAD + 3 + 2 * count);
        }
    }

    #[test]
    fn with_source_overrides_address() {
        let request = PollRequest::new(Identifier::new(1), ids(&[101]))
            .unwrap()
            .with_source(Identifier::new(0xF001));
        let frame = request.to_bytes();
        assert_eq!(&frame[4..6], &[0x01, 0xF0]);
        assert_eq!(request.wire_size(), frame.len());
    }

    #[test]
    fn request_decode_recovers_fields() {
        let request = PollRequest::new(Identifier::new(0x2001), ids(&[100, 113])).unwrap();
        let decoded = PollRequest::decode(&request.to_bytes(), ChecksumPolicy::Enforce).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn validate_rejects_bad_markers() {
        let mut frame = build_poll_request(Identifier::new(1), &ids(&[101]))
            .unwrap()
            .to_vec();
        let last = frame.len() - 1;
        frame[last] = 0xFF;
        assert_eq!(
            validate_frame(&frame, ChecksumPolicy::Ignore),
            Err(DecodeError::InvalidMarker {
                offset: last,
                expected: EOT,
                found: 0xFF
            })
        );
    }

    #[test]
    fn validate_rejects_length_mismatch() {
        let mut frame = build_poll_request(Identifier::new(1), &ids(&[101]))
            .unwrap()
            .to_vec();
        frame.push(0x00);
        assert!(matches!(
            validate_frame(&frame, ChecksumPolicy::Ignore),
            Err(DecodeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn checksum_policy_controls_mismatch() {
        let mut frame = build_poll_request(Identifier::new(1), &ids(&[101]))
            .unwrap()
            .to_vec();
        frame[11] ^= 0xFF;

        assert!(matches!(
            validate_frame(&frame, ChecksumPolicy::Enforce),
            Err(DecodeError::ChecksumMismatch { .. })
        ));
        assert!(validate_frame(&frame, ChecksumPolicy::Warn).is_ok());
        assert!(validate_frame(&frame, ChecksumPolicy::Ignore).is_ok());
    }

    #[test]
    fn header_parse_needs_eight_bytes() {
        assert_eq!(
            FrameHeader::parse(&[SOH, PROTOCOL_VERSION, 0x01]),
            Err(DecodeError::TruncatedHeader { len: 3, needed: 8 })
        );
    }
}
