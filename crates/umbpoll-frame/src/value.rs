//! Channel value types and their wire tags.

use bytes::{BufMut, BytesMut};

/// Unsigned 8-bit value (1 byte).
pub const TYPE_UINT8: u8 = 0x10;

/// IEEE-754 single-precision float, little-endian (4 bytes).
pub const TYPE_FLOAT32: u8 = 0x16;

/// A decoded channel value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelValue {
    UInt8(u8),
    Float32(f32),
    /// The record carried a type tag outside the known catalog.
    Unrecognized(u8),
}

impl ChannelValue {
    /// The wire tag for this value.
    pub fn type_tag(&self) -> u8 {
        match self {
            ChannelValue::UInt8(_) => TYPE_UINT8,
            ChannelValue::Float32(_) => TYPE_FLOAT32,
            ChannelValue::Unrecognized(tag) => *tag,
        }
    }

    /// Numeric view of the value, `None` for unrecognized tags.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ChannelValue::UInt8(v) => Some(f64::from(*v)),
            ChannelValue::Float32(v) => Some(f64::from(*v)),
            ChannelValue::Unrecognized(_) => None,
        }
    }

    /// Decode a value payload for a known tag. `bytes` must be
    /// `value_len(tag)` long.
    pub(crate) fn from_payload(tag: u8, bytes: &[u8]) -> Self {
        match (tag, bytes) {
            (TYPE_UINT8, [v]) => ChannelValue::UInt8(*v),
            (TYPE_FLOAT32, [a, b, c, d]) => ChannelValue::Float32(f32::from_le_bytes([*a, *b, *c, *d])),
            _ => ChannelValue::Unrecognized(tag),
        }
    }

    /// Append the tag and value payload.
    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.type_tag());
        match self {
            ChannelValue::UInt8(v) => dst.put_u8(*v),
            ChannelValue::Float32(v) => dst.put_f32_le(*v),
            ChannelValue::Unrecognized(_) => {}
        }
    }

    /// Payload size in bytes (excluding the tag).
    pub(crate) fn payload_len(&self) -> usize {
        value_len(self.type_tag()).unwrap_or(0)
    }
}

/// Payload size for a known tag, `None` for tags outside the catalog.
pub fn value_len(tag: u8) -> Option<usize> {
    match tag {
        TYPE_UINT8 => Some(1),
        TYPE_FLOAT32 => Some(4),
        _ => None,
    }
}

/// Returns a human-readable name for a type tag.
pub fn type_name(tag: u8) -> &'static str {
    match tag {
        TYPE_UINT8 => "UINT8",
        TYPE_FLOAT32 => "FLOAT32",
        _ => "UNRECOGNIZED",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags() {
        assert_eq!(value_len(TYPE_UINT8), Some(1));
        assert_eq!(value_len(TYPE_FLOAT32), Some(4));
        assert_eq!(value_len(0x17), None);
        assert_eq!(type_name(0x16), "FLOAT32");
        assert_eq!(type_name(0x99), "UNRECOGNIZED");
    }

    #[test]
    fn payload_decoding() {
        assert_eq!(ChannelValue::from_payload(TYPE_UINT8, &[42]), ChannelValue::UInt8(42));
        assert_eq!(
            ChannelValue::from_payload(TYPE_FLOAT32, &21.5f32.to_le_bytes()),
            ChannelValue::Float32(21.5)
        );
    }

    #[test]
    fn encode_writes_tag_then_payload() {
        let mut buf = BytesMut::new();
        ChannelValue::Float32(1.0).encode(&mut buf);
        assert_eq!(buf.as_ref(), &[0x16, 0x00, 0x00, 0x80, 0x3F]);

        buf.clear();
        ChannelValue::Unrecognized(0x20).encode(&mut buf);
        assert_eq!(buf.as_ref(), &[0x20]);
    }

    #[test]
    fn numeric_view() {
        assert_eq!(ChannelValue::UInt8(7).as_f64(), Some(7.0));
        assert_eq!(ChannelValue::Unrecognized(1).as_f64(), None);
    }
}
