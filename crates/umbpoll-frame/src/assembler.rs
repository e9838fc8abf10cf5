//! Accumulates stream bytes until a complete frame is present.
//!
//! Completion is decided from the header alone: once the body length byte
//! has arrived the frame is `body_len + FRAMING_OVERHEAD` bytes long. A
//! momentary lull in the transport ("nothing more available right now") is
//! never treated as the end of a frame.

use bytes::{Buf, Bytes, BytesMut};
use tracing::warn;

use crate::codec::{FRAMING_OVERHEAD, MAX_FRAME_SIZE, OFFSET_BODY_LEN, SOH};

/// Split one complete frame off the front of `src`.
///
/// Returns `None` if `src` doesn't hold a complete frame yet. Bytes ahead of
/// the first start marker are discarded.
pub fn split_frame(src: &mut BytesMut) -> Option<Bytes> {
    resync(src);
    if src.len() <= OFFSET_BODY_LEN {
        return None; // Need more data
    }

    let total = usize::from(src[OFFSET_BODY_LEN]) + FRAMING_OVERHEAD;
    if src.len() < total {
        return None; // Need more data
    }

    Some(src.split_to(total).freeze())
}

fn resync(src: &mut BytesMut) {
    match src.iter().position(|&b| b == SOH) {
        Some(0) => {}
        Some(skip) => {
            warn!(discarded = skip, "skipping bytes before start marker");
            src.advance(skip);
        }
        None if !src.is_empty() => {
            warn!(discarded = src.len(), "no start marker in buffered bytes");
            src.clear();
        }
        None => {}
    }
}

/// Stateful frame assembler owned by the single reader of a connection.
#[derive(Debug)]
pub struct FrameAssembler {
    buf: BytesMut,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE),
        }
    }

    /// Add freshly received bytes and return a frame if one is now complete.
    ///
    /// Bytes past the end of the returned frame stay buffered; call
    /// [`next_frame`](Self::next_frame) to drain them.
    pub fn feed(&mut self, new_bytes: &[u8]) -> Option<Bytes> {
        self.buf.extend_from_slice(new_bytes);
        self.next_frame()
    }

    /// Return the next complete frame already buffered, if any.
    pub fn next_frame(&mut self) -> Option<Bytes> {
        split_frame(&mut self.buf)
    }

    /// Number of bytes waiting for the rest of their frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial frame, returning how many bytes were discarded.
    pub fn reset(&mut self) -> usize {
        let discarded = self.buf.len();
        self.buf.clear();
        discarded
    }
}

#[cfg(test)]
mod tests {
    use bytes::BufMut;

    use super::*;
    use crate::codec::PollRequest;
    use crate::identifier::Identifier;

    fn sample_frame(channels: &[u16]) -> Bytes {
        let ids: Vec<Identifier> = channels.iter().copied().map(Identifier::new).collect();
        PollRequest::new(Identifier::new(1), ids).unwrap().to_bytes()
    }

    #[test]
    fn whole_frame_in_one_feed() {
        let frame = sample_frame(&[101]);
        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.feed(&frame), Some(frame));
        assert_eq!(assembler.buffered(), 0);
    }

    #[test]
    fn byte_by_byte_delivery() {
        let frame = sample_frame(&[100, 101, 102]);
        let mut assembler = FrameAssembler::new();

        for &byte in &frame[..frame.len() - 1] {
            assert_eq!(assembler.feed(&[byte]), None);
        }
        assert_eq!(assembler.feed(&frame[frame.len() - 1..]), Some(frame));
    }

    #[test]
    fn chunking_does_not_change_result() {
        let frame = sample_frame(&[100, 200, 300, 400]);
        for split in 1..frame.len() {
            let mut assembler = FrameAssembler::new();
            assert_eq!(assembler.feed(&frame[..split]), None);
            assert_eq!(assembler.feed(&frame[split..]), Some(frame.clone()));
        }
    }

    #[test]
    fn back_to_back_frames() {
        let first = sample_frame(&[101]);
        let second = sample_frame(&[102, 103]);
        let mut wire = BytesMut::new();
        wire.put_slice(&first);
        wire.put_slice(&second);

        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.feed(&wire), Some(first));
        assert_eq!(assembler.next_frame(), Some(second));
        assert_eq!(assembler.next_frame(), None);
    }

    #[test]
    fn resyncs_past_garbage() {
        let frame = sample_frame(&[101]);
        let mut wire = vec![0xFF, 0x00, 0x42];
        wire.extend_from_slice(&frame);

        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.feed(&wire), Some(frame));
    }

    #[test]
    fn garbage_without_marker_is_dropped() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.feed(&[0x10, 0x20, 0x30]), None);
        assert_eq!(assembler.buffered(), 0);
    }

    #[test]
    fn reset_discards_partial_frame() {
        let frame = sample_frame(&[101]);
        let mut assembler = FrameAssembler::new();
        assembler.feed(&frame[..5]);
        assert_eq!(assembler.reset(), 5);
        assert_eq!(assembler.buffered(), 0);

        assert_eq!(assembler.feed(&frame), Some(frame));
    }

    #[test]
    fn header_without_length_byte_waits() {
        let mut src = BytesMut::from(&[SOH, 0x10, 0x01, 0x00, 0x09, 0xF0][..]);
        assert_eq!(split_frame(&mut src), None);
        assert_eq!(src.len(), 6);
    }
}
