//! `tokio_util::codec` adapter for async callers.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::assembler::split_frame;
use crate::codec::{ChecksumPolicy, PollRequest};
use crate::error::FrameError;
use crate::response::{decode_frame, PollResponse};

/// Encodes poll requests and decodes poll responses on a framed stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollCodec {
    checksum: ChecksumPolicy,
}

impl PollCodec {
    pub fn new(checksum: ChecksumPolicy) -> Self {
        Self { checksum }
    }
}

impl Decoder for PollCodec {
    type Item = PollResponse;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match split_frame(src) {
            Some(frame) => Ok(Some(decode_frame(&frame, self.checksum)?)),
            None => Ok(None),
        }
    }
}

impl<'a> Encoder<&'a PollRequest> for PollCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a PollRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode(dst);
        Ok(())
    }
}

impl Encoder<PollRequest> for PollCodec {
    type Error = FrameError;

    fn encode(&mut self, item: PollRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode(dst);
        Ok(())
    }
}
