use std::io::{ErrorKind, Read};

use bytes::Bytes;
use tracing::debug;
use umbpoll_transport::UmbStream;

use crate::assembler::FrameAssembler;
use crate::codec::FrameConfig;
use crate::error::{FrameError, Result};
use crate::response::{decode_frame, PollResponse};

const READ_CHUNK_SIZE: usize = 512;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
pub struct FrameReader<T> {
    inner: T,
    assembler: FrameAssembler,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            assembler: FrameAssembler::new(),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::Timeout)` when the stream's read timeout
    /// expires and `Err(FrameError::ConnectionClosed)` on EOF. Either way the
    /// partial frame is discarded.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        if let Some(frame) = self.assembler.next_frame() {
            return Ok(frame);
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    let discarded = self.assembler.reset();
                    debug!(discarded, "read timed out");
                    return Err(FrameError::Timeout);
                }
                Err(err) => {
                    self.assembler.reset();
                    return Err(FrameError::Io(err));
                }
            };

            if read == 0 {
                let discarded = self.assembler.reset();
                debug!(discarded, "stream closed");
                return Err(FrameError::ConnectionClosed);
            }

            debug!(read, "received bytes");
            if let Some(frame) = self.assembler.feed(&chunk[..read]) {
                debug!(len = frame.len(), "frame complete");
                return Ok(frame);
            }
        }
    }

    /// Read and decode the next poll response.
    pub fn read_response(&mut self) -> Result<PollResponse> {
        let frame = self.read_frame()?;
        Ok(decode_frame(&frame, self.config.checksum)?)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<'a> FrameReader<&'a UmbStream> {
    /// Create a frame reader for an `UmbStream` and apply read timeout from config.
    pub fn with_config_stream(inner: &'a UmbStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: umbpoll_transport::TransportError) -> FrameError {
    match err {
        umbpoll_transport::TransportError::Io(io) => FrameError::Io(io),
        umbpoll_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        umbpoll_transport::TransportError::Closed => FrameError::ConnectionClosed,
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
