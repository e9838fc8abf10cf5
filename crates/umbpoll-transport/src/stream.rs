use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, TransportError};

/// A connected instrument stream. Implements Read + Write.
///
/// The stream is exclusively owned by the caller that opened it. Reader and
/// writer halves borrow it (`&UmbStream` is also `Read + Write`), and the
/// socket is shut down when the owner drops it or calls [`UmbStream::close`].
pub struct UmbStream {
    inner: TcpStream,
    closed: Arc<AtomicBool>,
}

impl Read for UmbStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        (&*self).read(buf)
    }
}

impl Write for UmbStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        (&*self).flush()
    }
}

impl Read for &UmbStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.is_closed() {
            return Ok(0);
        }
        (&self.inner).read(buf)
    }
}

impl Write for &UmbStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.is_closed() {
            return Err(std::io::Error::from(ErrorKind::NotConnected));
        }
        (&self.inner).write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        (&self.inner).flush()
    }
}

impl UmbStream {
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: stream,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Address of the connected instrument.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner.peer_addr().map_err(Into::into)
    }

    /// Whether [`close`](Self::close) has run, here or through a [`CloseHandle`].
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Shut down both directions of the connection.
    ///
    /// Idempotent: closing an already-closed stream, or one the instrument
    /// has already dropped, returns `Ok(())`.
    pub fn close(&self) -> Result<()> {
        shutdown_once(&self.inner, &self.closed)
    }

    /// Handle that can close this stream from another thread.
    ///
    /// Closing through the handle unblocks a read in progress on the owner.
    pub fn close_handle(&self) -> Result<CloseHandle> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        Ok(CloseHandle {
            inner: self.inner.try_clone()?,
            closed: Arc::clone(&self.closed),
        })
    }
}

impl Drop for UmbStream {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            debug!(%err, "shutdown on drop failed");
        }
    }
}

impl std::fmt::Debug for UmbStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UmbStream")
            .field("peer", &self.inner.peer_addr().ok())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Cross-thread close for an [`UmbStream`], e.g. from a Ctrl-C handler.
#[derive(Debug)]
pub struct CloseHandle {
    inner: TcpStream,
    closed: Arc<AtomicBool>,
}

impl CloseHandle {
    /// Shut down the shared connection. Idempotent.
    pub fn close(&self) -> Result<()> {
        shutdown_once(&self.inner, &self.closed)
    }

    /// Whether the shared connection has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn shutdown_once(stream: &TcpStream, closed: &AtomicBool) -> Result<()> {
    if closed.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    match stream.shutdown(Shutdown::Both) {
        Ok(()) => {
            debug!("connection closed");
            Ok(())
        }
        // The instrument hung up first.
        Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
        Err(err) => Err(TransportError::Io(err)),
    }
}
