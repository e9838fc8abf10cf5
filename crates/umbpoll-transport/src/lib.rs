//! TCP transport for polling networked instruments.
//!
//! This is the lowest layer of umbpoll. It opens the one connection a poll
//! needs and hands it out as an [`UmbStream`] owned by the caller. Closing is
//! idempotent and can be triggered from another thread via [`CloseHandle`],
//! which is how interrupt-driven cancellation terminates a blocked read.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::{CloseHandle, UmbStream};
pub use tcp::{resolve_address, TcpTransport, DEFAULT_PORT};
