//! Poll measurement channels from networked instruments.
//!
//! umbpoll sends one multi-channel request to an instrument and decodes the
//! typed readings it answers with.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP connection with scoped, idempotent close
//! - [`frame`]: Request building, response decoding, stream assembly
//!
//! ```no_run
//! use std::time::Duration;
//! use umbpoll::frame::{FrameConfig, FrameReader, FrameWriter, Identifier, PollRequest};
//! use umbpoll::transport::{resolve_address, TcpTransport, DEFAULT_PORT};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let addr = resolve_address("192.168.0.50", DEFAULT_PORT)?;
//! let stream = TcpTransport::connect(addr, Some(Duration::from_secs(5)))?;
//! let config = FrameConfig {
//!     read_timeout: Some(Duration::from_millis(510)),
//!     ..FrameConfig::default()
//! };
//!
//! let request = PollRequest::new(Identifier::new(1), vec![Identifier::new(100)])?;
//! FrameWriter::with_config_stream(&stream, config.clone())?.send_request(&request)?;
//! let response = FrameReader::with_config_stream(&stream, config)?.read_response()?;
//! for reading in &response.channels {
//!     println!("{} = {:?}", reading.channel_id, reading.value);
//! }
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use umbpoll_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use umbpoll_frame::*;
}
