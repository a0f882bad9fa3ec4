//! One direction of byte flow inside a proxied connection.
//!
//! A [`Channel`] pumps bytes from a source socket to a destination socket,
//! writing a trace record, a hex dump and a raw capture for every chunk. It
//! runs until its source read fails, then closes both sockets and reports to
//! the connection coordinator exactly once.

pub mod channel;
pub mod endpoint;
pub mod types;

pub use channel::{Channel, BUFFER_SIZE};
pub use endpoint::Endpoint;
pub use types::{ChannelReport, Direction};
