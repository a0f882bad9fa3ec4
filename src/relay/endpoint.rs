use std::io;
use std::net::{Shutdown, SocketAddr};

use log::trace;
use socket2::SockRef;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// A socket end a relay channel reads from or writes to.
pub trait Endpoint {
    /// Address shown in trace records: the socket's own local address.
    fn address(&self) -> String;

    /// Shuts down both directions of the underlying connection.
    ///
    /// The opposite channel's pending read on the same socket wakes up with
    /// end-of-stream. Closing an already closed socket is a no-op.
    fn close(&self);
}

impl Endpoint for OwnedReadHalf {
    fn address(&self) -> String {
        describe(self.local_addr())
    }

    fn close(&self) {
        shutdown(self.as_ref());
    }
}

impl Endpoint for OwnedWriteHalf {
    fn address(&self) -> String {
        describe(self.local_addr())
    }

    fn close(&self) {
        shutdown(self.as_ref());
    }
}

fn describe(addr: io::Result<SocketAddr>) -> String {
    match addr {
        Ok(addr) => addr.to_string(),
        Err(_) => "unknown".to_string(),
    }
}

fn shutdown(stream: &TcpStream) {
    // ENOTCONN once the peer or the other channel got there first
    if let Err(e) = SockRef::from(stream).shutdown(Shutdown::Both) {
        trace!("shutdown on closed socket ignored: {}", e);
    }
}
