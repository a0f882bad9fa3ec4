//! Common data types used across the relay subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a relay channel inside one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Bytes from the accepted client socket to the dialed target.
    LocalToRemote,
    /// Bytes from the dialed target back to the client.
    RemoteToLocal,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::LocalToRemote => write!(f, "L->R"),
            Direction::RemoteToLocal => write!(f, "R->L"),
        }
    }
}

/// Completion signal a channel sends to its coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelReport {
    pub direction: Direction,
    /// Number of non-empty reads relayed.
    pub packets: u64,
    /// Total bytes read from the source, i.e. the final offset.
    pub bytes: u64,
    /// Destination writes that failed; the channel kept reading after each.
    pub write_failures: u64,
}
