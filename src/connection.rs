//! Per-connection coordination.
//!
//! A [`Connection`] pairs one accepted socket with one dialed socket, runs
//! two opposite [`Channel`](crate::relay::Channel)s over them sharing a
//! single trace log, and waits for both to finish before closing the trace.

pub mod coordinator;

pub use coordinator::{Connection, ConnectionReport};
