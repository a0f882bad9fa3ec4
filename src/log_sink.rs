//! Ordered, asynchronous file logging for proxied connections.
//!
//! Each [`LogSink`] owns one file and one worker task. Producers hand buffers
//! over through an unbounded queue and never wait on disk I/O; the worker
//! writes them strictly in submission order and forces each one to stable
//! storage before taking the next.
//!
//! Two kinds of sinks are built on top of it:
//! - the connection trace, human-readable records written through
//!   [`TraceLog`], shared by both directions of a connection
//! - the binary capture, raw bytes of one direction with no framing
//!
//! File names are derived in [`naming`].

pub mod naming;
pub mod sink;
pub mod trace;

pub use sink::{LogSink, SinkHandle, SinkMessage};
pub use trace::{hex_dump, TraceLog};
