use chrono::{DateTime, Local};
use std::net::SocketAddr;

const TIMESTAMP_FORMAT: &str = "%Y.%m.%d-%H.%M.%S";

/// `YYYY.MM.DD-hh.mm.ss`, used both in file names and trace records.
pub fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

pub fn timestamp() -> String {
    format_timestamp(&Local::now())
}

/// Filesystem-safe form of a socket address: every `:` becomes `-`.
pub fn peer_descriptor(addr: &SocketAddr) -> String {
    addr.to_string().replace(':', "-")
}

pub fn trace_filename(timestamp: &str, sequence: u32, local: &str, remote: &str) -> String {
    format!("log-{}-{:04}-{}-{}.log", timestamp, sequence, local, remote)
}

pub fn capture_filename(timestamp: &str, sequence: u32, peer: &str) -> String {
    format!("log-binary-{}-{:04}-{}.log", timestamp, sequence, peer)
}
