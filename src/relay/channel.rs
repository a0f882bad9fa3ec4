use std::io;
use std::path::Path;

use log::{debug, trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::Sender;

use super::endpoint::Endpoint;
use super::types::{ChannelReport, Direction};
use crate::error_handling::types::LogError;
use crate::log_sink::naming::{capture_filename, timestamp};
use crate::log_sink::{LogSink, TraceLog};

/// Capacity of the reusable read buffer.
pub const BUFFER_SIZE: usize = 10 * 1024;

/// Unidirectional relay from `from` to `to`.
///
/// Each non-empty read is traced, hex dumped, captured raw and forwarded.
/// `packet_n` and `offset` only move forward and belong to this channel
/// alone. The loop ends on end-of-stream or on any read error other than
/// `Interrupted`; a failed destination write does not end it.
pub struct Channel<R, W> {
    direction: Direction,
    from: R,
    to: W,
    from_addr: String,
    to_addr: String,
    trace: TraceLog,
    capture: LogSink,
    done: Sender<ChannelReport>,
    offset: u64,
    packet_n: u64,
    write_failures: u64,
}

impl<R, W> Channel<R, W>
where
    R: AsyncRead + Endpoint + Unpin,
    W: AsyncWrite + Endpoint + Unpin,
{
    /// Prepares a channel and creates its binary capture file, named after
    /// `sequence` and `peer`, in `log_dir`.
    ///
    /// `done` receives exactly one [`ChannelReport`] once [`run`](Self::run)
    /// has closed everything.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        direction: Direction,
        from: R,
        to: W,
        peer: &str,
        sequence: u32,
        trace: TraceLog,
        done: Sender<ChannelReport>,
        log_dir: &Path,
    ) -> Result<Self, LogError> {
        let capture = LogSink::create(log_dir.join(capture_filename(&timestamp(), sequence, peer)))?;

        Ok(Self {
            direction,
            from_addr: from.address(),
            to_addr: to.address(),
            from,
            to,
            trace,
            capture,
            done,
            offset: 0,
            packet_n: 0,
            write_failures: 0,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Relays until the source read fails, then tears the channel down.
    pub async fn run(mut self) {
        trace!("[{}] relay started from {}", self.direction, self.from_addr);
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            let n = match self.from.read(&mut buffer).await {
                Ok(0) => {
                    trace!("[{}] end of stream from {}", self.direction, self.from_addr);
                    break;
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("[{}] read from {} failed: {}", self.direction, self.from_addr, e);
                    break;
                }
            };
            self.pass_through(&buffer[..n]).await;
        }

        self.disconnect().await;
    }

    async fn pass_through(&mut self, chunk: &[u8]) {
        self.trace.log(format!(
            "Received (#{}, {:08X}) {} bytes from {}",
            self.packet_n,
            self.offset,
            chunk.len(),
            self.from_addr
        ));
        self.trace.log_hex(chunk);
        self.capture.submit(chunk);

        if let Err(e) = self.to.write_all(chunk).await {
            self.write_failures += 1;
            debug!(
                "[{}] write of packet #{} to {} failed: {}",
                self.direction, self.packet_n, self.to_addr, e
            );
        }

        self.trace
            .log(format!("Sent (#{}) to {}\n", self.packet_n, self.to_addr));

        self.offset += chunk.len() as u64;
        self.packet_n += 1;
    }

    async fn disconnect(self) {
        let Channel {
            direction,
            from,
            to,
            from_addr,
            trace,
            capture,
            done,
            offset,
            packet_n,
            write_failures,
            ..
        } = self;

        trace.log(format!("Disconnected from {}", from_addr));

        from.close();
        to.close();
        drop(from);
        drop(to);

        if let Err(e) = capture.close().await {
            warn!("[{}] capture log did not close cleanly: {}", direction, e);
        }

        let report = ChannelReport {
            direction,
            packets: packet_n,
            bytes: offset,
            write_failures,
        };
        if done.send(report).await.is_err() {
            debug!("[{}] coordinator went away before completion", direction);
        }
    }
}
