use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::error_handling::types::ConnectionError;
use crate::log_sink::naming::{format_timestamp, peer_descriptor, trace_filename};
use crate::log_sink::{LogSink, TraceLog};
use crate::relay::{Channel, ChannelReport, Direction};

/// Outcome of one proxied session, returned once both channels are done.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub sequence: u32,
    pub target: String,
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    pub trace_path: PathBuf,
    /// In completion order, normally two entries.
    pub channels: Vec<ChannelReport>,
}

impl ConnectionReport {
    pub fn channel(&self, direction: Direction) -> Option<&ChannelReport> {
        self.channels.iter().find(|c| c.direction == direction)
    }

    pub fn total_bytes(&self) -> u64 {
        self.channels.iter().map(|c| c.bytes).sum()
    }
}

/// One accepted socket and its dialed counterpart.
///
/// Both sockets stay open until both relay directions have terminated; each
/// channel closes its own pair on the way out.
pub struct Connection {
    sequence: u32,
    local: TcpStream,
    remote: TcpStream,
    target: String,
    log_dir: PathBuf,
}

impl Connection {
    /// Dials `target` for the freshly accepted `local` socket.
    ///
    /// There is no retry. A failed dial returns [`ConnectionError::Dial`]
    /// before any log file has been created for `sequence`.
    pub async fn open(
        local: TcpStream,
        sequence: u32,
        target: &str,
        log_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConnectionError> {
        let remote = TcpStream::connect(target)
            .await
            .map_err(|source| ConnectionError::Dial {
                target: target.to_string(),
                source,
            })?;
        debug!("[{:04}] dialed {}", sequence, target);

        Ok(Self {
            sequence,
            local,
            remote,
            target: target.to_string(),
            log_dir: log_dir.into(),
        })
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Relays both directions until each has terminated.
    ///
    /// Creates the trace log and both capture logs, starts the two channels
    /// and waits for exactly two completion reports, in any order. The
    /// surviving direction is never cancelled: it ends when its own read
    /// fails after the other side closed the shared sockets.
    pub async fn process(self) -> Result<ConnectionReport, ConnectionError> {
        let local_info = peer_descriptor(&self.remote.local_addr().map_err(ConnectionError::Address)?);
        let remote_info = peer_descriptor(&self.remote.peer_addr().map_err(ConnectionError::Address)?);

        let started_at = Local::now();
        let trace_sink = LogSink::create(self.log_dir.join(trace_filename(
            &format_timestamp(&started_at),
            self.sequence,
            &local_info,
            &remote_info,
        )))?;
        let trace_path = trace_sink.path().to_path_buf();
        let trace = TraceLog::new(trace_sink.handle());

        let started = Instant::now();
        trace.log(format!("Connected to {}.\n", self.target));

        let (local_read, local_write) = self.local.into_split();
        let (remote_read, remote_write) = self.remote.into_split();
        let (done_tx, mut done_rx) = mpsc::channel(2);

        let local_to_remote = Channel::new(
            Direction::LocalToRemote,
            local_read,
            remote_write,
            &local_info,
            self.sequence,
            trace.clone(),
            done_tx.clone(),
            &self.log_dir,
        )?;
        let remote_to_local = Channel::new(
            Direction::RemoteToLocal,
            remote_read,
            local_write,
            &remote_info,
            self.sequence,
            trace.clone(),
            done_tx,
            &self.log_dir,
        )?;

        tokio::spawn(local_to_remote.run());
        tokio::spawn(remote_to_local.run());

        let mut channels = Vec::with_capacity(2);
        while channels.len() < 2 {
            match done_rx.recv().await {
                Some(report) => {
                    debug!("[{:04}] {} finished: {:?}", self.sequence, report.direction, report);
                    channels.push(report);
                }
                None => {
                    // a relay task panicked and dropped its sender
                    warn!("[{:04}] relay ended without reporting", self.sequence);
                    break;
                }
            }
        }

        let duration = started.elapsed();
        trace.log(format!(
            "Disconnected from {}, duration {:?}.\n",
            self.target, duration
        ));
        drop(trace);
        trace_sink.close().await?;

        info!(
            "[{:04}] Disconnected from {}, duration {:?}",
            self.sequence, self.target, duration
        );

        Ok(ConnectionReport {
            sequence: self.sequence,
            target: self.target,
            started_at,
            duration,
            trace_path,
            channels,
        })
    }
}
