//! # Network Listener Module
//!
//! Accepts inbound TCP connections and hands each one to a
//! [`Connection`] running in its own task.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌──────────────────────┐
//! │ Incoming        │───▶│ ProxyListener    │───▶│ Connection           │
//! │ Connections     │    │                  │    │ (one task each)      │
//! └─────────────────┘    │ - accept loop    │    │ - dial target        │
//!                        │ - sequence count │    │ - two relay channels │
//!                        └──────────────────┘    └──────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tcpip_proxy::configuration::Config;
//! use tcpip_proxy::network::ProxyListener;
//! use tcpip_proxy::error_handling::types::NetworkError;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), NetworkError> {
//!     let config = Config::from_args();
//!     let listener = ProxyListener::bind(&config).await?;
//!     listener.run().await;
//!     Ok(())
//! }
//! ```

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpStream};

use crate::configuration::Config;
use crate::connection::Connection;
use crate::error_handling::types::NetworkError;

/// Accept loop forwarding every inbound socket to one fixed target.
///
/// The listener owns the per-process sequence counter and is its only
/// writer. Numbers start at 1 and only name log files.
pub struct ProxyListener {
    listener: TcpListener,
    target: String,
    log_dir: PathBuf,
    next_sequence: u32,
}

impl ProxyListener {
    /// Validates `config` and binds the listening socket.
    ///
    /// # Errors
    ///
    /// - `NetworkError::ConfigError` if the log directory is missing or the
    ///   bind address is not an IP address
    /// - `NetworkError::BindError` if the port cannot be bound
    pub async fn bind(config: &Config) -> Result<Self, NetworkError> {
        config.validate()?;
        let addr = config.listen_addr()?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(NetworkError::BindError)?;

        info!(
            "Start listening on port {} and forwarding data to {}",
            config.listen_port,
            config.target()
        );

        Ok(Self {
            listener,
            target: config.target(),
            log_dir: config.log_dir.clone(),
            next_sequence: 1,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts forever. Accept errors are logged and skipped.
    ///
    /// A log file that cannot be created terminates the process with status
    /// 1; a failed dial only drops that one inbound socket.
    pub async fn run(mut self) {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Accept failed: {}", e);
                    continue;
                }
            };

            let sequence = self.take_sequence();
            debug!("[{:04}] accepted {}", sequence, peer);

            tokio::spawn(serve(
                stream,
                sequence,
                self.target.clone(),
                self.log_dir.clone(),
            ));
        }
    }

    fn take_sequence(&mut self) -> u32 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        sequence
    }
}

async fn serve(stream: TcpStream, sequence: u32, target: String, log_dir: PathBuf) {
    let result = match Connection::open(stream, sequence, &target, log_dir).await {
        Ok(connection) => connection.process().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(report) => match serde_json::to_string(&report) {
            Ok(json) => info!("[{:04}] {}", sequence, json),
            Err(e) => debug!("[{:04}] report not serializable: {}", sequence, e),
        },
        Err(e) if e.is_fatal() => {
            error!("[{:04}] {}, exiting...", sequence, e);
            std::process::exit(1);
        }
        Err(e) => warn!("[{:04}] {}", sequence, e),
    }
}
