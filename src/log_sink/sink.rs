use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::error_handling::types::LogError;

/// Messages understood by a sink worker, processed strictly in order.
#[derive(Debug, PartialEq, Eq)]
pub enum SinkMessage {
    Data(Vec<u8>),
    /// Everything queued before this is written, then the file is closed.
    Close,
}

/// Cloneable submission side of a [`LogSink`].
///
/// Any number of handles may submit concurrently; the worker serializes
/// them in arrival order.
#[derive(Debug, Clone)]
pub struct SinkHandle {
    tx: UnboundedSender<SinkMessage>,
}

impl SinkHandle {
    /// Queues `bytes` for writing and returns immediately.
    ///
    /// Empty buffers are ignored. Submitting after the sink was closed is a
    /// caller bug; the buffer is dropped.
    pub fn submit(&self, bytes: impl Into<Vec<u8>>) {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return;
        }
        if self.tx.send(SinkMessage::Data(bytes)).is_err() {
            trace!("submit after close, buffer dropped");
        }
    }
}

/// One append-only log file drained by a dedicated worker task.
pub struct LogSink {
    handle: SinkHandle,
    worker: JoinHandle<u64>,
    path: PathBuf,
}

impl LogSink {
    /// Creates (truncating) the file at `path` and starts its worker.
    ///
    /// The file is created before this returns, so a failure surfaces here as
    /// [`LogError::Create`] rather than inside the worker. Must be called from
    /// within a tokio runtime.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        let file = fs::File::create(&path).map_err(|source| LogError::Create {
            path: path.clone(),
            source,
        })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(drain(File::from_std(file), rx, path.clone()));
        debug!("Log sink opened at {}", path.display());

        Ok(Self {
            handle: SinkHandle { tx },
            worker,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn handle(&self) -> SinkHandle {
        self.handle.clone()
    }

    pub fn submit(&self, bytes: impl Into<Vec<u8>>) {
        self.handle.submit(bytes)
    }

    /// Queues the close marker and waits until the worker has written every
    /// earlier buffer and closed the file.
    ///
    /// Returns the number of bytes written to the file.
    pub async fn close(self) -> Result<u64, LogError> {
        // The worker only exits on Close or once every sender is gone, so the
        // send cannot race with a stopped worker.
        let _ = self.handle.tx.send(SinkMessage::Close);
        drop(self.handle);
        self.worker
            .await
            .map_err(|e| LogError::Worker(e.to_string()))
    }
}

async fn drain(mut file: File, mut rx: UnboundedReceiver<SinkMessage>, path: PathBuf) -> u64 {
    let mut written = 0u64;

    // A queue with no senders left is treated as Close.
    while let Some(message) = rx.recv().await {
        let bytes = match message {
            SinkMessage::Data(bytes) => bytes,
            SinkMessage::Close => break,
        };
        match write_synced(&mut file, &bytes).await {
            Ok(()) => written += bytes.len() as u64,
            Err(e) => warn!("Write to {} failed: {}", path.display(), e),
        }
    }
    rx.close();

    if let Err(e) = file.shutdown().await {
        warn!("Closing {} failed: {}", path.display(), e);
    }
    debug!("Log sink closed at {} ({} bytes)", path.display(), written);
    written
}

async fn write_synced(file: &mut File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes).await?;
    file.sync_data().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_writes_in_submission_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ordered.log");
        let sink = LogSink::create(&path).unwrap();

        sink.submit(b"first ".to_vec());
        sink.submit(b"second ".to_vec());
        sink.submit("third");
        let written = sink.close().await.unwrap();

        assert_eq!(written, 18);
        assert_eq!(std::fs::read(&path).unwrap(), b"first second third");
    }

    #[tokio::test]
    async fn test_empty_buffer_is_not_a_close_marker() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.log");
        let sink = LogSink::create(&path).unwrap();

        sink.submit(b"before".to_vec());
        sink.submit(Vec::new());
        sink.submit(b"-after".to_vec());
        sink.close().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"before-after");
    }

    #[tokio::test]
    async fn test_file_exists_before_anything_is_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eager.log");
        let sink = LogSink::create(&path).unwrap();

        assert!(path.exists());
        assert_eq!(sink.path(), path.as_path());
        assert_eq!(sink.close().await.unwrap(), 0);
        assert!(std::fs::read(&path).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_in_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("sink.log");

        match LogSink::create(&path) {
            Err(LogError::Create { path: p, .. }) => assert_eq!(p, path),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("sink created in a missing directory"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_producers_keep_their_own_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared.log");
        let sink = LogSink::create(&path).unwrap();

        let mut producers = Vec::new();
        for name in ["a", "b"] {
            let handle = sink.handle();
            producers.push(tokio::spawn(async move {
                for i in 0..50 {
                    handle.submit(format!("{}{}\n", name, i));
                    tokio::task::yield_now().await;
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }
        sink.close().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        for name in ["a", "b"] {
            let seen: Vec<u32> = content
                .lines()
                .filter_map(|line| line.strip_prefix(name))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(seen, (0..50).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn test_submit_after_close_is_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("late.log");
        let sink = LogSink::create(&path).unwrap();
        let late = sink.handle();

        sink.submit("kept");
        sink.close().await.unwrap();
        late.submit("dropped");

        assert_eq!(std::fs::read(&path).unwrap(), b"kept");
    }
}
