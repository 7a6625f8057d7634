// src/exec/sink.rs

//! Shared console destination for tagged output.
//!
//! Runners never touch the process's stdout/stderr directly; they write
//! through an `OutputSink`. Production uses [`StdioSink`]; tests can plug in
//! a recording sink and inspect the exact order chunks arrived in.

use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncWrite, AsyncWriteExt, Stderr, Stdout};
use tokio::sync::Mutex;

use crate::types::StreamKind;

/// Destination for tagged output chunks.
///
/// Implementations must write each chunk as a unit: a chunk is never split
/// around another chunk written concurrently.
pub trait OutputSink: Send + Sync {
    fn write_chunk(
        &self,
        stream: StreamKind,
        chunk: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + '_>>;
}

/// The parent process's own stdout and stderr.
pub struct StdioSink {
    stdout: Mutex<Stdout>,
    stderr: Mutex<Stderr>,
}

impl StdioSink {
    pub fn new() -> Self {
        Self {
            stdout: Mutex::new(tokio::io::stdout()),
            stderr: Mutex::new(tokio::io::stderr()),
        }
    }
}

impl Default for StdioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StdioSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioSink").finish_non_exhaustive()
    }
}

impl OutputSink for StdioSink {
    fn write_chunk(
        &self,
        stream: StreamKind,
        chunk: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + '_>> {
        Box::pin(async move {
            match stream {
                StreamKind::Stdout => write_locked(&self.stdout, &chunk).await,
                StreamKind::Stderr => write_locked(&self.stderr, &chunk).await,
            }
        })
    }
}

async fn write_locked<W>(writer: &Mutex<W>, chunk: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut writer = writer.lock().await;
    writer.write_all(chunk).await?;
    writer.flush().await
}
