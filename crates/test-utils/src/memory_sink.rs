use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use parrun::exec::OutputSink;
use parrun::types::StreamKind;

/// One chunk as it reached the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedChunk {
    pub stream: StreamKind,
    pub data: Vec<u8>,
}

impl RecordedChunk {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// A sink that records every chunk in arrival order.
///
/// Clones share the same recording, so a test can hand one clone to the
/// orchestrator and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    chunks: Arc<Mutex<Vec<RecordedChunk>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunks(&self) -> Vec<RecordedChunk> {
        self.chunks.lock().unwrap().clone()
    }

    pub fn stream_chunks(&self, stream: StreamKind) -> Vec<RecordedChunk> {
        self.chunks()
            .into_iter()
            .filter(|c| c.stream == stream)
            .collect()
    }

    /// Everything written to `stream`, concatenated.
    pub fn text(&self, stream: StreamKind) -> String {
        self.stream_chunks(stream)
            .iter()
            .map(RecordedChunk::text)
            .collect()
    }

    /// The payload `prefix` produced on `stream`, with the prefix stripped
    /// from every chunk.
    pub fn payload(&self, stream: StreamKind, prefix: &str) -> String {
        self.stream_chunks(stream)
            .iter()
            .filter_map(|c| c.text().strip_prefix(prefix).map(str::to_string))
            .collect()
    }

    /// For each chunk (both streams), the first of `prefixes` it starts with.
    pub fn owners<'a>(&self, prefixes: &[&'a str]) -> Vec<&'a str> {
        self.chunks()
            .iter()
            .filter_map(|c| {
                let text = c.text();
                prefixes.iter().copied().find(|p| text.starts_with(p))
            })
            .collect()
    }
}

impl OutputSink for MemorySink {
    fn write_chunk(
        &self,
        stream: StreamKind,
        chunk: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.chunks
                .lock()
                .unwrap()
                .push(RecordedChunk { stream, data: chunk });
            Ok(())
        })
    }
}
