// src/exec/tagger.rs

/// Prefix one chunk of captured output.
///
/// The prefix is applied per chunk exactly as the pipe delivered it; chunk
/// boundaries are not line boundaries and nothing is carried between calls.
pub fn tag(prefix: &str, chunk: &[u8]) -> Vec<u8> {
    let mut tagged = Vec::with_capacity(prefix.len() + chunk.len());
    tagged.extend_from_slice(prefix.as_bytes());
    tagged.extend_from_slice(chunk);
    tagged
}

/// Per-program tagger holding the program's prefix.
#[derive(Debug, Clone, Default)]
pub struct LineTagger {
    prefix: String,
}

impl LineTagger {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn tag(&self, chunk: &[u8]) -> Vec<u8> {
        tag(&self.prefix, chunk)
    }
}
