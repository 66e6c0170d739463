//! Versioned text buffer backing every analysis pass.
//!
//! The buffer follows the same discipline as an editor core: a single
//! `xi_rope::Rope` is the source of truth, every edit bumps a monotonic
//! version counter, and computations never read the rope directly — they
//! work from an immutable [`BufferSnapshot`] taken at a known version.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xi_rope::{Cursor, Rope, delta::Builder, rope::BaseMetric};

/// Stable identity of one document, used for cache keying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable document text with a monotonic version counter.
pub struct TextBuffer {
    id: DocumentId,
    /// xi-rope buffer containing the entire document as UTF-8 text
    buffer: Rope,
    /// Incremented on each edit (enables lazy cache invalidation)
    version: u64,
}

impl TextBuffer {
    /// Create a buffer from raw bytes, rejecting invalid UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_text(text))
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            id: DocumentId::new(),
            buffer: Rope::from(text),
            version: 0,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.len() == 0
    }

    /// Replace a byte range with new text and bump the version.
    ///
    /// The range is clamped to the buffer bounds and snapped back to char
    /// boundaries rather than panicking.
    pub fn replace(&mut self, range: std::ops::Range<usize>, text: &str) {
        let len = self.buffer.len();
        let start = self.snap_to_char_boundary(range.start.min(len));
        let end = self.snap_to_char_boundary(range.end.min(len)).max(start);

        let mut builder = Builder::new(len);
        builder.replace(start..end, Rope::from(text));
        self.buffer = builder.build().apply(&self.buffer);
        self.version += 1;
    }

    /// Largest char-boundary offset at or before `offset`.
    fn snap_to_char_boundary(&self, offset: usize) -> usize {
        let mut cursor = Cursor::new(&self.buffer, offset);
        if cursor.is_boundary::<BaseMetric>() {
            offset
        } else {
            cursor.prev::<BaseMetric>().unwrap_or(0)
        }
    }

    /// Take an immutable snapshot of the current text, split into lines.
    ///
    /// CRLF is normalized to LF here so every downstream pass sees one line
    /// ending convention.
    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot::from_text(self.id, self.version, &self.buffer.to_string())
    }
}

/// Immutable per-version view of a document as an ordered sequence of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSnapshot {
    id: DocumentId,
    version: u64,
    lines: Vec<String>,
}

impl BufferSnapshot {
    pub fn from_text(id: DocumentId, version: u64, text: &str) -> Self {
        let normalized = text.replace("\r\n", "\n");
        let lines = normalized.split('\n').map(str::to_owned).collect();
        Self { id, version, lines }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Full text of the snapshot, LF line endings.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// True when the underlying document was completely empty.
    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }
}
