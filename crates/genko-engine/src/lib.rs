pub mod buffer;
pub mod cache;
pub mod cancel;
pub mod classify;
pub mod dictionary;
pub mod fences;
pub mod interval;
pub mod layout;
pub mod outline;
pub mod settings;

// Re-export key types for easier usage
pub use buffer::{BufferSnapshot, DocumentId, TextBuffer};
pub use cache::VersionedCache;
pub use cancel::CancelToken;
pub use classify::{
    PosToken, PosTokenizer, Span, SpanCategory, SpanClassifier, SpanModifiers, TokenizerError,
};
pub use dictionary::{DictionaryError, DictionaryStore, TermKind, TermMatch, TermSets};
pub use interval::Interval;
pub use layout::{DisplayToken, Page, PageSet, Paginator, Row, RubyBlock, RubySegment};
pub use outline::{Heading, HeadingIndex, HeadingMetrics, OutlineMetrics, char_count};
pub use settings::{AnalysisSettings, LayoutSettings};
