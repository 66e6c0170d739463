//! The part-of-speech tokenizer seam.
//!
//! The tokenizer is an external service consumed as a black box; it may be
//! transiently unavailable, in which case the POS stage degrades to plain
//! without failing the line.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{SpanCategory, SpanModifiers};

#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("tokenizer is not ready")]
    NotReady,
    #[error("tokenizer failed: {0}")]
    Failed(String),
}

/// One morpheme as reported by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosToken {
    pub surface: String,
    /// Primary part of speech, e.g. 名詞.
    pub pos: String,
    /// Sub-classification, e.g. 固有名詞.
    pub pos_detail: String,
}

impl PosToken {
    pub fn new(surface: &str, pos: &str, pos_detail: &str) -> Self {
        Self {
            surface: surface.to_owned(),
            pos: pos.to_owned(),
            pos_detail: pos_detail.to_owned(),
        }
    }
}

pub trait PosTokenizer: Send + Sync {
    fn tokenize(&self, line: &str) -> Result<Vec<PosToken>, TokenizerError>;
}

/// Map a primary part of speech onto a span category. Accepts the Japanese
/// names tokenizers emit and English fallbacks.
pub fn category_for(pos: &str) -> SpanCategory {
    match pos {
        "代名詞" | "pronoun" => SpanCategory::Pronoun,
        "名詞" | "noun" => SpanCategory::Noun,
        "動詞" | "verb" => SpanCategory::Verb,
        "形容詞" | "形状詞" | "adjective" => SpanCategory::Adjective,
        "副詞" | "adverb" => SpanCategory::Adverb,
        "助詞" | "particle" => SpanCategory::Particle,
        "助動詞" | "auxiliary" => SpanCategory::Auxiliary,
        "接続詞" | "conjunction" => SpanCategory::Conjunction,
        "感動詞" | "interjection" => SpanCategory::Interjection,
        "記号" | "補助記号" | "symbol" => SpanCategory::Symbol,
        _ => SpanCategory::Other,
    }
}

/// Modifier bits from the primary POS and its sub-classification.
pub fn modifiers_for(pos: &str, pos_detail: &str) -> SpanModifiers {
    let mut m = SpanModifiers::NONE;
    if pos_detail.contains("固有名詞") || pos_detail.contains("proper") {
        m = m.with(SpanModifiers::PROPER_NOUN);
    }
    if pos.contains("接頭") || pos_detail.contains("接頭") || pos_detail.contains("prefix") {
        m = m.with(SpanModifiers::PREFIX);
    }
    if pos.contains("接尾") || pos_detail.contains("接尾") || pos_detail.contains("suffix") {
        m = m.with(SpanModifiers::SUFFIX);
    }
    m
}
