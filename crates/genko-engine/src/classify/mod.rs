//! Per-line semantic span classification.
//!
//! Classification is an ordered pipeline; every stage emits spans only on
//! the residue left by higher-priority stages, tracked as an interval mask:
//!
//! 1. whole-line heading override
//! 2. code fence (document-level scan)
//! 3. dictionary terms
//! 4. full-width bracket pairs (optional)
//! 5. literal dashes
//! 6. part-of-speech tokens
//!
//! Uncovered codepoints are implicitly plain and get no span. Results are
//! cached per `(document, version, line)`.

pub mod brackets;
pub mod pos;

pub use pos::{PosToken, PosTokenizer, TokenizerError};

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::buffer::{BufferSnapshot, DocumentId};
use crate::cache::VersionedCache;
use crate::cancel::CancelToken;
use crate::dictionary::{self, TermKind, TermSets};
use crate::fences::{self, FenceBlock};
use crate::interval::{self, Interval};
use crate::outline;
use crate::settings::AnalysisSettings;

/// Em dash and horizontal bar, the two glyphs the dash stage recognizes.
pub const DASH_GLYPHS: [char; 2] = ['\u{2014}', '\u{2015}'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpanCategory {
    Heading,
    Fence,
    Character,
    Glossary,
    Bracket,
    Symbol,
    Noun,
    Verb,
    Adjective,
    Adverb,
    Particle,
    Auxiliary,
    Pronoun,
    Conjunction,
    Interjection,
    Other,
}

/// Bitset of POS sub-classification modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpanModifiers(u8);

impl SpanModifiers {
    pub const NONE: Self = Self(0);
    pub const PROPER_NOUN: Self = Self(1);
    pub const PREFIX: Self = Self(1 << 1);
    pub const SUFFIX: Self = Self(1 << 2);

    pub fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

/// One classified region of a line, in codepoint offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub category: SpanCategory,
    pub modifiers: SpanModifiers,
}

impl Span {
    pub fn new(start: usize, end: usize, category: SpanCategory) -> Self {
        Self {
            start,
            end,
            category,
            modifiers: SpanModifiers::NONE,
        }
    }
}

/// Document-wide inputs shared by every line of one version.
struct DocumentContext {
    fence_blocks: Vec<FenceBlock>,
    bracket_coverage: Vec<Vec<Interval>>,
}

pub struct SpanClassifier {
    settings: AnalysisSettings,
    tokenizer: Option<Arc<dyn PosTokenizer>>,
    contexts: VersionedCache<Arc<DocumentContext>>,
    lines: VersionedCache<HashMap<usize, Arc<Vec<Span>>>>,
}

impl SpanClassifier {
    pub fn new(settings: AnalysisSettings, tokenizer: Option<Arc<dyn PosTokenizer>>) -> Self {
        Self {
            settings,
            tokenizer,
            contexts: VersionedCache::new(),
            lines: VersionedCache::new(),
        }
    }

    /// Classify one line, from cache when the version matches.
    pub fn classify_line(
        &mut self,
        snapshot: &BufferSnapshot,
        line_index: usize,
        terms: &TermSets,
    ) -> Arc<Vec<Span>> {
        if let Some(spans) = self
            .lines
            .get(snapshot.id(), snapshot.version())
            .and_then(|m| m.get(&line_index))
        {
            return spans.clone();
        }

        let ctx = self.context(snapshot);
        let line = snapshot.line(line_index).unwrap_or("");
        let spans = Arc::new(classify_line_impl(
            &self.settings,
            self.tokenizer.as_deref(),
            &ctx,
            line,
            line_index,
            terms,
        ));
        self.lines
            .get_or_insert_with_mut(snapshot.id(), snapshot.version(), HashMap::new)
            .insert(line_index, spans.clone());
        spans
    }

    /// Classify every line of the document.
    ///
    /// The cancel token is checked between lines; on cancellation the lines
    /// finished so far are returned.
    pub fn classify_document(
        &mut self,
        snapshot: &BufferSnapshot,
        terms: &TermSets,
        cancel: &CancelToken,
    ) -> Vec<Arc<Vec<Span>>> {
        let mut out = Vec::with_capacity(snapshot.line_count());
        for line_index in 0..snapshot.line_count() {
            if cancel.is_cancelled() {
                break;
            }
            out.push(self.classify_line(snapshot, line_index, terms));
        }
        out
    }

    /// Host close hook.
    pub fn evict(&mut self, id: DocumentId) {
        self.contexts.evict(id);
        self.lines.evict(id);
    }

    fn context(&mut self, snapshot: &BufferSnapshot) -> Arc<DocumentContext> {
        let bracket_override = self.settings.bracket_override_enabled;
        self.contexts
            .get_or_insert_with(snapshot.id(), snapshot.version(), || {
                let fence_blocks = fences::scan(snapshot.lines());
                let bracket_coverage = if bracket_override {
                    brackets::document_coverage(snapshot.lines())
                } else {
                    vec![Vec::new(); snapshot.line_count()]
                };
                Arc::new(DocumentContext {
                    fence_blocks,
                    bracket_coverage,
                })
            })
            .clone()
    }
}

fn classify_line_impl(
    settings: &AnalysisSettings,
    tokenizer: Option<&dyn PosTokenizer>,
    ctx: &DocumentContext,
    line: &str,
    line_index: usize,
    terms: &TermSets,
) -> Vec<Span> {
    let chars: Vec<char> = line.chars().collect();
    let n = chars.len();
    if n == 0 {
        return Vec::new();
    }

    // Stage 1: whole-line heading override
    if settings.heading_classification_enabled && outline::heading_level(line).is_some() {
        return vec![Span::new(0, n, SpanCategory::Heading)];
    }

    // Stage 2: fenced lines are fence end to end, nothing else applies
    if fences::line_in_fence(&ctx.fence_blocks, line_index) {
        return vec![Span::new(0, n, SpanCategory::Fence)];
    }

    let mut spans: Vec<Span> = Vec::new();
    let mut mask: Vec<Interval> = Vec::new();

    // Stage 3: dictionary terms (already non-overlapping among themselves)
    for m in dictionary::match_terms(line, terms) {
        let category = match m.kind {
            TermKind::Character => SpanCategory::Character,
            TermKind::Glossary => SpanCategory::Glossary,
        };
        spans.push(Span::new(m.start, m.end, category));
        mask.push(Interval::new(m.start, m.end));
    }
    mask = interval::merge(mask);

    // Stage 4: bracket pairs on the residue
    if settings.bracket_override_enabled {
        let line_brackets = ctx
            .bracket_coverage
            .get(line_index)
            .map_or(&[][..], Vec::as_slice);
        for b in line_brackets {
            for part in interval::subtract(*b, &mask) {
                spans.push(Span::new(part.start, part.end, SpanCategory::Bracket));
            }
            mask.push(*b);
        }
        mask = interval::merge(mask);
    }

    // Stage 5: literal dashes; a dash inside a bracket region is already
    // masked, so bracket color wins
    let dash_category = if settings.bracket_override_enabled {
        SpanCategory::Bracket
    } else {
        SpanCategory::Symbol
    };
    for (i, &c) in chars.iter().enumerate() {
        if !DASH_GLYPHS.contains(&c) {
            continue;
        }
        if interval::overlaps_any(i, i + 1, &mask) {
            continue;
        }
        spans.push(Span::new(i, i + 1, dash_category));
        mask.push(Interval::new(i, i + 1));
    }
    mask = interval::merge(mask);

    // Stage 6: POS tokens over the whole line; a token that touches any
    // earlier span is dropped whole. Tokenizer errors degrade to plain.
    if let Some(tokenizer) = tokenizer
        && let Ok(tokens) = tokenizer.tokenize(line)
    {
        let mut cursor = 0usize;
        for t in tokens {
            let len = t.surface.chars().count();
            let start = cursor;
            let end = (cursor + len).min(n);
            cursor += len;
            if start >= end {
                continue;
            }
            if interval::overlaps_any(start, end, &mask) {
                continue;
            }
            spans.push(Span {
                start,
                end,
                category: pos::category_for(&t.pos),
                modifiers: pos::modifiers_for(&t.pos, &t.pos_detail),
            });
            mask.push(Interval::new(start, end));
        }
    }

    spans.sort_by_key(|s| s.start);
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct MapTokenizer(HashMap<String, Vec<PosToken>>);

    impl PosTokenizer for MapTokenizer {
        fn tokenize(&self, line: &str) -> Result<Vec<PosToken>, TokenizerError> {
            Ok(self.0.get(line).cloned().unwrap_or_default())
        }
    }

    struct DownTokenizer;

    impl PosTokenizer for DownTokenizer {
        fn tokenize(&self, _line: &str) -> Result<Vec<PosToken>, TokenizerError> {
            Err(TokenizerError::NotReady)
        }
    }

    fn snap(text: &str) -> BufferSnapshot {
        BufferSnapshot::from_text(DocumentId::new(), 0, text)
    }

    fn glossary(terms: &[&str]) -> TermSets {
        TermSets {
            character_terms: Vec::new(),
            glossary_terms: terms.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Spans must be sorted, non-overlapping, and inside `[0, len)`.
    fn assert_well_formed(spans: &[Span], len: usize) {
        let mut prev_end = 0;
        for s in spans {
            assert!(s.start < s.end, "empty span {s:?}");
            assert!(s.start >= prev_end, "overlap at {s:?}");
            assert!(s.end <= len, "span {s:?} past line end {len}");
            prev_end = s.end;
        }
    }

    // ============ stage priorities ============

    #[test]
    fn test_heading_line_is_one_span() {
        let mut c = SpanClassifier::new(AnalysisSettings::default(), None);
        let s = snap("# 章のタイトル");
        let spans = c.classify_line(&s, 0, &glossary(&["タイトル"]));
        assert_eq!(*spans, vec![Span::new(0, 8, SpanCategory::Heading)]);
    }

    #[test]
    fn test_heading_override_disabled() {
        let settings = AnalysisSettings {
            heading_classification_enabled: false,
            ..Default::default()
        };
        let mut c = SpanClassifier::new(settings, None);
        let s = snap("# 東京");
        let spans = c.classify_line(&s, 0, &glossary(&["東京"]));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].category, SpanCategory::Glossary);
        assert_eq!((spans[0].start, spans[0].end), (2, 4));
    }

    #[test]
    fn test_fence_lines_excluded_from_dictionary() {
        let mut c = SpanClassifier::new(AnalysisSettings::default(), None);
        let s = snap("東京\n```\n東京\n```\n東京");
        let terms = glossary(&["東京"]);

        let outside = c.classify_line(&s, 0, &terms);
        assert_eq!(outside[0].category, SpanCategory::Glossary);

        for line in 1..=3 {
            let spans = c.classify_line(&s, line, &terms);
            assert_eq!(spans.len(), 1, "line {line}");
            assert_eq!(spans[0].category, SpanCategory::Fence);
        }

        let after = c.classify_line(&s, 4, &terms);
        assert_eq!(after[0].category, SpanCategory::Glossary);
    }

    #[test]
    fn test_unterminated_fence_extends_to_document_end() {
        let mut c = SpanClassifier::new(AnalysisSettings::default(), None);
        let s = snap("本文\n```\n東京");
        let spans = c.classify_line(&s, 2, &glossary(&["東京"]));
        assert_eq!(spans[0].category, SpanCategory::Fence);
    }

    #[test]
    fn test_dictionary_beats_bracket() {
        let mut c = SpanClassifier::new(AnalysisSettings::default(), None);
        let s = snap("「東京へ」");
        let spans = c.classify_line(&s, 0, &glossary(&["東京"]));

        // 「 bracket, 東京 glossary, へ」 bracket
        assert_eq!(
            *spans,
            vec![
                Span::new(0, 1, SpanCategory::Bracket),
                Span::new(1, 3, SpanCategory::Glossary),
                Span::new(3, 5, SpanCategory::Bracket),
            ]
        );
        assert_well_formed(&spans, 5);
    }

    #[test]
    fn test_dash_inside_bracket_keeps_bracket_color() {
        let mut c = SpanClassifier::new(AnalysisSettings::default(), None);
        let s = snap("「あ―い」と―と");
        let spans = c.classify_line(&s, 0, &TermSets::default());

        // One span for the whole bracket region, one for the outer dash
        assert_eq!(
            *spans,
            vec![
                Span::new(0, 5, SpanCategory::Bracket),
                Span::new(6, 7, SpanCategory::Bracket),
            ]
        );
    }

    #[test]
    fn test_dash_is_symbol_without_override() {
        let settings = AnalysisSettings {
            bracket_override_enabled: false,
            ..Default::default()
        };
        let mut c = SpanClassifier::new(settings, None);
        let s = snap("あ—い");
        let spans = c.classify_line(&s, 0, &TermSets::default());
        assert_eq!(*spans, vec![Span::new(1, 2, SpanCategory::Symbol)]);
    }

    // ============ POS stage ============

    fn tokenizer_for_office_line() -> Arc<dyn PosTokenizer> {
        let mut map = HashMap::new();
        map.insert(
            "東京都庁で働く。".to_string(),
            vec![
                PosToken::new("東京都庁", "名詞", "固有名詞"),
                PosToken::new("で", "助詞", "格助詞"),
                PosToken::new("働く", "動詞", "一般"),
                PosToken::new("。", "補助記号", "句点"),
            ],
        );
        Arc::new(MapTokenizer(map))
    }

    #[test]
    fn test_pos_tokens_fill_residue() {
        let mut c =
            SpanClassifier::new(AnalysisSettings::default(), Some(tokenizer_for_office_line()));
        let s = snap("東京都庁で働く。");
        let spans = c.classify_line(&s, 0, &TermSets::default());

        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].category, SpanCategory::Noun);
        assert!(spans[0].modifiers.contains(SpanModifiers::PROPER_NOUN));
        assert_eq!(spans[1].category, SpanCategory::Particle);
        assert_eq!(spans[2].category, SpanCategory::Verb);
        assert_eq!(spans[3].category, SpanCategory::Symbol);
        assert_well_formed(&spans, 8);
    }

    #[test]
    fn test_pos_token_overlapping_dictionary_is_dropped_whole() {
        let mut c =
            SpanClassifier::new(AnalysisSettings::default(), Some(tokenizer_for_office_line()));
        let s = snap("東京都庁で働く。");
        let spans = c.classify_line(&s, 0, &glossary(&["東京都"]));

        // 東京都 dictionary; 東京都庁 token dropped, so 庁 stays plain
        assert_eq!(spans[0], Span::new(0, 3, SpanCategory::Glossary));
        assert_eq!(spans[1].start, 4);
        assert_well_formed(&spans, 8);
        assert!(!spans.iter().any(|s| s.start <= 3 && s.end > 3));
    }

    #[test]
    fn test_tokenizer_unavailable_degrades_to_plain() {
        let mut c =
            SpanClassifier::new(AnalysisSettings::default(), Some(Arc::new(DownTokenizer)));
        let s = snap("ただの文。");
        let spans = c.classify_line(&s, 0, &TermSets::default());
        assert!(spans.is_empty());
    }

    // ============ caching & determinism ============

    #[test]
    fn test_classification_is_idempotent() {
        let mut c =
            SpanClassifier::new(AnalysisSettings::default(), Some(tokenizer_for_office_line()));
        let s = snap("東京都庁で働く。");
        let terms = glossary(&["東京都"]);

        let first = c.classify_line(&s, 0, &terms);
        let second = c.classify_line(&s, 0, &terms);
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_edit_invalidates_line_cache() {
        let mut buf = crate::buffer::TextBuffer::from_text("東京");
        let mut c = SpanClassifier::new(AnalysisSettings::default(), None);
        let terms = glossary(&["東京"]);

        let before = c.classify_line(&buf.snapshot(), 0, &terms);
        assert_eq!(before[0].category, SpanCategory::Glossary);

        // "東京" -> "残京" : no longer a term
        buf.replace(0..3, "残");
        let after = c.classify_line(&buf.snapshot(), 0, &terms);
        assert!(after.is_empty());
    }

    #[test]
    fn test_classify_document_and_cancel() {
        let mut c = SpanClassifier::new(AnalysisSettings::default(), None);
        let s = snap("一\n二\n三");
        let terms = TermSets::default();

        let all = c.classify_document(&s, &terms, &CancelToken::new());
        assert_eq!(all.len(), 3);

        let cancelled = CancelToken::new();
        cancelled.cancel();
        let mut fresh = SpanClassifier::new(AnalysisSettings::default(), None);
        let partial = fresh.classify_document(&s, &terms, &cancelled);
        assert!(partial.is_empty());
    }

    #[test]
    fn test_empty_line_has_no_spans() {
        let mut c = SpanClassifier::new(AnalysisSettings::default(), None);
        let s = snap("");
        assert!(c.classify_line(&s, 0, &TermSets::default()).is_empty());
    }
}
