//! Heading extraction and hierarchical char-count aggregation.
//!
//! A heading's segment runs to the next heading of *any* level — that is
//! what separates `own_count` (text directly under the heading) from
//! `sub_count` (the heading's whole subtree). Aggregation builds a
//! parent-pointer array once, then folds bottom-up.

pub mod charcount;

pub use charcount::char_count;

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::buffer::{BufferSnapshot, DocumentId};
use crate::cache::VersionedCache;
use crate::fences;

/// 0–3 leading spaces, 1–6 `#`, whitespace, then something non-blank.
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(#{1,6})[ \t]+(\S.*)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Line index of the heading in the document.
    pub line: usize,
    /// Marker depth, 1..=6.
    pub level: u8,
    /// Title text after the marker, right-trimmed.
    pub raw_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingMetrics {
    pub heading: Heading,
    /// Chars of the heading's own segment (to the next heading of any level).
    pub own_count: usize,
    /// `own_count` plus the `sub_count` of every direct child.
    pub sub_count: usize,
    /// `sub_count - own_count`.
    pub child_sum: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineMetrics {
    pub headings: Vec<HeadingMetrics>,
    /// Char count of the entire document.
    pub document_total: usize,
    /// Char count of text before the first heading.
    pub preamble_count: usize,
}

/// Heading level of a line, if it is one.
pub fn heading_level(line: &str) -> Option<u8> {
    HEADING_RE
        .captures(line)
        .map(|c| c.get(1).map_or(0, |m| m.len()) as u8)
}

fn parse_heading(line_index: usize, line: &str) -> Option<Heading> {
    let caps = HEADING_RE.captures(line)?;
    Some(Heading {
        line: line_index,
        level: caps.get(1).map_or(0, |m| m.len()) as u8,
        raw_title: caps.get(2).map_or("", |m| m.as_str()).trim_end().to_owned(),
    })
}

/// Extract the ordered heading list from a snapshot.
///
/// A line inside a paired fence block is never a heading, even when it
/// matches the marker pattern.
pub fn extract(snapshot: &BufferSnapshot) -> Vec<Heading> {
    let blocks = fences::scan(snapshot.lines());
    headings_outside_fences(snapshot.lines(), &blocks)
}

fn headings_outside_fences<'a>(
    lines: impl Iterator<Item = &'a str>,
    blocks: &[fences::FenceBlock],
) -> Vec<Heading> {
    lines
        .enumerate()
        .filter(|&(i, _)| !fences::line_in_terminated_fence(blocks, i))
        .filter_map(|(i, line)| parse_heading(i, line))
        .collect()
}

/// Compute per-heading char-count aggregates plus document totals.
pub fn compute_metrics(snapshot: &BufferSnapshot, count_spaces: bool) -> OutlineMetrics {
    let lines: Vec<&str> = snapshot.lines().collect();
    let blocks = fences::scan(lines.iter().copied());
    let headings = headings_outside_fences(lines.iter().copied(), &blocks);

    // One document-level pass, so a fence crossing a heading boundary pairs
    // the same way in every count. Fenced and heading lines count zero.
    let countable: Vec<usize> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if fences::line_in_terminated_fence(&blocks, i) || heading_level(line).is_some() {
                0
            } else {
                charcount::countable_chars(line, count_spaces)
            }
        })
        .collect();

    let document_total: usize = countable.iter().sum();
    let preamble_end = headings.first().map_or(lines.len(), |h| h.line);
    let preamble_count: usize = countable[..preamble_end].iter().sum();

    let own: Vec<usize> = headings
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let segment_end = headings.get(i + 1).map_or(lines.len(), |next| next.line);
            countable[h.line..segment_end].iter().sum()
        })
        .collect();

    // Parent pointers: nearest preceding heading of strictly lower level.
    let parent: Vec<Option<usize>> = (0..headings.len())
        .map(|i| {
            (0..i)
                .rev()
                .find(|&j| headings[j].level < headings[i].level)
        })
        .collect();

    // Bottom-up fold: children flow into parents exactly once.
    let mut sub = own.clone();
    for i in (0..headings.len()).rev() {
        if let Some(p) = parent[i] {
            sub[p] += sub[i];
        }
    }

    let headings = headings
        .into_iter()
        .enumerate()
        .map(|(i, heading)| HeadingMetrics {
            heading,
            own_count: own[i],
            sub_count: sub[i],
            child_sum: sub[i] - own[i],
        })
        .collect();

    OutlineMetrics {
        headings,
        document_total,
        preamble_count,
    }
}

/// Caching front end over [`compute_metrics`], keyed by document version.
///
/// Rebuild the index when `count_spaces` changes; version keys only cover
/// edits.
#[derive(Default)]
pub struct HeadingIndex {
    count_spaces: bool,
    cache: VersionedCache<Arc<OutlineMetrics>>,
}

impl HeadingIndex {
    pub fn new(count_spaces: bool) -> Self {
        Self {
            count_spaces,
            cache: VersionedCache::new(),
        }
    }

    pub fn metrics(&mut self, snapshot: &BufferSnapshot) -> Arc<OutlineMetrics> {
        let count_spaces = self.count_spaces;
        self.cache
            .get_or_insert_with(snapshot.id(), snapshot.version(), || {
                Arc::new(compute_metrics(snapshot, count_spaces))
            })
            .clone()
    }

    /// Host close hook.
    pub fn evict(&mut self, id: DocumentId) {
        self.cache.evict(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn snap(text: &str) -> BufferSnapshot {
        BufferSnapshot::from_text(DocumentId::new(), 0, text)
    }

    // ============ heading recognition ============

    #[rstest]
    #[case("# 第一章", Some(1))]
    #[case("###### 深い", Some(6))]
    #[case("   ## ふたつ", Some(2))]
    #[case("####### 深すぎ", None)]
    #[case("    # インデント過多", None)]
    #[case("#空白なし", None)]
    #[case("#", None)]
    #[case("# ", None)]
    #[case("#\t タブ区切り", Some(1))]
    #[case("本文", None)]
    fn test_heading_level(#[case] line: &str, #[case] expected: Option<u8>) {
        assert_eq!(heading_level(line), expected);
    }

    #[test]
    fn test_extract_titles_and_lines() {
        let s = snap("# 章\n本文\n## 節の題  \nさらに本文");
        let headings = extract(&s);
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].line, 0);
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[0].raw_title, "章");
        assert_eq!(headings[1].line, 2);
        assert_eq!(headings[1].level, 2);
        assert_eq!(headings[1].raw_title, "節の題");
    }

    // ============ metrics aggregation ============

    #[test]
    fn test_own_count_excludes_heading_line() {
        let s = snap("# 章\n東京都庁で働く。");
        let m = compute_metrics(&s, false);
        assert_eq!(m.headings.len(), 1);
        assert_eq!(m.headings[0].own_count, 8);
        assert_eq!(m.headings[0].sub_count, 8);
        assert_eq!(m.headings[0].child_sum, 0);
    }

    #[test]
    fn test_segments_end_at_any_level() {
        // own of the H1 stops at the H2 even though the H2 is deeper
        let s = snap("# 親\nああ\n## 子\nいいい\n# 次\nうううう");
        let m = compute_metrics(&s, false);
        assert_eq!(m.headings[0].own_count, 2);
        assert_eq!(m.headings[1].own_count, 3);
        assert_eq!(m.headings[2].own_count, 4);
    }

    #[test]
    fn test_subtree_aggregation() {
        let s = snap("# 親\nああ\n## 子\nいいい\n### 孫\nう\n## 子2\nええ\n# 次\nお");
        let m = compute_metrics(&s, false);

        // 孫: own 1; 子: own 3 + 孫 1 = 4; 子2: own 2; 親: own 2 + 4 + 2 = 8
        assert_eq!(m.headings[0].sub_count, 8);
        assert_eq!(m.headings[0].child_sum, 6);
        assert_eq!(m.headings[1].sub_count, 4);
        assert_eq!(m.headings[2].sub_count, 1);
        assert_eq!(m.headings[3].sub_count, 2);
        assert_eq!(m.headings[4].sub_count, 1);
    }

    #[test]
    fn test_skip_level_parenting() {
        // A ### directly under a # still parents to the #
        let s = snap("# 親\n### 孫\nあああ");
        let m = compute_metrics(&s, false);
        assert_eq!(m.headings[0].own_count, 0);
        assert_eq!(m.headings[0].sub_count, 3);
    }

    #[test]
    fn test_top_level_sum_plus_preamble_equals_total() {
        let s = snap("序文あり\n# 一\nああ\n## 一の一\nいい\n# 二\nううう");
        let m = compute_metrics(&s, false);

        let top_sum: usize = m
            .headings
            .iter()
            .filter(|h| h.heading.level == 1)
            .map(|h| h.sub_count)
            .sum();
        assert_eq!(top_sum + m.preamble_count, m.document_total);
        assert_eq!(m.preamble_count, 4);
    }

    #[test]
    fn test_fence_crossing_heading_boundary() {
        // The fence opens under # A and closes after the # B line; the pair
        // wins document-wide, so # B is no heading and nothing counts
        let s = snap("# A\n```\nほんぶん\n# B\n```");
        let m = compute_metrics(&s, false);

        assert_eq!(m.headings.len(), 1);
        assert_eq!(m.headings[0].heading.raw_title, "A");
        assert_eq!(m.document_total, 0);
        assert_eq!(m.headings[0].sub_count, 0);
        assert_eq!(m.preamble_count, 0);
    }

    #[test]
    fn test_fenced_heading_line_not_extracted() {
        let s = snap("# A\nああ\n```\n# B\n```\nいい");
        assert_eq!(extract(&s).len(), 1);

        let m = compute_metrics(&s, false);
        assert_eq!(m.headings[0].own_count, 4);
        assert_eq!(m.document_total, 4);
        assert_eq!(m.headings[0].sub_count + m.preamble_count, m.document_total);
    }

    #[test]
    fn test_document_without_headings() {
        let s = snap("ただの文章。");
        let m = compute_metrics(&s, false);
        assert!(m.headings.is_empty());
        assert_eq!(m.preamble_count, m.document_total);
        assert_eq!(m.document_total, 6);
    }

    // ============ caching ============

    #[test]
    fn test_heading_index_caches_per_version() {
        let mut buf = crate::buffer::TextBuffer::from_text("# 章\nああ");
        let mut index = HeadingIndex::new(false);

        let first = index.metrics(&buf.snapshot());
        let again = index.metrics(&buf.snapshot());
        assert!(Arc::ptr_eq(&first, &again));

        buf.replace(0..0, "序\n");
        let after_edit = index.metrics(&buf.snapshot());
        assert!(!Arc::ptr_eq(&first, &after_edit));
        assert_eq!(after_edit.preamble_count, 1);
    }
}
