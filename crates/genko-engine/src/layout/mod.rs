//! Manuscript-paper pagination.
//!
//! Lines are tokenized into atomic display units (single characters and ruby
//! blocks), greedily wrapped into fixed-capacity rows under kinsoku rules,
//! and grouped into pages. Page order follows source reading order; vertical
//! right-to-left presentation is the renderer's concern.

pub mod ruby;

pub use ruby::{RubyBlock, RubySegment};

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::buffer::{BufferSnapshot, DocumentId};
use crate::cache::VersionedCache;
use crate::cancel::CancelToken;
use crate::fences;
use crate::settings::LayoutSettings;

/// How far past `cols` a row may grow to hang banned leading glyphs.
pub const KINSOKU_HANG_LIMIT: usize = 2;

/// One atomic unit of horizontal space on a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayToken {
    Character(char),
    Ruby(RubyBlock),
}

impl DisplayToken {
    pub fn width(&self) -> usize {
        match self {
            Self::Character(_) => 1,
            Self::Ruby(block) => block.width(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Row {
    pub tokens: Vec<DisplayToken>,
}

impl Row {
    pub fn width(&self) -> usize {
        self.tokens.iter().map(DisplayToken::width).sum()
    }

    /// Base text of the row, readings elided.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| match t {
                DisplayToken::Character(c) => c.to_string(),
                DisplayToken::Ruby(block) => block.base.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Page {
    pub rows: Vec<Row>,
}

/// The full pagination result, carrying the geometry it was computed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSet {
    pub pages: Vec<Page>,
    pub rows_per_page: usize,
    pub cols: usize,
}

impl PageSet {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

pub struct Paginator {
    settings: LayoutSettings,
    banned: HashSet<char>,
    cache: VersionedCache<Arc<PageSet>>,
}

impl Paginator {
    /// Panics when the geometry violates the caller contract (`rows_per_page`
    /// or `cols` of zero).
    pub fn new(settings: LayoutSettings) -> Self {
        let settings = settings.validated();
        let banned = settings.banned_leading_chars.iter().copied().collect();
        Self {
            settings,
            banned,
            cache: VersionedCache::new(),
        }
    }

    /// Paginate a snapshot, from cache when the version matches.
    ///
    /// The cancel token is checked between lines; on cancellation the rows
    /// wrapped so far are grouped and returned, and nothing is cached.
    pub fn paginate(&mut self, snapshot: &BufferSnapshot, cancel: &CancelToken) -> Arc<PageSet> {
        if let Some(pages) = self.cache.get(snapshot.id(), snapshot.version()) {
            return pages.clone();
        }

        let fence_blocks = fences::scan(snapshot.lines());
        let mut rows: Vec<Row> = Vec::new();
        let mut cancelled = false;
        for (idx, line) in snapshot.lines().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            // paired fences drop out of the manuscript entirely
            if fences::line_in_terminated_fence(&fence_blocks, idx) {
                continue;
            }
            let line = substitute_heading_markers(line);
            let tokens = ruby::tokenize(&line);
            wrap_line(
                tokens,
                self.settings.cols,
                self.settings.kinsoku_enabled,
                &self.banned,
                &mut rows,
            );
        }

        let mut pages: Vec<Page> = rows
            .chunks(self.settings.rows_per_page)
            .map(|chunk| Page {
                rows: chunk.to_vec(),
            })
            .collect();
        if pages.is_empty() && !cancelled {
            pages.push(Page {
                rows: vec![Row::default()],
            });
        }

        let result = Arc::new(PageSet {
            pages,
            rows_per_page: self.settings.rows_per_page,
            cols: self.settings.cols,
        });
        if !cancelled {
            self.cache
                .insert(snapshot.id(), snapshot.version(), result.clone());
        }
        result
    }

    /// Host close hook.
    pub fn evict(&mut self, id: DocumentId) {
        self.cache.evict(id);
    }
}

/// Replace a leading `#` run plus its separating space with the same number
/// of ideographic spaces, so heading text keeps its column without literal
/// markers.
fn substitute_heading_markers(line: &str) -> String {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes == 0 {
        return line.to_string();
    }
    match line[hashes..].strip_prefix(' ') {
        Some(rest) => {
            let mut out = "\u{3000}".repeat(hashes);
            out.push_str(rest);
            out
        }
        None => line.to_string(),
    }
}

/// Greedily wrap one line's tokens, appending rows to `rows`.
fn wrap_line(
    tokens: Vec<DisplayToken>,
    cols: usize,
    kinsoku_enabled: bool,
    banned: &HashSet<char>,
    rows: &mut Vec<Row>,
) {
    if tokens.is_empty() {
        rows.push(Row {
            tokens: vec![DisplayToken::Character('\u{3000}')],
        });
        return;
    }

    let mut i = 0;
    while i < tokens.len() {
        let mut row = Vec::new();
        let mut width = 0;

        while i < tokens.len() && width + tokens[i].width() <= cols {
            width += tokens[i].width();
            row.push(tokens[i].clone());
            i += 1;
        }

        if row.is_empty() {
            // oversized token: force-place it to guarantee progress
            row.push(tokens[i].clone());
            i += 1;
        } else if kinsoku_enabled {
            // hang banned leading glyphs past the capacity, within the limit
            while i < tokens.len() && width < cols + KINSOKU_HANG_LIMIT {
                match &tokens[i] {
                    DisplayToken::Character(c) if banned.contains(c) => {
                        width += 1;
                        row.push(tokens[i].clone());
                        i += 1;
                    }
                    _ => break,
                }
            }
        }

        rows.push(Row { tokens: row });
    }
}
