//! The shared manuscript char-count primitive.
//!
//! Counts the prose a reader would actually read: fenced blocks, heading
//! lines, and ruby readings are not prose; markers and (optionally) spaces
//! are not counted either.

use std::sync::LazyLock;

use regex::Regex;

use crate::fences;
use crate::outline::heading_level;

/// Ruby reading segments, e.g. the `《とうきょう》` in `｜東京《とうきょう》`.
static RUBY_READING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new("《[^》]*》").unwrap());

/// Characters excluded unless `count_spaces` is set: plain/ideographic
/// space, heading marker, and both ruby base markers.
const MARKER_CHARS: [char; 5] = [' ', '\u{3000}', '#', '|', '｜'];

/// Count the prose codepoints of `text`.
///
/// - CRLF is normalized to LF.
/// - Well-formed (paired) fenced blocks are removed entirely, marker lines
///   included. An odd trailing fence marker is ignored: its lines stay and
///   are counted.
/// - Heading lines are dropped.
/// - Ruby readings `《…》` are dropped; the base text is counted.
/// - Newlines are never counted. With `count_spaces` unset, spaces and the
///   literal `#`, `|`, `｜` are not counted either.
pub fn char_count(text: &str, count_spaces: bool) -> usize {
    let normalized = text.replace("\r\n", "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();
    let blocks = fences::scan(lines.iter().copied());

    let mut total = 0;
    for (i, line) in lines.iter().enumerate() {
        if fences::line_in_terminated_fence(&blocks, i) {
            continue;
        }
        if heading_level(line).is_some() {
            continue;
        }
        total += countable_chars(line, count_spaces);
    }
    total
}

/// Prose codepoints of one line: ruby readings stripped, markers and spaces
/// filtered per `count_spaces`. Fence and heading handling is the caller's
/// job, since it needs document context.
pub(crate) fn countable_chars(line: &str, count_spaces: bool) -> usize {
    let stripped = RUBY_READING_RE.replace_all(line, "");
    stripped
        .chars()
        .filter(|c| count_spaces || !MARKER_CHARS.contains(c))
        .count()
}
