//! Full-width bracket pair detection over the whole document.
//!
//! Stack-based matching against a fixed pairing table. A close glyph matches
//! the nearest open of the same kind; opens above it on the stack are
//! discarded as unmatched. Regions include both bracket glyphs and may span
//! lines.

use crate::interval::{self, Interval};

/// The quotation pairs the override colors. The ruby reading pair `《》` is
/// deliberately absent; it belongs to ruby syntax.
pub const BRACKET_PAIRS: [(char, char); 6] = [
    ('「', '」'),
    ('『', '』'),
    ('（', '）'),
    ('〈', '〉'),
    ('【', '】'),
    ('〔', '〕'),
];

fn open_kind(c: char) -> Option<usize> {
    BRACKET_PAIRS.iter().position(|&(open, _)| open == c)
}

fn close_kind(c: char) -> Option<usize> {
    BRACKET_PAIRS.iter().position(|&(_, close)| close == c)
}

/// Per-line bracket-pair coverage, in codepoint intervals.
///
/// `result[line]` is the merged set of intervals on that line covered by
/// some matched pair, glyphs included.
pub fn document_coverage<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<Vec<Interval>> {
    let lines: Vec<&str> = lines.collect();
    let mut coverage: Vec<Vec<Interval>> = vec![Vec::new(); lines.len()];
    // (pair kind, line, col) of each currently open bracket
    let mut stack: Vec<(usize, usize, usize)> = Vec::new();

    for (line_idx, line) in lines.iter().enumerate() {
        for (col, c) in line.chars().enumerate() {
            if let Some(kind) = open_kind(c) {
                stack.push((kind, line_idx, col));
            } else if let Some(kind) = close_kind(c) {
                if let Some(pos) = stack.iter().rposition(|&(k, _, _)| k == kind) {
                    let (_, open_line, open_col) = stack[pos];
                    // opens above the match are unmatched; drop them
                    stack.truncate(pos);
                    add_region(
                        &mut coverage,
                        &lines,
                        (open_line, open_col),
                        (line_idx, col),
                    );
                }
                // a close with no matching open is ignored
            }
        }
    }

    for line_coverage in &mut coverage {
        *line_coverage = interval::merge(std::mem::take(line_coverage));
    }
    coverage
}

fn add_region(
    coverage: &mut [Vec<Interval>],
    lines: &[&str],
    open: (usize, usize),
    close: (usize, usize),
) {
    let (open_line, open_col) = open;
    let (close_line, close_col) = close;

    if open_line == close_line {
        coverage[open_line].push(Interval::new(open_col, close_col + 1));
        return;
    }
    coverage[open_line].push(Interval::new(open_col, lines[open_line].chars().count()));
    for l in (open_line + 1)..close_line {
        coverage[l].push(Interval::new(0, lines[l].chars().count()));
    }
    coverage[close_line].push(Interval::new(0, close_col + 1));
}
