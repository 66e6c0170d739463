//! Document-level code fence detection.
//!
//! A line containing a triple-backtick marker opens a fence; the next such
//! line closes it. Fence state is purely document-ordered — there is no
//! nesting. An odd trailing marker leaves an unterminated block, and the two
//! consumers disagree on purpose about what that means: classification
//! extends it to the document end, while char counting and pagination ignore
//! it entirely (the lines stay literally present).

pub const FENCE_MARKER: &str = "```";

/// One fenced region, marker lines included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceBlock {
    /// Line index of the opening marker.
    pub start: usize,
    /// Line index of the closing marker, or the last document line when
    /// unterminated.
    pub end: usize,
    pub terminated: bool,
}

impl FenceBlock {
    pub fn contains_line(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }
}

/// Scan the whole document for fenced regions, in order.
pub fn scan<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<FenceBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<usize> = None;
    let mut last_line = 0;

    for (i, line) in lines.enumerate() {
        last_line = i;
        if !line.contains(FENCE_MARKER) {
            continue;
        }
        match open.take() {
            Some(start) => blocks.push(FenceBlock {
                start,
                end: i,
                terminated: true,
            }),
            None => open = Some(i),
        }
    }

    if let Some(start) = open {
        blocks.push(FenceBlock {
            start,
            end: last_line,
            terminated: false,
        });
    }
    blocks
}

/// True when `line` falls inside any block (unterminated blocks included).
pub fn line_in_fence(blocks: &[FenceBlock], line: usize) -> bool {
    blocks.iter().any(|b| b.contains_line(line))
}

/// True when `line` falls inside a *terminated* block.
pub fn line_in_terminated_fence(blocks: &[FenceBlock], line: usize) -> bool {
    blocks
        .iter()
        .any(|b| b.terminated && b.contains_line(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fences() {
        assert_eq!(scan(["普通の行", "もう一行"].into_iter()), vec![]);
    }

    #[test]
    fn test_paired_fence() {
        let lines = ["前文", "```", "コード", "```", "後文"];
        let blocks = scan(lines.into_iter());
        assert_eq!(
            blocks,
            vec![FenceBlock {
                start: 1,
                end: 3,
                terminated: true
            }]
        );
        assert!(!line_in_fence(&blocks, 0));
        assert!(line_in_fence(&blocks, 1));
        assert!(line_in_fence(&blocks, 2));
        assert!(line_in_fence(&blocks, 3));
        assert!(!line_in_fence(&blocks, 4));
    }

    #[test]
    fn test_unterminated_fence_extends_to_end() {
        let lines = ["前文", "```", "コード", "つづき"];
        let blocks = scan(lines.into_iter());
        assert_eq!(
            blocks,
            vec![FenceBlock {
                start: 1,
                end: 3,
                terminated: false
            }]
        );
        assert!(!line_in_terminated_fence(&blocks, 2));
        assert!(line_in_fence(&blocks, 2));
    }

    #[test]
    fn test_two_blocks_and_trailing_odd_marker() {
        let lines = ["```", "a", "```", "x", "```", "b", "```", "```", "tail"];
        let blocks = scan(lines.into_iter());
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].terminated);
        assert!(blocks[1].terminated);
        assert!(!blocks[2].terminated);
        assert_eq!(blocks[2].start, 7);
        assert_eq!(blocks[2].end, 8);
    }

    #[test]
    fn test_marker_anywhere_in_line_counts() {
        let lines = ["text ``` trailing", "inside", "```"];
        let blocks = scan(lines.into_iter());
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].terminated);
    }
}
