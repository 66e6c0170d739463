//! Ruby (furigana) tokenization.
//!
//! A `|base《reading》` run becomes one atomic [`RubyBlock`] whose wrap width
//! is the codepoint length of the base, no matter how long the reading is.
//! Both the half-width `|` and full-width `｜` markers are recognized.

use serde::{Deserialize, Serialize};

use super::DisplayToken;

const RUBY_MARKERS: [char; 2] = ['|', '｜'];

/// One base/reading pairing inside a ruby block, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubySegment {
    pub base: String,
    pub reading: String,
}

/// An atomic annotated run. Never split across rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubyBlock {
    pub base: String,
    pub reading: String,
    pub segments: Vec<RubySegment>,
}

impl RubyBlock {
    pub fn new(base: String, reading: String) -> Self {
        let segments = pair_segments(&base, &reading);
        Self {
            base,
            reading,
            segments,
        }
    }

    /// Width in character cells; the reading rides alongside and costs none.
    pub fn width(&self) -> usize {
        self.base.chars().count()
    }
}

/// Distribute a reading over the base glyphs.
///
/// In order: a reading of only `・` repeats one dot per base glyph; a reading
/// containing `・` is split on it and zipped with the base glyphs; equal
/// codepoint lengths zip one to one; anything else is a single whole-word
/// reading.
fn pair_segments(base: &str, reading: &str) -> Vec<RubySegment> {
    let base_chars: Vec<char> = base.chars().collect();

    if !reading.is_empty() && reading.chars().all(|c| c == '・') {
        return base_chars
            .iter()
            .map(|&b| RubySegment {
                base: b.to_string(),
                reading: "・".to_string(),
            })
            .collect();
    }

    if reading.contains('・') {
        let parts: Vec<&str> = reading.split('・').collect();
        return base_chars
            .iter()
            .enumerate()
            .map(|(i, &b)| RubySegment {
                base: b.to_string(),
                reading: parts.get(i).copied().unwrap_or("").to_string(),
            })
            .collect();
    }

    if reading.chars().count() == base_chars.len() {
        return base_chars
            .iter()
            .zip(reading.chars())
            .map(|(&b, r)| RubySegment {
                base: b.to_string(),
                reading: r.to_string(),
            })
            .collect();
    }

    vec![RubySegment {
        base: base.to_string(),
        reading: reading.to_string(),
    }]
}

/// Split a line into display tokens, left to right.
pub fn tokenize(line: &str) -> Vec<DisplayToken> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if RUBY_MARKERS.contains(&chars[i])
            && let Some((block, consumed)) = parse_ruby(&chars[i..])
        {
            tokens.push(DisplayToken::Ruby(block));
            i += consumed;
            continue;
        }
        tokens.push(DisplayToken::Character(chars[i]));
        i += 1;
    }
    tokens
}

/// Parse `|base《reading》` starting at the marker in `chars[0]`.
///
/// Returns the block and the number of codepoints consumed, or `None` when
/// the pattern is incomplete (the marker then renders literally).
fn parse_ruby(chars: &[char]) -> Option<(RubyBlock, usize)> {
    let open = chars.iter().position(|&c| c == '《')?;
    if open == 1 {
        return None;
    }
    let base_chars = &chars[1..open];
    if base_chars.iter().any(|c| RUBY_MARKERS.contains(c)) {
        return None;
    }
    let close = chars[open + 1..].iter().position(|&c| c == '》')? + open + 1;

    let base: String = base_chars.iter().collect();
    let reading: String = chars[open + 1..close].iter().collect();
    Some((RubyBlock::new(base, reading), close + 1))
}
