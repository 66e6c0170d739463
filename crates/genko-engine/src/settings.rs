//! Engine settings supplied by the host.

use serde::{Deserialize, Serialize};

/// Glyphs forbidden from starting a row (kinsoku). Closing punctuation,
/// small kana, and the prolonged sound mark.
pub const DEFAULT_BANNED_LEADING: &str =
    "、。，．・：；？！ー）」』〉》】〕ゝゞ々ぁぃぅぇぉっゃゅょゎァィゥェォッャュョヮヵヶ";

/// Switches for the span-classification pipeline and char counting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Count ASCII/ideographic spaces and the literal `#`, `|`, `｜`
    /// characters toward char totals.
    pub count_spaces: bool,
    /// Color full-width bracket pairs (and dashes inside prose) as quotes.
    pub bracket_override_enabled: bool,
    /// Collapse heading lines into a single heading span.
    pub heading_classification_enabled: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            count_spaces: false,
            bracket_override_enabled: true,
            heading_classification_enabled: true,
        }
    }
}

/// Manuscript-paper geometry and line-break policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSettings {
    /// Rows per page; must be >= 1.
    pub rows_per_page: usize,
    /// Character cells per row; must be >= 1.
    pub cols: usize,
    /// Apply the banned-leading-character hang rule when wrapping.
    pub kinsoku_enabled: bool,
    /// Glyphs that may not start a row.
    pub banned_leading_chars: Vec<char>,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            rows_per_page: 20,
            cols: 20,
            kinsoku_enabled: true,
            banned_leading_chars: DEFAULT_BANNED_LEADING.chars().collect(),
        }
    }
}

impl LayoutSettings {
    /// Assert the caller contract: zero or negative geometry is a programmer
    /// error, not an environmental failure.
    pub fn validated(self) -> Self {
        assert!(self.rows_per_page >= 1, "rows_per_page must be >= 1");
        assert!(self.cols >= 1, "cols must be >= 1");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_ban_common_closers() {
        let settings = LayoutSettings::default();
        assert!(settings.banned_leading_chars.contains(&'。'));
        assert!(settings.banned_leading_chars.contains(&'」'));
        assert!(settings.banned_leading_chars.contains(&'ー'));
        assert!(!settings.banned_leading_chars.contains(&'「'));
    }

    #[test]
    #[should_panic(expected = "cols must be >= 1")]
    fn test_zero_cols_fails_fast() {
        LayoutSettings {
            cols: 0,
            ..Default::default()
        }
        .validated();
    }

    #[test]
    #[should_panic(expected = "rows_per_page must be >= 1")]
    fn test_zero_rows_fails_fast() {
        LayoutSettings {
            rows_per_page: 0,
            ..Default::default()
        }
        .validated();
    }
}
