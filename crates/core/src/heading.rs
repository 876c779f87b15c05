//! Outline heading classification.
//!
//! Numbering patterns are tried first and win over typography. Without a
//! numbering match, the dominant span's size relative to the body size and its
//! weight decide, subject to word-count and shape checks.

use crate::font_stats::FontStatistics;
use crate::models::{HeadingLevel, OutlineOptions, TextFragment};
use regex::Regex;
use std::sync::OnceLock;

/// Numbering patterns in priority order, paired with the depth they imply.
fn numbering_patterns() -> &'static [(Regex, usize)] {
    static PATTERNS: OnceLock<Vec<(Regex, usize)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            (Regex::new(r"^\s*(\d+\.?)\s+(.+)$").unwrap(), 1),
            (Regex::new(r"^\s*(\d+\.\d+\.?)\s+(.+)$").unwrap(), 2),
            (Regex::new(r"^\s*(\d+\.\d+\.\d+\.?)\s+(.+)$").unwrap(), 3),
            (Regex::new(r"^\s*([A-Z]\.?)\s+(.+)$").unwrap(), 1),
            (Regex::new(r"^\s*([IVX]+\.?)\s+(.+)$").unwrap(), 1),
        ]
    })
}

/// Depth implied by a leading numbering token, if any.
pub fn numbering_depth(text: &str) -> Option<usize> {
    numbering_patterns()
        .iter()
        .find(|(regex, _)| regex.is_match(text))
        .map(|(_, depth)| *depth)
}

/// Removes a leading run of digits, dots, dashes and bullets.
pub fn strip_numbering(text: &str) -> String {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let prefix = PREFIX.get_or_init(|| Regex::new(r"^\s*[\d.\-•*]+\s*").unwrap());
    prefix.replace(text, "").trim().to_string()
}

pub struct HeadingClassifier<'a> {
    stats: Option<&'a FontStatistics>,
    options: &'a OutlineOptions,
}

impl<'a> HeadingClassifier<'a> {
    pub fn new(stats: Option<&'a FontStatistics>, options: &'a OutlineOptions) -> Self {
        Self { stats, options }
    }

    /// Returns the heading level for a fragment, or `None` for body text.
    pub fn classify(&self, fragment: &TextFragment) -> Option<HeadingLevel> {
        let text = fragment.text.as_str();
        if text.chars().count() > self.options.max_heading_chars {
            return None;
        }

        if let Some(depth) = numbering_depth(text) {
            return Some(HeadingLevel::from_depth(depth));
        }

        let stats = self.stats?;
        let span = fragment.dominant_span()?;
        let ratio = stats.size_ratio(span.font_size);

        if !(ratio > self.options.candidate_size_ratio || span.bold) {
            return None;
        }

        let level = if ratio > self.options.h1_size_ratio {
            HeadingLevel::H1
        } else if ratio > self.options.h2_size_ratio {
            HeadingLevel::H2
        } else {
            HeadingLevel::H3
        };

        if fragment.word_count() > self.options.max_heading_words {
            return None;
        }

        let shaped_like_heading = self.has_keyword(text)
            || span.bold
            || is_all_upper(text)
            || (starts_upper(text) && !text.ends_with('.'));

        shaped_like_heading.then_some(level)
    }

    fn has_keyword(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.options
            .keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
    }
}

/// True when the text has cased letters and none of them are lowercase.
fn is_all_upper(text: &str) -> bool {
    let mut has_cased = false;
    for ch in text.chars() {
        if ch.is_lowercase() {
            return false;
        }
        if ch.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

fn starts_upper(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_uppercase)
}
