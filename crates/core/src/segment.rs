use crate::models::{DocumentLayout, Section, SegmentOptions, TextFragment};
use regex::Regex;
use std::sync::OnceLock;

fn loose_numbering() -> &'static Regex {
    static NUMBERED: OnceLock<Regex> = OnceLock::new();
    NUMBERED.get_or_init(|| Regex::new(r"^\d+\.?\s+\w+").unwrap())
}

/// Coarse header test used for retrieval segmentation. Deliberately looser
/// than the outline classifier and tuned separately.
pub fn is_section_header(fragment: &TextFragment, options: &SegmentOptions) -> bool {
    let text = fragment.text.trim();
    let lowered = text.to_lowercase();

    let sized = fragment.mean_font_size() > options.min_mean_font_size
        && text.chars().count() < options.max_sized_header_chars;
    let numbered = loose_numbering().is_match(text);
    let keyword = options
        .keywords
        .iter()
        .any(|keyword| lowered.contains(keyword.as_str()));

    (sized || fragment.has_bold() || numbered || keyword)
        && text.split_whitespace().count() < options.max_header_words
}

/// Splits a document into sections opened by header fragments.
pub fn segment_sections(layout: &DocumentLayout, options: &SegmentOptions) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for page in &layout.pages {
        for fragment in &page.fragments {
            let text = fragment.text.trim();
            if text.is_empty() {
                continue;
            }

            if is_section_header(fragment, options) {
                if let Some(done) = current.take() {
                    sections.push(done);
                }
                current = Some(Section::open(text, page.number));
                continue;
            }

            current
                .get_or_insert_with(|| Section::open(format!("Page {}", page.number), page.number))
                .append_body(text);
        }
    }

    if let Some(done) = current {
        sections.push(done);
    }

    sections
}
