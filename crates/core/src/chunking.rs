use crate::models::{Subsection, SubsectionOptions};

const ABBREVIATIONS: [&str; 9] = ["e.g", "i.e", "dr", "mr", "mrs", "ms", "fig", "vs", "no"];

pub fn normalize_whitespace(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Splits text at `.`, `!` or `?` followed by whitespace, keeping the
/// terminator. A colon ends a sentence when the next word is capitalized.
/// Common abbreviations and single-letter initials do not end a sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let normalized = normalize_whitespace(text);
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = normalized.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?' | ':') {
            continue;
        }
        let followed_by_space = chars.peek().is_some_and(|(_, next)| next.is_whitespace());
        if !followed_by_space {
            continue;
        }
        let end = index + ch.len_utf8();
        if ch == ':' && !normalized[end..].chars().nth(1).is_some_and(char::is_uppercase) {
            continue;
        }
        if ch == '.' && ends_with_abbreviation(&normalized[start..index]) {
            continue;
        }

        let sentence = normalized[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = end;
    }

    let tail = normalized[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

fn ends_with_abbreviation(before_dot: &str) -> bool {
    let last_word = before_dot
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(|ch: char| !ch.is_alphanumeric());

    if last_word.chars().count() == 1 && last_word.chars().all(char::is_uppercase) {
        return true;
    }

    let lowered = last_word.to_lowercase();
    ABBREVIATIONS.contains(&lowered.as_str())
}

/// Groups sentences into paragraphs and keeps those long enough to matter.
pub fn split_subsections(body: &str, options: &SubsectionOptions) -> Vec<Subsection> {
    let mut subsections = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();

    for sentence in split_sentences(body) {
        let closes_paragraph = sentence.ends_with(':');
        paragraph.push(sentence);

        let joined_len = paragraph.join(" ").chars().count();
        if paragraph.len() >= options.max_sentences
            || closes_paragraph
            || joined_len > options.max_paragraph_chars
        {
            push_paragraph(&mut subsections, &paragraph, options);
            paragraph.clear();
        }
    }

    if !paragraph.is_empty() {
        push_paragraph(&mut subsections, &paragraph, options);
    }

    subsections
}

fn push_paragraph(target: &mut Vec<Subsection>, sentences: &[String], options: &SubsectionOptions) {
    let text = sentences.join(" ");
    if word_count(&text) > options.min_words {
        let summary = summarize(&text, options);
        target.push(Subsection { text, summary });
    }
}

/// Crude extractive summary: short paragraphs verbatim, otherwise the first sentence.
pub fn summarize(paragraph: &str, options: &SubsectionOptions) -> String {
    if word_count(paragraph) <= options.verbatim_summary_words {
        return paragraph.to_string();
    }

    let sentences = split_sentences(paragraph);
    if sentences.len() <= options.verbatim_summary_sentences {
        return paragraph.to_string();
    }

    sentences
        .into_iter()
        .next()
        .unwrap_or_else(|| paragraph.to_string())
}
