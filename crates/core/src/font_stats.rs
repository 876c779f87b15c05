use crate::models::TextFragment;
use std::collections::BTreeMap;

/// Character-weighted font size distribution of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct FontStatistics {
    pub body_size: f32,
    pub sizes_descending: Vec<f32>,
    size_to_char_count: BTreeMap<u32, usize>,
}

impl FontStatistics {
    /// Returns `None` when the fragments carry no spans at all; callers then
    /// fall back to pattern-only heading detection.
    pub fn from_fragments<'a, I>(fragments: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a TextFragment>,
    {
        let mut size_to_char_count = BTreeMap::<u32, usize>::new();
        for fragment in fragments {
            for span in &fragment.spans {
                *size_to_char_count.entry(size_key(span.font_size)).or_insert(0) += span.char_count();
            }
        }

        if size_to_char_count.is_empty() {
            return None;
        }

        // Descending iteration with a strict comparison keeps the larger size on ties.
        let mut body_key = 0u32;
        let mut body_count = 0usize;
        let mut first = true;
        for (&key, &count) in size_to_char_count.iter().rev() {
            if first || count > body_count {
                body_key = key;
                body_count = count;
                first = false;
            }
        }

        Some(Self {
            body_size: key_size(body_key),
            sizes_descending: size_to_char_count.keys().rev().copied().map(key_size).collect(),
            size_to_char_count,
        })
    }

    pub fn char_count(&self, size: f32) -> usize {
        self.size_to_char_count
            .get(&size_key(size))
            .copied()
            .unwrap_or(0)
    }

    pub fn size_ratio(&self, size: f32) -> f32 {
        if self.body_size <= 0.0 {
            return 0.0;
        }
        size / self.body_size
    }
}

fn size_key(size: f32) -> u32 {
    (size.max(0.0) * 10.0).round() as u32
}

fn key_size(key: u32) -> f32 {
    key as f32 / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundingBox, TextSpan};

    fn fragment(spans: &[(&str, f32)]) -> TextFragment {
        TextFragment {
            text: spans.iter().map(|(text, _)| *text).collect::<Vec<_>>().join(""),
            page: 1,
            bbox: BoundingBox::default(),
            spans: spans
                .iter()
                .map(|(text, size)| TextSpan::new(*text, "Helvetica", *size, false))
                .collect(),
        }
    }

    #[test]
    fn body_size_covers_most_characters() {
        let fragments = vec![
            fragment(&[("Heading", 18.0)]),
            fragment(&[("a much longer body line", 10.0)]),
            fragment(&[("another body line", 10.0), ("x", 12.0)]),
        ];
        let stats = FontStatistics::from_fragments(&fragments).unwrap();
        assert_eq!(stats.body_size, 10.0);
        assert_eq!(stats.sizes_descending, vec![18.0, 12.0, 10.0]);
        assert_eq!(stats.char_count(10.0), 40);
        assert!(stats.sizes_descending.contains(&stats.body_size));
    }

    #[test]
    fn tie_prefers_larger_size() {
        let fragments = vec![fragment(&[("abcde", 10.0)]), fragment(&[("vwxyz", 14.0)])];
        let stats = FontStatistics::from_fragments(&fragments).unwrap();
        assert_eq!(stats.body_size, 14.0);
    }

    #[test]
    fn no_spans_yields_none() {
        let empty: Vec<TextFragment> = vec![fragment(&[])];
        assert!(FontStatistics::from_fragments(&empty).is_none());
    }

    #[test]
    fn size_ratio_is_relative_to_body() {
        let fragments = vec![fragment(&[("body body", 10.0)])];
        let stats = FontStatistics::from_fragments(&fragments).unwrap();
        assert!((stats.size_ratio(15.0) - 1.5).abs() < f32::EPSILON);
    }
}
