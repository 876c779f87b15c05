use crate::error::DocumentError;
use crate::extractor::LayoutReader;
use crate::font_stats::FontStatistics;
use crate::heading::{numbering_depth, strip_numbering, HeadingClassifier};
use crate::models::{DocumentLayout, HeadingCandidate, Outline, OutlineOptions, TextFragment};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Reads a document and builds its outline. Any failure to open or read the
/// document is replaced by the error sentinel so batches keep going.
pub fn extract_outline<R: LayoutReader + ?Sized>(
    reader: &R,
    path: &Path,
    options: &OutlineOptions,
) -> Outline {
    read_outline(reader, path, options).unwrap_or_else(|error| {
        warn!(path = %path.display(), %error, "document failed, emitting placeholder outline");
        failed_outline(options)
    })
}

pub fn read_outline<R: LayoutReader + ?Sized>(
    reader: &R,
    path: &Path,
    options: &OutlineOptions,
) -> Result<Outline, DocumentError> {
    let layout = reader.read_layout(path)?;
    let outline = assemble_outline(&layout, options);
    debug!(
        path = %path.display(),
        pages = layout.page_count(),
        headings = outline.headings.len(),
        "outline assembled"
    );
    Ok(outline)
}

pub fn failed_outline(options: &OutlineOptions) -> Outline {
    Outline {
        title: options.error_placeholder.clone(),
        headings: Vec::new(),
    }
}

/// Builds the outline of an already read document.
///
/// The title fragment is left out of the heading list unless it carries
/// section numbering, so a document opening with `1. Introduction` as its
/// largest text still lists that heading.
pub fn assemble_outline(layout: &DocumentLayout, options: &OutlineOptions) -> Outline {
    let first_page: &[TextFragment] = layout
        .page(1)
        .map(|page| page.fragments.as_slice())
        .unwrap_or_default();

    let title_index = select_title(first_page, options);
    let title = title_index
        .map(|index| first_page[index].text.clone())
        .unwrap_or_else(|| options.untitled_placeholder.clone());

    let excluded_index =
        title_index.filter(|&index| numbering_depth(&first_page[index].text).is_none());

    let stats = FontStatistics::from_fragments(layout.fragments());
    let classifier = HeadingClassifier::new(stats.as_ref(), options);

    let mut seen = HashSet::new();
    let mut headings = Vec::new();

    for page in &layout.pages {
        for (index, fragment) in page.fragments.iter().enumerate() {
            if page.number == 1 && Some(index) == excluded_index {
                continue;
            }

            let Some(level) = classifier.classify(fragment) else {
                continue;
            };

            let text = strip_numbering(&fragment.text);
            if text.is_empty() || !seen.insert(text.clone()) {
                continue;
            }

            headings.push(HeadingCandidate {
                level,
                text,
                page: fragment.page,
            });
        }
    }

    // Stable: same-page headings keep discovery order.
    headings.sort_by_key(|heading| heading.page);

    Outline { title, headings }
}

/// Index of the largest-font fragment among the first fragments of page one.
pub fn select_title(first_page: &[TextFragment], options: &OutlineOptions) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (index, fragment) in first_page
        .iter()
        .enumerate()
        .take(options.title_scan_fragments)
    {
        let Some(span) = fragment.dominant_span() else {
            continue;
        };
        if fragment.text.chars().count() >= options.title_max_chars {
            continue;
        }
        let beats = match best {
            Some((_, size)) => span.font_size > size,
            None => span.font_size > 0.0,
        };
        if beats {
            best = Some((index, span.font_size));
        }
    }

    best.map(|(index, _)| index)
}
