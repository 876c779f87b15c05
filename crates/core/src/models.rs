use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned box in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// A styled run within a fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub font_family: String,
    /// Rounded to 0.1pt.
    pub font_size: f32,
    pub bold: bool,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, font_family: impl Into<String>, font_size: f32, bold: bool) -> Self {
        Self {
            text: text.into(),
            font_family: font_family.into(),
            font_size: round_size(font_size),
            bold,
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

pub fn round_size(size: f32) -> f32 {
    (size * 10.0).round() / 10.0
}

/// One visual line of text with its font spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub page: u32,
    pub bbox: BoundingBox,
    pub spans: Vec<TextSpan>,
}

impl TextFragment {
    /// The span covering the most characters; the earliest one wins a tie.
    pub fn dominant_span(&self) -> Option<&TextSpan> {
        let mut best: Option<&TextSpan> = None;
        for span in &self.spans {
            match best {
                Some(current) if span.char_count() <= current.char_count() => {}
                _ => best = Some(span),
            }
        }
        best
    }

    pub fn mean_font_size(&self) -> f32 {
        if self.spans.is_empty() {
            return 0.0;
        }
        self.spans.iter().map(|span| span.font_size).sum::<f32>() / self.spans.len() as f32
    }

    pub fn has_bold(&self) -> bool {
        self.spans.iter().any(|span| span.bold)
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Fragments of one page, in reading order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub number: u32,
    pub fragments: Vec<TextFragment>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentLayout {
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn fragments(&self) -> impl Iterator<Item = &TextFragment> {
        self.pages.iter().flat_map(|page| page.fragments.iter())
    }

    pub fn page(&self, number: u32) -> Option<&PageLayout> {
        self.pages.iter().find(|page| page.number == number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeadingLevel {
    Title,
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Maps a numeric depth (1..=3) to a heading level; deeper levels clamp to H3.
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 => HeadingLevel::Title,
            1 => HeadingLevel::H1,
            2 => HeadingLevel::H2,
            _ => HeadingLevel::H3,
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HeadingLevel::Title => "Title",
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingCandidate {
    pub level: HeadingLevel,
    pub text: String,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    #[serde(rename = "outline")]
    pub headings: Vec<HeadingCandidate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub page: u32,
    pub body: String,
    pub subsections: Vec<Subsection>,
}

impl Section {
    pub fn open(title: impl Into<String>, page: u32) -> Self {
        Self {
            title: title.into(),
            page,
            body: String::new(),
            subsections: Vec::new(),
        }
    }

    pub fn append_body(&mut self, text: &str) {
        if !self.body.is_empty() {
            self.body.push(' ');
        }
        self.body.push_str(text);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subsection {
    pub text: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRecord {
    pub document: String,
    pub page: u32,
    pub title: String,
    pub content_preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsectionRecord {
    pub document: String,
    pub section_title: String,
    pub page: u32,
    pub subsection_idx: usize,
    pub refined_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDocument {
    pub document: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub processing_timestamp: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_documents: Vec<SkippedDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelevanceReport {
    pub metadata: ReportMetadata,
    pub extracted_sections: Vec<crate::ranking::Ranked<SectionRecord>>,
    pub subsection_analysis: Vec<crate::ranking::Ranked<SubsectionRecord>>,
}

/// Thresholds for the outline heading classifier and title picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineOptions {
    pub max_heading_chars: usize,
    pub candidate_size_ratio: f32,
    pub h2_size_ratio: f32,
    pub h1_size_ratio: f32,
    pub max_heading_words: usize,
    pub keywords: Vec<String>,
    pub title_scan_fragments: usize,
    pub title_max_chars: usize,
    pub untitled_placeholder: String,
    pub error_placeholder: String,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            max_heading_chars: 200,
            candidate_size_ratio: 1.2,
            h2_size_ratio: 1.3,
            h1_size_ratio: 1.5,
            max_heading_words: 10,
            keywords: [
                "introduction",
                "conclusion",
                "abstract",
                "summary",
                "chapter",
                "section",
                "overview",
                "background",
                "methodology",
                "results",
                "discussion",
                "references",
            ]
            .iter()
            .map(|keyword| keyword.to_string())
            .collect(),
            title_scan_fragments: 10,
            title_max_chars: 150,
            untitled_placeholder: "Untitled Document".to_string(),
            error_placeholder: "Error Processing Document".to_string(),
        }
    }
}

/// Thresholds for the coarse section segmenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentOptions {
    pub min_mean_font_size: f32,
    pub max_sized_header_chars: usize,
    /// Exclusive upper bound.
    pub max_header_words: usize,
    pub keywords: Vec<String>,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            min_mean_font_size: 12.0,
            max_sized_header_chars: 100,
            max_header_words: 15,
            keywords: ["chapter", "section", "introduction", "conclusion"]
                .iter()
                .map(|keyword| keyword.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsectionOptions {
    pub max_sentences: usize,
    pub max_paragraph_chars: usize,
    /// Paragraphs need strictly more words than this.
    pub min_words: usize,
    pub verbatim_summary_words: usize,
    pub verbatim_summary_sentences: usize,
}

impl Default for SubsectionOptions {
    fn default() -> Self {
        Self {
            max_sentences: 3,
            max_paragraph_chars: 200,
            min_words: 10,
            verbatim_summary_words: 30,
            verbatim_summary_sentences: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceOptions {
    pub job_weight: f32,
    pub persona_weight: f32,
    pub probe_body_chars: usize,
}

impl Default for RelevanceOptions {
    fn default() -> Self {
        Self {
            job_weight: 0.7,
            persona_weight: 0.3,
            probe_body_chars: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingOptions {
    pub section_cap: usize,
    pub subsection_cap: usize,
    pub preview_chars: usize,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            section_cap: 15,
            subsection_cap: 20,
            preview_chars: 200,
        }
    }
}

/// Every tunable heuristic, loadable from a single JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub outline: OutlineOptions,
    pub segment: SegmentOptions,
    pub subsections: SubsectionOptions,
    pub relevance: RelevanceOptions,
    pub ranking: RankingOptions,
}
