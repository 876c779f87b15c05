use crate::error::DocumentError;
use crate::models::{round_size, BoundingBox, DocumentLayout, PageLayout, TextFragment, TextSpan};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Glyph width assumed when a font has no usable `Widths` entry, in
/// thousandths of the font size.
const FALLBACK_GLYPH_WIDTH: f32 = 450.0;

/// Source of positioned, styled text fragments for a document.
pub trait LayoutReader {
    fn read_layout(&self, path: &Path) -> Result<DocumentLayout, DocumentError>;
}

/// Reads fragments by interpreting page content streams with lopdf.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfLayoutReader;

impl LayoutReader for LopdfLayoutReader {
    fn read_layout(&self, path: &Path) -> Result<DocumentLayout, DocumentError> {
        let document = Document::load(path).map_err(|error| DocumentError::Open {
            path: path.display().to_string(),
            reason: error.to_string(),
        })?;

        let mut pages = Vec::new();
        for (page_no, page_id) in document.get_pages() {
            let spans = page_spans(&document, page_id)?;
            let fragments = group_into_fragments(page_no, spans);
            debug!(page = page_no, fragments = fragments.len(), "page layout read");
            pages.push(PageLayout {
                number: page_no,
                fragments,
            });
        }

        Ok(DocumentLayout { pages })
    }
}

/// A span positioned on the page in default user space, before line grouping.
#[derive(Debug, Clone)]
pub(crate) struct PlacedSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub font_name: String,
}

impl PlacedSpan {
    fn into_span(self) -> TextSpan {
        let bold = is_bold_font(&self.font_name);
        TextSpan::new(self.text, self.font_name, self.font_size, bold)
    }
}

pub fn is_bold_font(font_name: &str) -> bool {
    let lowered = font_name.to_lowercase();
    lowered.contains("bold") || lowered.contains("black") || lowered.contains("heavy")
}

fn page_spans(document: &Document, page_id: ObjectId) -> Result<Vec<PlacedSpan>, DocumentError> {
    let fonts = document
        .get_page_fonts(page_id)
        .map_err(|error| DocumentError::PdfParse(error.to_string()))?;
    let metrics: BTreeMap<Vec<u8>, FontMetrics> = fonts
        .iter()
        .map(|(key, font)| (key.clone(), FontMetrics::from_font(document, font)))
        .collect();
    let data = document
        .get_page_content(page_id)
        .map_err(|error| DocumentError::PdfParse(error.to_string()))?;
    let content =
        Content::decode(&data).map_err(|error| DocumentError::PdfParse(error.to_string()))?;

    let mut spans = Vec::new();
    let mut state = TextState::default();
    let mut in_text = false;

    for operation in content.operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.ctm_stack.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(matrix) = matrix_operand(operands) {
                    state.ctm = matrix.multiply(&state.ctm);
                }
            }
            "BT" => {
                in_text = true;
                state.line_matrix = Matrix::IDENTITY;
                state.matrix = Matrix::IDENTITY;
            }
            "ET" => in_text = false,
            "Tf" => {
                if let (Some(Object::Name(name)), Some(size)) =
                    (operands.first(), operands.get(1).and_then(number))
                {
                    state.font_key = name.clone();
                    state.font_name = base_font_name(&fonts, name);
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    state.leading = leading;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) =
                    (operands.first().and_then(number), operands.get(1).and_then(number))
                {
                    state.next_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) =
                    (operands.first().and_then(number), operands.get(1).and_then(number))
                {
                    state.leading = -ty;
                    state.next_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(matrix) = matrix_operand(operands) {
                    state.line_matrix = matrix;
                    state.matrix = matrix;
                }
            }
            "T*" => state.next_line(0.0, -state.leading),
            "Tj" | "TJ" | "'" | "\"" => {
                if matches!(operation.operator.as_str(), "'" | "\"") {
                    state.next_line(0.0, -state.leading);
                }
                if !in_text {
                    continue;
                }
                let text_operand = if operation.operator == "\"" {
                    operands.get(2)
                } else {
                    operands.first()
                };
                let Some(text_operand) = text_operand else {
                    continue;
                };

                let start = state.rendering_matrix();
                let text = show_text(document, &fonts, &metrics, &mut state, text_operand);
                let end = state.rendering_matrix();

                if !text.trim().is_empty() {
                    spans.push(PlacedSpan {
                        text,
                        x: start.e,
                        y: start.f,
                        width: (end.e - start.e).hypot(end.f - start.f),
                        font_size: round_size(state.font_size * start.vertical_scale()),
                        font_name: state.font_name.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn base_font_name(fonts: &BTreeMap<Vec<u8>, &Dictionary>, key: &[u8]) -> String {
    match fonts.get(key).map(|font| font.get(b"BaseFont")) {
        Some(Ok(Object::Name(name))) => String::from_utf8_lossy(name).to_string(),
        _ => String::from_utf8_lossy(key).to_string(),
    }
}

/// Decodes a `Tj`/`TJ` operand and moves the text matrix past the shown glyphs.
fn show_text(
    document: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    metrics: &BTreeMap<Vec<u8>, FontMetrics>,
    state: &mut TextState,
    operand: &Object,
) -> String {
    let font = fonts.get(state.font_key.as_slice()).copied();
    let fallback = FontMetrics::default();
    let metric = metrics.get(state.font_key.as_slice()).unwrap_or(&fallback);
    let font_size = state.font_size;

    match operand {
        Object::String(bytes, _) => {
            let text = decode_bytes(document, font, bytes);
            state.advance(metric.advance(bytes, &text, font_size));
            text
        }
        Object::Array(items) => {
            let mut combined = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => {
                        let text = decode_bytes(document, font, bytes);
                        state.advance(metric.advance(bytes, &text, font_size));
                        combined.push_str(&text);
                    }
                    Object::Integer(_) | Object::Real(_) => {
                        let adjustment = number(item).unwrap_or(0.0);
                        state.advance(-adjustment / 1000.0 * font_size);
                        // Large negative kerning in a TJ array is a word gap.
                        if -adjustment > 200.0 && !combined.is_empty() && !combined.ends_with(' ') {
                            combined.push(' ');
                        }
                    }
                    _ => {}
                }
            }
            combined
        }
        _ => String::new(),
    }
}

fn decode_bytes(document: &Document, font: Option<&Dictionary>, bytes: &[u8]) -> String {
    if let Some(font) = font {
        if let Ok(encoding) = font.get_font_encoding(document) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return text;
            }
        }
    }
    decode_text_simple(bytes)
}

/// Decodes a PDF string without a font encoding: UTF-16BE with BOM, UTF-8, then Latin-1.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&byte| byte as char).collect(),
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    let values: Vec<f32> = operands.iter().filter_map(number).collect();
    (values.len() >= 6).then(|| Matrix {
        a: values[0],
        b: values[1],
        c: values[2],
        d: values[3],
        e: values[4],
        f: values[5],
    })
}

/// Glyph widths of a simple font, in thousandths of the font size.
#[derive(Debug, Clone, Default)]
struct FontMetrics {
    first_char: i64,
    widths: Vec<f32>,
    composite: bool,
}

impl FontMetrics {
    fn from_font(document: &Document, font: &Dictionary) -> Self {
        let composite =
            matches!(font.get(b"Subtype"), Ok(Object::Name(name)) if name.as_slice() == b"Type0");
        let first_char = match font.get(b"FirstChar") {
            Ok(Object::Integer(value)) => *value,
            _ => 0,
        };
        let widths = font
            .get(b"Widths")
            .ok()
            .and_then(|object| document.dereference(object).ok())
            .and_then(|(_, object)| object.as_array().ok())
            .map(|items| items.iter().map(|item| number(item).unwrap_or(0.0)).collect())
            .unwrap_or_default();

        Self {
            first_char,
            widths,
            composite,
        }
    }

    /// Horizontal advance of a shown string, in text space units.
    fn advance(&self, bytes: &[u8], text: &str, font_size: f32) -> f32 {
        let units: f32 = if self.composite || self.widths.is_empty() {
            text.chars().count() as f32 * FALLBACK_GLYPH_WIDTH
        } else {
            bytes
                .iter()
                .map(|&code| {
                    usize::try_from(i64::from(code) - self.first_char)
                        .ok()
                        .and_then(|index| self.widths.get(index))
                        .copied()
                        .filter(|width| *width > 0.0)
                        .unwrap_or(FALLBACK_GLYPH_WIDTH)
                })
                .sum()
        };
        units / 1000.0 * font_size
    }
}

#[derive(Debug, Clone)]
struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            ctm: Matrix::IDENTITY,
            ctm_stack: Vec::new(),
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            leading: 12.0,
        }
    }
}

impl TextState {
    fn next_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix.translate(tx, ty);
        self.matrix = self.line_matrix;
    }

    fn advance(&mut self, tx: f32) {
        self.matrix.translate(tx, 0.0);
    }

    /// Text matrix mapped into default user space.
    fn rendering_matrix(&self) -> Matrix {
        self.matrix.multiply(&self.ctm)
    }
}

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    /// `self` applied first, then `other`.
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Length of the transformed unit vertical, i.e. the scale applied to glyph height.
    fn vertical_scale(&self) -> f32 {
        self.c.hypot(self.d)
    }
}

/// Groups spans sharing a baseline into fragments, top-to-bottom then left-to-right.
pub(crate) fn group_into_fragments(page: u32, mut spans: Vec<PlacedSpan>) -> Vec<TextFragment> {
    spans.sort_by(|left, right| {
        right
            .y
            .total_cmp(&left.y)
            .then_with(|| left.x.total_cmp(&right.x))
    });

    let mut lines: Vec<Vec<PlacedSpan>> = Vec::new();
    for span in spans {
        let same_line = lines
            .last()
            .and_then(|line| line.first())
            .is_some_and(|first| (first.y - span.y).abs() <= span.font_size.max(first.font_size) * 0.3);

        match lines.last_mut() {
            Some(line) if same_line => line.push(span),
            _ => lines.push(vec![span]),
        }
    }

    lines
        .into_iter()
        .filter_map(|mut line| {
            line.sort_by(|left, right| left.x.total_cmp(&right.x));
            build_fragment(page, line)
        })
        .collect()
}

fn build_fragment(page: u32, line: Vec<PlacedSpan>) -> Option<TextFragment> {
    let mut text = String::new();
    let mut bbox: Option<BoundingBox> = None;
    let mut previous_end: Option<f32> = None;

    for span in &line {
        if let Some(end) = previous_end {
            let gap = span.x - end;
            let needs_space = gap > span.font_size * 0.1
                && !text.ends_with(char::is_whitespace)
                && !span.text.starts_with(char::is_whitespace);
            if needs_space {
                text.push(' ');
            }
        }
        text.push_str(&span.text);
        previous_end = Some(span.x + span.width);

        let span_box = BoundingBox {
            x0: span.x,
            y0: span.y - span.font_size * 0.2,
            x1: span.x + span.width,
            y1: span.y + span.font_size * 0.8,
        };
        bbox = Some(match bbox {
            Some(current) => BoundingBox {
                x0: current.x0.min(span_box.x0),
                y0: current.y0.min(span_box.y0),
                x1: current.x1.max(span_box.x1),
                y1: current.y1.max(span_box.y1),
            },
            None => span_box,
        });
    }

    let text = text.trim().to_string();
    if text.is_empty() {
        return None;
    }

    Some(TextFragment {
        text,
        page,
        bbox: bbox.unwrap_or_default(),
        spans: line.into_iter().map(PlacedSpan::into_span).collect(),
    })
}
