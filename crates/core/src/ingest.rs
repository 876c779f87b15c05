use crate::error::DocumentError;
use crate::extractor::LayoutReader;
use crate::models::{Outline, OutlineOptions};
use crate::outline::{failed_outline, read_outline};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// PDF files directly inside `folder`, sorted by path.
pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// `report.pdf` → `<output_dir>/report.json`.
pub fn outline_output_path(pdf: &Path, output_dir: &Path) -> Result<PathBuf, DocumentError> {
    let stem = pdf
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| DocumentError::MissingFileName(pdf.display().to_string()))?;
    Ok(output_dir.join(format!("{stem}.json")))
}

pub struct OutlineEntry {
    pub source: PathBuf,
    pub output: PathBuf,
    pub outline: Outline,
    pub failed: bool,
}

pub struct OutlineBatchReport {
    pub entries: Vec<OutlineEntry>,
}

impl OutlineBatchReport {
    pub fn failed(&self) -> impl Iterator<Item = &OutlineEntry> {
        self.entries.iter().filter(|entry| entry.failed)
    }
}

/// Writes one outline JSON per PDF in `input_dir`. A document that cannot be
/// read still gets a file, holding the error sentinel.
pub fn extract_outlines_in_folder<R: LayoutReader + ?Sized>(
    reader: &R,
    input_dir: &Path,
    output_dir: &Path,
    options: &OutlineOptions,
) -> Result<OutlineBatchReport, DocumentError> {
    fs::create_dir_all(output_dir)?;

    let files = discover_pdf_files(input_dir);
    if files.is_empty() {
        warn!(folder = %input_dir.display(), "no pdf files found");
    }

    let mut entries = Vec::with_capacity(files.len());
    for source in files {
        info!(path = %source.display(), "processing");
        let (outline, failed) = match read_outline(reader, &source, options) {
            Ok(outline) => (outline, false),
            Err(error) => {
                warn!(path = %source.display(), %error, "document failed, emitting placeholder outline");
                (failed_outline(options), true)
            }
        };

        let output = outline_output_path(&source, output_dir)?;
        let json = serde_json::to_string_pretty(&outline)?;
        fs::write(&output, json)?;
        info!(path = %output.display(), headings = outline.headings.len(), "completed");

        entries.push(OutlineEntry {
            source,
            output,
            outline,
            failed,
        });
    }

    Ok(OutlineBatchReport { entries })
}
