use crate::error::ConfigError;
use crate::models::PipelineOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One Round-2 job: which documents to rank, for whom, and for what task.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub document_paths: Vec<PathBuf>,
    pub persona: String,
    pub job: String,
}

impl RunConfig {
    /// File names of the configured documents, in configured order.
    pub fn document_names(&self) -> Vec<String> {
        self.document_paths.iter().map(|path| document_name(path)).collect()
    }
}

pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DocumentEntry {
    Name(String),
    Described { filename: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PersonaEntry {
    Text(String),
    Described { role: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JobEntry {
    Text(String),
    Described { task: String },
}

#[derive(Debug, Deserialize)]
struct RawRunConfig {
    documents: Vec<DocumentEntry>,
    persona: PersonaEntry,
    job_to_be_done: JobEntry,
}

/// Parses a run configuration; relative document paths resolve against `base_dir`.
pub fn parse_run_config(json: &str, base_dir: &Path) -> Result<RunConfig, ConfigError> {
    let raw: RawRunConfig = serde_json::from_str(json)?;

    if raw.documents.is_empty() {
        return Err(ConfigError::Invalid("no documents listed".to_string()));
    }

    let document_paths = raw
        .documents
        .into_iter()
        .map(|entry| {
            let name = match entry {
                DocumentEntry::Name(name) | DocumentEntry::Described { filename: name } => name,
            };
            let path = PathBuf::from(name);
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        })
        .collect();

    let persona = match raw.persona {
        PersonaEntry::Text(text) | PersonaEntry::Described { role: text } => text,
    };
    let job = match raw.job_to_be_done {
        JobEntry::Text(text) | JobEntry::Described { task: text } => text,
    };

    Ok(RunConfig {
        document_paths,
        persona,
        job,
    })
}

pub fn load_run_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let json = read(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_run_config(&json, base_dir)
}

/// Loads tunable heuristics; any field left out keeps its default.
pub fn load_options(path: &Path) -> Result<PipelineOptions, ConfigError> {
    let json = read(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}
