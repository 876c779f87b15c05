//! Relevance scoring against a persona and a job to be done.
//!
//! Persona and job embeddings are blended into one query vector; every
//! candidate text is scored by cosine similarity to it. Scores are bounded in
//! `[-1, 1]` and are not rescaled.

use crate::embeddings::{CharacterNgramEmbedder, Embedder};
use crate::error::EmbeddingError;
use crate::models::{RelevanceOptions, Section, Subsection};
use std::sync::OnceLock;
use tracing::info;

static DEFAULT_MODEL: OnceLock<CharacterNgramEmbedder> = OnceLock::new();

/// The process-wide default model, loaded on first use and kept until exit.
fn default_model() -> &'static CharacterNgramEmbedder {
    DEFAULT_MODEL.get_or_init(|| {
        let model = CharacterNgramEmbedder::default();
        info!(dimensions = model.dimensions, "default embedding model loaded");
        model
    })
}

/// Blended persona/job query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryProfile {
    pub combined: Vec<f32>,
}

pub struct RelevanceScorer<E: Embedder> {
    embedder: E,
    options: RelevanceOptions,
}

impl RelevanceScorer<&'static CharacterNgramEmbedder> {
    pub fn with_default_model(options: RelevanceOptions) -> Self {
        Self::new(default_model(), options)
    }
}

impl<E: Embedder> RelevanceScorer<E> {
    pub fn new(embedder: E, options: RelevanceOptions) -> Self {
        Self { embedder, options }
    }

    pub fn profile(&self, persona: &str, job: &str) -> Result<QueryProfile, EmbeddingError> {
        let persona_vector = self.embedder.embed(persona)?;
        let job_vector = self.embedder.embed(job)?;
        let combined = combine(
            &job_vector,
            self.options.job_weight,
            &persona_vector,
            self.options.persona_weight,
        )?;
        Ok(QueryProfile { combined })
    }

    pub fn score_text(&self, profile: &QueryProfile, text: &str) -> Result<f32, EmbeddingError> {
        let vector = self.embedder.embed(text)?;
        cosine_similarity(&vector, &profile.combined)
    }

    /// Scores a section by its title plus the head of its body.
    pub fn score_section(&self, profile: &QueryProfile, section: &Section) -> Result<f32, EmbeddingError> {
        self.score_text(profile, &section_probe(section, self.options.probe_body_chars))
    }

    pub fn score_subsection(
        &self,
        profile: &QueryProfile,
        subsection: &Subsection,
    ) -> Result<f32, EmbeddingError> {
        self.score_text(profile, &subsection.summary)
    }
}

pub fn section_probe(section: &Section, body_chars: usize) -> String {
    let head: String = section.body.chars().take(body_chars).collect();
    format!("{} {}", section.title, head)
}

/// `job_weight * job + persona_weight * persona`, element-wise.
pub fn combine(
    job: &[f32],
    job_weight: f32,
    persona: &[f32],
    persona_weight: f32,
) -> Result<Vec<f32>, EmbeddingError> {
    if job.len() != persona.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: job.len(),
            actual: persona.len(),
        });
    }

    Ok(job
        .iter()
        .zip(persona)
        .map(|(job_value, persona_value)| job_weight * job_value + persona_weight * persona_value)
        .collect())
}

/// Cosine similarity; zero when either vector has no magnitude.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Result<f32, EmbeddingError> {
    if left.len() != right.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: right.len(),
            actual: left.len(),
        });
    }

    let dot: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let left_norm = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let right_norm = right.iter().map(|value| value * value).sum::<f32>().sqrt();

    if left_norm == 0.0 || right_norm == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (left_norm * right_norm))
}
