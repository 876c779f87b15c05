use crate::error::EmbeddingError;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT: usize = 128;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = DEFAULT;

/// Text → fixed-length vector. Must be deterministic for identical input within a run.
pub trait Embedder {
    fn dimensions(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text)
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text)
    }
}

/// Hashed character-trigram embedding, L2 normalized. Runs fully offline.
#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl Embedder for CharacterNgramEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return Ok(vector);
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        Ok(vector)
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingEndpointConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub dimensions: usize,
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    data: Option<Vec<EmbeddingDatum>>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Embedding provider served over HTTP, e.g. a local sentence-transformer server.
pub struct HttpEmbedder {
    endpoint: Url,
    api_key: Option<String>,
    dimensions: usize,
    client: Client,
}

impl HttpEmbedder {
    pub fn new(config: EmbeddingEndpointConfig) -> Result<Self, EmbeddingError> {
        Ok(Self {
            endpoint: Url::parse(&config.endpoint)?,
            api_key: config.api_key,
            dimensions: config.dimensions,
            client: Client::new(),
        })
    }
}

impl Embedder for HttpEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("content-type", "application/json")
            .json(&EmbeddingRequest { input: text });

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send()?;
        if !response.status().is_success() {
            return Err(EmbeddingError::Response(format!(
                "embedding request to {} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let payload: EmbeddingResponse = response.json()?;
        let vector = payload_to_vector(payload)?;
        if vector.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

fn payload_to_vector(payload: EmbeddingResponse) -> Result<Vec<f32>, EmbeddingError> {
    if let Some(vector) = payload.embedding {
        return Ok(vector);
    }

    payload
        .data
        .and_then(|data| data.into_iter().next())
        .map(|datum| datum.embedding)
        .ok_or_else(|| EmbeddingError::Response("response carried no embedding".to_string()))
}
