pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod font_stats;
pub mod heading;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod outline;
pub mod ranking;
pub mod relevance;
pub mod segment;

pub use chunking::{normalize_whitespace, split_sentences, split_subsections, summarize};
pub use config::{load_options, load_run_config, parse_run_config, RunConfig};
pub use embeddings::{
    CharacterNgramEmbedder, Embedder, EmbeddingEndpointConfig, HttpEmbedder,
    DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{ConfigError, DocumentError, EmbeddingError, PipelineError};
pub use extractor::{LayoutReader, LopdfLayoutReader};
pub use font_stats::FontStatistics;
pub use heading::HeadingClassifier;
pub use ingest::{discover_pdf_files, extract_outlines_in_folder, OutlineBatchReport, OutlineEntry};
pub use models::{
    DocumentLayout, HeadingCandidate, HeadingLevel, Outline, OutlineOptions, PageLayout,
    PipelineOptions, RankingOptions, RelevanceOptions, RelevanceReport, Section, SegmentOptions,
    Subsection, SubsectionOptions, TextFragment, TextSpan,
};
pub use orchestrator::RelevancePipeline;
pub use outline::{assemble_outline, extract_outline, read_outline};
pub use ranking::Ranked;
pub use relevance::{QueryProfile, RelevanceScorer};
pub use segment::segment_sections;
