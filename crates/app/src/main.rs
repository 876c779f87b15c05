use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use docintel_core::{
    extract_outline, extract_outlines_in_folder, load_options, load_run_config, Embedder,
    EmbeddingEndpointConfig, HttpEmbedder, LopdfLayoutReader, PipelineOptions, RelevancePipeline,
    RelevanceScorer, RunConfig, DEFAULT_EMBEDDING_DIMENSIONS,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "docintel", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory scanned for batch input.
    #[arg(long, global = true, env = "DOCINTEL_INPUT_DIR", default_value = "/app/input")]
    input_dir: PathBuf,

    /// Directory batch results are written to.
    #[arg(long, global = true, env = "DOCINTEL_OUTPUT_DIR", default_value = "/app/output")]
    output_dir: PathBuf,

    /// JSON file overriding heuristic thresholds.
    #[arg(long, global = true)]
    heuristics: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Extract title and heading outline from PDFs.
    Outline {
        /// PDF to process when the input directory does not exist.
        path: Option<PathBuf>,
    },
    /// Rank sections of a document collection for a persona and job.
    Rank {
        /// Run configuration used when the input directory does not exist.
        config: Option<PathBuf>,
        /// Embedding service URL; the built-in model is used when absent.
        #[arg(long, env = "EMBEDDING_ENDPOINT")]
        embedding_endpoint: Option<String>,
        #[arg(long, env = "EMBEDDING_API_KEY", hide_env_values = true)]
        embedding_api_key: Option<String>,
        #[arg(long, env = "EMBEDDING_DIMENSIONS", default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
        embedding_dimensions: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        "docintel boot"
    );

    let options = match &cli.heuristics {
        Some(path) => load_options(path)
            .with_context(|| format!("loading heuristics from {}", path.display()))?,
        None => PipelineOptions::default(),
    };

    match cli.command {
        Command::Outline { path } => run_outline(&cli.input_dir, &cli.output_dir, path, &options),
        Command::Rank {
            config,
            embedding_endpoint,
            embedding_api_key,
            embedding_dimensions,
        } => {
            let (config, output) = resolve_run_config(&cli.input_dir, &cli.output_dir, config)?;

            match embedding_endpoint {
                Some(endpoint) => {
                    let embedder = HttpEmbedder::new(EmbeddingEndpointConfig {
                        endpoint,
                        api_key: embedding_api_key,
                        dimensions: embedding_dimensions,
                    })
                    .context("configuring embedding endpoint")?;
                    let scorer = RelevanceScorer::new(embedder, options.relevance.clone());
                    run_rank(scorer, &config, options, output.as_deref())
                }
                None => {
                    let scorer = RelevanceScorer::with_default_model(options.relevance.clone());
                    run_rank(scorer, &config, options, output.as_deref())
                }
            }
        }
    }
}

fn run_outline(
    input_dir: &Path,
    output_dir: &Path,
    path: Option<PathBuf>,
    options: &PipelineOptions,
) -> anyhow::Result<()> {
    let reader = LopdfLayoutReader;

    if input_dir.is_dir() {
        let report = extract_outlines_in_folder(&reader, input_dir, output_dir, &options.outline)
            .with_context(|| format!("processing {}", input_dir.display()))?;

        for entry in report.failed() {
            warn!(path = %entry.source.display(), "written with placeholder outline");
        }
        info!(
            documents = report.entries.len(),
            output = %output_dir.display(),
            "outline batch finished"
        );
        return Ok(());
    }

    let Some(path) = path else {
        bail!(
            "input directory {} does not exist; pass a PDF path",
            input_dir.display()
        );
    };

    let outline = extract_outline(&reader, &path, &options.outline);
    println!("{}", serde_json::to_string_pretty(&outline)?);
    Ok(())
}

/// Run configuration plus the file the report goes to; `None` means stdout.
fn resolve_run_config(
    input_dir: &Path,
    output_dir: &Path,
    config: Option<PathBuf>,
) -> anyhow::Result<(RunConfig, Option<PathBuf>)> {
    if input_dir.is_dir() {
        let path = input_dir.join("config.json");
        let config = load_run_config(&path)
            .with_context(|| format!("loading run config {}", path.display()))?;
        return Ok((config, Some(output_dir.join("output.json"))));
    }

    let Some(path) = config else {
        bail!(
            "input directory {} does not exist; pass a config path",
            input_dir.display()
        );
    };
    let config = load_run_config(&path)
        .with_context(|| format!("loading run config {}", path.display()))?;
    Ok((config, None))
}

fn run_rank<E: Embedder>(
    scorer: RelevanceScorer<E>,
    config: &RunConfig,
    options: PipelineOptions,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let reader = LopdfLayoutReader;
    let pipeline = RelevancePipeline::new(&reader, scorer, options);
    let report = pipeline.run(config).context("ranking documents")?;
    let json = serde_json::to_string_pretty(&report)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(
                path = %path.display(),
                sections = report.extracted_sections.len(),
                subsections = report.subsection_analysis.len(),
                "relevance report written"
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
