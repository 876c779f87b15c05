use crate::chunking::split_subsections;
use crate::config::{document_name, RunConfig};
use crate::embeddings::Embedder;
use crate::error::PipelineError;
use crate::extractor::LayoutReader;
use crate::models::{
    PipelineOptions, RelevanceReport, ReportMetadata, Section, SectionRecord, SkippedDocument,
    SubsectionRecord,
};
use crate::ranking::{content_preview, rank_top, Scored};
use crate::relevance::{QueryProfile, RelevanceScorer};
use crate::segment::segment_sections;
use chrono::Utc;
use tracing::{debug, info, warn};

/// Runs segmentation and scoring per document, then ranks the merged pool once.
pub struct RelevancePipeline<'a, R, E>
where
    R: LayoutReader + ?Sized,
    E: Embedder,
{
    reader: &'a R,
    scorer: RelevanceScorer<E>,
    options: PipelineOptions,
}

#[derive(Debug, Default)]
struct CandidatePool {
    sections: Vec<Scored<SectionRecord>>,
    subsections: Vec<Scored<SubsectionRecord>>,
}

impl<'a, R, E> RelevancePipeline<'a, R, E>
where
    R: LayoutReader + ?Sized,
    E: Embedder,
{
    pub fn new(reader: &'a R, scorer: RelevanceScorer<E>, options: PipelineOptions) -> Self {
        Self {
            reader,
            scorer,
            options,
        }
    }

    pub fn run(&self, config: &RunConfig) -> Result<RelevanceReport, PipelineError> {
        let profile = self.scorer.profile(&config.persona, &config.job)?;

        let mut pool = CandidatePool::default();
        let mut skipped_documents = Vec::new();

        for path in &config.document_paths {
            let document = document_name(path);
            let layout = match self.reader.read_layout(path) {
                Ok(layout) => layout,
                Err(error) => {
                    warn!(document = %document, %error, "skipping unreadable document");
                    skipped_documents.push(SkippedDocument {
                        document,
                        reason: error.to_string(),
                    });
                    continue;
                }
            };

            let mut sections = segment_sections(&layout, &self.options.segment);
            for section in &mut sections {
                section.subsections = split_subsections(&section.body, &self.options.subsections);
            }
            debug!(document = %document, sections = sections.len(), "document segmented");

            self.score_document(&document, &sections, &profile, &mut pool)?;
        }

        info!(
            sections = pool.sections.len(),
            subsections = pool.subsections.len(),
            skipped = skipped_documents.len(),
            "ranking candidate pool"
        );

        Ok(RelevanceReport {
            metadata: ReportMetadata {
                input_documents: config.document_names(),
                persona: config.persona.clone(),
                job_to_be_done: config.job.clone(),
                processing_timestamp: Utc::now().to_rfc3339(),
                skipped_documents,
            },
            extracted_sections: rank_top(pool.sections, self.options.ranking.section_cap),
            subsection_analysis: rank_top(pool.subsections, self.options.ranking.subsection_cap),
        })
    }

    fn score_document(
        &self,
        document: &str,
        sections: &[Section],
        profile: &QueryProfile,
        pool: &mut CandidatePool,
    ) -> Result<(), PipelineError> {
        for section in sections {
            let score = self.scorer.score_section(profile, section)?;
            pool.sections.push(Scored::new(
                SectionRecord {
                    document: document.to_string(),
                    page: section.page,
                    title: section.title.clone(),
                    content_preview: content_preview(&section.body, self.options.ranking.preview_chars),
                },
                score,
            ));

            for (index, subsection) in section.subsections.iter().enumerate() {
                let score = self.scorer.score_subsection(profile, subsection)?;
                pool.subsections.push(Scored::new(
                    SubsectionRecord {
                        document: document.to_string(),
                        section_title: section.title.clone(),
                        page: section.page,
                        subsection_idx: index,
                        refined_text: subsection.summary.clone(),
                    },
                    score,
                ));
            }
        }
        Ok(())
    }
}
