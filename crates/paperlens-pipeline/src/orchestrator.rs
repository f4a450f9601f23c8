//! End-to-end research analysis pipeline.
//!
//! Orchestrates the full flow for a single batch run:
//!   1. Parse: extract text + metadata from each PDF, store paper rows
//!   2. Summarize: one completion call per accepted paper, store summaries
//!   3. Synthesize: one cross-paper completion pass plus a cited
//!      mini-survey, store the synthesis row
//!
//! Failures are isolated to the smallest unit — one file, one paper, or
//! the whole synthesis step — and recorded as structured error entries.
//! The only run-terminating condition is zero papers accepted in Stage 1.
//! Processing is strictly sequential: items run in input order and no two
//! external calls overlap.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use paperlens_db::{
    NewPaper, NewSummary, NewSynthesis, PaperRecord, PaperRepository, SummaryRecord,
    SummaryRepository, SynthesisRecord, SynthesisRepository,
};
use paperlens_extract::DocumentExtractor;
use paperlens_llm::CompletionClient;

use crate::output::OutputSink;
use crate::parser;
use crate::prompts;
use crate::report::{
    OutcomeStatus, ParseOutcome, RunResult, StageError, SummarizeOutcome, SynthesisOutcome,
};

// ── Config ────────────────────────────────────────────────────────────────────

/// Truncation limits for prompt building and raw-reply fallbacks.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Chars of full text embedded in the summary prompt.
    pub full_text_limit: usize,
    /// Chars of each abstract embedded in the synthesis prompt.
    pub abstract_limit: usize,
    /// Chars of raw reply stored when no SUMMARY section parsed.
    pub summary_fallback_limit: usize,
    /// Chars of raw reply stored when no SYNTHESIS section parsed.
    pub synthesis_fallback_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            full_text_limit: 3000,
            abstract_limit: 300,
            summary_fallback_limit: 500,
            synthesis_fallback_limit: 800,
        }
    }
}

// ── Progress / stored results ─────────────────────────────────────────────────

/// Current database-level progress, independent of any single run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineProgress {
    pub papers_parsed: i64,
    pub papers_summarized: i64,
    pub syntheses_generated: i64,
    pub status: String,
}

/// Everything persisted so far, for the results/chat front-ends.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredResults {
    pub papers: Vec<PaperRecord>,
    pub summaries: Vec<SummaryRecord>,
    pub synthesis: Option<SynthesisRecord>,
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

pub struct ResearchOrchestrator {
    extractor: Arc<dyn DocumentExtractor>,
    completion: CompletionClient,
    papers: PaperRepository,
    summaries: SummaryRepository,
    syntheses: SynthesisRepository,
    output: Arc<dyn OutputSink>,
    config: PipelineConfig,
}

impl ResearchOrchestrator {
    pub fn new(
        extractor: Arc<dyn DocumentExtractor>,
        completion: CompletionClient,
        papers: PaperRepository,
        summaries: SummaryRepository,
        syntheses: SynthesisRepository,
        output: Arc<dyn OutputSink>,
        config: PipelineConfig,
    ) -> Self {
        Self { extractor, completion, papers, summaries, syntheses, output, config }
    }

    /// Run the three-stage workflow over the given PDFs, in order.
    ///
    /// Never errors: every collaborator failure is converted into a
    /// structured entry in the returned result.
    pub async fn process_papers(&self, pdf_paths: &[PathBuf]) -> RunResult {
        let run_id = Uuid::new_v4();
        let t0 = std::time::Instant::now();
        let mut result = RunResult::new(run_id);

        info!(run_id = %run_id, papers = pdf_paths.len(), "Starting research paper processing");

        // ── Stage 1: parse all PDFs ───────────────────────────────────────────
        info!("Stage 1: parsing PDFs");
        for (idx, path) in pdf_paths.iter().enumerate() {
            let file_name = file_name_of(path);
            info!(file = %file_name, n = idx + 1, total = pdf_paths.len(), "Parsing paper");

            match self.parse_one(path).await {
                Ok(paper_id) => {
                    result.paper_ids.push(paper_id);
                    result.parsing.push(ParseOutcome {
                        file_name,
                        path: path.display().to_string(),
                        status: OutcomeStatus::Success,
                        paper_id: Some(paper_id),
                    });
                }
                Err(message) => {
                    warn!(file = %file_name, error = %message, "Paper parse failed");
                    result.errors.push(StageError::parsing(&file_name, message));
                    result.parsing.push(ParseOutcome {
                        file_name,
                        path: path.display().to_string(),
                        status: OutcomeStatus::Failed,
                        paper_id: None,
                    });
                }
            }
        }

        if result.paper_ids.is_empty() {
            warn!(run_id = %run_id, "No papers were successfully parsed, aborting workflow");
            result.duration_ms = t0.elapsed().as_millis() as u64;
            return result;
        }
        info!(accepted = result.paper_ids.len(), "Stage 1 complete");

        // ── Stage 2: summarize each accepted paper ────────────────────────────
        info!("Stage 2: summarizing papers");
        let accepted = result.paper_ids.clone();
        for (idx, paper_id) in accepted.iter().enumerate() {
            info!(paper_id, n = idx + 1, total = accepted.len(), "Summarizing paper");

            match self.summarize_one(*paper_id).await {
                Ok(()) => result.summarization.push(SummarizeOutcome {
                    paper_id: *paper_id,
                    status: OutcomeStatus::Success,
                }),
                Err(message) => {
                    warn!(paper_id, error = %message, "Paper summarization failed");
                    result.errors.push(StageError::summarization(*paper_id, message));
                    result.summarization.push(SummarizeOutcome {
                        paper_id: *paper_id,
                        status: OutcomeStatus::Failed,
                    });
                }
            }
        }
        info!(summarized = result.summarized_ok(), "Stage 2 complete");

        // ── Stage 3: cross-paper synthesis ────────────────────────────────────
        info!("Stage 3: synthesizing insights");
        match self.synthesize(&accepted).await {
            Ok(outcome) => {
                info!(synthesis_id = outcome.synthesis_id, "Stage 3 complete");
                result.synthesis = Some(outcome);
            }
            Err(message) => {
                warn!(error = %message, "Synthesis failed");
                result.errors.push(StageError::synthesis(message));
            }
        }

        result.duration_ms = t0.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            parsed = result.parsed_ok(),
            summarized = result.summarized_ok(),
            synthesis = result.synthesis.is_some(),
            errors = result.errors.len(),
            duration_ms = result.duration_ms,
            "Workflow complete"
        );
        result
    }

    /// Stage 1 unit of work: text, metadata, paper row.
    async fn parse_one(&self, path: &Path) -> Result<i64, String> {
        let extracted = self
            .extractor
            .extract_text(path)
            .await
            .map_err(|e| format!("PDF parsing failed: {e}"))?;

        let metadata = self
            .extractor
            .extract_metadata(path)
            .await
            .map_err(|e| format!("Metadata extraction failed: {e}"))?;

        let paper_id = self
            .papers
            .insert(&NewPaper {
                title: metadata.title,
                authors: metadata.authors,
                abstract_text: metadata.abstract_text,
                year: metadata.year,
                full_text: extracted.text,
                file_path: path.display().to_string(),
                file_name: extracted.file_name,
                page_count: extracted.page_count as i64,
                extra_metadata: serde_json::json!({}),
            })
            .map_err(|e| format!("Database storage failed: {e}"))?;

        Ok(paper_id)
    }

    /// Stage 2 unit of work: fetch, prompt, parse, store, side files.
    async fn summarize_one(&self, paper_id: i64) -> Result<(), String> {
        let paper = self
            .papers
            .get(paper_id)
            .map_err(|e| format!("Failed to retrieve paper: {e}"))?
            .ok_or_else(|| format!("Paper {paper_id} not found"))?;

        let prompt = prompts::summary_prompt(&paper, self.config.full_text_limit);
        let reply = self
            .completion
            .complete_text(prompts::SUMMARIZER_SYSTEM, &prompt)
            .await
            .map_err(|e| format!("Completion failed: {e}"))?;

        let fields = parser::parse_summary_reply(&reply);
        let summary_text = fields
            .summary
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| prompts::truncate(&reply, self.config.summary_fallback_limit));

        self.summaries
            .insert(&NewSummary {
                paper_id,
                summary_text,
                key_findings: fields.key_findings.clone(),
                methodology: fields.methodology.clone(),
                contributions: fields.contributions.clone(),
                limitations: fields.limitations.clone(),
            })
            .map_err(|e| format!("Failed to store summary: {e}"))?;

        // Side files are fire-and-forget; the sink absorbs its own errors.
        self.output.write_paper_outputs(&paper, &fields);

        Ok(())
    }

    /// Stage 3: one synthesis pass plus the cited mini-survey.
    async fn synthesize(&self, accepted_ids: &[i64]) -> Result<SynthesisOutcome, String> {
        let all_papers = self
            .papers
            .get_all()
            .map_err(|e| format!("Failed to retrieve papers: {e}"))?;
        if all_papers.is_empty() {
            return Err("No papers found for synthesis".to_string());
        }

        let context = prompts::papers_context(&all_papers, self.config.abstract_limit);
        let prompt = prompts::synthesis_prompt(&context, all_papers.len());
        let reply = self
            .completion
            .complete_text(prompts::SYNTHESIS_SYSTEM, &prompt)
            .await
            .map_err(|e| format!("Synthesis completion failed: {e}"))?;

        let fields = parser::parse_synthesis_reply(&reply);

        info!("Generating mini-survey with inline citations");
        let references = prompts::reference_list(&all_papers, accepted_ids)
            .ok_or_else(|| "Accepted paper missing from database".to_string())?;

        let survey_prompt = prompts::survey_prompt(
            &context,
            fields.synthesis.as_deref().unwrap_or(""),
            &fields.themes,
            &fields.gaps,
        );
        let survey_reply = self
            .completion
            .complete_text(prompts::SYNTHESIS_SYSTEM, &survey_prompt)
            .await
            .map_err(|e| format!("Survey completion failed: {e}"))?;

        let mut survey = survey_reply.trim().to_string();
        if !survey.contains("## References") {
            survey.push_str(&format!("\n\n## References\n{references}"));
        }

        let synthesis_text = fields
            .synthesis
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| prompts::truncate(&reply, self.config.synthesis_fallback_limit));

        let new_synthesis = NewSynthesis {
            synthesis_text,
            common_themes: fields.themes,
            research_gaps: fields.gaps,
            future_directions: fields.directions,
            mini_survey: Some(survey.clone()),
            papers_included: accepted_ids.to_vec(),
        };

        let synthesis_id = self
            .syntheses
            .insert(&new_synthesis)
            .map_err(|e| format!("Failed to store synthesis: {e}"))?;

        self.output.write_synthesis_outputs(&new_synthesis, &survey);

        Ok(SynthesisOutcome {
            synthesis_id,
            paper_count: accepted_ids.len(),
        })
    }

    /// Database-level progress counts for the status front-end.
    pub fn progress(&self) -> paperlens_db::Result<PipelineProgress> {
        let papers_parsed = self.papers.count()?;
        Ok(PipelineProgress {
            papers_parsed,
            papers_summarized: self.summaries.count()?,
            syntheses_generated: self.syntheses.count()?,
            status: if papers_parsed > 0 { "active" } else { "idle" }.to_string(),
        })
    }

    /// Everything persisted so far: papers, summaries, latest synthesis.
    pub fn results(&self) -> paperlens_db::Result<StoredResults> {
        Ok(StoredResults {
            papers: self.papers.get_all()?,
            summaries: self.summaries.get_all()?,
            synthesis: self.syntheses.latest()?,
        })
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
