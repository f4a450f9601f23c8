//! End-to-end pipeline tests with a deterministic mock completion backend
//! and a scripted extractor, over a real in-memory database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use paperlens_db::{Database, PaperRepository, SummaryRepository, SynthesisRepository};
use paperlens_extract::{
    DocumentExtractor, ExtractError, ExtractedText, PaperMetadata, Result as ExtractResult,
};
use paperlens_llm::{
    CompletionClient, CompletionRequest, CompletionResponse, LlmBackend, LlmError,
};
use paperlens_pipeline::{
    FsOutputWriter, OutcomeStatus, PipelineConfig, ResearchOrchestrator, Stage,
};

// ── Mock extractor ────────────────────────────────────────────────────────────

/// Extractor scripted per file name; unknown files fail extraction.
struct ScriptedExtractor {
    docs: HashMap<String, (String, usize, PaperMetadata)>,
}

impl ScriptedExtractor {
    fn new() -> Self {
        Self { docs: HashMap::new() }
    }

    fn with_doc(mut self, file_name: &str, title: &str, year: Option<i32>) -> Self {
        let text = format!("--- Page 1 ---\nBody of {title}. ");
        let meta = PaperMetadata {
            title: title.to_string(),
            authors: "Doe J, Smith A".to_string(),
            abstract_text: format!("Abstract of {title}."),
            year,
        };
        self.docs.insert(file_name.to_string(), (text, 1, meta));
        self
    }
}

#[async_trait]
impl DocumentExtractor for ScriptedExtractor {
    async fn extract_text(&self, path: &Path) -> ExtractResult<ExtractedText> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        match self.docs.get(&name) {
            Some((text, pages, _)) => Ok(ExtractedText {
                text: text.clone(),
                page_count: *pages,
                file_name: name,
            }),
            None => Err(ExtractError::FileNotFound(path.to_path_buf())),
        }
    }

    async fn extract_metadata(&self, path: &Path) -> ExtractResult<PaperMetadata> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        match self.docs.get(&name) {
            Some((_, _, meta)) => Ok(meta.clone()),
            None => Err(ExtractError::FileNotFound(path.to_path_buf())),
        }
    }
}

// ── Mock completion backend ───────────────────────────────────────────────────

/// Routes replies on prompt shape: summary prompts get a five-label reply,
/// synthesis prompts a four-label reply, survey prompts a survey without a
/// References section (so the pipeline must append one).
struct ScriptedBackend {
    calls: AtomicU32,
    /// Titles whose summary call should fail terminally.
    fail_summary_for: Vec<String>,
    /// Reply used for summary prompts; defaults to a well-formed one.
    summary_reply: Option<String>,
}

impl ScriptedBackend {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_summary_for: Vec::new(),
            summary_reply: None,
        }
    }

    fn failing_summaries_for(mut self, title: &str) -> Self {
        self.fail_summary_for.push(title.to_string());
        self
    }

    fn with_summary_reply(mut self, reply: &str) -> Self {
        self.summary_reply = Some(reply.to_string());
        self
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let user = req
            .messages
            .iter()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let content = if user.contains("structured summary") {
            for title in &self.fail_summary_for {
                if user.contains(title) {
                    return Err(LlmError::ApiError {
                        status: 400,
                        message: format!("refusing to summarize {title}"),
                    });
                }
            }
            self.summary_reply.clone().unwrap_or_else(|| {
                "SUMMARY: A concise overview.\n\
                 KEY_FINDINGS: Finding one.\n\
                 METHODOLOGY: Benchmarks.\n\
                 CONTRIBUTIONS: A new method.\n\
                 LIMITATIONS: Narrow scope."
                    .to_string()
            })
        } else if user.contains("cross-paper synthesis") {
            "SYNTHESIS: The papers share a focus on efficiency.\n\
             THEMES:\n- Efficiency\n- Robust evaluation\n\
             GAPS:\n- Multilingual coverage\n\
             DIRECTIONS:\n- Hardware-aware methods"
                .to_string()
        } else if user.contains("mini-survey") {
            "## Introduction\nA short survey [1].\n\n## Key Themes\nEfficiency [1], [2].\n\n\
             ## Research Gaps and Opportunities\nCoverage gaps.\n\n## Conclusion\nPromising field."
                .to_string()
        } else {
            String::new()
        };

        Ok(CompletionResponse {
            content,
            model: "mock".to_string(),
            prompt_tokens: 0,
            completion_tokens: 0,
        })
    }

    fn model_id(&self) -> &str { "mock" }
    fn is_local(&self) -> bool { true }
}

// ── Harness ───────────────────────────────────────────────────────────────────

struct Harness {
    orchestrator: ResearchOrchestrator,
    backend: Arc<ScriptedBackend>,
    papers: PaperRepository,
    summaries: SummaryRepository,
    syntheses: SynthesisRepository,
    _data_dir: tempfile::TempDir,
    data_path: PathBuf,
}

fn harness(extractor: ScriptedExtractor, backend: ScriptedBackend) -> Harness {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let papers = PaperRepository::new(db.clone());
    let summaries = SummaryRepository::new(db.clone());
    let syntheses = SynthesisRepository::new(db);
    let backend = Arc::new(backend);
    let client = CompletionClient::new(backend.clone());
    let data_dir = tempfile::tempdir().unwrap();
    let data_path = data_dir.path().to_path_buf();
    let orchestrator = ResearchOrchestrator::new(
        Arc::new(extractor),
        client,
        papers.clone(),
        summaries.clone(),
        syntheses.clone(),
        Arc::new(FsOutputWriter::new(&data_path)),
        PipelineConfig::default(),
    );
    Harness {
        orchestrator,
        backend,
        papers,
        summaries,
        syntheses,
        _data_dir: data_dir,
        data_path,
    }
}

fn paths(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(|n| PathBuf::from(format!("/papers/{n}"))).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn all_success_run_processes_every_paper_in_order() {
    let extractor = ScriptedExtractor::new()
        .with_doc("alpha.pdf", "Paper Alpha", Some(2021))
        .with_doc("beta.pdf", "Paper Beta", Some(2022))
        .with_doc("gamma.pdf", "Paper Gamma", None);
    let h = harness(extractor, ScriptedBackend::new());

    let result = h
        .orchestrator
        .process_papers(&paths(&["alpha.pdf", "beta.pdf", "gamma.pdf"]))
        .await;

    assert_eq!(result.parsing.len(), 3);
    assert!(result.parsing.iter().all(|p| p.status == OutcomeStatus::Success));
    assert_eq!(result.paper_ids.len(), 3);
    assert!(result.errors.is_empty());

    // Accepted order matches input order.
    let titles: Vec<String> = result
        .paper_ids
        .iter()
        .map(|id| h.papers.get(*id).unwrap().unwrap().title)
        .collect();
    assert_eq!(titles, vec!["Paper Alpha", "Paper Beta", "Paper Gamma"]);

    // Stage 2 ran for every accepted paper, in the same order.
    let attempted: Vec<i64> = result.summarization.iter().map(|s| s.paper_id).collect();
    assert_eq!(attempted, result.paper_ids);
    assert_eq!(h.summaries.count().unwrap(), 3);

    // Stage 3 stored one synthesis over all accepted papers.
    let outcome = result.synthesis.expect("synthesis should be present");
    assert_eq!(outcome.paper_count, 3);
    let stored = h.syntheses.latest().unwrap().unwrap();
    assert_eq!(stored.papers_included, result.paper_ids);
    assert_eq!(stored.common_themes, vec!["Efficiency", "Robust evaluation"]);
}

#[tokio::test]
async fn survey_gets_references_appended_when_reply_lacks_them() {
    let extractor = ScriptedExtractor::new().with_doc("alpha.pdf", "Paper Alpha", Some(2021));
    let h = harness(extractor, ScriptedBackend::new());

    let result = h.orchestrator.process_papers(&paths(&["alpha.pdf"])).await;
    let paper_id = result.paper_ids[0];

    let survey = h.syntheses.latest().unwrap().unwrap().mini_survey.unwrap();
    assert!(survey.contains("## References"));
    assert!(survey.contains("[1] Paper Alpha (2021)"));

    // And the side files exist with the survey content.
    let survey_file = std::fs::read_to_string(h.data_path.join("mini_survey.md")).unwrap();
    assert_eq!(survey_file, survey);
    assert!(h.data_path.join(format!("paper_{paper_id}/metadata.json")).exists());
    assert!(h.data_path.join(format!("paper_{paper_id}/summary.json")).exists());
    assert!(h.data_path.join("synthesis.json").exists());
}

#[tokio::test]
async fn one_failing_pdf_does_not_abort_the_batch() {
    // beta.pdf is not scripted, so its extraction fails.
    let extractor = ScriptedExtractor::new()
        .with_doc("alpha.pdf", "Paper Alpha", Some(2021))
        .with_doc("gamma.pdf", "Paper Gamma", Some(2023));
    let h = harness(extractor, ScriptedBackend::new());

    let result = h
        .orchestrator
        .process_papers(&paths(&["alpha.pdf", "beta.pdf", "gamma.pdf"]))
        .await;

    assert_eq!(result.parsing.len(), 3);
    assert_eq!(result.parsed_ok(), 2);
    assert_eq!(result.paper_ids.len(), 2);

    let parse_errors: Vec<_> = result
        .errors
        .iter()
        .filter(|e| e.stage == Stage::Parsing)
        .collect();
    assert_eq!(parse_errors.len(), 1);
    assert_eq!(parse_errors[0].item.as_deref(), Some("beta.pdf"));

    // Stage 2 attempted exactly the accepted papers.
    let attempted: Vec<i64> = result.summarization.iter().map(|s| s.paper_id).collect();
    assert_eq!(attempted, result.paper_ids);

    // Stage 3 used exactly those two papers.
    assert_eq!(result.synthesis.unwrap().paper_count, 2);
    let stored = h.syntheses.latest().unwrap().unwrap();
    assert_eq!(stored.papers_included, result.paper_ids);
}

#[tokio::test]
async fn zero_accepted_papers_terminates_the_run() {
    let extractor = ScriptedExtractor::new(); // nothing scripted: every file fails
    let h = harness(extractor, ScriptedBackend::new());

    let result = h
        .orchestrator
        .process_papers(&paths(&["alpha.pdf", "beta.pdf"]))
        .await;

    assert_eq!(result.parsing.len(), 2);
    assert_eq!(result.parsed_ok(), 0);
    assert!(result.paper_ids.is_empty());
    assert!(result.summarization.is_empty());
    assert!(result.synthesis.is_none());
    assert!(result.errors.iter().all(|e| e.stage == Stage::Parsing));
    // Stages 2 and 3 never reached the completion service.
    assert_eq!(h.backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_input_yields_empty_result() {
    let h = harness(ScriptedExtractor::new(), ScriptedBackend::new());
    let result = h.orchestrator.process_papers(&[]).await;
    assert!(result.parsing.is_empty());
    assert!(result.paper_ids.is_empty());
    assert!(result.synthesis.is_none());
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn summarization_failure_is_isolated_to_one_paper() {
    let extractor = ScriptedExtractor::new()
        .with_doc("alpha.pdf", "Paper Alpha", Some(2021))
        .with_doc("beta.pdf", "Paper Beta", Some(2022));
    let backend = ScriptedBackend::new().failing_summaries_for("Paper Beta");
    let h = harness(extractor, backend);

    let result = h
        .orchestrator
        .process_papers(&paths(&["alpha.pdf", "beta.pdf"]))
        .await;

    assert_eq!(result.summarization.len(), 2);
    assert_eq!(result.summarized_ok(), 1);
    let failed: Vec<_> = result
        .summarization
        .iter()
        .filter(|s| s.status == OutcomeStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert!(result
        .errors
        .iter()
        .any(|e| e.stage == Stage::Summarization && e.item == Some(failed[0].paper_id.to_string())));

    // Only the successful paper got a summary row; Stage 3 still ran over
    // both accepted papers.
    assert_eq!(h.summaries.count().unwrap(), 1);
    assert_eq!(result.synthesis.unwrap().paper_count, 2);
}

#[tokio::test]
async fn unstructured_reply_falls_back_to_truncated_raw_text() {
    let extractor = ScriptedExtractor::new().with_doc("alpha.pdf", "Paper Alpha", Some(2021));
    let rambling = "The model just rambled on. ".repeat(40); // > 500 chars
    let backend = ScriptedBackend::new().with_summary_reply(&rambling);
    let h = harness(extractor, backend);

    let result = h.orchestrator.process_papers(&paths(&["alpha.pdf"])).await;
    let paper_id = result.paper_ids[0];

    let summary = h.summaries.get_for_paper(paper_id).unwrap().unwrap();
    let expected: String = rambling.chars().take(500).collect();
    assert_eq!(summary.summary_text, expected);
    assert_eq!(summary.key_findings, None);
    assert_eq!(summary.methodology, None);
    assert_eq!(summary.contributions, None);
    assert_eq!(summary.limitations, None);
}

#[tokio::test]
async fn latest_synthesis_comes_from_the_second_run() {
    let extractor = ScriptedExtractor::new()
        .with_doc("alpha.pdf", "Paper Alpha", Some(2021))
        .with_doc("beta.pdf", "Paper Beta", Some(2022));
    let h = harness(extractor, ScriptedBackend::new());

    let first = h.orchestrator.process_papers(&paths(&["alpha.pdf"])).await;
    let second = h
        .orchestrator
        .process_papers(&paths(&["alpha.pdf", "beta.pdf"]))
        .await;

    assert_eq!(h.syntheses.count().unwrap(), 2);
    let latest = h.syntheses.latest().unwrap().unwrap();
    assert_eq!(latest.papers_included, second.paper_ids);
    assert_ne!(latest.papers_included, first.paper_ids);
}

#[tokio::test]
async fn progress_and_results_reflect_stored_rows() {
    let extractor = ScriptedExtractor::new().with_doc("alpha.pdf", "Paper Alpha", Some(2021));
    let h = harness(extractor, ScriptedBackend::new());

    let progress = h.orchestrator.progress().unwrap();
    assert_eq!(progress.papers_parsed, 0);
    assert_eq!(progress.status, "idle");

    h.orchestrator.process_papers(&paths(&["alpha.pdf"])).await;

    let progress = h.orchestrator.progress().unwrap();
    assert_eq!(progress.papers_parsed, 1);
    assert_eq!(progress.papers_summarized, 1);
    assert_eq!(progress.syntheses_generated, 1);
    assert_eq!(progress.status, "active");

    let results = h.orchestrator.results().unwrap();
    assert_eq!(results.papers.len(), 1);
    assert_eq!(results.summaries.len(), 1);
    assert!(results.synthesis.is_some());
}
