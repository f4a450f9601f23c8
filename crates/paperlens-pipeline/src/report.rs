//! Per-run result aggregation.
//!
//! Built fresh on every `process_papers` call and returned to the caller
//! for rendering; only the database rows and side files outlive it.

use serde::Serialize;
use uuid::Uuid;

/// Pipeline stage an error or outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Parsing,
    Summarization,
    Synthesis,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Parsing => write!(f, "parsing"),
            Stage::Summarization => write!(f, "summarization"),
            Stage::Synthesis => write!(f, "synthesis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

/// One structured error entry. `item` names the failed unit — a file name
/// in Stage 1, a paper id in Stage 2, absent for the single Stage 3 step.
#[derive(Debug, Clone, Serialize)]
pub struct StageError {
    pub stage: Stage,
    pub item: Option<String>,
    pub message: String,
}

impl StageError {
    pub fn parsing(file_name: &str, message: impl Into<String>) -> Self {
        Self {
            stage: Stage::Parsing,
            item: Some(file_name.to_string()),
            message: message.into(),
        }
    }

    pub fn summarization(paper_id: i64, message: impl Into<String>) -> Self {
        Self {
            stage: Stage::Summarization,
            item: Some(paper_id.to_string()),
            message: message.into(),
        }
    }

    pub fn synthesis(message: impl Into<String>) -> Self {
        Self {
            stage: Stage::Synthesis,
            item: None,
            message: message.into(),
        }
    }
}

/// Stage 1 outcome for one input path, success or failure.
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutcome {
    pub file_name: String,
    pub path: String,
    pub status: OutcomeStatus,
    pub paper_id: Option<i64>,
}

/// Stage 2 outcome for one accepted paper.
#[derive(Debug, Clone, Serialize)]
pub struct SummarizeOutcome {
    pub paper_id: i64,
    pub status: OutcomeStatus,
}

/// Stage 3 outcome; present only when the synthesis row was stored.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisOutcome {
    pub synthesis_id: i64,
    pub paper_count: usize,
}

/// Aggregate of one pipeline invocation.
///
/// `synthesis` is `None` both when Stage 3 never ran and when it failed;
/// the two cases are told apart by the presence of a synthesis-tagged
/// entry in `errors`.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub parsing: Vec<ParseOutcome>,
    pub summarization: Vec<SummarizeOutcome>,
    pub synthesis: Option<SynthesisOutcome>,
    pub errors: Vec<StageError>,
    pub paper_ids: Vec<i64>,
    pub duration_ms: u64,
}

impl RunResult {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            parsing: Vec::new(),
            summarization: Vec::new(),
            synthesis: None,
            errors: Vec::new(),
            paper_ids: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn parsed_ok(&self) -> usize {
        self.parsing
            .iter()
            .filter(|p| p.status == OutcomeStatus::Success)
            .count()
    }

    pub fn summarized_ok(&self) -> usize {
        self.summarization
            .iter()
            .filter(|s| s.status == OutcomeStatus::Success)
            .count()
    }
}
