//! Side-file output writing.
//!
//! Best-effort by contract: a failed write is logged and absorbed, never
//! surfaced through the run result. The orchestrator holds the sink by
//! reference so tests can substitute their own.

use paperlens_db::{NewSynthesis, PaperRecord};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::parser::SummaryFields;

/// Output sink seam consumed by the orchestrator.
pub trait OutputSink: Send + Sync {
    /// Write metadata.json and summary.json for one summarized paper.
    fn write_paper_outputs(&self, paper: &PaperRecord, summary: &SummaryFields);

    /// Write synthesis.json and mini_survey.md for the aggregate result.
    fn write_synthesis_outputs(&self, synthesis: &NewSynthesis, survey: &str);
}

/// Filesystem sink writing under a data directory:
/// `paper_{id}/metadata.json`, `paper_{id}/summary.json`,
/// `synthesis.json`, `mini_survey.md`.
pub struct FsOutputWriter {
    data_dir: PathBuf,
}

impl FsOutputWriter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    fn write_json(&self, path: &Path, value: &serde_json::Value) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let pretty = serde_json::to_string_pretty(value)?;
        std::fs::write(path, pretty)?;
        info!(path = %path.display(), "Output written");
        Ok(())
    }

    fn write_text(&self, path: &Path, text: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        info!(path = %path.display(), "Output written");
        Ok(())
    }
}

impl OutputSink for FsOutputWriter {
    fn write_paper_outputs(&self, paper: &PaperRecord, summary: &SummaryFields) {
        let paper_dir = self.data_dir.join(format!("paper_{}", paper.id));

        let metadata = serde_json::json!({
            "paper_id": paper.id,
            "title": paper.title,
            "authors": paper.authors,
            "year": paper.year,
            "abstract": paper.abstract_text,
            "file_name": paper.file_name,
            "page_count": paper.page_count,
        });
        if let Err(e) = self.write_json(&paper_dir.join("metadata.json"), &metadata) {
            error!(paper_id = paper.id, error = %e, "Failed to write paper metadata");
        }

        let summary_json = serde_json::json!({
            "paper_id": paper.id,
            "summary": summary.summary.as_deref().unwrap_or(""),
            "key_findings": summary.key_findings.as_deref().unwrap_or(""),
            "methodology": summary.methodology.as_deref().unwrap_or(""),
            "contributions": summary.contributions.as_deref().unwrap_or(""),
            "limitations": summary.limitations.as_deref().unwrap_or(""),
        });
        if let Err(e) = self.write_json(&paper_dir.join("summary.json"), &summary_json) {
            error!(paper_id = paper.id, error = %e, "Failed to write paper summary");
        }
    }

    fn write_synthesis_outputs(&self, synthesis: &NewSynthesis, survey: &str) {
        let synthesis_json = serde_json::json!({
            "synthesis_text": synthesis.synthesis_text,
            "common_themes": synthesis.common_themes,
            "research_gaps": synthesis.research_gaps,
            "future_directions": synthesis.future_directions,
            "papers_included": synthesis.papers_included,
            "paper_count": synthesis.papers_included.len(),
        });
        if let Err(e) = self.write_json(&self.data_dir.join("synthesis.json"), &synthesis_json) {
            error!(error = %e, "Failed to write synthesis outputs");
        }

        if let Err(e) = self.write_text(&self.data_dir.join("mini_survey.md"), survey) {
            error!(error = %e, "Failed to write mini-survey");
        }
    }
}
