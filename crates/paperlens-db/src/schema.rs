//! Record types stored in SQLite.
//!
//! `New*` structs carry insert payloads; `*Record` structs are what the
//! repositories read back, with ids and timestamps assigned by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Papers
// =============================================================================

/// Insert payload for one parsed paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaper {
    pub title: String,
    pub authors: String,
    pub abstract_text: String,
    pub year: Option<i32>,
    pub full_text: String,
    pub file_path: String,
    pub file_name: String,
    pub page_count: i64,
    pub extra_metadata: serde_json::Value,
}

/// Paper row. `title` and `full_text` are non-empty once stored; the
/// extractor supplies fallbacks before insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    pub id: i64,
    pub title: String,
    pub authors: String,
    pub abstract_text: String,
    pub year: Option<i32>,
    pub full_text: String,
    pub file_path: String,
    pub file_name: String,
    pub page_count: i64,
    pub extra_metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Summaries
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSummary {
    pub paper_id: i64,
    pub summary_text: String,
    pub key_findings: Option<String>,
    pub methodology: Option<String>,
    pub contributions: Option<String>,
    pub limitations: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub id: i64,
    pub paper_id: i64,
    pub summary_text: String,
    pub key_findings: Option<String>,
    pub methodology: Option<String>,
    pub contributions: Option<String>,
    pub limitations: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Syntheses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSynthesis {
    pub synthesis_text: String,
    pub common_themes: Vec<String>,
    pub research_gaps: Vec<String>,
    pub future_directions: Vec<String>,
    pub mini_survey: Option<String>,
    pub papers_included: Vec<i64>,
}

/// Cross-paper synthesis row. `paper_count` always equals the length of
/// `papers_included` at creation time; rows accumulate across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRecord {
    pub id: i64,
    pub synthesis_text: String,
    pub common_themes: Vec<String>,
    pub research_gaps: Vec<String>,
    pub future_directions: Vec<String>,
    pub mini_survey: Option<String>,
    pub papers_included: Vec<i64>,
    pub paper_count: i64,
    pub created_at: DateTime<Utc>,
}
