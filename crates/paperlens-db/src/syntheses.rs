//! Synthesis repository.
//!
//! Rows accumulate across pipeline runs; "latest" is the row with the
//! greatest created_at, with id as tiebreak so repeated runs inside one
//! timestamp tick stay deterministic.

use crate::database::Database;
use crate::error::Result;
use crate::schema::{NewSynthesis, SynthesisRecord};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct SynthesisRepository {
    db: Arc<Database>,
}

impl SynthesisRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a synthesis. `paper_count` is derived from `papers_included`.
    pub fn insert(&self, synthesis: &NewSynthesis) -> Result<i64> {
        let conn = self.db.conn()?;
        conn.execute(
            "INSERT INTO syntheses
                 (synthesis_text, common_themes, research_gaps, future_directions,
                  mini_survey, papers_included, paper_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                synthesis.synthesis_text,
                serde_json::to_string(&synthesis.common_themes)?,
                serde_json::to_string(&synthesis.research_gaps)?,
                serde_json::to_string(&synthesis.future_directions)?,
                synthesis.mini_survey,
                serde_json::to_string(&synthesis.papers_included)?,
                synthesis.papers_included.len() as i64,
                Utc::now(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!(
            synthesis_id = id,
            papers = synthesis.papers_included.len(),
            "Synthesis stored"
        );
        Ok(id)
    }

    /// The most recently created synthesis, if any.
    pub fn latest(&self) -> Result<Option<SynthesisRecord>> {
        let conn = self.db.conn()?;
        let record = conn
            .query_row(
                "SELECT id, synthesis_text, common_themes, research_gaps,
                        future_directions, mini_survey, papers_included,
                        paper_count, created_at
                 FROM syntheses ORDER BY created_at DESC, id DESC LIMIT 1",
                [],
                row_to_synthesis,
            )
            .optional()?;
        Ok(record)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.db.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM syntheses", [], |r| r.get(0))?)
    }
}

fn row_to_synthesis(row: &Row<'_>) -> rusqlite::Result<SynthesisRecord> {
    let themes: String = row.get("common_themes")?;
    let gaps: String = row.get("research_gaps")?;
    let directions: String = row.get("future_directions")?;
    let included: String = row.get("papers_included")?;
    Ok(SynthesisRecord {
        id: row.get("id")?,
        synthesis_text: row.get("synthesis_text")?,
        common_themes: serde_json::from_str(&themes).unwrap_or_default(),
        research_gaps: serde_json::from_str(&gaps).unwrap_or_default(),
        future_directions: serde_json::from_str(&directions).unwrap_or_default(),
        mini_survey: row.get("mini_survey")?,
        papers_included: serde_json::from_str(&included).unwrap_or_default(),
        paper_count: row.get("paper_count")?,
        created_at: row.get("created_at")?,
    })
}
