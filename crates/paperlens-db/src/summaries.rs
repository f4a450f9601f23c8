//! Summary repository.
//!
//! A summary references exactly one paper; inserting against a missing
//! paper id is rejected before any row is written.

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::schema::{NewSummary, SummaryRecord};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct SummaryRepository {
    db: Arc<Database>,
}

impl SummaryRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a summary for an existing paper, returning the summary id.
    pub fn insert(&self, summary: &NewSummary) -> Result<i64> {
        let conn = self.db.conn()?;

        let paper_exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM papers WHERE id = ?1",
            [summary.paper_id],
            |r| r.get(0),
        )?;
        if !paper_exists {
            warn!(paper_id = summary.paper_id, "Cannot store summary: paper not found");
            return Err(DbError::NotFound(format!("paper {}", summary.paper_id)));
        }

        conn.execute(
            "INSERT INTO summaries
                 (paper_id, summary_text, key_findings, methodology,
                  contributions, limitations, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                summary.paper_id,
                summary.summary_text,
                summary.key_findings,
                summary.methodology,
                summary.contributions,
                summary.limitations,
                Utc::now(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!(paper_id = summary.paper_id, summary_id = id, "Summary stored");
        Ok(id)
    }

    /// The summary for one paper, if any.
    pub fn get_for_paper(&self, paper_id: i64) -> Result<Option<SummaryRecord>> {
        let conn = self.db.conn()?;
        let record = conn
            .query_row(
                "SELECT id, paper_id, summary_text, key_findings, methodology,
                        contributions, limitations, created_at
                 FROM summaries WHERE paper_id = ?1 ORDER BY id LIMIT 1",
                [paper_id],
                row_to_summary,
            )
            .optional()?;
        Ok(record)
    }

    pub fn get_all(&self) -> Result<Vec<SummaryRecord>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, paper_id, summary_text, key_findings, methodology,
                    contributions, limitations, created_at
             FROM summaries ORDER BY id",
        )?;
        let rows = stmt.query_map([], row_to_summary)?;
        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.db.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM summaries", [], |r| r.get(0))?)
    }
}

fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<SummaryRecord> {
    Ok(SummaryRecord {
        id: row.get("id")?,
        paper_id: row.get("paper_id")?,
        summary_text: row.get("summary_text")?,
        key_findings: row.get("key_findings")?,
        methodology: row.get("methodology")?,
        contributions: row.get("contributions")?,
        limitations: row.get("limitations")?,
        created_at: row.get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::papers::PaperRepository;
    use crate::schema::NewPaper;

    fn setup() -> (PaperRepository, SummaryRepository, i64) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let papers = PaperRepository::new(db.clone());
        let summaries = SummaryRepository::new(db);
        let paper_id = papers
            .insert(&NewPaper {
                title: "A Paper".to_string(),
                authors: "Doe J".to_string(),
                abstract_text: "Abstract.".to_string(),
                year: Some(2023),
                full_text: "Body.".to_string(),
                file_path: "/p/a.pdf".to_string(),
                file_name: "a.pdf".to_string(),
                page_count: 3,
                extra_metadata: serde_json::json!({}),
            })
            .unwrap();
        (papers, summaries, paper_id)
    }

    fn sample_summary(paper_id: i64) -> NewSummary {
        NewSummary {
            paper_id,
            summary_text: "Two sentence overview.".to_string(),
            key_findings: Some("Finding one.".to_string()),
            methodology: None,
            contributions: None,
            limitations: Some("Small sample.".to_string()),
        }
    }

    #[test]
    fn test_insert_and_fetch_for_paper() {
        let (_papers, summaries, paper_id) = setup();
        summaries.insert(&sample_summary(paper_id)).unwrap();
        let stored = summaries.get_for_paper(paper_id).unwrap().unwrap();
        assert_eq!(stored.summary_text, "Two sentence overview.");
        assert_eq!(stored.methodology, None);
    }

    #[test]
    fn test_insert_for_missing_paper_is_rejected() {
        let (_papers, summaries, _paper_id) = setup();
        let err = summaries.insert(&sample_summary(999)).unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
        assert_eq!(summaries.count().unwrap(), 0);
    }

    #[test]
    fn test_no_summary_is_none() {
        let (_papers, summaries, paper_id) = setup();
        assert!(summaries.get_for_paper(paper_id).unwrap().is_none());
    }
}
