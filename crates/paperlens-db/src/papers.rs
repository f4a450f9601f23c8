//! Paper repository.

use crate::database::Database;
use crate::error::Result;
use crate::schema::{NewPaper, PaperRecord};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct PaperRepository {
    db: Arc<Database>,
}

impl PaperRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new paper, returning its assigned id.
    pub fn insert(&self, paper: &NewPaper) -> Result<i64> {
        let conn = self.db.conn()?;
        conn.execute(
            "INSERT INTO papers
                 (title, authors, abstract, year, full_text, file_path,
                  file_name, page_count, extra_metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                paper.title,
                paper.authors,
                paper.abstract_text,
                paper.year,
                paper.full_text,
                paper.file_path,
                paper.file_name,
                paper.page_count,
                serde_json::to_string(&paper.extra_metadata)?,
                Utc::now(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!(paper_id = id, title = %paper.title, "Paper stored");
        Ok(id)
    }

    /// Fetch one paper by id.
    pub fn get(&self, id: i64) -> Result<Option<PaperRecord>> {
        let conn = self.db.conn()?;
        let record = conn
            .query_row(
                "SELECT id, title, authors, abstract, year, full_text, file_path,
                        file_name, page_count, extra_metadata, created_at
                 FROM papers WHERE id = ?1",
                [id],
                row_to_paper,
            )
            .optional()?;
        Ok(record)
    }

    /// All papers in insertion order.
    pub fn get_all(&self) -> Result<Vec<PaperRecord>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, authors, abstract, year, full_text, file_path,
                    file_name, page_count, extra_metadata, created_at
             FROM papers ORDER BY id",
        )?;
        let rows = stmt.query_map([], row_to_paper)?;
        let mut papers = Vec::new();
        for row in rows {
            papers.push(row?);
        }
        Ok(papers)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.db.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM papers", [], |r| r.get(0))?)
    }
}

fn row_to_paper(row: &Row<'_>) -> rusqlite::Result<PaperRecord> {
    let extra: String = row.get("extra_metadata")?;
    Ok(PaperRecord {
        id: row.get("id")?,
        title: row.get("title")?,
        authors: row.get("authors")?,
        abstract_text: row.get("abstract")?,
        year: row.get("year")?,
        full_text: row.get("full_text")?,
        file_path: row.get("file_path")?,
        file_name: row.get("file_name")?,
        page_count: row.get("page_count")?,
        extra_metadata: serde_json::from_str(&extra).unwrap_or_default(),
        created_at: row.get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_paper(title: &str) -> NewPaper {
        NewPaper {
            title: title.to_string(),
            authors: "Doe J, Smith A".to_string(),
            abstract_text: "We study things.".to_string(),
            year: Some(2024),
            full_text: "--- Page 1 ---\nBody text.".to_string(),
            file_path: "/papers/sample.pdf".to_string(),
            file_name: "sample.pdf".to_string(),
            page_count: 12,
            extra_metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let repo = PaperRepository::new(Arc::new(Database::open_in_memory().unwrap()));
        let a = repo.insert(&sample_paper("First")).unwrap();
        let b = repo.insert(&sample_paper("Second")).unwrap();
        assert!(b > a);
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_get_roundtrip() {
        let repo = PaperRepository::new(Arc::new(Database::open_in_memory().unwrap()));
        let id = repo.insert(&sample_paper("Roundtrip")).unwrap();
        let paper = repo.get(id).unwrap().unwrap();
        assert_eq!(paper.title, "Roundtrip");
        assert_eq!(paper.year, Some(2024));
        assert_eq!(paper.page_count, 12);
    }

    #[test]
    fn test_get_missing_is_none() {
        let repo = PaperRepository::new(Arc::new(Database::open_in_memory().unwrap()));
        assert!(repo.get(99).unwrap().is_none());
    }

    #[test]
    fn test_get_all_preserves_insert_order() {
        let repo = PaperRepository::new(Arc::new(Database::open_in_memory().unwrap()));
        for title in ["A", "B", "C"] {
            repo.insert(&sample_paper(title)).unwrap();
        }
        let titles: Vec<String> = repo.get_all().unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }
}
