//! Database connection and schema management.

use crate::error::{DbError, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// Main database handle. Thread-safe via an internal mutex on the
/// connection; the pipeline issues one logical request at a time.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database file at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        info!(path = %path.display(), "Database opened");
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS papers (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                title          TEXT NOT NULL,
                authors        TEXT,
                abstract       TEXT,
                year           INTEGER,
                full_text      TEXT NOT NULL,
                file_path      TEXT,
                file_name      TEXT,
                page_count     INTEGER NOT NULL DEFAULT 0,
                extra_metadata TEXT NOT NULL DEFAULT '{}',
                created_at     TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_papers_title ON papers(title);

            CREATE TABLE IF NOT EXISTS summaries (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                paper_id      INTEGER NOT NULL REFERENCES papers(id) ON DELETE CASCADE,
                summary_text  TEXT NOT NULL,
                key_findings  TEXT,
                methodology   TEXT,
                contributions TEXT,
                limitations   TEXT,
                created_at    TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_summaries_paper ON summaries(paper_id);

            CREATE TABLE IF NOT EXISTS syntheses (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                synthesis_text    TEXT NOT NULL,
                common_themes     TEXT NOT NULL,
                research_gaps     TEXT NOT NULL,
                future_directions TEXT NOT NULL,
                mini_survey       TEXT,
                papers_included   TEXT NOT NULL,
                paper_count       INTEGER NOT NULL,
                created_at        TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}
