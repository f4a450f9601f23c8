//! paperlens-extract — PDF text and metadata extraction.
//!
//! Extraction is a two-call contract consumed by the pipeline:
//!   `extract_text`     — full text of every page plus the page count
//!   `extract_metadata` — best-effort title/authors/abstract/year, using
//!                        the PDF info dictionary first and text heuristics
//!                        as fallback
//!
//! Both calls are independent so that a metadata failure can be reported
//! separately from a text failure.

pub mod metadata;
pub mod pdf;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use metadata::PaperMetadata;
pub use pdf::PdfExtractor;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ExtractError>;

/// Full text of one document.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
    pub file_name: String,
}

/// Document extraction seam used by the orchestrator.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> Result<ExtractedText>;
    async fn extract_metadata(&self, path: &Path) -> Result<PaperMetadata>;
}
