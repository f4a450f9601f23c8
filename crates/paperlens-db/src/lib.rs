//! paperlens-db — SQLite persistence for papers, summaries, and syntheses.
//!
//! Embedded storage, no external server. One repository per entity over a
//! shared `Database` handle. Every create commits independently; a paper
//! stored without a summary is a valid partial state the readers tolerate.

pub mod database;
pub mod error;
pub mod papers;
pub mod schema;
pub mod summaries;
pub mod syntheses;

pub use database::Database;
pub use error::{DbError, Result};
pub use papers::PaperRepository;
pub use schema::{
    NewPaper, NewSummary, NewSynthesis, PaperRecord, SummaryRecord, SynthesisRecord,
};
pub use summaries::SummaryRepository;
pub use syntheses::SynthesisRepository;
