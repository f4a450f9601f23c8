//! paperlens-common — Shared error type and configuration used across all PaperLens crates.

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{PaperlensError, Result};
