//! Configuration loading for PaperLens.
//! Reads paperlens.toml from the current directory or the path in the
//! PAPERLENS_CONFIG env var. CLI flags override individual fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub papers: PapersConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf { PathBuf::from("database/paperlens.db") }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend()      -> String { "ollama".to_string() }
fn default_base_url()     -> String { "http://localhost:11434".to_string() }
fn default_model()        -> String { "gemma3:1b".to_string() }
fn default_temperature()  -> f32    { 0.0 }
fn default_max_tokens()   -> u32    { 4000 }
fn default_attempts()     -> u32    { 3 }
fn default_timeout_secs() -> u64    { 300 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend:      default_backend(),
            base_url:     default_base_url(),
            model:        default_model(),
            api_key:      None,
            temperature:  default_temperature(),
            max_tokens:   default_max_tokens(),
            attempts:     default_attempts(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PapersConfig {
    #[serde(default = "default_papers_dir")]
    pub dir: PathBuf,
}

fn default_papers_dir() -> PathBuf { PathBuf::from("papers") }

impl Default for PapersConfig {
    fn default() -> Self {
        Self { dir: default_papers_dir() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf { PathBuf::from("data") }

impl Default for OutputConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir() }
    }
}

impl Config {
    /// Load configuration from paperlens.toml.
    /// Checks PAPERLENS_CONFIG env var first, then the current directory.
    /// A missing file yields the defaults — PaperLens runs out of the box
    /// against a local Ollama.
    pub fn load() -> crate::Result<Self> {
        let path = std::env::var("PAPERLENS_CONFIG")
            .unwrap_or_else(|_| "paperlens.toml".to_string());

        if !Path::new(&path).exists() {
            tracing::debug!(path = %path, "No config file found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_local_ollama() {
        let cfg = Config::default();
        assert_eq!(cfg.llm.backend, "ollama");
        assert!(cfg.llm.base_url.contains("localhost"));
        assert_eq!(cfg.llm.attempts, 3);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [llm]
            model = "llama3.2:3b"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.llm.model, "llama3.2:3b");
        assert_eq!(cfg.llm.base_url, default_base_url());
        assert_eq!(cfg.database.path, default_db_path());
    }

    #[test]
    fn test_temperature_zero_for_reproducibility() {
        assert_eq!(default_temperature(), 0.0);
    }
}
