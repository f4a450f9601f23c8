//! PaperLens — research paper analysis pipeline.
//! Entry point for the CLI binary.

mod chat;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use paperlens_common::Config;
use paperlens_db::{Database, PaperRepository, SummaryRepository, SynthesisRepository};
use paperlens_extract::PdfExtractor;
use paperlens_llm::{CompletionClient, LlmBackend, OllamaBackend, OpenAiCompatibleBackend, RetryPolicy};
use paperlens_pipeline::{FsOutputWriter, PipelineConfig, ResearchOrchestrator, RunResult};

#[derive(Parser)]
#[command(name = "paperlens", version, about = "Research paper analysis pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, summarize, and synthesize a directory of PDF papers
    Analyze {
        /// Directory containing PDF research papers
        #[arg(short, long)]
        papers_dir: Option<PathBuf>,
        /// Directory for output data and results
        #[arg(short = 'o', long)]
        data_dir: Option<PathBuf>,
        /// SQLite database file
        #[arg(short, long)]
        db_path: Option<PathBuf>,
        /// Completion service base URL
        #[arg(long)]
        base_url: Option<String>,
        /// Model name
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Interactive chat over the analyzed papers
    Chat {
        /// SQLite database file
        #[arg(short, long)]
        db_path: Option<PathBuf>,
        /// Completion service base URL
        #[arg(long)]
        base_url: Option<String>,
        /// Model name
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Print processing progress counts
    Status {
        /// SQLite database file
        #[arg(short, long)]
        db_path: Option<PathBuf>,
    },
    /// Print stored papers, summaries, and the latest synthesis as JSON
    Results {
        /// SQLite database file
        #[arg(short, long)]
        db_path: Option<PathBuf>,
    },
}

fn build_backend(config: &Config) -> Arc<dyn LlmBackend> {
    let timeout = std::time::Duration::from_secs(config.llm.timeout_secs);
    match config.llm.backend.as_str() {
        "openai_compatible" => Arc::new(OpenAiCompatibleBackend::new(
            config.llm.base_url.clone(),
            config.llm.model.clone(),
            config.llm.api_key.clone(),
            timeout,
        )),
        _ => Arc::new(OllamaBackend::new(
            config.llm.base_url.clone(),
            config.llm.model.clone(),
            timeout,
        )),
    }
}

fn build_completion_client(config: &Config) -> CompletionClient {
    CompletionClient::new(build_backend(config))
        .with_policy(RetryPolicy {
            attempts: config.llm.attempts,
            ..RetryPolicy::default()
        })
        .with_sampling(config.llm.temperature, config.llm.max_tokens)
}

struct AppContext {
    orchestrator: ResearchOrchestrator,
    papers: PaperRepository,
    summaries: SummaryRepository,
    syntheses: SynthesisRepository,
    client: CompletionClient,
}

fn build_app(config: &Config) -> anyhow::Result<AppContext> {
    let db = Arc::new(
        Database::open(&config.database.path)
            .with_context(|| format!("opening database {}", config.database.path.display()))?,
    );
    let papers = PaperRepository::new(db.clone());
    let summaries = SummaryRepository::new(db.clone());
    let syntheses = SynthesisRepository::new(db);
    let client = build_completion_client(config);

    let orchestrator = ResearchOrchestrator::new(
        Arc::new(PdfExtractor::new()),
        client.clone(),
        papers.clone(),
        summaries.clone(),
        syntheses.clone(),
        Arc::new(FsOutputWriter::new(&config.output.data_dir)),
        PipelineConfig::default(),
    );

    Ok(AppContext { orchestrator, papers, summaries, syntheses, client })
}

/// List *.pdf files in a directory, sorted by file name.
fn discover_pdfs(dir: &PathBuf) -> anyhow::Result<Vec<PathBuf>> {
    let mut pdfs: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading papers directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map(|e| e.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

fn render_run_result(result: &RunResult) {
    println!();
    println!("Analysis complete.");
    println!("  Papers parsed:      {}/{}", result.parsed_ok(), result.parsing.len());
    println!("  Papers summarized:  {}", result.summarized_ok());
    println!(
        "  Synthesis:          {}",
        if result.synthesis.is_some() { "yes" } else { "no" }
    );

    if !result.errors.is_empty() {
        println!("  Errors: {}", result.errors.len());
        for error in &result.errors {
            match &error.item {
                Some(item) => println!("    [{}] {}: {}", error.stage, item, error.message),
                None => println!("    [{}] {}", error.stage, error.message),
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("paperlens=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    match cli.command {
        Commands::Analyze { papers_dir, data_dir, db_path, base_url, model } => {
            if let Some(dir) = papers_dir { config.papers.dir = dir; }
            if let Some(dir) = data_dir { config.output.data_dir = dir; }
            if let Some(path) = db_path { config.database.path = path; }
            if let Some(url) = base_url { config.llm.base_url = url; }
            if let Some(m) = model { config.llm.model = m; }

            let pdfs = discover_pdfs(&config.papers.dir)?;
            if pdfs.is_empty() {
                bail!("no PDF files found in {}", config.papers.dir.display());
            }

            println!("PaperLens — analyzing {} papers with {}", pdfs.len(), config.llm.model);
            for pdf in &pdfs {
                println!("  - {}", pdf.display());
            }

            let app = build_app(&config)?;
            info!(papers = pdfs.len(), model = %config.llm.model, "Starting analysis");
            let result = app.orchestrator.process_papers(&pdfs).await;
            render_run_result(&result);

            println!();
            println!("Results stored in:");
            println!("  Database: {}", config.database.path.display());
            println!("  Outputs:  {}", config.output.data_dir.display());
        }

        Commands::Chat { db_path, base_url, model } => {
            if let Some(path) = db_path { config.database.path = path; }
            if let Some(url) = base_url { config.llm.base_url = url; }
            if let Some(m) = model { config.llm.model = m; }

            let app = build_app(&config)?;
            chat::run_chat(&app.papers, &app.summaries, &app.syntheses, &app.client).await?;
        }

        Commands::Status { db_path } => {
            if let Some(path) = db_path { config.database.path = path; }
            let app = build_app(&config)?;
            let progress = app.orchestrator.progress()?;
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }

        Commands::Results { db_path } => {
            if let Some(path) = db_path { config.database.path = path; }
            let app = build_app(&config)?;
            let results = app.orchestrator.results()?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
