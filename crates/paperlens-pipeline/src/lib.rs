//! paperlens-pipeline — The research analysis pipeline.
//!
//! Drives the three sequential stages (parse, summarize, synthesize) over
//! the extraction, completion, persistence, and output collaborators, and
//! turns free-form model replies into structured fields.

pub mod orchestrator;
pub mod output;
pub mod parser;
pub mod prompts;
pub mod report;

pub use orchestrator::{PipelineConfig, PipelineProgress, ResearchOrchestrator, StoredResults};
pub use output::{FsOutputWriter, OutputSink};
pub use parser::{parse_summary_reply, parse_synthesis_reply, SummaryFields, SynthesisFields};
pub use report::{
    OutcomeStatus, ParseOutcome, RunResult, Stage, StageError, SummarizeOutcome, SynthesisOutcome,
};
