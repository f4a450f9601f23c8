//! Interactive chat over analyzed papers.
//!
//! The stored papers, summaries, and latest synthesis are folded into the
//! system prompt so the model answers from the database contents directly;
//! each user turn is a single completion call.

use anyhow::bail;
use std::io::{BufRead, Write};
use tracing::info;

use paperlens_db::{PaperRepository, SummaryRepository, SynthesisRepository};
use paperlens_llm::CompletionClient;
use paperlens_pipeline::prompts::truncate;

const MAX_CONTEXT_PAPERS: usize = 10;

pub async fn run_chat(
    papers: &PaperRepository,
    summaries: &SummaryRepository,
    syntheses: &SynthesisRepository,
    client: &CompletionClient,
) -> anyhow::Result<()> {
    let paper_count = papers.count()?;
    if paper_count == 0 {
        bail!(
            "no analyzed papers found in the database; \
             run `paperlens analyze --papers-dir papers/` first"
        );
    }

    let all_papers = papers.get_all()?;
    let all_summaries = summaries.get_all()?;
    let latest_synthesis = syntheses.latest()?;

    println!("PaperLens Research Assistant — interactive chat");
    println!();
    println!("Found {paper_count} analyzed paper(s):");
    for (i, paper) in all_papers.iter().enumerate() {
        let year = paper
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        println!("  {}. {} ({})", i + 1, paper.title, year);
    }
    println!();
    println!("Summaries available: {}", all_summaries.len());
    println!(
        "Synthesis available: {}",
        if latest_synthesis.is_some() { "yes" } else { "no" }
    );
    println!();
    println!("Ask questions about the papers, summaries, or synthesis.");
    println!("Type 'exit' or 'quit' to end the chat.");
    println!();

    let system_prompt = build_context_prompt(&all_papers, &all_summaries, latest_synthesis.as_ref());
    info!(
        papers = all_papers.len(),
        summaries = all_summaries.len(),
        model = client.model_id(),
        "Chat context loaded"
    );

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("You: ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "bye") {
            break;
        }

        match client.complete_text(&system_prompt, input).await {
            Ok(reply) => println!("\nAssistant: {}\n", reply.trim()),
            Err(e) => println!("\nAssistant unavailable: {e}\n"),
        }
    }

    println!("Chat ended.");
    Ok(())
}

/// Fold database contents into a system prompt, truncated per entry so a
/// handful of papers fits comfortably in a small model's context.
fn build_context_prompt(
    papers: &[paperlens_db::PaperRecord],
    summaries: &[paperlens_db::SummaryRecord],
    synthesis: Option<&paperlens_db::SynthesisRecord>,
) -> String {
    let mut parts: Vec<String> = vec![
        "You are a research assistant that helps users understand and explore analyzed research papers.".into(),
        String::new(),
        "Guidelines:".into(),
        "- Be helpful and conversational".into(),
        "- Cite paper titles when referencing".into(),
        "- If information isn't available, say so".into(),
        String::new(),
        "=== DATABASE CONTENTS ===".into(),
        String::new(),
    ];

    parts.push(format!("PAPERS ({}):", papers.len()));
    for (i, paper) in papers.iter().take(MAX_CONTEXT_PAPERS).enumerate() {
        let year = paper
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        parts.push(format!(
            "{}. [{}] {} by {} ({})",
            i + 1,
            paper.id,
            paper.title,
            paper.authors,
            year
        ));
        if !paper.abstract_text.is_empty() {
            parts.push(format!("   Abstract: {}", truncate(&paper.abstract_text, 200)));
        }
    }
    parts.push(String::new());

    if !summaries.is_empty() {
        parts.push(format!("SUMMARIES ({}):", summaries.len()));
        for summary in summaries {
            parts.push(format!("Paper {}:", summary.paper_id));
            parts.push(format!("   Summary: {}", truncate(&summary.summary_text, 300)));
            if let Some(ref findings) = summary.key_findings {
                parts.push(format!("   Key findings: {}", truncate(findings, 200)));
            }
        }
        parts.push(String::new());
    }

    if let Some(synthesis) = synthesis {
        parts.push("SYNTHESIS:".into());
        parts.push(format!("Overview: {}", truncate(&synthesis.synthesis_text, 400)));
        if !synthesis.common_themes.is_empty() {
            let themes: Vec<&str> = synthesis
                .common_themes
                .iter()
                .take(5)
                .map(String::as_str)
                .collect();
            parts.push(format!("Themes: {}", themes.join(", ")));
        }
        parts.push(String::new());
    }

    parts.push("Answer questions directly from this context.".into());
    parts.join("\n")
}
