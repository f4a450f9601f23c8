//! Prompt construction for the three model calls.
//!
//! Prompts ask for labeled plain-text sections rather than structured
//! output; the parsers in `parser.rs` are the other half of that
//! contract.

use paperlens_db::PaperRecord;

pub const SUMMARIZER_SYSTEM: &str = "\
You are a research paper summarizer. Analyze papers and provide structured summaries.

Output format:
SUMMARY: [2-3 sentence overview of the paper's main contribution and findings]
KEY_FINDINGS: [Bullet points of main results and discoveries]
METHODOLOGY: [Research methods and approaches used]
CONTRIBUTIONS: [Novel contributions to the field]
LIMITATIONS: [Limitations and future work needed]

Guidelines:
- Be concise and technical
- Focus on facts, not opinions
- Do not ask questions or suggest follow-ups
- Output only the structured analysis";

pub const SYNTHESIS_SYSTEM: &str = "\
You are a research synthesis analyzer. Analyze multiple papers to identify themes, gaps, and future directions.

Output format:
SYNTHESIS: [500-800 word analysis comparing papers, identifying patterns, discussing common approaches and divergent findings. Reference specific paper titles.]
THEMES: [List 3-5 common themes, one per line with dash. Be specific.]
GAPS: [List 3-5 research gaps, one per line with dash. Be concrete.]
DIRECTIONS: [List 3-5 future directions, one per line with dash. Be actionable.]

Guidelines:
- Reference papers by title in the synthesis
- Identify patterns and divergences
- Be specific and technical
- Do not ask questions or suggest follow-ups
- Output only the structured analysis";

/// Char-boundary-safe prefix.
pub fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Per-paper summarization prompt: metadata plus the opening slice of the
/// full text, with the five-label format instruction.
pub fn summary_prompt(paper: &PaperRecord, full_text_limit: usize) -> String {
    format!(
        "Analyze this research paper and provide a structured summary.\n\n\
         Title: {}\n\
         Authors: {}\n\
         Abstract: {}\n\n\
         Full Text (first {} chars):\n{}\n\n\
         Provide your analysis in this format:\n\
         SUMMARY: [2-3 sentence overview]\n\
         KEY_FINDINGS: [bullet points of main findings]\n\
         METHODOLOGY: [research methods used]\n\
         CONTRIBUTIONS: [novel contributions]\n\
         LIMITATIONS: [limitations and future work]",
        paper.title,
        paper.authors,
        paper.abstract_text,
        full_text_limit,
        truncate(&paper.full_text, full_text_limit),
    )
}

/// Shared paper context block used by the synthesis and survey prompts.
pub fn papers_context(papers: &[PaperRecord], abstract_limit: usize) -> String {
    let mut context = String::from("# Research Papers\n\n");
    for paper in papers {
        context.push_str(&format!(
            "## Paper {}: {}\nAuthors: {}\nAbstract: {}...\n\n",
            paper.id,
            paper.title,
            paper.authors,
            truncate(&paper.abstract_text, abstract_limit),
        ));
    }
    context
}

/// Cross-paper synthesis prompt with the four-label format instruction.
pub fn synthesis_prompt(context: &str, paper_count: usize) -> String {
    format!(
        "{context}\n\n\
         Analyze these {paper_count} papers and provide a cross-paper synthesis.\n\n\
         Output format:\n\
         SYNTHESIS: [500-800 word analysis discussing common themes, comparing approaches, and identifying patterns]\n\
         THEMES: [List 3-5 common themes, one per line starting with dash]\n\
         GAPS: [List 3-5 research gaps, one per line starting with dash]\n\
         DIRECTIONS: [List 3-5 future directions, one per line starting with dash]\n\n\
         Be specific and reference papers by their titles."
    )
}

/// Mini-survey prompt: fixed section template, word cap, and bracketed
/// numeric citations over the accepted papers.
pub fn survey_prompt(
    context: &str,
    synthesis_text: &str,
    themes: &[String],
    gaps: &[String],
) -> String {
    format!(
        "Generate a concise mini-survey (\u{2264}800 words) synthesizing these research papers.\n\n\
         Papers:\n{context}\n\n\
         Synthesis Summary:\n{synthesis_text}\n\n\
         Common Themes: {}\n\
         Research Gaps: {}\n\n\
         Format:\n\
         ## Introduction\n\
         [2-3 sentences on topic scope and relevance]\n\n\
         ## Key Themes\n\
         [Discuss main themes with inline citations like [1], [2]]\n\n\
         ## Research Gaps and Opportunities\n\
         [Identify gaps and future directions]\n\n\
         ## Conclusion\n\
         [1-2 sentences summarizing the field]\n\n\
         ## References\n\
         [Will be added automatically]\n\n\
         Use inline citations [1], [2], etc. when referencing specific papers.\n\
         Be concise, academic, and under 800 words total.",
        themes.join(", "),
        gaps.join(", "),
    )
}

/// `[index] title (year)` reference lines, 1-based over the accepted
/// papers in accepted order. Returns None when an accepted id has no
/// matching paper row.
pub fn reference_list(papers: &[PaperRecord], accepted_ids: &[i64]) -> Option<String> {
    let mut refs = Vec::with_capacity(accepted_ids.len());
    for (idx, paper_id) in accepted_ids.iter().enumerate() {
        let paper = papers.iter().find(|p| p.id == *paper_id)?;
        let year = paper
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        refs.push(format!("[{}] {} ({})", idx + 1, paper.title, year));
    }
    Some(refs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn paper(id: i64, title: &str, year: Option<i32>) -> PaperRecord {
        PaperRecord {
            id,
            title: title.to_string(),
            authors: "Doe J".to_string(),
            abstract_text: "An abstract about caching.".to_string(),
            year,
            full_text: "x".repeat(5000),
            file_path: format!("/papers/{id}.pdf"),
            file_name: format!("{id}.pdf"),
            page_count: 10,
            extra_metadata: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_prompt_truncates_full_text() {
        let p = paper(1, "Caching Revisited", Some(2022));
        let prompt = summary_prompt(&p, 3000);
        assert!(prompt.contains("Title: Caching Revisited"));
        assert!(prompt.contains("first 3000 chars"));
        // 3000 of full text, not all 5000
        assert!(!prompt.contains(&"x".repeat(3001)));
        assert!(prompt.contains(&"x".repeat(3000)));
    }

    #[test]
    fn test_papers_context_numbering_uses_db_ids() {
        let papers = vec![paper(4, "First", Some(2020)), paper(9, "Second", None)];
        let context = papers_context(&papers, 300);
        assert!(context.contains("## Paper 4: First"));
        assert!(context.contains("## Paper 9: Second"));
    }

    #[test]
    fn test_reference_list_is_one_based_in_accepted_order() {
        let papers = vec![paper(4, "First", Some(2020)), paper(9, "Second", None)];
        let refs = reference_list(&papers, &[9, 4]).unwrap();
        assert_eq!(refs, "[1] Second (N/A)\n[2] First (2020)");
    }

    #[test]
    fn test_reference_list_missing_paper_is_none() {
        let papers = vec![paper(4, "Only", Some(2020))];
        assert!(reference_list(&papers, &[4, 5]).is_none());
    }

    #[test]
    fn test_survey_prompt_contains_template_sections() {
        let prompt = survey_prompt("ctx", "syn", &["T".to_string()], &["G".to_string()]);
        for marker in ["## Introduction", "## Key Themes", "## Research Gaps and Opportunities", "## Conclusion", "## References"] {
            assert!(prompt.contains(marker), "missing {marker}");
        }
        assert!(prompt.contains("Common Themes: T"));
        assert!(prompt.contains("Research Gaps: G"));
    }
}
