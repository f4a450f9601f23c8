//! Heuristic metadata extraction for PDFs with empty info dictionaries.
//!
//! Heuristics:
//!   title    — first line of reasonable length among the first ten
//!   abstract — text between an "Abstract" marker and the introduction
//!   year     — first 20xx match in the opening 3000 characters
//!   authors  — no reliable text signal without NER; fixed fallback

use regex::Regex;
use std::sync::OnceLock;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_AUTHORS: &str = "Unknown Authors";
pub const NO_ABSTRACT: &str = "No abstract found";

const ABSTRACT_CAP: usize = 500;
const YEAR_WINDOW: usize = 3000;

/// Best-effort bibliographic metadata for one paper.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperMetadata {
    pub title: String,
    pub authors: String,
    pub abstract_text: String,
    pub year: Option<i32>,
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"20\d{2}").unwrap())
}

/// First 20xx year occurring in `text`.
pub fn year_in(text: &str) -> Option<i32> {
    year_regex().find(text).and_then(|m| m.as_str().parse().ok())
}

/// Extract metadata from raw page text.
pub fn extract_heuristic(text: &str) -> PaperMetadata {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    PaperMetadata {
        title: guess_title(&lines),
        authors: UNKNOWN_AUTHORS.to_string(),
        abstract_text: guess_abstract(&lines),
        year: year_in(&prefix(text, YEAR_WINDOW)),
    }
}

/// Char-boundary-safe prefix of `text`.
fn prefix(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

/// First line among the first ten that looks like a title: reasonable
/// length and not an all-caps header.
fn guess_title(lines: &[&str]) -> String {
    lines
        .iter()
        .take(10)
        .find(|l| l.len() > 10 && l.len() < 200 && !is_all_caps(l))
        .map(|l| l.to_string())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

fn is_all_caps(line: &str) -> bool {
    let mut has_alpha = false;
    for c in line.chars().filter(|c| c.is_alphabetic()) {
        has_alpha = true;
        if c.is_lowercase() {
            return false;
        }
    }
    has_alpha
}

/// Text between a short "Abstract" marker line and the first
/// introduction/keywords marker, joined with single spaces.
fn guess_abstract(lines: &[&str]) -> String {
    let mut in_abstract = false;
    let mut collected: Vec<&str> = Vec::new();

    for line in lines {
        let lower = line.to_lowercase();

        if !in_abstract && lower.contains("abstract") && line.len() < 50 {
            in_abstract = true;
            continue;
        }

        if in_abstract {
            let end = ["introduction", "1.", "keywords", "1 introduction"]
                .iter()
                .any(|marker| lower.contains(marker));
            if end {
                break;
            }
            collected.push(line);
        }
    }

    let joined = collected.join(" ").trim().to_string();
    if joined.is_empty() {
        NO_ABSTRACT.to_string()
    } else if joined.len() > ABSTRACT_CAP {
        joined.chars().take(ABSTRACT_CAP).collect()
    } else {
        joined
    }
}
