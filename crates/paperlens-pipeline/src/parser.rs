//! Structured-field extraction from free-form model replies.
//!
//! Small local models reliably emit labeled plain text but not
//! machine-structured output, so both parsers scan line by line for a
//! fixed label vocabulary and degrade gracefully: malformed input yields
//! empty fields, never an error. The caller falls back to truncated raw
//! text when a required section is missing.

use serde::Serialize;

// ── Summary replies ───────────────────────────────────────────────────────────

/// Parsed sections of a summarization reply. A `None` field means the
/// label never appeared (or carried no content).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryFields {
    pub summary: Option<String>,
    pub key_findings: Option<String>,
    pub methodology: Option<String>,
    pub contributions: Option<String>,
    pub limitations: Option<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum SummarySlot {
    Summary,
    KeyFindings,
    Methodology,
    Contributions,
    Limitations,
}

const SUMMARY_LABELS: [(&str, SummarySlot); 5] = [
    ("SUMMARY:", SummarySlot::Summary),
    ("KEY_FINDINGS:", SummarySlot::KeyFindings),
    ("METHODOLOGY:", SummarySlot::Methodology),
    ("CONTRIBUTIONS:", SummarySlot::Contributions),
    ("LIMITATIONS:", SummarySlot::Limitations),
];

impl SummaryFields {
    fn set(&mut self, slot: SummarySlot, text: String) {
        let field = match slot {
            SummarySlot::Summary => &mut self.summary,
            SummarySlot::KeyFindings => &mut self.key_findings,
            SummarySlot::Methodology => &mut self.methodology,
            SummarySlot::Contributions => &mut self.contributions,
            SummarySlot::Limitations => &mut self.limitations,
        };
        *field = Some(text);
    }
}

/// Extract the five labeled sections from a summarization reply.
///
/// A line starting with a label opens that section, with the remainder of
/// the line as its first content. Non-empty lines inside an open section
/// accumulate; flushing joins them with single spaces. Text before the
/// first label is ignored.
pub fn parse_summary_reply(reply: &str) -> SummaryFields {
    let mut fields = SummaryFields::default();
    let mut current: Option<SummarySlot> = None;
    let mut buffer: Vec<String> = Vec::new();

    for raw_line in reply.lines() {
        let line = raw_line.trim();

        if let Some((label, slot)) = SUMMARY_LABELS
            .iter()
            .find(|(label, _)| line.starts_with(label))
        {
            if let Some(open) = current {
                if !buffer.is_empty() {
                    fields.set(open, buffer.join(" "));
                }
            }
            current = Some(*slot);
            buffer.clear();
            let rest = line[label.len()..].trim();
            if !rest.is_empty() {
                buffer.push(rest.to_string());
            }
        } else if !line.is_empty() && current.is_some() {
            buffer.push(line.to_string());
        }
    }

    if let Some(open) = current {
        if !buffer.is_empty() {
            fields.set(open, buffer.join(" "));
        }
    }

    fields
}

// ── Synthesis replies ─────────────────────────────────────────────────────────

/// Parsed sections of a synthesis reply. The three list sections keep
/// only bulleted lines, in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SynthesisFields {
    pub synthesis: Option<String>,
    pub themes: Vec<String>,
    pub gaps: Vec<String>,
    pub directions: Vec<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum SynthesisSlot {
    Synthesis,
    Themes,
    Gaps,
    Directions,
}

const SYNTHESIS_LABELS: [(&str, SynthesisSlot); 4] = [
    ("SYNTHESIS:", SynthesisSlot::Synthesis),
    ("THEMES:", SynthesisSlot::Themes),
    ("GAPS:", SynthesisSlot::Gaps),
    ("DIRECTIONS:", SynthesisSlot::Directions),
];

/// Extract the four labeled sections from a synthesis reply.
///
/// `SYNTHESIS` accumulates free text like the summary parser. Inside
/// `THEMES`/`GAPS`/`DIRECTIONS` only lines starting with `-` or `*` are
/// kept (markers stripped); anything else is silently dropped.
pub fn parse_synthesis_reply(reply: &str) -> SynthesisFields {
    let mut fields = SynthesisFields::default();
    let mut current: Option<SynthesisSlot> = None;
    let mut buffer: Vec<String> = Vec::new();

    let flush_synthesis = |buffer: &mut Vec<String>, fields: &mut SynthesisFields| {
        if !buffer.is_empty() {
            fields.synthesis = Some(buffer.join(" "));
            buffer.clear();
        }
    };

    for raw_line in reply.lines() {
        let line = raw_line.trim();

        if let Some((label, slot)) = SYNTHESIS_LABELS
            .iter()
            .find(|(label, _)| line.starts_with(label))
        {
            if current == Some(SynthesisSlot::Synthesis) {
                flush_synthesis(&mut buffer, &mut fields);
            }
            current = Some(*slot);
            buffer.clear();
            if *slot == SynthesisSlot::Synthesis {
                let rest = line[label.len()..].trim();
                if !rest.is_empty() {
                    buffer.push(rest.to_string());
                }
            }
            continue;
        }

        if line.is_empty() {
            continue;
        }

        match current {
            Some(SynthesisSlot::Synthesis) => buffer.push(line.to_string()),
            Some(slot) => {
                if line.starts_with('-') || line.starts_with('*') {
                    let item = line.trim_start_matches(['-', '*', ' ']).trim();
                    if !item.is_empty() {
                        let list = match slot {
                            SynthesisSlot::Themes => &mut fields.themes,
                            SynthesisSlot::Gaps => &mut fields.gaps,
                            SynthesisSlot::Directions => &mut fields.directions,
                            SynthesisSlot::Synthesis => unreachable!(),
                        };
                        list.push(item.to_string());
                    }
                }
            }
            None => {}
        }
    }

    if current == Some(SynthesisSlot::Synthesis) {
        flush_synthesis(&mut buffer, &mut fields);
    }

    fields
}

// ── Tests ─────────────────────────────────────────────────────────────────────
