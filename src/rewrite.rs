//! Manifest rewriting
//!
//! Appends ` --index-url <url>` to every requirement line, choosing the
//! preferred index when the package is published there and the default index
//! otherwise. Lines that fail to parse are kept as-is and recorded as errors.

use crate::index::Prober;
use crate::manifest::{Line, LineError, Manifest};

/// What happened to a single manifest line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Blank or comment line, emitted unchanged
    Passthrough(String),
    /// Requirement line pinned to an index
    Pinned { line: String, index_url: String },
    /// Unparsable line, emitted unchanged
    Invalid(LineError),
}

impl LineOutcome {
    pub fn render(&self) -> String {
        match self {
            LineOutcome::Passthrough(line) => line.clone(),
            LineOutcome::Pinned { line, index_url } => format!("{} --index-url {}", line, index_url),
            LineOutcome::Invalid(err) => err.text.clone(),
        }
    }
}

/// Result of rewriting a manifest, one outcome per input line
#[derive(Debug, Clone, Default)]
pub struct Rewrite {
    pub outcomes: Vec<LineOutcome>,
}

impl Rewrite {
    /// Rewritten manifest text, lines joined with `\n`
    pub fn text(&self) -> String {
        self.outcomes
            .iter()
            .map(LineOutcome::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True when no line failed to parse
    pub fn is_success(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &LineError> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            LineOutcome::Invalid(err) => Some(err),
            _ => None,
        })
    }
}

/// Rewrite every line of `manifest`, probing `preferred_index` once per
/// requirement in manifest order
pub fn rewrite(
    manifest: &Manifest,
    preferred_index: Option<&str>,
    default_index: &str,
    prober: &dyn Prober,
) -> Rewrite {
    let outcomes = manifest
        .lines()
        .iter()
        .enumerate()
        .map(|(idx, line)| match line {
            Line::Blank | Line::Comment(_) => LineOutcome::Passthrough(line.text().to_string()),
            Line::Invalid { text, error } => {
                tracing::warn!("Error processing line '{}': {}", text, error);
                LineOutcome::Invalid(LineError {
                    line_number: idx + 1,
                    text: text.clone(),
                    error: error.clone(),
                })
            }
            Line::Requirement { text, requirement } => {
                let index_url = match preferred_index {
                    Some(preferred) if prober.exists(&requirement.name, preferred) => preferred,
                    _ => default_index,
                };
                tracing::info!("{} -> {}", requirement.name, index_url);
                LineOutcome::Pinned {
                    line: text.clone(),
                    index_url: index_url.to_string(),
                }
            }
        })
        .collect();

    Rewrite { outcomes }
}
