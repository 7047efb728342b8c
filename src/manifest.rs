//! Requirements manifest reading and validation
//!
//! A manifest is a line-oriented text file. Each line (after trimming) is one of:
//! - blank
//! - a comment starting with `#`
//! - a requirement expression (see [`crate::requirement`])

use crate::requirement::{Requirement, RequirementError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Input file '{}' does not exist.", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One manifest line, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Blank,
    Comment(String),
    Requirement { text: String, requirement: Requirement },
    Invalid { text: String, error: RequirementError },
}

impl Line {
    /// Classify a raw line
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim();
        if text.is_empty() {
            return Line::Blank;
        }
        if text.starts_with('#') {
            return Line::Comment(text.to_string());
        }
        match Requirement::parse(text) {
            Ok(requirement) => Line::Requirement {
                text: text.to_string(),
                requirement,
            },
            Err(error) => Line::Invalid {
                text: text.to_string(),
                error,
            },
        }
    }

    /// The trimmed line text
    pub fn text(&self) -> &str {
        match self {
            Line::Blank => "",
            Line::Comment(text) => text,
            Line::Requirement { text, .. } | Line::Invalid { text, .. } => text,
        }
    }
}

/// An ordered, parsed manifest
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    lines: Vec<Line>,
}

impl Manifest {
    pub fn parse(content: &str) -> Self {
        Manifest {
            lines: content.lines().map(Line::parse).collect(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|source| ManifestError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Manifest::parse(&content))
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Collect every line that failed to parse
    pub fn validate(&self) -> Validation {
        let errors = self
            .lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| match line {
                Line::Invalid { text, error } => Some(LineError {
                    line_number: idx + 1,
                    text: text.clone(),
                    error: error.clone(),
                }),
                _ => None,
            })
            .collect();
        Validation { errors }
    }
}

/// A requirement line that failed to parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    /// 1-based line number
    pub line_number: usize,
    pub text: String,
    pub error: RequirementError,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: '{}': {}", self.line_number, self.text, self.error)
    }
}

/// Outcome of validating a whole manifest
#[derive(Debug, Clone, Default)]
pub struct Validation {
    pub errors: Vec<LineError>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate the manifest at `path`, scanning every line
pub fn validate(path: &Path) -> Result<Validation, ManifestError> {
    Ok(Manifest::read(path)?.validate())
}
