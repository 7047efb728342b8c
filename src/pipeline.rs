//! The end-to-end run: validate, rewrite, lock
//!
//! Each stage short-circuits on failure. The lock compiler cleans up its own
//! scratch file, so nothing here needs unwinding.

use crate::cli::Cli;
use crate::config::Config;
use crate::index::Prober;
use crate::lock::{self, LockCompiler, LockError};
use crate::manifest::{LineError, Manifest, ManifestError};
use crate::rewrite;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Invalid requirements file {}: {} bad line(s)", path.display(), errors.len())]
    Invalid {
        path: PathBuf,
        errors: Vec<LineError>,
    },

    #[error("Failed to rewrite {} line(s)", errors.len())]
    Rewrite { errors: Vec<LineError> },

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl PipelineError {
    /// Per-line failures behind this error, if any
    pub fn line_errors(&self) -> &[LineError] {
        match self {
            PipelineError::Invalid { errors, .. } | PipelineError::Rewrite { errors } => {
                errors.as_slice()
            }
            _ => &[],
        }
    }
}

/// Resolved settings for one run
#[derive(Debug, Clone)]
pub struct Options {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub preferred_index: Option<String>,
    pub default_index: String,
    pub dry_run: bool,
}

impl Options {
    /// Merge command-line flags over the config file
    pub fn resolve(cli: &Cli, config: &Config) -> Self {
        Options {
            input: cli.input_file.clone(),
            output: cli.output.clone(),
            preferred_index: cli
                .preferred_index
                .clone()
                .or_else(|| config.preferred_index.clone()),
            default_index: cli
                .default_index
                .clone()
                .unwrap_or_else(|| config.default_index().to_string()),
            dry_run: cli.dry_run,
        }
    }
}

/// Run the pipeline, returning the text to print
///
/// With `dry_run` the rewritten manifest is returned and the compiler is not
/// invoked. Otherwise the locked manifest is returned and, when an output path
/// is set, written there.
pub fn run(
    options: &Options,
    prober: &dyn Prober,
    compiler: &dyn LockCompiler,
) -> Result<String, PipelineError> {
    let manifest = Manifest::read(&options.input)?;

    let validation = manifest.validate();
    if !validation.is_valid() {
        return Err(PipelineError::Invalid {
            path: options.input.clone(),
            errors: validation.errors,
        });
    }
    tracing::info!("Validated {}", options.input.display());

    let rewritten = rewrite::rewrite(
        &manifest,
        options.preferred_index.as_deref(),
        &options.default_index,
        prober,
    );
    if !rewritten.is_success() {
        return Err(PipelineError::Rewrite {
            errors: rewritten.errors().cloned().collect(),
        });
    }
    let text = rewritten.text();

    if options.dry_run {
        return Ok(text);
    }

    tracing::info!("Compiling lock");
    let locked = compiler.compile(&text)?;

    if let Some(output) = &options.output {
        lock::write_output(output, &locked)?;
        tracing::info!("Wrote {}", output.display());
    }

    Ok(locked)
}
