//! Lock compiler invocation
//!
//! Writes the rewritten manifest to a scratch file and runs an external lock
//! compiler (`pip-compile` by default) against it:
//!
//! ```text
//! <program> [args...] --generate-hashes <scratch-file>
//! ```
//!
//! The compiler's stdout is the locked manifest. The scratch file is removed
//! when the compile call returns, whatever the outcome.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Lock compiler executable used when none is configured
pub const DEFAULT_COMPILER: &str = "pip-compile";

/// Flag asking the compiler to emit hashes for every pin
const GENERATE_HASHES_FLAG: &str = "--generate-hashes";

#[derive(Error, Debug)]
pub enum LockError {
    #[error("Failed to create scratch manifest: {0}")]
    Scratch(std::io::Error),

    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Error running {program}: {stderr}")]
    Failed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Failed to write {path}: {source}")]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Turns a manifest into a hash-pinned lock
pub trait LockCompiler {
    fn compile(&self, manifest: &str) -> Result<String, LockError>;
}

/// Runs a pip-compile compatible executable
#[derive(Debug, Clone)]
pub struct PipCompile {
    program: String,
    args: Vec<String>,
}

impl PipCompile {
    /// `args` are passed before the hashes flag and the manifest path
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        PipCompile {
            program: program.into(),
            args,
        }
    }
}

impl LockCompiler for PipCompile {
    fn compile(&self, manifest: &str) -> Result<String, LockError> {
        // Removed on drop
        let mut scratch = tempfile::Builder::new()
            .prefix("reqpin-")
            .suffix(".txt")
            .tempfile()
            .map_err(LockError::Scratch)?;
        scratch
            .write_all(manifest.as_bytes())
            .and_then(|()| scratch.flush())
            .map_err(LockError::Scratch)?;

        tracing::debug!(
            "Running {} {:?} {} {}",
            self.program,
            self.args,
            GENERATE_HASHES_FLAG,
            scratch.path().display()
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(GENERATE_HASHES_FLAG)
            .arg(scratch.path())
            .output()
            .map_err(|source| LockError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(LockError::Failed {
                program: self.program.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Write the locked manifest to `path`
pub fn write_output(path: &Path, locked: &str) -> Result<(), LockError> {
    fs::write(path, locked).map_err(|source| LockError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })
}
