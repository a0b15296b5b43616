//! Syntax down-leveling (JSX and friends into plain calls).
//! The actual lowering is done by an external tool; this module only
//! defines the seam and a process-backed implementation.

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum DownlevelError {
    #[error("Failed to start down-leveler `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Down-leveler `{program}` exited with {status:?}: {stderr}")]
    Failed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },
    #[error("Down-leveler `{program}` produced invalid UTF-8")]
    InvalidOutput { program: String },
}

pub trait Downlevel: Send + Sync {
    fn lower(&self, source: &str) -> Result<String, DownlevelError>;

    fn name(&self) -> &str;
}

/// Leaves the source as is; for components already written as plain script.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Downlevel for Passthrough {
    fn lower(&self, source: &str) -> Result<String, DownlevelError> {
        Ok(source.to_string())
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}

/// Pipes the source through an external program (stdin → stdout),
/// e.g. `esbuild --loader=jsx`.
#[derive(Debug, Clone)]
pub struct CommandDownleveler {
    program: String,
    args: Vec<String>,
}

impl CommandDownleveler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Downlevel for CommandDownleveler {
    #[instrument(skip(self, source), fields(program = %self.program, len = source.len()))]
    fn lower(&self, source: &str) -> Result<String, DownlevelError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DownlevelError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin from a separate thread so a large output cannot deadlock us.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = source.to_string();
            thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let output = child.wait_with_output().map_err(|source| DownlevelError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        if let Some(writer) = writer {
            if let Ok(Err(e)) = writer.join() {
                debug!(error = %e, "Down-leveler closed stdin early");
            }
        }

        if !output.status.success() {
            return Err(DownlevelError::Failed {
                program: self.program.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| DownlevelError::InvalidOutput {
            program: self.program.clone(),
        })
    }

    fn name(&self) -> &str {
        &self.program
    }
}
