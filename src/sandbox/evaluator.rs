//! Evaluates a factory inside the isolated context.

use async_trait::async_trait;
use serde::Serialize;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Failed to start evaluator `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Evaluator I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Factory raised: {0}")]
    Script(String),
    #[error("Evaluation exceeded {0:?}")]
    Timeout(Duration),
    #[error("Evaluator produced invalid UTF-8")]
    InvalidOutput,
}

/// What a successful evaluation put on the surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub markup: String,
    /// blake3 of the factory source that produced this output.
    pub source_digest: String,
}

impl Rendered {
    pub fn new(markup: impl Into<String>, code: &str) -> Self {
        Self {
            markup: markup.into(),
            source_digest: blake3::hash(code.as_bytes()).to_hex().to_string(),
        }
    }
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    fn name(&self) -> &str;

    /// Runs the factory with the given namespaces injected positionally and
    /// renders the returned component.
    async fn evaluate(&self, code: &str, namespaces: &[String]) -> Result<Rendered, EvaluationError>;
}

#[derive(Serialize)]
struct Payload<'a> {
    factory: &'a str,
    namespaces: &'a [String],
}

/// Runs every evaluation in a fresh child process with an empty environment.
/// The payload `{"factory": …, "namespaces": […]}` goes in on stdin and the
/// rendered markup comes back on stdout. A non-zero exit is a script error
/// and its stderr is the message.
///
/// The child is killed when the evaluation future is dropped, which is how a
/// superseded render gets abandoned.
#[derive(Debug, Clone)]
pub struct ProcessEvaluator {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessEvaluator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn run(&self, code: &str, namespaces: &[String]) -> Result<Rendered, EvaluationError> {
        let payload = serde_json::to_vec(&Payload {
            factory: code,
            namespaces,
        })
        .map_err(|e| EvaluationError::Io(e.into()))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env_clear()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EvaluationError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(&payload).await {
                    debug!(error = %e, "Evaluator closed stdin early");
                }
            }
        };
        let (_, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(EvaluationError::Script(if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            }));
        }

        let markup = String::from_utf8(output.stdout).map_err(|_| EvaluationError::InvalidOutput)?;
        Ok(Rendered::new(markup.trim_end(), code))
    }
}

#[async_trait]
impl Evaluator for ProcessEvaluator {
    fn name(&self) -> &str {
        &self.program
    }

    #[instrument(skip(self, code, namespaces), fields(program = %self.program, len = code.len()))]
    async fn evaluate(&self, code: &str, namespaces: &[String]) -> Result<Rendered, EvaluationError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(code, namespaces))
                .await
                .map_err(|_| EvaluationError::Timeout(limit))?,
            None => self.run(code, namespaces).await,
        }
    }
}
