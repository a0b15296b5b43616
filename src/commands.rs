//! Entry points behind the CLI. Each returns a printable string or a message
//! describing what went wrong.

use crate::config::Config;
use crate::prompt;
use crate::sandbox::SandboxSession;
use crate::segment::{self, ParsedMessage};
use crate::view::{present, Presentation, ViewMode};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Upper bound on waiting for a render when no evaluator timeout is set.
const RENDER_WAIT: Duration = Duration::from_secs(30);

/// Segment list of a message, as JSON.
pub fn parse_message(raw: &str) -> Result<String, String> {
    let segments = segment::parse(raw);
    serde_json::to_string_pretty(&*segments).map_err(|e| e.to_string())
}

/// Factory source for a component.
#[instrument(skip(source, config))]
pub fn compile_artifact(source: &str, config: &Config) -> Result<String, String> {
    let compiler = config.compiler().map_err(|e| e.to_string())?;
    compiler
        .compile(source)
        .map(|factory| factory.code)
        .map_err(|e| e.to_string())
}

/// How each artifact in a message (or only the one with `id`) is presented.
pub fn present_artifacts(
    raw: &str,
    id: Option<&str>,
    mode: ViewMode,
    config: &Config,
) -> Result<String, String> {
    let compiler = config.compiler().map_err(|e| e.to_string())?;
    let message = ParsedMessage::parse(raw);

    let presentations: Vec<Presentation> = match id {
        Some(id) => {
            let artifact = message
                .artifact(id)
                .ok_or_else(|| format!("No artifact with identifier {:?}", id))?;
            vec![present(artifact, mode, &compiler)]
        }
        None => message
            .artifacts()
            .map(|artifact| present(artifact, mode, &compiler))
            .collect(),
    };
    serde_json::to_string_pretty(&presentations).map_err(|e| e.to_string())
}

pub fn system_prompt(config: &Config) -> Result<String, String> {
    let registry = config.registry().map_err(|e| e.to_string())?;
    Ok(prompt::system_prompt(&registry))
}

/// Compiles a component and renders it through the configured evaluator.
#[instrument(skip(source, config))]
pub async fn render_artifact(source: &str, config: &Config) -> Result<String, String> {
    let evaluator = config
        .evaluator()
        .ok_or("No sandbox evaluator configured ([sandbox.evaluator])")?;
    let compiler = config.compiler().map_err(|e| e.to_string())?;
    let factory = compiler.compile(source).map_err(|e| e.to_string())?;

    let session = SandboxSession::mount(Arc::new(evaluator), compiler.registry());
    session.load_and_render(&factory);

    let wait = config
        .sandbox
        .timeout_ms
        .map(|ms| Duration::from_millis(ms) + Duration::from_secs(1))
        .unwrap_or(RENDER_WAIT);
    let mut surface = session.surface();
    let rendered = tokio::time::timeout(wait, surface.wait_for(Option::is_some))
        .await
        .map_err(|_| format!("Nothing rendered within {:?}; see the log for evaluation errors", wait))?
        .map_err(|e| e.to_string())?
        .clone();

    rendered
        .map(|rendered| rendered.markup)
        .ok_or_else(|| "Nothing rendered".to_string())
}
