//! How an artifact segment is shown in the side panel.

use crate::compiler::{Compiler, FactorySource};
use crate::segment::{Artifact, ArtifactKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Code,
    Preview,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum Presentation {
    /// Highlighted source. `error` is set when a preview was asked for but
    /// the component failed to compile.
    Code {
        language: String,
        source: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Markdown { source: String },
    /// Rendered as a standalone document.
    Html { document: String },
    /// Compiled component, ready for a sandbox session.
    Component { factory: FactorySource },
    Svg { markup: String },
    Diagram { source: String },
    Unsupported { kind: Option<String> },
}

/// Kinds with a code/preview toggle.
pub fn supports_preview(kind: &ArtifactKind) -> bool {
    matches!(kind, ArtifactKind::Html | ArtifactKind::React)
}

#[instrument(skip(artifact, compiler), fields(id = artifact.id.as_deref(), kind = ?artifact.kind))]
pub fn present(artifact: &Artifact, mode: ViewMode, compiler: &Compiler) -> Presentation {
    let preview = mode == ViewMode::Preview
        && !artifact.generating
        && artifact.kind.as_ref().is_some_and(supports_preview);

    match (&artifact.kind, preview) {
        (Some(ArtifactKind::Html), true) => Presentation::Html {
            document: artifact.content.clone(),
        },
        (Some(ArtifactKind::React), true) => match compiler.compile(&artifact.content) {
            Ok(factory) => Presentation::Component { factory },
            Err(e) => {
                warn!(error = %e, "Preview unavailable; showing source");
                code(language(artifact, "tsx"), &artifact.content, Some(e.to_string()))
            }
        },
        (Some(ArtifactKind::Html), false) => code("html", &artifact.content, None),
        (Some(ArtifactKind::React), false) => code(language(artifact, "tsx"), &artifact.content, None),
        (Some(ArtifactKind::Code), _) => match &artifact.language {
            Some(language) => code(language, &artifact.content, None),
            None => {
                debug!("Code artifact without a language");
                unsupported(artifact)
            }
        },
        (Some(ArtifactKind::Markdown), _) => Presentation::Markdown {
            source: artifact.content.clone(),
        },
        (Some(ArtifactKind::Svg), _) => Presentation::Svg {
            markup: artifact.content.clone(),
        },
        (Some(ArtifactKind::Mermaid), _) => Presentation::Diagram {
            source: artifact.content.clone(),
        },
        (Some(ArtifactKind::Other(_)), _) | (None, _) => unsupported(artifact),
    }
}

/// The artifact's `language` attribute where its kind honours one.
fn language<'a>(artifact: &'a Artifact, fallback: &'a str) -> &'a str {
    match &artifact.kind {
        Some(kind) if kind.uses_language() => artifact.language.as_deref().unwrap_or(fallback),
        _ => fallback,
    }
}

fn code(language: &str, source: &str, error: Option<String>) -> Presentation {
    Presentation::Code {
        language: language.to_string(),
        source: source.to_string(),
        error,
    }
}

fn unsupported(artifact: &Artifact) -> Presentation {
    Presentation::Unsupported {
        kind: artifact.kind.as_ref().map(|kind| kind.mime().to_string()),
    }
}

#[cfg(test)]
mod tests;
