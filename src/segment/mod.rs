//! Splits an assistant message into text, thinking and artifact segments.
//! Works on partial input: a tag that has not been closed yet yields a
//! segment with `generating = true`.

mod attributes;
pub mod cache;
pub mod parser;
pub mod serialize;
pub mod stream;

pub use cache::{CacheStats, SegmentCache};
pub use parser::parse_uncached;
pub use serialize::serialize;
pub use stream::MessageStream;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One piece of a message, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Segment {
    Text { content: String },
    Thinking { content: String, generating: bool },
    Artifact(Artifact),
}

impl Segment {
    pub fn text(content: impl Into<String>) -> Self {
        Segment::Text {
            content: content.into(),
        }
    }

    /// True while the tag backing this segment has not been closed.
    pub fn is_generating(&self) -> bool {
        match self {
            Segment::Text { .. } => false,
            Segment::Thinking { generating, .. } => *generating,
            Segment::Artifact(artifact) => artifact.generating,
        }
    }

    pub fn as_artifact(&self) -> Option<&Artifact> {
        match self {
            Segment::Artifact(artifact) => Some(artifact),
            _ => None,
        }
    }
}

/// Body and attributes of an `<artifact>` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Option<String>,
    pub kind: Option<ArtifactKind>,
    pub title: Option<String>,
    pub language: Option<String>,
    pub content: String,
    pub generating: bool,
}

/// Value of the `type` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArtifactKind {
    Code,
    Markdown,
    Html,
    Svg,
    Mermaid,
    React,
    /// Anything else, kept verbatim.
    Other(String),
}

impl ArtifactKind {
    pub const KNOWN: [ArtifactKind; 6] = [
        ArtifactKind::Code,
        ArtifactKind::Markdown,
        ArtifactKind::Html,
        ArtifactKind::Svg,
        ArtifactKind::Mermaid,
        ArtifactKind::React,
    ];

    pub fn from_mime(mime: &str) -> Self {
        match mime {
            "application/code" => ArtifactKind::Code,
            "text/markdown" => ArtifactKind::Markdown,
            "text/html" => ArtifactKind::Html,
            "image/svg+xml" => ArtifactKind::Svg,
            "application/mermaid" => ArtifactKind::Mermaid,
            "application/react" => ArtifactKind::React,
            other => ArtifactKind::Other(other.to_string()),
        }
    }

    pub fn mime(&self) -> &str {
        match self {
            ArtifactKind::Code => "application/code",
            ArtifactKind::Markdown => "text/markdown",
            ArtifactKind::Html => "text/html",
            ArtifactKind::Svg => "image/svg+xml",
            ArtifactKind::Mermaid => "application/mermaid",
            ArtifactKind::React => "application/react",
            ArtifactKind::Other(mime) => mime,
        }
    }

    /// Whether the `language` attribute carries meaning for this kind.
    pub fn uses_language(&self) -> bool {
        matches!(self, ArtifactKind::Code | ArtifactKind::React)
    }
}

impl From<String> for ArtifactKind {
    fn from(mime: String) -> Self {
        ArtifactKind::from_mime(&mime)
    }
}

impl From<ArtifactKind> for String {
    fn from(kind: ArtifactKind) -> Self {
        kind.mime().to_string()
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Parses `raw` through the process-wide segment cache.
pub fn parse(raw: &str) -> Arc<[Segment]> {
    cache::global().get_or_parse(raw)
}

/// A parsed message plus the lookups the conversation view needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    segments: Arc<[Segment]>,
}

impl ParsedMessage {
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: parse(raw),
        }
    }

    pub fn from_segments(segments: Arc<[Segment]>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn shared(&self) -> Arc<[Segment]> {
        Arc::clone(&self.segments)
    }

    /// First thinking block as `(content, generating)`.
    pub fn thinking(&self) -> Option<(&str, bool)> {
        self.segments.iter().find_map(|segment| match segment {
            Segment::Thinking {
                content,
                generating,
            } => Some((content.as_str(), *generating)),
            _ => None,
        })
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.segments.iter().filter_map(Segment::as_artifact)
    }

    /// Latest revision of the artifact with this identifier.
    pub fn artifact(&self, id: &str) -> Option<&Artifact> {
        self.artifacts()
            .filter(|artifact| artifact.id.as_deref() == Some(id))
            .last()
    }

    pub fn is_generating(&self) -> bool {
        self.segments.iter().any(Segment::is_generating)
    }
}
