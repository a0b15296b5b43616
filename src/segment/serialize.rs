//! Writes segments back into the tag micro-format.

use super::{Artifact, Segment};

/// Inverse of parsing for closed segments: re-parsing the output of this
/// function yields the same sequence. Segments are joined by newlines.
pub fn serialize(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(write_segment)
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_segment(segment: &Segment) -> String {
    match segment {
        Segment::Text { content } => content.clone(),
        Segment::Thinking { content, .. } => format!("<thinking>{}</thinking>", content),
        Segment::Artifact(artifact) => write_artifact(artifact),
    }
}

fn write_artifact(artifact: &Artifact) -> String {
    let mut tag = String::from("<artifact");
    let attributes = [
        ("identifier", artifact.id.as_deref()),
        ("type", artifact.kind.as_ref().map(|kind| kind.mime())),
        ("title", artifact.title.as_deref()),
        ("language", artifact.language.as_deref()),
    ];
    for (key, value) in attributes {
        if let Some(value) = value {
            tag.push_str(&format!(" {}=\"{}\"", key, value));
        }
    }
    format!("{}>{}</artifact>", tag, artifact.content)
}
