//! Single left-to-right scan over the raw message.
//!
//! The scanner is in one of three states: outside any tag, inside
//! `<thinking>`, or inside `<artifact>`. Inside a tag it only looks for the
//! matching closing tag, so tags of the same type never nest. Fenced code is
//! copied through as text without looking at its contents.

use super::{attributes, Artifact, Segment};

const FENCE: &str = "```";
const THINKING_CLOSE: &str = "</thinking>";
const ARTIFACT_CLOSE: &str = "</artifact>";

/// Segments `raw` without consulting any cache. Never fails: anything that
/// does not form a recognized tag stays plain text.
pub fn parse_uncached(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut pos = 0;
    // Start of the plain text not yet flushed.
    let mut pending = 0;

    while pos < raw.len() {
        let rest = &raw[pos..];

        if rest.starts_with(FENCE) {
            flush_text(&mut segments, &raw[pending..pos]);
            let end = match rest[FENCE.len()..].find(FENCE) {
                Some(offset) => pos + FENCE.len() + offset + FENCE.len(),
                None => raw.len(),
            };
            segments.push(Segment::text(&raw[pos..end]));
            pos = end;
            pending = end;
            continue;
        }

        if rest.starts_with('<') {
            if let Some(open) = OpenTag::read(rest) {
                flush_text(&mut segments, &raw[pending..pos]);
                let body_start = pos + open.len;
                let body = &raw[body_start..];
                let closing = open.closing();

                match body.find(closing) {
                    Some(offset) => {
                        segments.push(open.finish(&body[..offset], false));
                        pos = body_start + offset + closing.len();
                        pending = pos;
                        continue;
                    }
                    None => {
                        // Still streaming: the rest of the input belongs to this tag.
                        segments.push(open.finish(body, true));
                        return segments;
                    }
                }
            }
        }

        pos += next_candidate(rest);
    }

    flush_text(&mut segments, &raw[pending..]);
    segments
}

/// Byte distance to the next character that could start a fence or a tag.
fn next_candidate(rest: &str) -> usize {
    let first = rest.chars().next().map_or(1, char::len_utf8);
    rest[first..]
        .find(|c: char| c == '<' || c == '`')
        .map_or(rest.len(), |offset| first + offset)
}

fn flush_text(segments: &mut Vec<Segment>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        segments.push(Segment::text(trimmed));
    }
}

enum TagKind {
    Thinking,
    Artifact(Artifact),
}

struct OpenTag {
    kind: TagKind,
    /// Length of the opening tag including `<` and `>`.
    len: usize,
}

impl OpenTag {
    /// Reads an opening tag at the start of `rest`, which begins with `<`.
    fn read(rest: &str) -> Option<Self> {
        let close = rest.find('>')?;
        let inner = &rest[1..close];
        let name_end = inner
            .find(|c: char| c.is_whitespace() || c == '/')
            .unwrap_or(inner.len());

        let kind = match &inner[..name_end] {
            "thinking" => TagKind::Thinking,
            "artifact" => {
                let mut artifact = Artifact::default();
                attributes::apply(&mut artifact, &inner[name_end..]);
                TagKind::Artifact(artifact)
            }
            _ => return None,
        };

        Some(Self {
            kind,
            len: close + 1,
        })
    }

    fn closing(&self) -> &'static str {
        match self.kind {
            TagKind::Thinking => THINKING_CLOSE,
            TagKind::Artifact(_) => ARTIFACT_CLOSE,
        }
    }

    fn finish(self, body: &str, generating: bool) -> Segment {
        match self.kind {
            TagKind::Thinking => Segment::Thinking {
                content: body.trim().to_string(),
                generating,
            },
            TagKind::Artifact(mut artifact) => {
                artifact.content = body.to_string();
                artifact.generating = generating;
                Segment::Artifact(artifact)
            }
        }
    }
}
