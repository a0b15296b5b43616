//! System prompt that teaches a model the artifact micro-format.

use crate::registry::{NamespaceRegistry, Resolution};
use crate::segment::ArtifactKind;
use std::fmt::Write;

pub fn base_system() -> &'static str {
    r#"You are Artifacto, a helpful assistant.

Answer directly and concisely; offer to elaborate instead of padding.
For problems that benefit from systematic reasoning, work through them step
by step before answering."#
}

fn thinking_section() -> &'static str {
    r#"# Thinking

Before creating or updating an artifact, reason briefly inside
<thinking>...</thinking>: is the content substantial, self-contained and
likely to be reused? If not, answer inline instead. If it is, decide whether
this is a new artifact or an update to an existing one."#
}

fn artifact_section() -> &'static str {
    r#"# Artifacts

Wrap artifact content in <artifact ...>...</artifact> with these attributes,
always double-quoted:

- identifier: kebab-case, descriptive. Reuse it when updating an artifact.
- type: one of the types listed below.
- title: a short human-readable title.
- language: only for application/code and application/react.

Never put triple backticks inside an artifact; the tag already carries the
language. Always include the complete content, never a truncated diff."#
}

fn kind_usage(kind: &ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Code => "code snippets or scripts in any language; set the language attribute",
        ArtifactKind::Markdown => "documents in plain text or Markdown",
        ArtifactKind::Html => "a single-file HTML page with inline JS and CSS",
        ArtifactKind::Svg => "a vector image; prefer a viewBox over width/height",
        ArtifactKind::Mermaid => "a Mermaid diagram, without a code fence",
        ArtifactKind::React => "a React component with a default export and no required props",
        ArtifactKind::Other(_) => "",
    }
}

/// The full prompt; importable libraries come from `registry`.
pub fn system_prompt(registry: &NamespaceRegistry) -> String {
    let mut prompt = String::new();
    prompt.push_str(base_system());
    prompt.push_str("\n\n");
    prompt.push_str(thinking_section());
    prompt.push_str("\n\n");
    prompt.push_str(artifact_section());
    prompt.push_str("\n\n# Types\n\n");
    for kind in ArtifactKind::KNOWN.iter() {
        let _ = writeln!(prompt, "- {}: {}", kind.mime(), kind_usage(kind));
    }

    prompt.push_str("\n# React components\n\n");
    prompt.push_str("Only these modules can be imported, with named imports only:\n\n");
    for namespace in registry.namespaces() {
        let module = match namespace.resolution {
            Resolution::Exact(_) => format!("\"{}\"", namespace.specifier()),
            Resolution::Prefix(_) => format!("\"{}/...\"", namespace.specifier().trim_end_matches('/')),
        };
        let _ = write!(prompt, "- {}", module);
        if !namespace.description.is_empty() {
            let _ = write!(prompt, ": {}", namespace.description);
        }
        if !namespace.capabilities.is_empty() {
            let _ = write!(prompt, " (e.g. {})", namespace.capabilities.join(", "));
        }
        prompt.push('\n');
    }
    prompt.push_str(
        "\nNo other libraries are installed. Default and namespace imports \
         (`import X from`, `import * as X from`) are not supported.\n",
    );

    prompt
}
