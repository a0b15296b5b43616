//! `key="value"` extraction for opening `<artifact ...>` tags.

use super::{Artifact, ArtifactKind};
use regex::Regex;
use std::sync::LazyLock;

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w+)="([^"]*)""#).expect("attribute pattern is valid")
});

/// Fills the attribute fields of `artifact` from the text after the tag name.
/// Single-quoted and bare values are not recognized; unknown keys are ignored.
pub(super) fn apply(artifact: &mut Artifact, attributes: &str) {
    for caps in ATTRIBUTE.captures_iter(attributes) {
        let value = caps[2].to_string();
        match &caps[1] {
            "identifier" => artifact.id = Some(value),
            "type" => artifact.kind = Some(ArtifactKind::from(value)),
            "title" => artifact.title = Some(value),
            "language" => artifact.language = Some(value),
            _ => {}
        }
    }
}
