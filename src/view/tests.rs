use super::*;
use crate::segment::ParsedMessage;
use pretty_assertions::assert_eq;

fn artifact(kind: &str, language: Option<&str>, content: &str) -> Artifact {
    Artifact {
        id: Some("a".into()),
        kind: Some(ArtifactKind::from_mime(kind)),
        title: None,
        language: language.map(str::to_string),
        content: content.into(),
        generating: false,
    }
}

fn source(language: &str, source: &str) -> Presentation {
    Presentation::Code {
        language: language.into(),
        source: source.into(),
        error: None,
    }
}

#[test]
fn preview_toggle_only_for_html_and_react() {
    let supported: Vec<_> = ArtifactKind::KNOWN.iter().filter(|k| supports_preview(k)).collect();
    assert_eq!(supported, [&ArtifactKind::Html, &ArtifactKind::React]);
}

#[test]
fn html_preview_is_the_document() {
    let html = artifact("text/html", None, "<h1>Hi</h1>");
    let compiler = Compiler::default();
    assert_eq!(
        present(&html, ViewMode::Preview, &compiler),
        Presentation::Html {
            document: "<h1>Hi</h1>".into()
        }
    );
    assert_eq!(present(&html, ViewMode::Code, &compiler), source("html", "<h1>Hi</h1>"));
}

#[test]
fn react_preview_compiles_the_component() {
    let react = artifact("application/react", None, "export default function App() { return null }");
    match present(&react, ViewMode::Preview, &Compiler::default()) {
        Presentation::Component { factory } => assert_eq!(factory.export_name, "App"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn react_compile_failure_falls_back_to_source() {
    let react = artifact("application/react", None, "const App = () => null");
    match present(&react, ViewMode::Preview, &Compiler::default()) {
        Presentation::Code {
            language,
            source,
            error,
        } => {
            assert_eq!(language, "tsx");
            assert_eq!(source, "const App = () => null");
            assert!(error.unwrap().contains("default export"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn language_attribute_only_counts_where_the_kind_uses_it() {
    let compiler = Compiler::default();
    let jsx = artifact("application/react", Some("jsx"), "export default function App() {}");
    assert_eq!(
        present(&jsx, ViewMode::Code, &compiler),
        source("jsx", "export default function App() {}")
    );

    let html = artifact("text/html", Some("python"), "<p>hi</p>");
    assert_eq!(present(&html, ViewMode::Code, &compiler), source("html", "<p>hi</p>"));
}

#[test]
fn generating_artifacts_show_code_even_in_preview() {
    let mut html = artifact("text/html", None, "<h1>H");
    html.generating = true;
    assert_eq!(
        present(&html, ViewMode::Preview, &Compiler::default()),
        source("html", "<h1>H")
    );
}

#[test]
fn code_artifacts_need_a_language() {
    let compiler = Compiler::default();
    let python = artifact("application/code", Some("python"), "print(1)");
    assert_eq!(present(&python, ViewMode::Preview, &compiler), source("python", "print(1)"));

    let bare = artifact("application/code", None, "print(1)");
    assert_eq!(
        present(&bare, ViewMode::Code, &compiler),
        Presentation::Unsupported {
            kind: Some("application/code".into())
        }
    );
}

#[test]
fn document_kinds_ignore_the_mode() {
    let compiler = Compiler::default();
    for mode in [ViewMode::Code, ViewMode::Preview] {
        assert_eq!(
            present(&artifact("text/markdown", None, "# T"), mode, &compiler),
            Presentation::Markdown { source: "# T".into() }
        );
        assert_eq!(
            present(&artifact("image/svg+xml", None, "<svg/>"), mode, &compiler),
            Presentation::Svg {
                markup: "<svg/>".into()
            }
        );
        assert_eq!(
            present(&artifact("application/mermaid", None, "graph TD"), mode, &compiler),
            Presentation::Diagram {
                source: "graph TD".into()
            }
        );
    }
}

#[test]
fn unknown_or_missing_kind_is_unsupported() {
    let compiler = Compiler::default();
    assert_eq!(
        present(&artifact("text/csv", None, "a,b"), ViewMode::Code, &compiler),
        Presentation::Unsupported {
            kind: Some("text/csv".into())
        }
    );
    let untyped = Artifact::default();
    assert_eq!(
        present(&untyped, ViewMode::Preview, &compiler),
        Presentation::Unsupported { kind: None }
    );
}

#[test]
fn presents_parsed_message_artifacts() {
    let message = ParsedMessage::parse(
        "Here you go\n<artifact identifier=\"page\" type=\"text/html\" title=\"Page\"><p>ok</p></artifact>",
    );
    let page = message.artifact("page").unwrap();
    let presentation = present(page, ViewMode::Preview, &Compiler::default());
    assert_eq!(
        serde_json::to_value(&presentation).unwrap(),
        serde_json::json!({ "view": "html", "document": "<p>ok</p>" })
    );
}
