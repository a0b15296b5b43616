use super::*;
use crate::registry::Resolution;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

const FULL: &str = r#"
[parser]
cache_capacity = 8

[compiler.downlevel]
program = "esbuild"
args = ["--loader=jsx"]

[sandbox]
timeout_ms = 1500

[sandbox.evaluator]
program = "/usr/local/bin/render-factory"

[[registry.namespaces]]
id = "React"
resolution = { exact = "react" }

[[registry.namespaces]]
id = "kit"
resolution = { prefix = "@kit/" }
description = "House components"

[logging]
level = "artifacto=debug"
"#;

#[test]
fn empty_document_gives_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.parser.cache_capacity, 256);
    assert_eq!(config.logging.level, "info");
    assert!(config.evaluator().is_none());
}

#[test]
fn full_document_round_trips_into_sections() {
    let config = Config::parse(FULL).unwrap();

    assert_eq!(config.cache_capacity().unwrap().get(), 8);
    assert_eq!(
        config.compiler.downlevel,
        Some(CommandConfig {
            program: "esbuild".into(),
            args: vec!["--loader=jsx".into()],
        })
    );
    assert_eq!(config.sandbox.timeout_ms, Some(1500));
    assert_eq!(config.logging.level, "artifacto=debug");

    let registry = config.registry().unwrap();
    assert_eq!(registry.ids().collect::<Vec<_>>(), ["React", "kit"]);
    assert_eq!(registry.get("kit").unwrap().resolution, Resolution::Prefix("@kit/".into()));
}

#[test]
fn compiler_uses_configured_registry_order() {
    let config = Config::parse(
        r#"
        [[registry.namespaces]]
        id = "h"
        resolution = { exact = "hyperscript" }
        "#,
    )
    .unwrap();
    let factory = config
        .compiler()
        .unwrap()
        .compile("import { div } from \"hyperscript\";\nexport default function A() { return div() }")
        .unwrap();
    assert!(factory.code.starts_with("return function(h) {\nconst { div } = h;"));
}

#[test]
fn empty_registry_section_falls_back_to_defaults() {
    let registry = Config::default().registry().unwrap();
    assert_eq!(registry.ids().count(), 5);
    assert!(Arc::ptr_eq(&registry, &default_registry()));
}

#[test]
fn zero_cache_capacity_is_rejected() {
    let err = Config::parse("[parser]\ncache_capacity = 0").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "parser.cache_capacity",
            ..
        }
    ));
}

#[test]
fn duplicate_namespace_ids_are_rejected() {
    let err = Config::parse(
        r#"
        [[registry.namespaces]]
        id = "ui"
        resolution = { exact = "a" }

        [[registry.namespaces]]
        id = "ui"
        resolution = { exact = "b" }
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Registry(RegistryError::DuplicateId(id)) if id == "ui"));
}

#[test]
fn other_invalid_values_are_rejected() {
    for (text, field) in [
        ("[sandbox]\ntimeout_ms = 0", "sandbox.timeout_ms"),
        ("[sandbox.evaluator]\nprogram = \" \"", "sandbox.evaluator.program"),
        ("[compiler.downlevel]\nprogram = \"\"", "compiler.downlevel.program"),
        ("[logging]\nlevel = \"\"", "logging.level"),
    ] {
        match Config::parse(text) {
            Err(ConfigError::Invalid { field: got, .. }) => assert_eq!(got, field),
            other => panic!("{}: unexpected {:?}", text, other),
        }
    }
}

#[test]
fn syntax_errors_are_parse_errors() {
    assert!(matches!(Config::parse("[parser"), Err(ConfigError::Parse(_))));
    assert!(matches!(
        Config::parse("[parser]\ncache_capacity = \"many\""),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn loads_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(FULL.as_bytes()).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.parser.cache_capacity, 8);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    match Config::from_file(&path) {
        Err(ConfigError::Io { path: got, .. }) => assert_eq!(got, path),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn from_env_follows_the_path_variable() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[logging]\nlevel = \"warn\"\n").unwrap();

    env::set_var(CONFIG_ENV, file.path());
    let loaded = Config::from_env();
    env::remove_var(CONFIG_ENV);
    let unset = Config::from_env();

    assert_eq!(loaded.unwrap().logging.level, "warn");
    assert_eq!(unset.unwrap(), Config::default());
}

#[test]
fn evaluator_picks_up_timeout() {
    let config = Config::parse(FULL).unwrap();
    let evaluator = config.evaluator().unwrap();
    assert_eq!(
        format!("{:?}", evaluator),
        format!(
            "{:?}",
            ProcessEvaluator::new("/usr/local/bin/render-factory", vec![])
                .with_timeout(Duration::from_millis(1500))
        )
    );
}
