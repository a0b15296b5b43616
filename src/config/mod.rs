//! Runtime configuration, loaded from TOML.
//!
//! ```toml
//! [parser]
//! cache_capacity = 512
//!
//! [compiler.downlevel]
//! program = "esbuild"
//! args = ["--loader=jsx"]
//!
//! [sandbox]
//! timeout_ms = 2000
//! [sandbox.evaluator]
//! program = "/usr/local/bin/render-factory"
//!
//! [[registry.namespaces]]
//! id = "d3"
//! resolution = { exact = "d3" }
//!
//! [logging]
//! level = "debug"
//! ```

use crate::compiler::{CommandDownleveler, Compiler, Downlevel, Passthrough};
use crate::registry::{default_registry, Namespace, NamespaceRegistry, RegistryError};
use crate::sandbox::ProcessEvaluator;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use std::{env, fs};
use thiserror::Error;
use tracing::debug;

/// Environment variable holding the config file path.
pub const CONFIG_ENV: &str = "ARTIFACTO_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("Invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfig,
    pub compiler: CompilerConfig,
    pub sandbox: SandboxConfig,
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Entries kept by the parse cache.
    pub cache_capacity: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            cache_capacity: crate::segment::cache::DEFAULT_CAPACITY,
        }
    }
}

/// An external program invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// JSX down-leveler; sources pass through unchanged when unset.
    pub downlevel: Option<CommandConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub evaluator: Option<CommandConfig>,
    /// Off unless set.
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Replaces the built-in namespaces when non-empty.
    pub namespaces: Vec<Namespace>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loading config");
        Self::parse(&text)
    }

    /// Reads `.env` if present, then loads the file named by
    /// `ARTIFACTO_CONFIG`. Defaults when the variable is unset.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        match env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.parser.cache_capacity == 0 {
            return Err(invalid("parser.cache_capacity", "must be at least 1"));
        }
        if let Some(command) = &self.compiler.downlevel {
            check_program("compiler.downlevel.program", command)?;
        }
        if let Some(command) = &self.sandbox.evaluator {
            check_program("sandbox.evaluator.program", command)?;
        }
        if self.sandbox.timeout_ms == Some(0) {
            return Err(invalid("sandbox.timeout_ms", "must be positive when set"));
        }
        if self.logging.level.trim().is_empty() {
            return Err(invalid("logging.level", "must not be empty"));
        }
        self.registry()?;
        Ok(())
    }

    pub fn cache_capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.parser.cache_capacity)
            .ok_or_else(|| invalid("parser.cache_capacity", "must be at least 1"))
    }

    /// Configured namespaces, or the built-in registry.
    pub fn registry(&self) -> Result<Arc<NamespaceRegistry>> {
        if self.registry.namespaces.is_empty() {
            return Ok(default_registry());
        }
        Ok(Arc::new(NamespaceRegistry::new(self.registry.namespaces.clone())?))
    }

    pub fn compiler(&self) -> Result<Compiler> {
        let downlevel: Arc<dyn Downlevel> = match &self.compiler.downlevel {
            Some(command) => Arc::new(CommandDownleveler::new(&command.program, command.args.clone())),
            None => Arc::new(Passthrough),
        };
        Ok(Compiler::new(self.registry()?, downlevel))
    }

    /// `None` when no evaluator program is configured.
    pub fn evaluator(&self) -> Option<ProcessEvaluator> {
        let command = self.sandbox.evaluator.as_ref()?;
        let evaluator = ProcessEvaluator::new(&command.program, command.args.clone());
        Some(match self.sandbox.timeout_ms {
            Some(ms) => evaluator.with_timeout(Duration::from_millis(ms)),
            None => evaluator,
        })
    }
}

fn check_program(field: &'static str, command: &CommandConfig) -> Result<()> {
    if command.program.trim().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests;
