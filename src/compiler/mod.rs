//! Turns a submitted component source into a runnable factory.
//!
//! Pipeline: default-export extraction → import rewriting → down-leveling →
//! factory template. Nothing is cached; every call recompiles.

pub mod downlevel;
pub mod exports;
pub mod factory;
pub mod imports;
pub mod lexer;

pub use downlevel::{CommandDownleveler, Downlevel, DownlevelError, Passthrough};
pub use exports::{extract_default_export, DefaultExport};
pub use imports::{rewrite_imports, ImportWarning, Rewrite};

use crate::registry::{default_registry, NamespaceRegistry};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("No default export found; the factory has nothing to return")]
    MissingDefaultExport,
    #[error("Unresolvable import `{statement}`: {reason}")]
    UnresolvableImport { statement: String, reason: String },
    #[error("Down-leveling failed: {0}")]
    Downlevel(#[from] DownlevelError),
}

pub type Result<T> = std::result::Result<T, CompileError>;

/// Output of a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactorySource {
    pub code: String,
    pub export_name: String,
    pub parameters: Vec<String>,
    pub warnings: Vec<ImportWarning>,
    /// blake3 of `code`, for correlating logs across the sandbox boundary.
    pub digest: String,
}

pub struct Compiler {
    registry: Arc<NamespaceRegistry>,
    downlevel: Arc<dyn Downlevel>,
}

impl Compiler {
    pub fn new(registry: Arc<NamespaceRegistry>, downlevel: Arc<dyn Downlevel>) -> Self {
        Self { registry, downlevel }
    }

    pub fn registry(&self) -> &Arc<NamespaceRegistry> {
        &self.registry
    }

    #[instrument(skip_all, fields(len = source.len(), downlevel = self.downlevel.name()))]
    pub fn compile(&self, source: &str) -> Result<FactorySource> {
        let result = self.run(source);
        match &result {
            Ok(factory) => debug!(
                export = %factory.export_name,
                digest = %factory.digest,
                warnings = factory.warnings.len(),
                "Component compiled"
            ),
            Err(e) => warn!(error = %e, "Component compilation failed"),
        }
        result
    }

    fn run(&self, source: &str) -> Result<FactorySource> {
        let extracted = extract_default_export(source);
        let export_name = extracted.name.ok_or(CompileError::MissingDefaultExport)?;

        let rewrite = rewrite_imports(&extracted.source, &self.registry)?;
        let lowered = self.downlevel.lower(&rewrite.source)?;

        let parameters: Vec<String> = self.registry.ids().map(str::to_string).collect();
        let code = factory::wrap(&lowered, &parameters, &export_name);
        let digest = blake3::hash(code.as_bytes()).to_hex().to_string();

        Ok(FactorySource {
            code,
            export_name,
            parameters,
            warnings: rewrite.warnings,
            digest,
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(default_registry(), Arc::new(Passthrough))
    }
}

/// Compiles with the default registry and no down-leveling.
pub fn compile(source: &str) -> Result<FactorySource> {
    Compiler::default().compile(source)
}
