//! Renders assistant messages that embed thinking and artifacts: a streaming
//! segment parser, a component-to-factory compiler and a sandbox bridge that
//! runs the factory in an isolated context.

pub mod commands;
pub mod compiler;
pub mod config;
pub mod logging;
pub mod prompt;
pub mod registry;
pub mod sandbox;
pub mod segment;
pub mod view;

pub use compiler::{compile, CompileError, Compiler, FactorySource};
pub use config::{Config, ConfigError};
pub use registry::{default_registry, Namespace, NamespaceRegistry};
pub use sandbox::{SandboxSession, Signal};
pub use segment::{parse, Artifact, ArtifactKind, ParsedMessage, Segment};
