//! Execution host / sandbox bridge.
//!
//! The host and the isolated rendering context run as separate tasks and
//! share nothing but an unacknowledged message channel:
//!
//! ```text
//! host ──{"signal":"update","code":…}──▶ context ──▶ Evaluator ──▶ Surface
//!      ◀──────{"signal":"ready"}─────────
//! ```

pub mod channel;
pub mod context;
pub mod evaluator;
pub mod host;
pub mod protocol;
pub mod session;

pub use channel::{channel, Port};
pub use context::{IsolatedContext, Surface};
pub use evaluator::{EvaluationError, Evaluator, ProcessEvaluator, Rendered};
pub use host::{HostState, SandboxHost};
pub use protocol::{ProtocolError, Signal};
pub use session::SandboxSession;

#[cfg(test)]
mod tests;
