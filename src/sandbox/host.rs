//! Host-side lifecycle of one rendering surface.

use super::channel::Port;
use super::protocol::Signal;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostState {
    /// No context has announced itself since the last (re)mount.
    Uninitialized,
    Ready,
    Rendering,
}

pub struct SandboxHost {
    state: HostState,
    last_source: Option<String>,
    port: Port,
}

impl SandboxHost {
    pub fn new(port: Port) -> Self {
        Self {
            state: HostState::Uninitialized,
            last_source: None,
            port,
        }
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    pub fn last_source(&self) -> Option<&str> {
        self.last_source.as_deref()
    }

    /// Records `code` as the current source and sends it if the context is
    /// listening; otherwise it goes out after the next readiness signal.
    pub fn submit(&mut self, code: String) {
        self.last_source = Some(code);
        match self.state {
            HostState::Uninitialized => debug!("Context not ready; holding source"),
            HostState::Ready | HostState::Rendering => self.send_last(),
        }
    }

    pub fn handle(&mut self, signal: Signal) {
        match signal {
            Signal::Ready => {
                debug!(resend = self.last_source.is_some(), "Context ready");
                self.state = HostState::Ready;
                self.send_last();
            }
            Signal::Update { .. } => warn!("Ignoring update sent by the isolated context"),
        }
    }

    /// Attaches to a freshly mounted context. Nothing is assumed to survive
    /// the restart; the last source is resent once the new context is ready.
    pub fn remount(&mut self, port: Port) {
        self.port = port;
        self.state = HostState::Uninitialized;
    }

    pub async fn next_signal(&mut self) -> Option<Signal> {
        self.port.recv().await
    }

    fn send_last(&mut self) {
        if let Some(code) = &self.last_source {
            self.port.post(&Signal::Update { code: code.clone() });
            self.state = HostState::Rendering;
        }
    }
}
