//! The isolated rendering context: a task that listens on its end of the
//! channel, evaluates updates and publishes what it rendered.

use super::channel::Port;
use super::evaluator::{Evaluator, Rendered};
use super::protocol::Signal;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

/// Read side of the rendered output. `None` until something rendered.
pub type Surface = watch::Receiver<Option<Rendered>>;

/// Running context; aborted when dropped.
pub struct IsolatedContext {
    task: JoinHandle<()>,
}

impl IsolatedContext {
    /// Starts a context on `port`. The surface is cleared, then the context
    /// announces itself with a readiness signal.
    pub fn mount(
        port: Port,
        evaluator: Arc<dyn Evaluator>,
        namespaces: Vec<String>,
        surface: Arc<watch::Sender<Option<Rendered>>>,
    ) -> Self {
        surface.send_replace(None);
        let span = tracing::debug_span!("isolated_context", evaluator = evaluator.name());
        let task = tokio::spawn(run(port, evaluator, namespaces, surface).instrument(span));
        Self { task }
    }

    /// Aborts the task and waits until it has stopped, after which it can no
    /// longer publish to the surface.
    pub async fn unmount(mut self) {
        self.task.abort();
        if let Err(e) = (&mut self.task).await {
            if !e.is_cancelled() {
                warn!(error = %e, "Isolated context failed");
            }
        }
    }
}

impl Drop for IsolatedContext {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut port: Port,
    evaluator: Arc<dyn Evaluator>,
    namespaces: Vec<String>,
    surface: Arc<watch::Sender<Option<Rendered>>>,
) {
    port.post(&Signal::Ready);
    let mut pending: Option<String> = None;

    loop {
        let code = match pending.take() {
            Some(code) => code,
            None => match next_update(&mut port).await {
                Some(code) => code,
                None => break,
            },
        };
        let code = newest(&mut port, code);

        tokio::select! {
            result = evaluator.evaluate(&code, &namespaces) => match result {
                Ok(rendered) => {
                    debug!(digest = %rendered.source_digest, "Rendered");
                    surface.send_replace(Some(rendered));
                }
                // The previous output stays in place.
                Err(e) => warn!(error = %e, "Evaluation failed"),
            },
            next = next_update(&mut port) => match next {
                Some(code) => {
                    debug!("Evaluation superseded by a newer update");
                    pending = Some(code);
                }
                None => break,
            },
        }
    }

    info!("Host hung up; context stopped");
}

async fn next_update(port: &mut Port) -> Option<String> {
    loop {
        match port.recv().await? {
            Signal::Update { code } => return Some(code),
            Signal::Ready => warn!("Ignoring readiness signal sent to the context"),
        }
    }
}

/// Coalesces a burst: any updates already queued behind `code` win.
fn newest(port: &mut Port, code: String) -> String {
    let mut latest = code;
    let mut skipped = 0usize;
    for signal in port.drain() {
        if let Signal::Update { code } = signal {
            latest = code;
            skipped += 1;
        }
    }
    if skipped > 0 {
        debug!(skipped, "Coalesced queued updates");
    }
    latest
}
