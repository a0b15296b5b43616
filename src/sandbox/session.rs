//! A mounted surface: host state machine + isolated context, driven by one task.

use super::channel::{channel, Port};
use super::context::{IsolatedContext, Surface};
use super::evaluator::{Evaluator, Rendered};
use super::host::SandboxHost;
use crate::compiler::FactorySource;
use crate::registry::NamespaceRegistry;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

enum Command {
    Load(String),
    Remount,
}

pub struct SandboxSession {
    id: Uuid,
    commands: mpsc::UnboundedSender<Command>,
    surface: Surface,
    task: JoinHandle<()>,
}

impl SandboxSession {
    /// Mounts a fresh context that injects the registry's namespaces.
    /// Must be called from within a tokio runtime.
    pub fn mount(evaluator: Arc<dyn Evaluator>, registry: &NamespaceRegistry) -> Self {
        let id = Uuid::new_v4();
        let namespaces: Vec<String> = registry.ids().map(str::to_string).collect();
        let (surface_tx, surface) = watch::channel(None);
        let (commands, commands_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            evaluator,
            namespaces,
            surface: Arc::new(surface_tx),
        };
        let span = info_span!("sandbox", session = %id);
        let task = tokio::spawn(driver.run(commands_rx).instrument(span));

        Self {
            id,
            commands,
            surface,
            task,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Sends a compiled factory to the context. Returns immediately; the
    /// result shows up on [`surface`](Self::surface).
    pub fn load_and_render(&self, factory: &FactorySource) {
        debug!(session = %self.id, digest = %factory.digest, "Submitting factory");
        self.send(Command::Load(factory.code.clone()));
    }

    /// Replaces the isolated context with a fresh one. The last submitted
    /// factory is sent again once the new context is ready.
    pub fn remount(&self) {
        self.send(Command::Remount);
    }

    pub fn surface(&self) -> Surface {
        self.surface.clone()
    }

    pub fn current(&self) -> Option<Rendered> {
        self.surface.borrow().clone()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!(session = %self.id, "Session driver has stopped");
        }
    }
}

impl Drop for SandboxSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Driver {
    evaluator: Arc<dyn Evaluator>,
    namespaces: Vec<String>,
    surface: Arc<watch::Sender<Option<Rendered>>>,
}

impl Driver {
    fn mount_context(&self) -> (Port, IsolatedContext) {
        let (host_port, context_port) = channel();
        let context = IsolatedContext::mount(
            context_port,
            Arc::clone(&self.evaluator),
            self.namespaces.clone(),
            Arc::clone(&self.surface),
        );
        (host_port, context)
    }

    async fn run(self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let (port, context) = self.mount_context();
        let mut host = SandboxHost::new(port);
        let mut context = Some(context);
        info!(namespaces = ?self.namespaces, "Surface mounted");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Load(code)) => host.submit(code),
                    Some(Command::Remount) => {
                        // The old context must be gone before the new one clears the surface.
                        if let Some(old) = context.take() {
                            old.unmount().await;
                        }
                        let (port, fresh) = self.mount_context();
                        context = Some(fresh);
                        host.remount(port);
                        info!("Surface remounted");
                    }
                    None => break,
                },
                signal = host.next_signal() => match signal {
                    Some(signal) => host.handle(signal),
                    None => {
                        warn!("Isolated context stopped unexpectedly");
                        break;
                    }
                },
            }
        }

        drop(context);
        debug!("Surface torn down");
    }
}
