//! One end of the asynchronous, fire-and-forget message channel.
//! Messages travel as encoded JSON strings, never as shared values.

use super::protocol::Signal;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

pub struct Port {
    tx: UnboundedSender<String>,
    rx: UnboundedReceiver<String>,
}

/// A connected pair: whatever one end posts, the other receives.
pub fn channel() -> (Port, Port) {
    let (a_tx, a_rx) = mpsc::unbounded_channel();
    let (b_tx, b_rx) = mpsc::unbounded_channel();
    (Port { tx: a_tx, rx: b_rx }, Port { tx: b_tx, rx: a_rx })
}

impl Port {
    /// At most once: a message to a closed peer is dropped.
    pub fn post(&self, signal: &Signal) {
        match signal.encode() {
            Ok(raw) => self.post_raw(raw),
            Err(e) => warn!(error = %e, "Dropping unencodable signal"),
        }
    }

    pub fn post_raw(&self, raw: String) {
        if self.tx.send(raw).is_err() {
            debug!("Peer is gone; message dropped");
        }
    }

    /// Next decodable signal. Malformed messages are logged and skipped.
    /// `None` once the peer has hung up.
    pub async fn recv(&mut self) -> Option<Signal> {
        loop {
            let raw = self.rx.recv().await?;
            if let Some(signal) = decode_or_log(&raw) {
                return Some(signal);
            }
        }
    }

    /// Every signal already queued, without waiting.
    pub fn drain(&mut self) -> Vec<Signal> {
        let mut signals = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(raw) => signals.extend(decode_or_log(&raw)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        signals
    }
}

fn decode_or_log(raw: &str) -> Option<Signal> {
    match Signal::decode(raw) {
        Ok(signal) => Some(signal),
        Err(e) => {
            warn!(error = %e, "Dropping malformed message");
            None
        }
    }
}
