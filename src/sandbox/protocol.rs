//! Wire format of the host ⇄ isolated-context channel.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Undecodable message {raw:?}: {source}")]
    Decode {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode signal: {0}")]
    Encode(#[source] serde_json::Error),
}

/// `{"signal":"ready"}` / `{"signal":"update","code":"…"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "lowercase")]
pub enum Signal {
    /// Sent once by a freshly loaded context.
    Ready,
    /// Replaces whatever the context currently renders.
    Update { code: String },
}

impl Signal {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw).map_err(|source| ProtocolError::Decode {
            raw: raw.to_string(),
            source,
        })
    }
}
