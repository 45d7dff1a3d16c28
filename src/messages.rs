/// WebSocket message shapes for the upstream data/assistant channel
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Messages arriving from the remote backend. These are the only three
/// shapes the core reacts to; anything else on the channel is the
/// backend's business.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    /// A replacement dataset streamed over the persistent channel.
    #[serde(rename_all = "camelCase")]
    DataUpdate {
        rows: Vec<HashMap<String, JsonValue>>,
        headers: Vec<String>,
        #[serde(default)]
        total_row_count: Option<u64>,
    },

    /// An assistant chat line to display alongside the data.
    Chat { text: String },

    /// A backend failure, surfaced as a transient notification.
    Error { text: String },
}

/// Messages sent to the remote backend.
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// A user chat line drained from the session outbox.
    Chat { text: String },
}
