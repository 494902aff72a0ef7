use chrono::{DateTime, Utc};
use liqmap_core::HeatmapSnapshot;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pre-serialised JSON frame, shared between the cache and every client task.
pub type Payload = Arc<str>;

/// Messages pushed to WebSocket clients
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        message: String,
        symbols: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    Snapshot(SnapshotMessage),
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn to_payload(&self) -> Result<Payload, serde_json::Error> {
        serde_json::to_string(self).map(Payload::from)
    }
}

/// Latest heatmap computed for one symbol
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SnapshotMessage {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub data: HeatmapSnapshot,
}

/// Messages accepted from WebSocket clients
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Resend the latest snapshot for `symbol`
    Request { symbol: String },
}

/// Latest snapshot payload per symbol, in first-published order.
#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    inner: Arc<RwLock<indexmap::IndexMap<String, Payload>>>,
}

impl SnapshotCache {
    pub fn insert(&self, symbol: &str, payload: Payload) {
        self.inner.write().insert(normalise(symbol), payload);
    }

    pub fn get(&self, symbol: &str) -> Option<Payload> {
        self.inner.read().get(&normalise(symbol)).cloned()
    }

    pub fn all(&self) -> Vec<Payload> {
        self.inner.read().values().cloned().collect()
    }
}

fn normalise(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
