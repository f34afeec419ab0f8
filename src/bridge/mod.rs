//! Loopback WebSocket bridge between the dispatcher and the browser
//! extension shim.
//!
//! The extension connects with role `extension`: it forwards hotkey
//! commands, tab activations and palette port messages as events, and
//! answers the browser API requests the dispatcher sends it. Developer
//! tooling connects with role `cli` to poke a running dispatcher.

pub mod client;
mod server;
pub mod session;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::dispatcher::HostEvent;
use crate::error::{PaletteError, Result};
use crate::protocol::TabId;

/// Protocol version announced in `hello_ack` and the minimum accepted.
pub const PROTOCOL_VERSION: &str = "0.2.0";

/// Events the extension pushes without a request id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExtensionEvent {
    Command {
        command: String,
    },
    TabActivated {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    PortMessage {
        message: Value,
    },
}

impl From<ExtensionEvent> for HostEvent {
    fn from(event: ExtensionEvent) -> Self {
        match event {
            ExtensionEvent::Command { command } => HostEvent::Command(command),
            ExtensionEvent::TabActivated { tab_id } => HostEvent::TabActivated(tab_id),
            ExtensionEvent::PortMessage { message } => HostEvent::PortMessage(message),
        }
    }
}

/// Shared state for the bridge server
struct BridgeState {
    /// Session token that clients must present in the hello handshake
    token: String,
    /// Channel to send requests to the connected extension
    extension_tx: Option<mpsc::UnboundedSender<String>>,
    /// Dispatcher requests waiting for extension responses, keyed by request id
    pending: HashMap<u64, oneshot::Sender<Value>>,
    /// Monotonically increasing request id counter
    next_id: u64,
}

/// Handle to the bridge. Cheap to clone; all clones share one connection.
#[derive(Clone)]
pub struct Bridge {
    state: Arc<Mutex<BridgeState>>,
    events: mpsc::UnboundedSender<HostEvent>,
}

impl Bridge {
    /// Create a bridge that forwards extension events into `events`.
    pub fn new(token: String, events: mpsc::UnboundedSender<HostEvent>) -> Self {
        Self {
            state: Arc::new(Mutex::new(BridgeState {
                token,
                extension_tx: None,
                pending: HashMap::new(),
                next_id: 1,
            })),
            events,
        }
    }

    pub async fn is_extension_connected(&self) -> bool {
        self.state.lock().await.extension_tx.is_some()
    }

    /// Send one browser API request to the extension and wait for its
    /// response. No timeout: the request fails only when the extension
    /// answers with an error or disconnects.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let (response_tx, response_rx) = oneshot::channel::<Value>();

        {
            let mut s = self.state.lock().await;
            let ext_tx = s
                .extension_tx
                .clone()
                .ok_or(PaletteError::ExtensionNotConnected)?;

            let request_id = s.next_id;
            s.next_id += 1;
            s.pending.insert(request_id, response_tx);

            let frame = serde_json::json!({
                "id": request_id,
                "method": method,
                "params": params,
            });

            tracing::debug!("-> {} #{}", method, request_id);

            if ext_tx.send(frame.to_string()).is_err() {
                s.pending.remove(&request_id);
                s.extension_tx = None;
                return Err(PaletteError::ExtensionDisconnected);
            }
        }

        let response = response_rx
            .await
            .map_err(|_| PaletteError::ExtensionDisconnected)?;

        if let Some(error) = response.get("error") {
            return Err(PaletteError::BrowserApi {
                method: method.to_string(),
                message: error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("Unknown extension error")
                    .to_string(),
            });
        }

        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    fn forward_event(&self, event: HostEvent) {
        if self.events.send(event).is_err() {
            tracing::warn!("Dispatcher is gone; dropping extension event");
        }
    }
}
