use std::net::SocketAddr;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::http::{Request, Response, StatusCode};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use super::session::token_matches;
use super::{Bridge, ExtensionEvent, PROTOCOL_VERSION};
use crate::dispatcher::HostEvent;
use crate::error::{PaletteError, Result};
use crate::protocol::TOGGLE_COMMAND;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsStream = SplitStream<WebSocketStream<TcpStream>>;

/// How long a fresh connection may take to say hello.
const HELLO_TIMEOUT: Duration = Duration::from_secs(5);

/// Accept browser-extension origins and plain-http loopback pages. A missing
/// Origin header (native clients) is accepted as well.
fn is_origin_allowed(origin: Option<&str>) -> bool {
    let Some(origin) = origin else {
        return true;
    };
    let origin = origin.to_ascii_lowercase();
    let Some((scheme, rest)) = origin.split_once("://") else {
        return false;
    };
    let authority = rest.trim_end_matches('/');
    if authority.is_empty() || authority.contains('/') {
        return false;
    }

    match scheme {
        "chrome-extension" => true,
        "http" => {
            let host = if authority.starts_with('[') {
                match authority.find(']') {
                    Some(end) => &authority[..=end],
                    None => return false,
                }
            } else {
                authority.split(':').next().unwrap_or("")
            };
            let port_ok = match authority[host.len()..].strip_prefix(':') {
                Some(port) => port.parse::<u16>().is_ok(),
                None => authority.len() == host.len(),
            };
            port_ok && matches!(host, "127.0.0.1" | "localhost" | "[::1]")
        }
        _ => false,
    }
}

fn json_frame(value: Value) -> Message {
    Message::Text(value.to_string().into())
}

impl Bridge {
    /// Bind the loopback listener for the bridge.
    pub async fn bind(port: u16) -> Result<TcpListener> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        TcpListener::bind(&addr)
            .await
            .map_err(|e| PaletteError::BridgeError(format!("Failed to bind to {}: {}", addr, e)))
    }

    /// Accept connections until the listener fails.
    pub async fn run(&self, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer) = listener
                .accept()
                .await
                .map_err(|e| PaletteError::BridgeError(format!("Accept failed: {}", e)))?;

            if !peer.ip().is_loopback() {
                tracing::warn!("Rejected non-loopback connection from {}", peer);
                continue;
            }

            tracing::debug!("New connection from {}", peer);
            let bridge = self.clone();
            tokio::spawn(async move { bridge.handle_connection(stream).await });
        }
    }

    /// Origin check during the upgrade, then the hello handshake, then the
    /// role-specific loop.
    async fn handle_connection(self, stream: TcpStream) {
        let ws = match tokio_tungstenite::accept_hdr_async(
            stream,
            |req: &Request<()>,
             resp: Response<()>|
             -> std::result::Result<Response<()>, Response<Option<String>>> {
                let origin = req.headers().get("origin").and_then(|v| v.to_str().ok());
                if is_origin_allowed(origin) {
                    return Ok(resp);
                }
                tracing::warn!("Rejected WebSocket connection with origin: {:?}", origin);
                let mut rejection = Response::new(Some("Forbidden origin".to_string()));
                *rejection.status_mut() = StatusCode::FORBIDDEN;
                Err(rejection)
            },
        )
        .await
        {
            Ok(ws) => ws,
            Err(e) => {
                tracing::error!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws.split();

        let hello: Value = match tokio::time::timeout(HELLO_TIMEOUT, read.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str(text.as_str()) {
                Ok(v) => v,
                Err(_) => {
                    tracing::warn!("Invalid JSON in hello");
                    return;
                }
            },
            _ => {
                tracing::warn!("Client disconnected or timed out before sending hello");
                return;
            }
        };

        if hello.get("type").and_then(|t| t.as_str()) != Some("hello") {
            tracing::warn!("Expected hello message, got {}", hello);
            return;
        }

        let role = hello.get("role").and_then(|r| r.as_str()).unwrap_or("");
        let version = hello
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or("0.0.0");
        let presented = hello.get("token").and_then(|t| t.as_str()).unwrap_or("");

        if let Err(rejection) = self.check_hello(version, presented).await {
            tracing::warn!("Rejected {} client: {}", role, rejection["error"]);
            let _ = write.send(json_frame(rejection)).await;
            return;
        }

        let ack = serde_json::json!({ "type": "hello_ack", "version": PROTOCOL_VERSION });
        if write.send(json_frame(ack)).await.is_err() {
            tracing::warn!("Failed to send hello_ack to {} client", role);
            return;
        }

        match role {
            "extension" => self.handle_extension_client(write, read).await,
            "cli" => self.handle_cli_client(write, read).await,
            other => tracing::warn!("Unknown client role: {}", other),
        }
    }

    /// Returns the `hello_error` frame when the client may not proceed.
    async fn check_hello(&self, version: &str, presented: &str) -> std::result::Result<(), Value> {
        let minimum = semver::Version::new(0, 2, 0);
        let version_ok = semver::Version::parse(version)
            .map(|v| v >= minimum)
            .unwrap_or(false);
        if !version_ok {
            return Err(serde_json::json!({
                "type": "hello_error",
                "error": "version_mismatch",
                "message": format!(
                    "Protocol version {} is not supported. Minimum required: {}",
                    version, PROTOCOL_VERSION
                ),
                "required_version": PROTOCOL_VERSION,
            }));
        }

        let s = self.state.lock().await;
        if !token_matches(&s.token, presented) {
            return Err(serde_json::json!({
                "type": "hello_error",
                "error": "invalid_token",
                "message": "Token mismatch. Read the current token from the bridge-token file.",
            }));
        }

        Ok(())
    }

    /// Keep the extension's sender in shared state, route responses to the
    /// pending requests and events to the dispatcher.
    async fn handle_extension_client(&self, mut write: WsSink, mut read: WsStream) {
        tracing::info!("Extension connected");

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        {
            let mut s = self.state.lock().await;
            if s.extension_tx.replace(tx.clone()).is_some() {
                tracing::warn!("A second extension connected; replacing the previous one");
                // Requests still out on the replaced connection will never be
                // answered here; dropping their senders fails them.
                s.pending.clear();
            }
        }

        let write_handle = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if write.send(Message::Text(msg.into())).await.is_err() {
                    break;
                }
            }
            let _ = write
                .send(Message::Close(Some(CloseFrame {
                    code: CloseCode::Normal,
                    reason: "Session ended".into(),
                })))
                .await;
        });

        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => self.on_extension_frame(text.as_str()).await,
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    tracing::error!("Extension WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        tracing::info!("Extension disconnected");

        {
            let mut s = self.state.lock().await;
            let ours = s
                .extension_tx
                .as_ref()
                .is_some_and(|current| current.same_channel(&tx));
            if ours {
                s.extension_tx = None;
                // Dropping the senders fails every waiting request.
                s.pending.clear();
            }
        }

        write_handle.abort();
    }

    async fn on_extension_frame(&self, raw: &str) {
        let frame: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("Invalid JSON from extension: {}", e);
                return;
            }
        };

        if let Some(id) = frame.get("id").and_then(|i| i.as_u64()) {
            let mut s = self.state.lock().await;
            match s.pending.remove(&id) {
                Some(sender) => {
                    let _ = sender.send(frame);
                }
                None => tracing::warn!("Response for unknown request id: {}", id),
            }
            return;
        }

        match serde_json::from_value::<ExtensionEvent>(frame) {
            Ok(event) => self.forward_event(event.into()),
            Err(e) => tracing::warn!("Unrecognised extension event: {}", e),
        }
    }

    /// One request per CLI connection: read it, answer it, done.
    async fn handle_cli_client(&self, mut write: WsSink, mut read: WsStream) {
        let request: Value = match tokio::time::timeout(HELLO_TIMEOUT, read.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str(text.as_str()) {
                Ok(v) => v,
                Err(_) => {
                    tracing::warn!("Invalid JSON command from CLI");
                    return;
                }
            },
            _ => {
                tracing::warn!("CLI disconnected before sending command");
                return;
            }
        };

        let id = request.get("id").cloned().unwrap_or(serde_json::json!(0));
        let method = request.get("method").and_then(|m| m.as_str()).unwrap_or("");
        let params = request.get("params").cloned().unwrap_or(Value::Null);

        tracing::debug!("CLI command: {} {}", method, params);

        let reply = match method {
            "palette.toggle" => {
                self.forward_event(HostEvent::Command(TOGGLE_COMMAND.to_string()));
                serde_json::json!({ "id": id, "result": { "queued": true } })
            }
            "palette.dispatch" => {
                self.forward_event(HostEvent::PortMessage(params));
                serde_json::json!({ "id": id, "result": { "queued": true } })
            }
            "palette.status" => serde_json::json!({
                "id": id,
                "result": {
                    "extension_connected": self.is_extension_connected().await,
                    "protocol_version": PROTOCOL_VERSION,
                }
            }),
            other => serde_json::json!({
                "id": id,
                "error": { "code": -32601, "message": format!("Method not allowed: {}", other) }
            }),
        };

        let _ = write.send(json_frame(reply)).await;
    }
}
