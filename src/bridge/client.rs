//! CLI side of the bridge: connect, say hello as `cli`, send one request.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::session;
use super::PROTOCOL_VERSION;
use crate::error::{PaletteError, Result};

/// Send one request to a running bridge, reading the token from the
/// session file.
pub async fn send_command(port: u16, method: &str, params: Value) -> Result<Value> {
    let token = session::read_token_file().await.ok_or_else(|| {
        PaletteError::BridgeError(
            "No bridge token found. Is `command-palette serve` running?".to_string(),
        )
    })?;

    send_command_with_token(port, method, params, &token).await
}

/// Send one request with an explicit token.
pub async fn send_command_with_token(
    port: u16,
    method: &str,
    params: Value,
    token: &str,
) -> Result<Value> {
    let url = format!("ws://127.0.0.1:{}", port);
    let (mut ws, _) = connect_async(&url).await.map_err(|e| {
        PaletteError::BridgeError(format!(
            "Cannot connect to bridge at {}. Is `command-palette serve` running? ({})",
            url, e
        ))
    })?;

    let hello = serde_json::json!({
        "type": "hello",
        "role": "cli",
        "token": token,
        "version": PROTOCOL_VERSION,
    });
    ws.send(Message::Text(hello.to_string().into()))
        .await
        .map_err(|e| PaletteError::BridgeError(format!("Send hello failed: {}", e)))?;

    match tokio::time::timeout(Duration::from_secs(5), ws.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => {
            let ack: Value = serde_json::from_str(text.as_str()).unwrap_or_default();
            if ack.get("type").and_then(|t| t.as_str()) != Some("hello_ack") {
                let reason = ack
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("handshake rejected");
                return Err(PaletteError::BridgeError(format!(
                    "Authentication failed: {}",
                    reason
                )));
            }
        }
        Ok(Some(Err(e))) => {
            return Err(PaletteError::BridgeError(format!(
                "Authentication error: {}",
                e
            )));
        }
        Ok(_) => {
            return Err(PaletteError::BridgeError(
                "Authentication failed: connection closed during handshake".to_string(),
            ));
        }
        Err(_) => {
            return Err(PaletteError::BridgeError(
                "Authentication timeout: bridge did not respond".to_string(),
            ));
        }
    }

    let request = serde_json::json!({
        "id": 1,
        "method": method,
        "params": params,
    });
    ws.send(Message::Text(request.to_string().into()))
        .await
        .map_err(|e| PaletteError::BridgeError(format!("Send failed: {}", e)))?;

    while let Some(frame) = ws.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let resp: Value = serde_json::from_str(text.as_str())?;
                if let Some(error) = resp.get("error") {
                    return Err(PaletteError::BridgeError(
                        error
                            .get("message")
                            .and_then(|m| m.as_str())
                            .unwrap_or("Unknown bridge error")
                            .to_string(),
                    ));
                }
                return Ok(resp.get("result").cloned().unwrap_or(Value::Null));
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                return Err(PaletteError::BridgeError(format!("WebSocket error: {}", e)));
            }
        }
    }

    Err(PaletteError::BridgeError(
        "Connection closed without response".to_string(),
    ))
}

/// Plain TCP connect check; does not open a WebSocket session.
pub async fn is_bridge_running(port: u16) -> bool {
    tokio::net::TcpStream::connect(format!("127.0.0.1:{}", port))
        .await
        .is_ok()
}
