use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("Browser API call {method} failed: {message}")]
    BrowserApi { method: String, message: String },

    #[error("Extension not connected. Is the browser open with the palette extension enabled?")]
    ExtensionNotConnected,

    #[error("Extension disconnected")]
    ExtensionDisconnected,

    #[error("Palette port closed")]
    PortClosed,

    #[error("Invalid action message: {0}")]
    InvalidMessage(String),

    #[error("Bridge error: {0}")]
    BridgeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PaletteError>;
