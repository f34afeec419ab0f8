//! Session token and port files shared between `serve` and the other
//! commands that talk to a running bridge.

use std::path::PathBuf;

use rand::Rng;
use subtle::ConstantTimeEq;

use crate::error::{PaletteError, Result};

/// Token prefix for all bridge session tokens.
const TOKEN_PREFIX: &str = "cpt_";

/// Generate a new session token: `cpt_` + 32 random hex characters.
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}{}", TOKEN_PREFIX, hex)
}

/// Compare tokens in constant time.
pub fn token_matches(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).unwrap_u8() == 1
}

fn session_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir().ok_or_else(|| {
        PaletteError::Other("Cannot determine local data directory".to_string())
    })?;
    Ok(data_dir.join("command-palette"))
}

/// `~/.local/share/command-palette/bridge-token`
pub fn token_file_path() -> Result<PathBuf> {
    Ok(session_dir()?.join("bridge-token"))
}

/// `~/.local/share/command-palette/bridge-port`
pub fn port_file_path() -> Result<PathBuf> {
    Ok(session_dir()?.join("bridge-port"))
}

/// Write the session token with mode 0600: temp file first, then rename.
pub async fn write_token_file(token: &str) -> Result<()> {
    let path = token_file_path()?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    #[cfg(unix)]
    {
        let tmp_path = path.with_extension("tmp");
        let mut opts = tokio::fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true).mode(0o600);
        let mut file = opts.open(&tmp_path).await?;
        tokio::io::AsyncWriteExt::write_all(&mut file, token.as_bytes()).await?;
        tokio::io::AsyncWriteExt::flush(&mut file).await?;
        drop(file);
        tokio::fs::rename(&tmp_path, &path).await?;
    }

    #[cfg(not(unix))]
    {
        tokio::fs::write(&path, token).await?;
    }

    Ok(())
}

pub async fn read_token_file() -> Option<String> {
    let path = token_file_path().ok()?;
    tokio::fs::read_to_string(&path)
        .await
        .ok()
        .map(|s| s.trim().to_string())
}

pub async fn write_port_file(port: u16) -> Result<()> {
    let path = port_file_path()?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, port.to_string()).await?;
    Ok(())
}

/// Read the bridge port from file. Returns None if missing or invalid.
pub async fn read_port_file() -> Option<u16> {
    let path = port_file_path().ok()?;
    let content = tokio::fs::read_to_string(&path).await.ok()?;
    content.trim().parse().ok()
}

pub async fn delete_port_file() {
    if let Ok(path) = port_file_path() {
        let _ = tokio::fs::remove_file(&path).await;
    }
}
