use std::sync::Arc;

use colored::Colorize;
use tokio::sync::mpsc;

use crate::bridge::{session, Bridge, PROTOCOL_VERSION};
use crate::browser::ExtensionBackend;
use crate::cli::Cli;
use crate::config::Config;
use crate::dispatcher::{Dispatcher, Variant};
use crate::error::{PaletteError, Result};

pub async fn run(cli: &Cli, token: Option<&str>, variant: Option<&str>) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(variant) = variant {
        config.palette.variant = variant.parse::<Variant>().map_err(PaletteError::ConfigError)?;
    }
    let port = cli.port.unwrap_or(config.bridge.port);

    // Session files are only touched once the port is ours, so a failed start
    // leaves a running bridge's token and port in place.
    let listener = Bridge::bind(port).await?;

    let token = token
        .map(str::to_string)
        .or_else(|| config.bridge.token.clone())
        .unwrap_or_else(session::generate_token);
    session::write_token_file(&token).await.map_err(|e| {
        PaletteError::Other(format!(
            "Failed to write token file - check directory permissions: {}",
            e
        ))
    })?;

    session::write_port_file(port).await?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let bridge = Bridge::new(token.clone(), events_tx);
    let dispatcher = Dispatcher::new(Arc::new(ExtensionBackend::new(bridge.clone())), &config);
    let variant = dispatcher.variant();
    let actions: Vec<String> = dispatcher.table().actions().map(|a| a.to_string()).collect();
    let dispatcher_handle = tokio::spawn(dispatcher.run(events_rx));

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "status": "listening",
                "url": format!("ws://127.0.0.1:{}", port),
                "variant": variant.to_string(),
                "protocol_version": PROTOCOL_VERSION,
                "actions": actions,
            })
        );
    } else {
        println!();
        println!("  {}", "Command Palette".bold());
        println!("  {}", "─".repeat(40).dimmed());
        println!();
        println!(
            "  {}  WebSocket bridge on ws://127.0.0.1:{}",
            "◆".cyan(),
            port
        );
        println!(
            "  {}  Variant: {} ({} actions)",
            "◆".cyan(),
            variant,
            actions.len()
        );
        println!("  {}  Token: {}", "◆".cyan(), token.dimmed());
        println!();
        println!("  {}  Press Ctrl+C to stop", "ℹ".dimmed());
        println!();
    }

    let result = tokio::select! {
        result = bridge.run(listener) => result,
        signal = shutdown_signal() => signal,
    };

    dispatcher_handle.abort();
    session::delete_port_file().await;
    tracing::info!("Bridge stopped");

    result
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigint.recv() => tracing::info!("Received SIGINT"),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}
