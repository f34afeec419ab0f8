use colored::Colorize;

use crate::bridge::client;
use crate::cli::Cli;
use crate::commands::resolve_port;
use crate::config::Config;
use crate::error::{PaletteError, Result};
use crate::protocol::{ActionKind, ActionMessage};

pub async fn status(cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let port = resolve_port(cli, &config).await;

    if !client::is_bridge_running(port).await {
        if cli.json {
            println!(
                "{}",
                serde_json::json!({ "bridge_running": false, "port": port })
            );
        } else {
            println!(
                "  {} Bridge is not running on port {}",
                "✗".red(),
                port
            );
            println!(
                "  {}  Start it with `command-palette serve`",
                "ℹ".dimmed()
            );
        }
        return Ok(());
    }

    let status = client::send_command(port, "palette.status", serde_json::json!({})).await?;
    let connected = status
        .get("extension_connected")
        .and_then(|c| c.as_bool())
        .unwrap_or(false);

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "bridge_running": true,
                "port": port,
                "extension_connected": connected,
                "protocol_version": status.get("protocol_version"),
            })
        );
    } else {
        println!("  {} Bridge is running on port {}", "✓".green(), port);
        if connected {
            println!("  {} Extension connected", "✓".green());
        } else {
            println!("  {} Extension not connected", "!".yellow());
        }
    }

    Ok(())
}

pub async fn toggle(cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let port = resolve_port(cli, &config).await;

    let result = client::send_command(port, "palette.toggle", serde_json::json!({})).await?;

    if cli.json {
        println!("{}", result);
    } else {
        println!("  {} Toggle queued", "✓".green());
    }
    Ok(())
}

pub async fn send(
    cli: &Cli,
    action: &str,
    value: Option<&str>,
    new_window: bool,
    incognito: bool,
) -> Result<()> {
    let message = build_message(action, value, new_window, incognito)?;

    let config = Config::load()?;
    let port = resolve_port(cli, &config).await;

    let params = serde_json::to_value(&message)?;
    let result = client::send_command(port, "palette.dispatch", params).await?;

    if cli.json {
        println!("{}", result);
    } else {
        println!("  {} Sent {}", "✓".green(), message.action);
    }
    Ok(())
}

/// Numeric values for tab actions go out as tab ids, anything else as text.
/// Unknown action names are refused here rather than left for the dispatcher
/// to drop.
fn build_message(
    action: &str,
    value: Option<&str>,
    new_window: bool,
    incognito: bool,
) -> Result<ActionMessage> {
    let kind = ActionKind::parse(action).ok_or_else(|| {
        let known: Vec<&str> = ActionKind::ALL.iter().map(|k| k.as_str()).collect();
        PaletteError::Other(format!(
            "Unknown action '{}'. Expected one of: {}",
            action,
            known.join(", ")
        ))
    })?;

    let takes_tab = matches!(kind, ActionKind::ChangeActiveTab | ActionKind::CloseTab);
    let mut message = ActionMessage::new(kind);
    if let Some(value) = value {
        message = match value.parse::<i64>() {
            Ok(tab_id) if takes_tab => message.with_tab(tab_id),
            _ => message.with_value(value),
        };
    }
    if new_window || incognito {
        message = message.in_new_window(incognito);
    }
    Ok(message)
}
