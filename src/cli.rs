use clap::{Parser, Subcommand};

use crate::commands;
use crate::error::Result;

/// Command palette dispatcher - tab switching and browser actions behind one hotkey
#[derive(Parser)]
#[command(name = "command-palette")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Bridge port (overrides config)
    #[arg(long, env = "COMMAND_PALETTE_PORT", global = true)]
    pub port: Option<u16>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bridge and the dispatcher until interrupted
    Serve {
        /// Session token the extension must present (default: generated)
        #[arg(long, env = "COMMAND_PALETTE_TOKEN")]
        token: Option<String>,

        /// Dispatcher variant: full or compact
        #[arg(long)]
        variant: Option<String>,
    },

    /// Show whether the bridge is running and the extension is connected
    Status,

    /// Fire the toggle-palette command on a running dispatcher
    Toggle,

    /// Send one palette action to a running dispatcher
    Send {
        /// Action name (e.g., open-tab, search, change-active-tab)
        action: String,

        /// Tab id, URL or search query, depending on the action
        value: Option<String>,

        /// Open the result in a new window
        #[arg(long)]
        new_window: bool,

        /// Open the result in a new incognito window (implies --new-window)
        #[arg(long)]
        incognito: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., palette.variant, pages.scheme)
        key: String,
        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show configuration file path
    Path,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Serve { token, variant } => {
                commands::serve::run(self, token.as_deref(), variant.as_deref()).await
            }
            Commands::Status => commands::palette::status(self).await,
            Commands::Toggle => commands::palette::toggle(self).await,
            Commands::Send {
                action,
                value,
                new_window,
                incognito,
            } => {
                commands::palette::send(self, action, value.as_deref(), *new_window, *incognito)
                    .await
            }
            Commands::Config { command } => commands::config::run(self, command).await,
        }
    }
}
