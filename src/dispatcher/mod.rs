//! Background dispatcher: turns hotkey presses, tab activations and palette
//! port messages into browser API calls.
//!
//! The dispatcher owns its state outright and consumes [`HostEvent`]s one at
//! a time from a single channel, so nothing here is shared or locked.

mod active_tab;
mod handlers;
mod table;
mod toggle;

pub use active_tab::ActiveTabCache;
pub use handlers::{normalize_url, search_url};
pub use table::{ActionTable, Route, Variant};
pub use toggle::ToggleOutcome;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::browser::BrowserApi;
use crate::config::{Config, PagesConfig, PaletteConfig, SearchConfig};
use crate::error::Result;
use crate::protocol::{ActionKind, ActionMessage, TabId, TOGGLE_COMMAND};

/// Inbound triggers from the browser side.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A named keyboard command fired.
    Command(String),
    /// The user switched to another tab.
    TabActivated(TabId),
    /// Raw payload received on the palette port.
    PortMessage(serde_json::Value),
}

/// What `dispatch` did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled(ActionKind),
    Unsupported(String),
}

pub struct Dispatcher {
    browser: Arc<dyn BrowserApi>,
    table: ActionTable,
    variant: Variant,
    active_tab: ActiveTabCache,
    palette: PaletteConfig,
    pages: PagesConfig,
    search: SearchConfig,
}

impl Dispatcher {
    pub fn new(browser: Arc<dyn BrowserApi>, config: &Config) -> Self {
        let variant = config.palette.variant;
        Self {
            browser,
            table: ActionTable::for_variant(variant),
            variant,
            active_tab: ActiveTabCache::new(),
            palette: config.palette.clone(),
            pages: config.pages.clone(),
            search: config.search.clone(),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn table(&self) -> &ActionTable {
        &self.table
    }

    pub fn active_tab(&self) -> &ActiveTabCache {
        &self.active_tab
    }

    /// Route a message to its handler. Unknown or unregistered actions are
    /// logged and dropped; the port stays usable.
    pub async fn dispatch(&self, message: &ActionMessage) -> Result<DispatchOutcome> {
        let kind = match self.table.route(&message.action) {
            Route::Handler(kind) => kind,
            Route::Unsupported => {
                tracing::error!("Unsupported action {}!", message.action);
                return Ok(DispatchOutcome::Unsupported(message.action.clone()));
            }
        };

        tracing::debug!(action = %kind, "Dispatching palette action");
        self.handle(kind, message).await?;
        Ok(DispatchOutcome::Handled(kind))
    }

    async fn handle(&self, kind: ActionKind, message: &ActionMessage) -> Result<()> {
        match kind {
            ActionKind::ChangeActiveTab => self.change_active_tab(message).await,
            ActionKind::CloseTab => self.close_tab(message).await,
            ActionKind::OpenTab => self.open_tab(message).await,
            ActionKind::Search => self.search(message).await,
            ActionKind::ClearHistory
            | ActionKind::OpenDownloads
            | ActionKind::OpenExtensions
            | ActionKind::OpenHistory
            | ActionKind::OpenSettings => self.open_fixed_page(kind).await,
        }
    }

    /// Apply one inbound event.
    pub async fn handle_event(&mut self, event: HostEvent) -> Result<()> {
        match event {
            HostEvent::Command(name) if name == TOGGLE_COMMAND => {
                let outcome = self.toggle().await?;
                tracing::debug!(?outcome, "Toggle command handled");
            }
            HostEvent::Command(name) => {
                tracing::debug!("Ignoring command {}", name);
            }
            HostEvent::TabActivated(tab_id) => {
                self.active_tab.record(tab_id);
            }
            HostEvent::PortMessage(raw) => match serde_json::from_value::<ActionMessage>(raw) {
                Ok(message) => {
                    self.dispatch(&message).await?;
                }
                Err(e) => {
                    tracing::error!("Malformed palette message: {}", e);
                }
            },
        }
        Ok(())
    }

    /// Consume events until every sender is gone. Failures are logged and
    /// the loop moves on to the next event.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<HostEvent>) {
        tracing::info!(variant = %self.variant, "Dispatcher ready");

        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle_event(event).await {
                tracing::error!("{}", e);
            }
        }

        tracing::info!("Dispatcher stopped");
    }
}
