use std::slice;

use super::Dispatcher;
use crate::browser::TabQuery;
use crate::error::Result;
use crate::protocol::{OpenEvent, TabId};

/// Result of one hotkey press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// No active tab could be resolved; nothing was sent.
    NoActiveTab,
    /// The palette was injected into the tab, then opened.
    Injected(TabId),
    /// The palette was already mounted and was opened.
    Opened(TabId),
}

impl Dispatcher {
    /// Make sure the palette lives in the active tab, then open it.
    ///
    /// Order: presence check, stylesheet, script, open event. The open event
    /// targets state the script creates, so it is only sent after the script ran.
    pub async fn toggle(&mut self) -> Result<ToggleOutcome> {
        let Some(tab_id) = self.resolve_active_tab().await? else {
            tracing::debug!("Toggle ignored: no active tab");
            return Ok(ToggleOutcome::NoActiveTab);
        };

        let mounted = self
            .browser
            .is_palette_mounted(tab_id, &self.palette.root_element_id)
            .await?;

        if mounted {
            self.send_open_signal(tab_id).await?;
            return Ok(ToggleOutcome::Opened(tab_id));
        }

        self.inject(tab_id).await?;
        self.send_open_signal(tab_id).await?;
        Ok(ToggleOutcome::Injected(tab_id))
    }

    async fn resolve_active_tab(&mut self) -> Result<Option<TabId>> {
        if self.variant.caches_active_tab() {
            if let Some(tab_id) = self.active_tab.get() {
                return Ok(Some(tab_id));
            }
        }

        let tabs = self
            .browser
            .query_tabs(TabQuery::active_in_current_window())
            .await?;
        let tab_id = tabs.first().map(|tab| tab.id);

        if self.variant.caches_active_tab() {
            if let Some(id) = tab_id {
                self.active_tab.record(id);
            }
        }

        Ok(tab_id)
    }

    async fn inject(&self, tab_id: TabId) -> Result<()> {
        tracing::debug!(tab_id, "Injecting palette");
        self.browser
            .insert_css(tab_id, slice::from_ref(&self.palette.stylesheet))
            .await?;
        self.browser
            .execute_script(tab_id, slice::from_ref(&self.palette.script))
            .await
    }

    async fn send_open_signal(&self, tab_id: TabId) -> Result<()> {
        let tabs = self.browser.query_tabs(TabQuery::inactive()).await?;
        let event = OpenEvent::from_tabs(&tabs);
        tracing::debug!(tab_id, tabs = event.tabs.len(), "Opening palette");
        self.browser.dispatch_open_event(tab_id, &event).await
    }
}
