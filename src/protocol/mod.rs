//! Shared vocabulary between the dispatcher, the bridge and the palette.
//!
//! Field names follow the browser's JSON shapes (`windowId`, `createWindow`)
//! so the extension shim can forward records without reshaping them.

mod action;

pub use action::{ActionKind, ActionMessage, ActionValue};

use serde::{Deserialize, Serialize};

pub type TabId = i64;
pub type WindowId = i64;

/// Name of the global hotkey command.
pub const TOGGLE_COMMAND: &str = "toggle-palette";

/// Name of the DOM event that reveals the palette.
pub const OPEN_EVENT: &str = "OpenCommandPalette";

/// Id of the palette's root element inside the page.
pub const ROOT_ELEMENT_ID: &str = "chrome-command-palette";

/// A browser tab record, as much of it as the palette needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
    LockedFullscreen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub id: WindowId,
    #[serde(default)]
    pub state: WindowState,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub incognito: bool,
}

/// Read-only projection of a tab handed to the palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabSummary {
    pub label: String,
    pub url: String,
    pub value: TabId,
}

impl From<&Tab> for TabSummary {
    fn from(tab: &Tab) -> Self {
        Self {
            label: tab.title.clone(),
            url: tab.url.clone(),
            value: tab.id,
        }
    }
}

/// Detail payload of the open event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenEvent {
    pub tabs: Vec<TabSummary>,
}

impl OpenEvent {
    /// Build the payload from tabs in the order the browser returned them.
    pub fn from_tabs(tabs: &[Tab]) -> Self {
        Self {
            tabs: tabs.iter().map(TabSummary::from).collect(),
        }
    }
}
