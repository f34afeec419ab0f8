mod extension_backend;

pub use extension_backend::ExtensionBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::protocol::{OpenEvent, Tab, TabId, Window, WindowId, WindowState};

/// Filter for `tabs.query`. Unset fields do not constrain the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_window: Option<bool>,
}

impl TabQuery {
    /// The active tab of the current window.
    pub fn active_in_current_window() -> Self {
        Self {
            active: Some(true),
            current_window: Some(true),
        }
    }

    /// Every tab that is not the active one of its window.
    pub fn inactive() -> Self {
        Self {
            active: Some(false),
            current_window: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWindow {
    pub focused: bool,
    pub incognito: bool,
    pub state: WindowState,
    pub url: String,
}

/// Where a native search opens its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    NewTab,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disposition: Option<Disposition>,
}

/// The browser capability surface the dispatcher drives.
///
/// Every call is a single browser API round trip. Failures are returned as
/// errors; implementations do not retry.
#[async_trait]
pub trait BrowserApi: Send + Sync {
    async fn query_tabs(&self, query: TabQuery) -> Result<Vec<Tab>>;

    async fn get_tab(&self, tab_id: TabId) -> Result<Tab>;

    /// The tab the calling context runs in, if it runs in one.
    async fn current_tab(&self) -> Result<Option<Tab>>;

    async fn create_tab(&self, url: &str) -> Result<Tab>;

    async fn activate_tab(&self, tab_id: TabId) -> Result<()>;

    async fn remove_tab(&self, tab_id: TabId) -> Result<()>;

    async fn current_window(&self) -> Result<Window>;

    async fn create_window(&self, options: CreateWindow) -> Result<Window>;

    async fn focus_window(&self, window_id: WindowId) -> Result<()>;

    async fn search(&self, query: SearchQuery) -> Result<()>;

    async fn insert_css(&self, tab_id: TabId, files: &[String]) -> Result<()>;

    /// Run script files in the page; resolves once they have executed.
    async fn execute_script(&self, tab_id: TabId, files: &[String]) -> Result<()>;

    /// Whether the palette root element already exists in the page. Must not
    /// modify the page.
    async fn is_palette_mounted(&self, tab_id: TabId, root_element_id: &str) -> Result<bool>;

    /// Dispatch the open event into the page. No acknowledgment beyond the
    /// call itself completing.
    async fn dispatch_open_event(&self, tab_id: TabId, event: &OpenEvent) -> Result<()>;
}
