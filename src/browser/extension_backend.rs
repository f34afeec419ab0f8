use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{BrowserApi, CreateWindow, SearchQuery, TabQuery};
use crate::bridge::Bridge;
use crate::error::{PaletteError, Result};
use crate::protocol::{OpenEvent, Tab, TabId, Window, WindowId, OPEN_EVENT};

/// Browser API backed by the extension on the other end of the bridge.
///
/// Each trait call becomes one `{id, method, params}` request; the extension
/// runs the matching `chrome.*` call and answers with its result.
pub struct ExtensionBackend {
    bridge: Bridge,
}

impl ExtensionBackend {
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let result = self.bridge.request(method, params).await?;
        serde_json::from_value(result).map_err(|e| PaletteError::BrowserApi {
            method: method.to_string(),
            message: format!("unexpected result shape: {}", e),
        })
    }

    async fn call_unit(&self, method: &str, params: Value) -> Result<()> {
        self.bridge.request(method, params).await?;
        Ok(())
    }
}

#[async_trait]
impl BrowserApi for ExtensionBackend {
    async fn query_tabs(&self, query: TabQuery) -> Result<Vec<Tab>> {
        self.call("tabs.query", serde_json::to_value(query)?).await
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<Tab> {
        self.call("tabs.get", json!({ "tabId": tab_id })).await
    }

    async fn current_tab(&self) -> Result<Option<Tab>> {
        self.call("tabs.getCurrent", json!({})).await
    }

    async fn create_tab(&self, url: &str) -> Result<Tab> {
        self.call("tabs.create", json!({ "url": url })).await
    }

    async fn activate_tab(&self, tab_id: TabId) -> Result<()> {
        self.call_unit("tabs.update", json!({ "tabId": tab_id, "active": true }))
            .await
    }

    async fn remove_tab(&self, tab_id: TabId) -> Result<()> {
        self.call_unit("tabs.remove", json!({ "tabId": tab_id })).await
    }

    async fn current_window(&self) -> Result<Window> {
        self.call("windows.getCurrent", json!({})).await
    }

    async fn create_window(&self, options: CreateWindow) -> Result<Window> {
        self.call("windows.create", serde_json::to_value(options)?)
            .await
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<()> {
        self.call_unit(
            "windows.update",
            json!({ "windowId": window_id, "focused": true }),
        )
        .await
    }

    async fn search(&self, query: SearchQuery) -> Result<()> {
        self.call_unit("search.query", serde_json::to_value(query)?)
            .await
    }

    async fn insert_css(&self, tab_id: TabId, files: &[String]) -> Result<()> {
        self.call_unit(
            "scripting.insertCSS",
            json!({ "target": { "tabId": tab_id }, "files": files }),
        )
        .await
    }

    async fn execute_script(&self, tab_id: TabId, files: &[String]) -> Result<()> {
        self.call_unit(
            "scripting.executeScript",
            json!({ "target": { "tabId": tab_id }, "files": files }),
        )
        .await
    }

    async fn is_palette_mounted(&self, tab_id: TabId, root_element_id: &str) -> Result<bool> {
        self.call(
            "palette.isMounted",
            json!({ "target": { "tabId": tab_id }, "rootElementId": root_element_id }),
        )
        .await
    }

    async fn dispatch_open_event(&self, tab_id: TabId, event: &OpenEvent) -> Result<()> {
        self.call_unit(
            "palette.dispatchOpenEvent",
            json!({
                "target": { "tabId": tab_id },
                "event": OPEN_EVENT,
                "detail": event,
            }),
        )
        .await
    }
}
