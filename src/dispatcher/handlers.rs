use super::Dispatcher;
use crate::browser::{CreateWindow, Disposition, SearchQuery};
use crate::error::{PaletteError, Result};
use crate::protocol::{ActionKind, ActionMessage, ActionValue, Window};

/// Prefix `http://` unless the value already starts with an http(s) scheme.
pub fn normalize_url(value: &str) -> String {
    let lower = value.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        value.to_string()
    } else {
        format!("http://{}", value)
    }
}

/// Fill the `{query}` placeholder of a search URL template.
pub fn search_url(template: &str, query: &str) -> String {
    template.replace("{query}", &urlencoding::encode(query))
}

impl Dispatcher {
    pub(super) async fn change_active_tab(&self, message: &ActionMessage) -> Result<()> {
        let tab_id = message.tab_id()?;

        if message.create_window {
            self.open_in_new_window(&ActionValue::TabId(tab_id), message.incognito)
                .await?;
            return Ok(());
        }

        let tab = self.browser.get_tab(tab_id).await?;
        self.browser.focus_window(tab.window_id).await?;
        self.browser.activate_tab(tab.id).await
    }

    pub(super) async fn close_tab(&self, message: &ActionMessage) -> Result<()> {
        self.browser.remove_tab(message.tab_id()?).await
    }

    pub(super) async fn open_fixed_page(&self, kind: ActionKind) -> Result<()> {
        let url = self.pages.url_for(kind).ok_or_else(|| {
            PaletteError::Other(format!("No internal page configured for {}", kind))
        })?;
        self.browser.create_tab(url).await?;
        Ok(())
    }

    pub(super) async fn open_tab(&self, message: &ActionMessage) -> Result<()> {
        let url = normalize_url(message.text()?);

        if message.create_window {
            self.open_in_new_window(&ActionValue::Text(url), message.incognito)
                .await?;
            return Ok(());
        }

        self.browser.create_tab(&url).await?;
        Ok(())
    }

    pub(super) async fn search(&self, message: &ActionMessage) -> Result<()> {
        let query = message.text()?;

        if !message.create_window {
            return self
                .browser
                .search(SearchQuery {
                    text: query.to_string(),
                    disposition: Some(Disposition::NewTab),
                })
                .await;
        }

        if message.incognito {
            let url = search_url(&self.search.incognito_url, query);
            self.open_in_new_window(&ActionValue::Text(url), true).await?;
            return Ok(());
        }

        // Two separate steps: the window is not awaited to be ready or
        // focused before the query fires, so the results may land in either
        // window.
        let window = self
            .open_in_new_window(&ActionValue::Text(query.to_string()), false)
            .await?;
        let current = self.browser.current_tab().await?;
        tracing::debug!(
            window = window.id,
            current_tab = ?current.map(|tab| tab.id),
            "Window created, issuing search"
        );

        self.browser
            .search(SearchQuery {
                text: query.to_string(),
                disposition: None,
            })
            .await
    }

    /// Open a tab (by id) or a literal URL in a new focused window that
    /// inherits the current window's state.
    pub(super) async fn open_in_new_window(
        &self,
        value: &ActionValue,
        incognito: bool,
    ) -> Result<Window> {
        let url = match value {
            ActionValue::TabId(id) => self.browser.get_tab(*id).await?.url,
            ActionValue::Text(url) => url.clone(),
        };

        let state = self.browser.current_window().await?.state;

        self.browser
            .create_window(CreateWindow {
                focused: true,
                incognito,
                state,
                url,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_http_scheme() {
        assert_eq!(normalize_url("example.com"), "http://example.com");
        assert_eq!(normalize_url("localhost:8080/path"), "http://localhost:8080/path");
    }

    #[test]
    fn normalize_keeps_http_and_https() {
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("HTTPS://Example.com"), "HTTPS://Example.com");
    }

    #[test]
    fn normalize_only_looks_at_the_prefix() {
        assert_eq!(
            normalize_url("example.com/?next=https://other.com"),
            "http://example.com/?next=https://other.com"
        );
    }

    #[test]
    fn search_url_encodes_query() {
        assert_eq!(
            search_url("https://google.com/search?q={query}", "cats"),
            "https://google.com/search?q=cats"
        );
        assert_eq!(
            search_url("https://duckduckgo.com/?q={query}", "rust & tokio"),
            "https://duckduckgo.com/?q=rust%20%26%20tokio"
        );
    }
}
