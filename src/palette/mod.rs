//! In-page palette model: the state the injected UI keeps between the open
//! event and the user's choice. Rendering is left to the UI layer; this
//! type only decides what is listed and what gets sent back.

mod entry;

pub use entry::{Entry, Modifiers};

use tokio::sync::mpsc;

use crate::config::PaletteConfig;
use crate::dispatcher::HostEvent;
use crate::error::{PaletteError, Result};
use crate::protocol::{ActionKind, ActionMessage, OpenEvent, TabSummary};

/// The long-lived channel from the palette to the dispatcher. Posting never
/// waits for a reply.
#[derive(Debug, Clone)]
pub struct Port {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl Port {
    /// Connect to the dispatcher's event channel.
    pub fn connect(tx: mpsc::UnboundedSender<HostEvent>) -> Self {
        Self { tx }
    }

    pub fn post(&self, message: &ActionMessage) -> Result<()> {
        let payload = serde_json::to_value(message)?;
        self.tx
            .send(HostEvent::PortMessage(payload))
            .map_err(|_| PaletteError::PortClosed)
    }
}

pub struct Palette {
    root_element_id: String,
    actions: Vec<ActionKind>,
    port: Port,
    tabs: Vec<TabSummary>,
    query: String,
    selected: usize,
    visible: bool,
}

impl Palette {
    /// Mount the palette root at the configured element id, the same id the
    /// dispatcher's presence check looks for. One palette per page; that check
    /// keeps a second injection from happening.
    pub fn mount(config: &PaletteConfig, port: Port) -> Self {
        tracing::debug!("Mounting palette at #{}", config.root_element_id);
        Self {
            root_element_id: config.root_element_id.clone(),
            actions: config.variant.actions().to_vec(),
            port,
            tabs: Vec::new(),
            query: String::new(),
            selected: 0,
            visible: false,
        }
    }

    pub fn root_element_id(&self) -> &str {
        &self.root_element_id
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Handle the open event: replace the tab list and show an empty query.
    pub fn on_open(&mut self, event: OpenEvent) {
        self.tabs = event.tabs;
        self.query.clear();
        self.selected = 0;
        self.visible = true;
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.selected = 0;
    }

    /// Entries for the current query: matching tabs, then matching fixed
    /// actions, then "open" and "search" for the typed text.
    pub fn candidates(&self) -> Vec<Entry> {
        let terms: Vec<String> = self
            .query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();

        let mut entries: Vec<Entry> = self
            .tabs
            .iter()
            .cloned()
            .map(Entry::Tab)
            .chain(
                self.actions
                    .iter()
                    .filter(|kind| kind.is_fixed_page())
                    .copied()
                    .map(Entry::Action),
            )
            .filter(|entry| entry.matches(&terms))
            .collect();

        let typed = self.query.trim();
        if !typed.is_empty() {
            if self.actions.contains(&ActionKind::OpenTab) {
                entries.push(Entry::OpenUrl(typed.to_string()));
            }
            if self.actions.contains(&ActionKind::Search) {
                entries.push(Entry::Search(typed.to_string()));
            }
        }

        entries
    }

    pub fn selected(&self) -> Option<Entry> {
        self.candidates().into_iter().nth(self.selected)
    }

    pub fn select_next(&mut self) {
        let count = self.candidates().len();
        if count > 0 {
            self.selected = (self.selected + 1) % count;
        }
    }

    pub fn select_prev(&mut self) {
        let count = self.candidates().len();
        if count > 0 {
            self.selected = (self.selected + count - 1) % count;
        }
    }

    /// Send the selected entry's message and hide. Returns the message sent,
    /// or None when hidden or nothing is selected.
    pub fn confirm(&mut self, modifiers: Modifiers) -> Result<Option<ActionMessage>> {
        if !self.visible {
            return Ok(None);
        }
        let Some(entry) = self.selected() else {
            return Ok(None);
        };

        let message = entry.to_message(modifiers);
        self.send_and_hide(message)
    }

    /// Close the selected tab entry, if the selection is a tab.
    pub fn close_selected(&mut self) -> Result<Option<ActionMessage>> {
        if !self.visible || !self.actions.contains(&ActionKind::CloseTab) {
            return Ok(None);
        }
        let Some(Entry::Tab(tab)) = self.selected() else {
            return Ok(None);
        };

        self.tabs.retain(|t| t.value != tab.value);
        let message = ActionMessage::new(ActionKind::CloseTab).with_tab(tab.value);
        self.send_and_hide(message)
    }

    /// Hide without sending anything.
    pub fn dismiss(&mut self) {
        self.visible = false;
    }

    fn send_and_hide(&mut self, message: ActionMessage) -> Result<Option<ActionMessage>> {
        self.visible = false;
        self.port.post(&message)?;
        Ok(Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dispatcher::Variant;
    use crate::protocol::ActionValue;

    fn summary(id: i64, label: &str, url: &str) -> TabSummary {
        TabSummary {
            label: label.to_string(),
            url: url.to_string(),
            value: id,
        }
    }

    fn open_event() -> OpenEvent {
        OpenEvent {
            tabs: vec![
                summary(2, "Rust Book", "https://doc.rust-lang.org/book"),
                summary(3, "Tokio", "https://tokio.rs"),
            ],
        }
    }

    fn mounted(variant: Variant) -> (Palette, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = PaletteConfig {
            variant,
            ..PaletteConfig::default()
        };
        (Palette::mount(&config, Port::connect(tx)), rx)
    }

    fn posted(rx: &mut mpsc::UnboundedReceiver<HostEvent>) -> Vec<ActionMessage> {
        let mut out = Vec::new();
        while let Ok(HostEvent::PortMessage(raw)) = rx.try_recv() {
            out.push(serde_json::from_value(raw).unwrap());
        }
        out
    }

    #[test]
    fn mounts_hidden_at_root_element() {
        let (palette, _rx) = mounted(Variant::Full);
        assert_eq!(palette.root_element_id(), "chrome-command-palette");
        assert!(!palette.is_visible());
    }

    #[test]
    fn mounts_at_configured_root_element() {
        let mut config = Config::default();
        config
            .set_key("palette.root_element_id", "my-palette")
            .unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();

        let palette = Palette::mount(&config.palette, Port::connect(tx));
        assert_eq!(palette.root_element_id(), config.palette.root_element_id);
        assert_eq!(palette.root_element_id(), "my-palette");
    }

    #[test]
    fn open_event_populates_and_shows() {
        let (mut palette, _rx) = mounted(Variant::Full);
        palette.on_open(open_event());

        assert!(palette.is_visible());
        let candidates = palette.candidates();
        assert_eq!(candidates[0], Entry::Tab(summary(2, "Rust Book", "https://doc.rust-lang.org/book")));
        assert_eq!(candidates[1], Entry::Tab(summary(3, "Tokio", "https://tokio.rs")));
        // five fixed-page actions follow the tabs
        assert_eq!(candidates.len(), 7);
    }

    #[test]
    fn repeated_open_replaces_tabs_and_resets_query() {
        let (mut palette, _rx) = mounted(Variant::Full);
        palette.on_open(open_event());
        palette.set_query("tokio");
        palette.select_next();

        palette.on_open(OpenEvent {
            tabs: vec![summary(9, "Serde", "https://serde.rs")],
        });

        assert_eq!(palette.query(), "");
        assert_eq!(palette.selected_index(), 0);
        assert_eq!(
            palette.selected(),
            Some(Entry::Tab(summary(9, "Serde", "https://serde.rs")))
        );
    }

    #[test]
    fn query_filters_and_adds_typed_entries() {
        let (mut palette, _rx) = mounted(Variant::Full);
        palette.on_open(open_event());
        palette.set_query("tokio");

        assert_eq!(
            palette.candidates(),
            vec![
                Entry::Tab(summary(3, "Tokio", "https://tokio.rs")),
                Entry::OpenUrl("tokio".to_string()),
                Entry::Search("tokio".to_string()),
            ]
        );
    }

    #[test]
    fn compact_variant_lists_no_fixed_pages() {
        let (mut palette, _rx) = mounted(Variant::Compact);
        palette.on_open(open_event());
        assert_eq!(palette.candidates().len(), 2);

        palette.set_query("history");
        assert_eq!(
            palette.candidates(),
            vec![
                Entry::OpenUrl("history".to_string()),
                Entry::Search("history".to_string()),
            ]
        );
    }

    #[test]
    fn selection_wraps() {
        let (mut palette, _rx) = mounted(Variant::Compact);
        palette.on_open(open_event());

        palette.select_prev();
        assert_eq!(palette.selected_index(), 1);
        palette.select_next();
        assert_eq!(palette.selected_index(), 0);
    }

    #[test]
    fn confirm_sends_one_message_and_hides() {
        let (mut palette, mut rx) = mounted(Variant::Full);
        palette.on_open(open_event());
        palette.select_next();

        let sent = palette.confirm(Modifiers::new_window()).unwrap().unwrap();
        assert_eq!(sent.kind(), Some(ActionKind::ChangeActiveTab));
        assert_eq!(sent.value, Some(ActionValue::TabId(3)));
        assert!(sent.create_window);
        assert!(!palette.is_visible());

        assert_eq!(posted(&mut rx), vec![sent]);
    }

    #[test]
    fn confirm_while_hidden_sends_nothing() {
        let (mut palette, mut rx) = mounted(Variant::Full);
        palette.on_open(open_event());
        palette.dismiss();

        assert_eq!(palette.confirm(Modifiers::default()).unwrap(), None);
        assert!(posted(&mut rx).is_empty());
    }

    #[test]
    fn typed_search_confirms_as_search() {
        let (mut palette, mut rx) = mounted(Variant::Full);
        palette.on_open(OpenEvent::default());
        palette.set_query("cats");
        palette.select_next();

        palette.confirm(Modifiers::incognito()).unwrap();

        let sent = posted(&mut rx);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind(), Some(ActionKind::Search));
        assert_eq!(sent[0].value, Some(ActionValue::Text("cats".to_string())));
        assert!(sent[0].create_window && sent[0].incognito);
    }

    #[test]
    fn close_selected_removes_tab() {
        let (mut palette, mut rx) = mounted(Variant::Full);
        palette.on_open(open_event());

        let sent = palette.close_selected().unwrap().unwrap();
        assert_eq!(sent, ActionMessage::new(ActionKind::CloseTab).with_tab(2));
        assert!(!palette.is_visible());
        assert!(!palette
            .candidates()
            .iter()
            .any(|e| matches!(e, Entry::Tab(t) if t.value == 2)));
        assert_eq!(posted(&mut rx).len(), 1);
    }

    #[test]
    fn close_selected_ignores_action_entries() {
        let (mut palette, _rx) = mounted(Variant::Full);
        palette.on_open(OpenEvent::default());
        assert_eq!(palette.close_selected().unwrap(), None);
    }

    #[test]
    fn post_after_dispatcher_gone_is_port_closed() {
        let (mut palette, rx) = mounted(Variant::Full);
        drop(rx);
        palette.on_open(open_event());

        assert!(matches!(
            palette.confirm(Modifiers::default()),
            Err(PaletteError::PortClosed)
        ));
    }
}
