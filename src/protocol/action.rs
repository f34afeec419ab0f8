use serde::{Deserialize, Serialize};

use super::TabId;
use crate::error::{PaletteError, Result};

/// Every action the palette can ask the dispatcher to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    ChangeActiveTab,
    ClearHistory,
    CloseTab,
    OpenDownloads,
    OpenExtensions,
    OpenHistory,
    OpenSettings,
    OpenTab,
    Search,
}

impl ActionKind {
    pub const ALL: [ActionKind; 9] = [
        ActionKind::ChangeActiveTab,
        ActionKind::ClearHistory,
        ActionKind::CloseTab,
        ActionKind::OpenDownloads,
        ActionKind::OpenExtensions,
        ActionKind::OpenHistory,
        ActionKind::OpenSettings,
        ActionKind::OpenTab,
        ActionKind::Search,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::ChangeActiveTab => "change-active-tab",
            ActionKind::ClearHistory => "clear-history",
            ActionKind::CloseTab => "close-tab",
            ActionKind::OpenDownloads => "open-downloads",
            ActionKind::OpenExtensions => "open-extensions",
            ActionKind::OpenHistory => "open-history",
            ActionKind::OpenSettings => "open-settings",
            ActionKind::OpenTab => "open-tab",
            ActionKind::Search => "search",
        }
    }

    /// Parse a wire action name. Returns None for names this build does not know.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Actions that open a fixed page and carry no value.
    pub fn is_fixed_page(&self) -> bool {
        matches!(
            self,
            ActionKind::ClearHistory
                | ActionKind::OpenDownloads
                | ActionKind::OpenExtensions
                | ActionKind::OpenHistory
                | ActionKind::OpenSettings
        )
    }

    /// Human label used by the palette for static entries.
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::ChangeActiveTab => "Switch to tab",
            ActionKind::ClearHistory => "Clear browsing data",
            ActionKind::CloseTab => "Close tab",
            ActionKind::OpenDownloads => "Open downloads",
            ActionKind::OpenExtensions => "Open extensions",
            ActionKind::OpenHistory => "Open history",
            ActionKind::OpenSettings => "Open settings",
            ActionKind::OpenTab => "Open URL",
            ActionKind::Search => "Search",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `value` field: a tab id for tab actions, a URL or query otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionValue {
    TabId(TabId),
    Text(String),
}

impl From<TabId> for ActionValue {
    fn from(id: TabId) -> Self {
        ActionValue::TabId(id)
    }
}

impl From<&str> for ActionValue {
    fn from(text: &str) -> Self {
        ActionValue::Text(text.to_string())
    }
}

impl From<String> for ActionValue {
    fn from(text: String) -> Self {
        ActionValue::Text(text)
    }
}

/// One request from the palette to the dispatcher.
///
/// `action` stays a plain string on the wire so that an unknown name is a
/// routing decision for the dispatcher rather than a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMessage {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ActionValue>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub create_window: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub incognito: bool,
}

impl ActionMessage {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            action: kind.as_str().to_string(),
            value: None,
            create_window: false,
            incognito: false,
        }
    }

    pub fn with_value(mut self, value: impl Into<ActionValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_tab(mut self, tab_id: TabId) -> Self {
        self.value = Some(ActionValue::TabId(tab_id));
        self
    }

    pub fn in_new_window(mut self, incognito: bool) -> Self {
        self.create_window = true;
        self.incognito = incognito;
        self
    }

    pub fn kind(&self) -> Option<ActionKind> {
        ActionKind::parse(&self.action)
    }

    /// The value as a tab id, or an error naming the action.
    pub fn tab_id(&self) -> Result<TabId> {
        match &self.value {
            Some(ActionValue::TabId(id)) => Ok(*id),
            Some(ActionValue::Text(text)) => text.trim().parse().map_err(|_| {
                PaletteError::InvalidMessage(format!(
                    "{} expects a tab id, got {:?}",
                    self.action, text
                ))
            }),
            None => Err(PaletteError::InvalidMessage(format!(
                "{} requires a tab id value",
                self.action
            ))),
        }
    }

    /// The value as text, or an error naming the action.
    pub fn text(&self) -> Result<&str> {
        match &self.value {
            Some(ActionValue::Text(text)) => Ok(text),
            Some(ActionValue::TabId(id)) => Err(PaletteError::InvalidMessage(format!(
                "{} expects a URL or query, got tab id {}",
                self.action, id
            ))),
            None => Err(PaletteError::InvalidMessage(format!(
                "{} requires a value",
                self.action
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names_round_trip_through_parse() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ActionKind::parse("unknown-action"), None);
    }

    #[test]
    fn decodes_tab_id_and_flags() {
        let msg: ActionMessage = serde_json::from_str(
            r#"{"action":"change-active-tab","value":42,"createWindow":true,"incognito":false}"#,
        )
        .unwrap();

        assert_eq!(msg.kind(), Some(ActionKind::ChangeActiveTab));
        assert_eq!(msg.value, Some(ActionValue::TabId(42)));
        assert!(msg.create_window);
        assert!(!msg.incognito);
    }

    #[test]
    fn decodes_unknown_action_without_error() {
        let msg: ActionMessage = serde_json::from_str(r#"{"action":"unknown-action"}"#).unwrap();
        assert_eq!(msg.kind(), None);
        assert_eq!(msg.value, None);
    }

    #[test]
    fn encodes_without_default_flags() {
        let msg = ActionMessage::new(ActionKind::OpenTab).with_value("example.com");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "action": "open-tab", "value": "example.com" })
        );
    }

    #[test]
    fn tab_id_accepts_numeric_strings() {
        let msg = ActionMessage::new(ActionKind::CloseTab).with_value("17");
        assert_eq!(msg.tab_id().unwrap(), 17);
    }

    #[test]
    fn tab_id_rejects_text_and_missing_value() {
        let msg = ActionMessage::new(ActionKind::CloseTab).with_value("cats");
        assert!(matches!(msg.tab_id(), Err(PaletteError::InvalidMessage(_))));

        let msg = ActionMessage::new(ActionKind::CloseTab);
        assert!(matches!(msg.tab_id(), Err(PaletteError::InvalidMessage(_))));
    }

    #[test]
    fn text_rejects_tab_id() {
        let msg = ActionMessage::new(ActionKind::Search).with_tab(3);
        assert!(matches!(msg.text(), Err(PaletteError::InvalidMessage(_))));
    }
}
