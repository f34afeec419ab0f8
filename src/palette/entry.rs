use crate::protocol::{ActionKind, ActionMessage, TabSummary};

/// Keyboard modifiers held while confirming an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub new_window: bool,
    pub incognito: bool,
}

impl Modifiers {
    pub fn new_window() -> Self {
        Self {
            new_window: true,
            incognito: false,
        }
    }

    pub fn incognito() -> Self {
        Self {
            new_window: true,
            incognito: true,
        }
    }

    fn opens_window(&self) -> bool {
        self.new_window || self.incognito
    }
}

/// One selectable row of the palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Tab(TabSummary),
    Action(ActionKind),
    OpenUrl(String),
    Search(String),
}

impl Entry {
    pub fn label(&self) -> String {
        match self {
            Entry::Tab(tab) => tab.label.clone(),
            Entry::Action(kind) => kind.label().to_string(),
            Entry::OpenUrl(url) => format!("Open {}", url),
            Entry::Search(query) => format!("Search {}", query),
        }
    }

    /// True when every term occurs in the label or URL, ignoring case.
    pub(super) fn matches(&self, terms: &[String]) -> bool {
        if terms.is_empty() {
            return true;
        }
        let haystack = match self {
            Entry::Tab(tab) => format!("{} {}", tab.label, tab.url),
            other => other.label(),
        }
        .to_lowercase();
        terms.iter().all(|term| haystack.contains(term.as_str()))
    }

    /// The message confirming this entry sends. Window modifiers only apply
    /// to entries that can open a window.
    pub fn to_message(&self, modifiers: Modifiers) -> ActionMessage {
        let message = match self {
            Entry::Tab(tab) => ActionMessage::new(ActionKind::ChangeActiveTab).with_tab(tab.value),
            Entry::Action(kind) => return ActionMessage::new(*kind),
            Entry::OpenUrl(url) => ActionMessage::new(ActionKind::OpenTab).with_value(url.as_str()),
            Entry::Search(query) => {
                ActionMessage::new(ActionKind::Search).with_value(query.as_str())
            }
        };

        if modifiers.opens_window() {
            message.in_new_window(modifiers.incognito)
        } else {
            message
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ActionValue;

    fn tab() -> Entry {
        Entry::Tab(TabSummary {
            label: "Tokio Docs".to_string(),
            url: "https://docs.rs/tokio".to_string(),
            value: 8,
        })
    }

    #[test]
    fn matches_label_and_url_terms() {
        let entry = tab();
        assert!(entry.matches(&["tokio".to_string()]));
        assert!(entry.matches(&["docs.rs".to_string(), "tokio".to_string()]));
        assert!(!entry.matches(&["serde".to_string()]));
    }

    #[test]
    fn tab_entry_becomes_change_active_tab() {
        let msg = tab().to_message(Modifiers::default());
        assert_eq!(msg.kind(), Some(ActionKind::ChangeActiveTab));
        assert_eq!(msg.value, Some(ActionValue::TabId(8)));
        assert!(!msg.create_window);
    }

    #[test]
    fn incognito_implies_new_window() {
        let modifiers = Modifiers {
            new_window: false,
            incognito: true,
        };
        let msg = Entry::Search("cats".to_string()).to_message(modifiers);
        assert!(msg.create_window);
        assert!(msg.incognito);
    }

    #[test]
    fn fixed_actions_ignore_modifiers() {
        let msg = Entry::Action(ActionKind::OpenHistory).to_message(Modifiers::incognito());
        assert_eq!(msg, ActionMessage::new(ActionKind::OpenHistory));
    }
}
