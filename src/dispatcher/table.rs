use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::protocol::ActionKind;

/// Behaviour profile of the dispatcher.
///
/// `Full` offers every action and queries the active tab on each hotkey
/// press. `Compact` offers the tab actions only and answers the hotkey from
/// the cached active tab id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Full,
    Compact,
}

impl Variant {
    pub fn actions(&self) -> &'static [ActionKind] {
        match self {
            Variant::Full => &ActionKind::ALL,
            Variant::Compact => &[
                ActionKind::ChangeActiveTab,
                ActionKind::CloseTab,
                ActionKind::OpenTab,
                ActionKind::Search,
            ],
        }
    }

    pub fn caches_active_tab(&self) -> bool {
        matches!(self, Variant::Compact)
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Full => write!(f, "full"),
            Variant::Compact => write!(f, "compact"),
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Variant::Full),
            "compact" => Ok(Variant::Compact),
            other => Err(format!("unknown variant '{}' (expected full or compact)", other)),
        }
    }
}

/// Where a wire action name leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Handler(ActionKind),
    Unsupported,
}

/// Explicit registration of the handlers a dispatcher accepts.
#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    registered: BTreeSet<ActionKind>,
}

impl ActionTable {
    pub fn for_variant(variant: Variant) -> Self {
        let mut table = Self::default();
        for kind in variant.actions() {
            table.register(*kind);
        }
        table
    }

    pub fn register(&mut self, kind: ActionKind) {
        self.registered.insert(kind);
    }

    pub fn contains(&self, kind: ActionKind) -> bool {
        self.registered.contains(&kind)
    }

    pub fn actions(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.registered.iter().copied()
    }

    /// Total over all strings: anything not registered is `Unsupported`.
    pub fn route(&self, action: &str) -> Route {
        match ActionKind::parse(action) {
            Some(kind) if self.contains(kind) => Route::Handler(kind),
            _ => Route::Unsupported,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_table_routes_every_action() {
        let table = ActionTable::for_variant(Variant::Full);
        for kind in ActionKind::ALL {
            assert_eq!(table.route(kind.as_str()), Route::Handler(kind));
        }
    }

    #[test]
    fn compact_table_drops_fixed_pages() {
        let table = ActionTable::for_variant(Variant::Compact);
        assert_eq!(table.route("open-settings"), Route::Unsupported);
        assert_eq!(table.route("clear-history"), Route::Unsupported);
        assert_eq!(
            table.route("close-tab"),
            Route::Handler(ActionKind::CloseTab)
        );
        assert_eq!(table.actions().count(), 4);
    }

    #[test]
    fn unknown_and_empty_names_are_unsupported() {
        let table = ActionTable::for_variant(Variant::Full);
        assert_eq!(table.route("unknown-action"), Route::Unsupported);
        assert_eq!(table.route(""), Route::Unsupported);
        assert_eq!(table.route("OPEN-TAB"), Route::Unsupported);
    }

    #[test]
    fn variant_parses_case_insensitively() {
        assert_eq!("Compact".parse::<Variant>(), Ok(Variant::Compact));
        assert_eq!(" full ".parse::<Variant>(), Ok(Variant::Full));
        assert!("tiny".parse::<Variant>().is_err());
    }
}
