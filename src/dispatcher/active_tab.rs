use crate::protocol::TabId;

/// Id of the most recently activated tab seen by this process.
///
/// Written by tab-activation events, read by the hotkey handler. It can lag
/// behind the browser when an activation event has not been delivered yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveTabCache {
    tab_id: Option<TabId>,
}

impl ActiveTabCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<TabId> {
        self.tab_id
    }

    pub fn record(&mut self, tab_id: TabId) {
        self.tab_id = Some(tab_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unset() {
        assert_eq!(ActiveTabCache::new().get(), None);
    }

    #[test]
    fn keeps_latest_activation() {
        let mut cache = ActiveTabCache::new();
        cache.record(4);
        cache.record(9);
        assert_eq!(cache.get(), Some(9));
    }
}
