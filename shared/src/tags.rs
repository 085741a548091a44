use std::collections::HashMap;

/// Reserved tag carried implicitly by every completed marker.
pub const COMPLETED_TAG: &str = "Completed";

/// Persisted key for a tag's show/hide setting, scoped per map by the store.
pub fn setting_key(tag: &str) -> String {
    format!("show-{tag}")
}

/// Every tag starts shown except `Completed`.
pub fn default_shown(tag: &str) -> bool {
    tag != COMPLETED_TAG
}

/// Per-map persistent storage for tag settings.
pub trait TagStore {
    fn get_tag_setting(&self, tag: &str) -> Option<bool>;
    fn set_tag_setting(&mut self, tag: &str, shown: bool);
}

/// Current show/hide value for every tag the map offers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSettings {
    order: Vec<String>,
    shown: HashMap<String, bool>,
}

impl TagSettings {
    /// Read the offered tags from `store` once, appending `Completed` if absent.
    pub fn load<I, S>(tags: I, store: &dyn TagStore) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut settings = Self::default();
        for tag in tags
            .into_iter()
            .map(Into::into)
            .chain(std::iter::once(COMPLETED_TAG.to_string()))
        {
            if settings.shown.contains_key(&tag) {
                continue;
            }
            let shown = store
                .get_tag_setting(&tag)
                .unwrap_or_else(|| default_shown(&tag));
            settings.shown.insert(tag.clone(), shown);
            settings.order.push(tag);
        }
        settings
    }

    /// Tags nobody configured fall back to the default policy.
    pub fn is_shown(&self, tag: &str) -> bool {
        self.shown
            .get(tag)
            .copied()
            .unwrap_or_else(|| default_shown(tag))
    }

    /// Returns `true` when the value changed.
    pub fn set_shown(&mut self, tag: &str, shown: bool) -> bool {
        if self.is_shown(tag) == shown && self.shown.contains_key(tag) {
            return false;
        }
        if !self.shown.contains_key(tag) {
            self.order.push(tag.to_string());
        }
        self.shown.insert(tag.to_string(), shown);
        true
    }

    /// Tags in the order they are offered.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.order
            .iter()
            .map(|tag| (tag.as_str(), self.is_shown(tag)))
    }
}
