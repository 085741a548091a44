//! LocalStorage-backed stores, one record per map directory.

use std::collections::{BTreeSet, HashMap};

use gloo_storage::{LocalStorage, Storage};
use zdmap_shared::tags::setting_key;
use zdmap_shared::{CompletionStore, TagStore};

fn settings_key(directory: &str) -> String {
    format!("{directory}_settings")
}

fn completed_key(directory: &str) -> String {
    format!("{directory}_completed")
}

/// Tag show/hide settings, read once and written through on every change.
pub struct LocalTagStore {
    key: String,
    values: HashMap<String, bool>,
}

impl LocalTagStore {
    pub fn load(directory: &str) -> Self {
        let key = settings_key(directory);
        let values = LocalStorage::get(&key).unwrap_or_default();
        Self { key, values }
    }
}

impl TagStore for LocalTagStore {
    fn get_tag_setting(&self, tag: &str) -> Option<bool> {
        self.values.get(&setting_key(tag)).copied()
    }

    fn set_tag_setting(&mut self, tag: &str, shown: bool) {
        self.values.insert(setting_key(tag), shown);
        if let Err(e) = LocalStorage::set(&self.key, &self.values) {
            tracing::warn!(key = %self.key, error = %e, "failed to persist tag settings");
        }
    }
}

/// Completion marks made on this device, used when no wiki account is known.
pub struct LocalCompletionStore {
    key: String,
    completed: BTreeSet<String>,
}

impl LocalCompletionStore {
    pub fn load(directory: &str) -> Self {
        let key = completed_key(directory);
        let completed = LocalStorage::get(&key).unwrap_or_default();
        Self { key, completed }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    fn persist(&self) {
        if let Err(e) = LocalStorage::set(&self.key, &self.completed) {
            tracing::warn!(key = %self.key, error = %e, "failed to persist completion");
        }
    }
}

impl CompletionStore for LocalCompletionStore {
    fn record_completion(&mut self, marker_id: &str, completed: bool) {
        let changed = if completed {
            self.completed.insert(marker_id.to_string())
        } else {
            self.completed.remove(marker_id)
        };
        if changed {
            self.persist();
        }
    }

    fn clear_completion(&mut self) {
        self.completed.clear();
        LocalStorage::delete(&self.key);
    }
}
