use std::collections::BTreeSet;

use crate::category::Category;
use crate::error::{MapError, Result};

/// Which categories the legend currently lets through.
///
/// `AllSelected` and `NoneSelected` only hold after the matching explicit
/// action; a `Custom` set that happens to be full or empty stays `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategorySelection {
    #[default]
    AllSelected,
    NoneSelected,
    Custom(BTreeSet<String>),
}

impl CategorySelection {
    /// Effective membership used by the visibility resolver.
    pub fn is_selected(&self, category: &str) -> bool {
        match self {
            Self::AllSelected => true,
            Self::NoneSelected => false,
            Self::Custom(selected) => selected.contains(category),
        }
    }

    /// Membership of individually highlighted entries. All/None highlight
    /// their own button instead, so this is empty for both.
    pub fn is_individually_selected(&self, category: &str) -> bool {
        matches!(self, Self::Custom(selected) if selected.contains(category))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendAction {
    Show,
    Hide,
}

/// One category whose effective selection flipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendChange {
    pub category: String,
    pub action: LegendAction,
}

#[derive(Debug, Clone, Default)]
pub struct Legend {
    categories: Vec<Category>,
    selection: CategorySelection,
}

impl Legend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_category(&mut self, category: Category) -> Result<()> {
        if self.category(category.name()).is_some() {
            return Err(MapError::config(
                format!("category `{}`", category.name()),
                "registered twice",
            ));
        }
        self.categories.push(category);
        Ok(())
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name() == name)
    }

    /// Distinct group names in registration order.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for group in self.categories.iter().filter_map(Category::group) {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        groups
    }

    pub fn selection(&self) -> &CategorySelection {
        &self.selection
    }

    pub fn is_selected(&self, category: &str) -> bool {
        self.selection.is_selected(category)
    }

    pub fn select_all(&mut self) -> Vec<LegendChange> {
        if self.selection == CategorySelection::AllSelected {
            return Vec::new();
        }
        self.transition(CategorySelection::AllSelected)
    }

    pub fn select_none(&mut self) -> Vec<LegendChange> {
        if self.selection == CategorySelection::NoneSelected {
            return Vec::new();
        }
        self.transition(CategorySelection::NoneSelected)
    }

    /// Return to the neutral "All" display, as focus navigation does.
    pub fn reset(&mut self) -> Vec<LegendChange> {
        self.select_all()
    }

    pub fn toggle_category(&mut self, name: &str) -> Result<Vec<LegendChange>> {
        if self.category(name).is_none() {
            return Err(MapError::unknown("category", name));
        }
        let mut selected = self.effective_set();
        if !selected.remove(name) {
            selected.insert(name.to_string());
        }
        Ok(self.transition(CategorySelection::Custom(selected)))
    }

    /// Deselect the group if any member is individually selected, otherwise
    /// select exactly its members on top of the individual selection.
    pub fn toggle_group(&mut self, group: &str) -> Result<Vec<LegendChange>> {
        let members: Vec<String> = self
            .categories
            .iter()
            .filter(|c| c.in_group(group))
            .map(|c| c.name().to_string())
            .collect();
        if members.is_empty() {
            return Err(MapError::unknown("group", group));
        }

        let any_selected = members
            .iter()
            .any(|name| self.selection.is_individually_selected(name));
        let mut selected = match &self.selection {
            CategorySelection::Custom(selected) => selected.clone(),
            CategorySelection::AllSelected | CategorySelection::NoneSelected => BTreeSet::new(),
        };
        for name in members {
            if any_selected {
                selected.remove(&name);
            } else {
                selected.insert(name);
            }
        }
        Ok(self.transition(CategorySelection::Custom(selected)))
    }

    fn effective_set(&self) -> BTreeSet<String> {
        self.categories
            .iter()
            .filter(|c| self.selection.is_selected(c.name()))
            .map(|c| c.name().to_string())
            .collect()
    }

    fn transition(&mut self, next: CategorySelection) -> Vec<LegendChange> {
        let changes = self
            .categories
            .iter()
            .filter_map(|c| {
                let before = self.selection.is_selected(c.name());
                let after = next.is_selected(c.name());
                (before != after).then(|| LegendChange {
                    category: c.name().to_string(),
                    action: if after {
                        LegendAction::Show
                    } else {
                        LegendAction::Hide
                    },
                })
            })
            .collect();
        tracing::debug!(from = ?self.selection, to = ?next, "legend transition");
        self.selection = next;
        changes
    }
}
