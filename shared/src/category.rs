use crate::descriptor::{CategoryDescriptor, IconDescriptor};
use crate::error::{MapError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Icon {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl Icon {
    pub fn from_descriptor(desc: &IconDescriptor, directory: &str) -> Self {
        Self {
            url: icon_url(directory, &desc.url),
            width: desc.width,
            height: desc.height,
        }
    }
}

/// Resolve a descriptor icon path against the map's asset directory.
/// Absolute paths and full URLs are kept as given.
pub fn icon_url(directory: &str, url: &str) -> String {
    if url.starts_with('/') || url.contains("://") || url.starts_with("data:") {
        url.to_string()
    } else {
        format!("{directory}/icons/{url}")
    }
}

/// A legend entry. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    group: Option<String>,
    icon: Icon,
}

impl Category {
    pub fn new(name: impl Into<String>, group: Option<String>, icon: Icon) -> Self {
        Self {
            name: name.into(),
            group,
            icon,
        }
    }

    pub fn from_descriptor(desc: &CategoryDescriptor, directory: &str) -> Result<Self> {
        if desc.name.trim().is_empty() {
            return Err(MapError::config("category", "name must not be empty"));
        }
        let group = desc
            .group
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string);
        let icon = desc
            .icon
            .as_ref()
            .map(|icon| Icon::from_descriptor(icon, directory))
            .unwrap_or_default();
        Ok(Self::new(desc.name.clone(), group, icon))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn icon(&self) -> &Icon {
        &self.icon
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.group.as_deref() == Some(group)
    }
}
