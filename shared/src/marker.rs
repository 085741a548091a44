use std::collections::BTreeSet;

use crate::crs::PlanePoint;
use crate::descriptor::MarkerDescriptor;
use crate::error::{MapError, Result};
use crate::tags::COMPLETED_TAG;

/// Explicit override that bypasses normal filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForcedVisibility {
    Off,
    On,
    #[default]
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    id: String,
    name: String,
    position: PlanePoint,
    category: String,
    tags: BTreeSet<String>,
    min_zoom: f64,
    completed: bool,
    forced: ForcedVisibility,
}

impl Marker {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        position: PlanePoint,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            category: category.into(),
            tags: BTreeSet::new(),
            min_zoom: 0.0,
            completed: false,
            forced: ForcedVisibility::Default,
        }
    }

    /// `Completed` is owned by the completion flag, so a literal tag of that
    /// name is dropped.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags
            .into_iter()
            .map(Into::into)
            .filter(|tag| tag != COMPLETED_TAG)
            .collect();
        self
    }

    pub fn with_min_zoom(mut self, min_zoom: f64) -> Self {
        self.min_zoom = min_zoom;
        self
    }

    pub fn from_descriptor(desc: &MarkerDescriptor) -> Result<Self> {
        let context = || format!("marker `{}`", desc.id);
        if desc.id.is_empty() {
            return Err(MapError::config("marker", "id must not be empty"));
        }
        let Some(coords) = desc.coords else {
            return Err(MapError::config(context(), "missing coords"));
        };
        let position = PlanePoint::from_coords(coords);
        if !position.is_finite() {
            return Err(MapError::config(context(), "coords must be finite"));
        }
        let min_zoom = desc.min_zoom.unwrap_or(0.0);
        if !min_zoom.is_finite() {
            return Err(MapError::config(context(), "minZoom must be finite"));
        }
        if desc.tags.iter().any(|tag| tag == COMPLETED_TAG) {
            tracing::debug!(marker = %desc.id, "ignoring literal Completed tag");
        }
        Ok(Self::new(desc.id.clone(), desc.name.clone(), position, desc.category.clone())
            .with_tags(desc.tags.iter().cloned())
            .with_min_zoom(min_zoom))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> PlanePoint {
        self.position
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Static tags plus `Completed` while the marker is complete.
    pub fn effective_tags(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .map(String::as_str)
            .chain(self.completed.then_some(COMPLETED_TAG))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        if tag == COMPLETED_TAG {
            self.completed
        } else {
            self.tags.contains(tag)
        }
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Returns `true` when the flag changed.
    pub fn complete(&mut self) -> bool {
        !std::mem::replace(&mut self.completed, true)
    }

    /// Returns `true` when the flag changed.
    pub fn uncomplete(&mut self) -> bool {
        std::mem::replace(&mut self.completed, false)
    }

    pub fn forced_visibility(&self) -> ForcedVisibility {
        self.forced
    }

    pub fn force_show(&mut self) {
        self.forced = ForcedVisibility::On;
    }

    pub fn force_hide(&mut self) {
        self.forced = ForcedVisibility::Off;
    }

    pub fn reset_visibility(&mut self) {
        self.forced = ForcedVisibility::Default;
    }
}
