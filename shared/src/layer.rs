use crate::category::Icon;
use crate::descriptor::LayerDescriptor;
use crate::error::{MapError, Result};
use crate::marker::{ForcedVisibility, Marker};
use crate::surface::{RenderSurface, ViewDelta};
use crate::visibility::{self, VisibilityContext};

/// What the renderer was last told about this layer and its markers.
#[derive(Debug, Clone, Default, PartialEq)]
struct LayerView {
    on_view: bool,
    markers: Vec<bool>,
}

/// A named, zoom-bounded group of markers.
///
/// Layers are built detached and only become usable once a map attaches
/// them; until then the on-view queries return [`MapError::Detached`].
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    name: String,
    min_zoom: f64,
    max_zoom: f64,
    icon: Option<Icon>,
    markers: Vec<Marker>,
    forced: ForcedVisibility,
    view: Option<LayerView>,
}

impl Layer {
    pub fn new(name: impl Into<String>, min_zoom: f64, max_zoom: f64) -> Result<Self> {
        let name = name.into();
        if min_zoom.is_nan() || max_zoom.is_nan() || min_zoom > max_zoom {
            return Err(MapError::config(
                format!("layer `{name}`"),
                format!("zoom range [{min_zoom}, {max_zoom}] is empty"),
            ));
        }
        Ok(Self {
            name,
            min_zoom,
            max_zoom,
            icon: None,
            markers: Vec::new(),
            forced: ForcedVisibility::Default,
            view: None,
        })
    }

    /// A layer visible at every zoom.
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_zoom: 0.0,
            max_zoom: f64::INFINITY,
            icon: None,
            markers: Vec::new(),
            forced: ForcedVisibility::Default,
            view: None,
        }
    }

    /// Bad markers are logged and skipped; only a bad zoom range fails the layer.
    pub fn from_descriptor(desc: &LayerDescriptor, directory: &str) -> Result<Self> {
        let mut layer = Self::new(
            desc.name.clone(),
            desc.min_zoom.unwrap_or(0.0),
            desc.max_zoom.unwrap_or(f64::INFINITY),
        )?;
        layer.icon = desc
            .icon
            .as_ref()
            .map(|icon| Icon::from_descriptor(icon, directory));

        for marker_desc in &desc.markers {
            let added = Marker::from_descriptor(marker_desc).and_then(|m| layer.push_marker(m));
            if let Err(e) = added {
                tracing::warn!(layer = %layer.name, error = %e, "skipping marker");
            }
        }
        Ok(layer)
    }

    pub fn with_marker(mut self, marker: Marker) -> Result<Self> {
        self.push_marker(marker)?;
        Ok(self)
    }

    pub fn push_marker(&mut self, marker: Marker) -> Result<()> {
        if self.marker(marker.id()).is_some() {
            return Err(MapError::config(
                format!("marker `{}`", marker.id()),
                format!("duplicate id in layer `{}`", self.name),
            ));
        }
        self.markers.push(marker);
        if let Some(view) = self.view.as_mut() {
            view.markers.push(false);
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    pub fn icon(&self) -> Option<&Icon> {
        self.icon.as_ref()
    }

    pub fn contains_zoom(&self, zoom: f64) -> bool {
        zoom >= self.min_zoom && zoom <= self.max_zoom
    }

    /// Markers in declaration order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id() == id)
    }

    pub(crate) fn marker_mut(&mut self, id: &str) -> Option<&mut Marker> {
        self.markers.iter_mut().find(|m| m.id() == id)
    }

    pub(crate) fn markers_mut(&mut self) -> &mut [Marker] {
        &mut self.markers
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

    pub(crate) fn set_forced_visibility(&mut self, forced: ForcedVisibility) {
        self.forced = forced;
    }

    pub fn is_attached(&self) -> bool {
        self.view.is_some()
    }

    pub fn is_on_view(&self) -> Result<bool> {
        self.view
            .as_ref()
            .map(|view| view.on_view)
            .ok_or_else(|| MapError::Detached(self.name.clone()))
    }

    pub fn is_marker_on_view(&self, id: &str) -> Result<bool> {
        let view = self
            .view
            .as_ref()
            .ok_or_else(|| MapError::Detached(self.name.clone()))?;
        self.markers
            .iter()
            .position(|m| m.id() == id)
            .map(|idx| view.markers[idx])
            .ok_or_else(|| MapError::unknown("marker", id))
    }

    pub(crate) fn attach(&mut self) {
        self.view = Some(LayerView {
            on_view: false,
            markers: vec![false; self.markers.len()],
        });
    }

    /// Re-resolve every marker and tell the renderer about each change.
    pub(crate) fn sync_view<S>(
        &mut self,
        ctx: &VisibilityContext<'_>,
        surface: &mut S,
    ) -> Result<ViewDelta>
    where
        S: RenderSurface + ?Sized,
    {
        let was_on_view = self.is_on_view()?;
        let gate = visibility::layer_gate(self, ctx.zoom);
        let mut delta = ViewDelta::default();

        if gate && !was_on_view {
            surface.add_layer_to_view(self);
            delta.layers_added += 1;
        }

        let Self {
            name,
            markers,
            view,
            ..
        } = &mut *self;
        let view = view
            .as_mut()
            .ok_or_else(|| MapError::Detached(name.clone()))?;
        for (marker, on_view) in markers.iter().zip(view.markers.iter_mut()) {
            let visible = gate && visibility::marker_verdict(marker, ctx).is_visible();
            if visible == *on_view {
                continue;
            }
            if visible {
                surface.add_marker_to_view(name.as_str(), marker);
                delta.markers_added += 1;
            } else {
                surface.remove_marker_from_view(name.as_str(), marker);
                delta.markers_removed += 1;
            }
            *on_view = visible;
        }
        view.on_view = gate;

        if !gate && was_on_view {
            surface.remove_layer_from_view(self);
            delta.layers_removed += 1;
        }
        Ok(delta)
    }
}
