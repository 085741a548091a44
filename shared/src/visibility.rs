//! Pure visibility policy. Nothing here is cached; the map re-runs it over
//! every marker whenever zoom, tags, legend, completion or overrides change.

use crate::layer::Layer;
use crate::legend::CategorySelection;
use crate::marker::{ForcedVisibility, Marker};
use crate::tags::TagSettings;

/// The global signals a decision depends on, captured at one instant.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityContext<'a> {
    pub zoom: f64,
    pub selection: &'a CategorySelection,
    pub tags: &'a TagSettings,
}

/// Why a marker is or is not on view, in policy order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    LayerHidden,
    ForcedOff,
    ForcedOn,
    BelowMinZoom,
    CategoryDeselected,
    TagHidden(String),
    Shown,
}

impl Verdict {
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::ForcedOn | Self::Shown)
    }
}

/// Layer-level gate: forced state first, then the layer's zoom range.
pub fn layer_gate(layer: &Layer, zoom: f64) -> bool {
    match layer.forced_visibility() {
        ForcedVisibility::Off => false,
        ForcedVisibility::On => true,
        ForcedVisibility::Default => layer.contains_zoom(zoom),
    }
}

/// Marker-level policy, assuming the owning layer's gate already passed.
pub fn marker_verdict(marker: &Marker, ctx: &VisibilityContext<'_>) -> Verdict {
    match marker.forced_visibility() {
        ForcedVisibility::Off => return Verdict::ForcedOff,
        ForcedVisibility::On => return Verdict::ForcedOn,
        ForcedVisibility::Default => {}
    }
    if ctx.zoom < marker.min_zoom() {
        return Verdict::BelowMinZoom;
    }
    if !ctx.selection.is_selected(marker.category()) {
        return Verdict::CategoryDeselected;
    }
    if let Some(tag) = marker.effective_tags().find(|tag| !ctx.tags.is_shown(tag)) {
        return Verdict::TagHidden(tag.to_string());
    }
    Verdict::Shown
}

pub fn explain(layer: &Layer, marker: &Marker, ctx: &VisibilityContext<'_>) -> Verdict {
    if !layer_gate(layer, ctx.zoom) {
        return Verdict::LayerHidden;
    }
    marker_verdict(marker, ctx)
}

pub fn resolve(layer: &Layer, marker: &Marker, ctx: &VisibilityContext<'_>) -> bool {
    explain(layer, marker, ctx).is_visible()
}
