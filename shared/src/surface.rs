use crate::layer::Layer;
use crate::marker::Marker;

/// The external renderer the map pushes visibility into.
///
/// Implementations must treat adding something already on view, or removing
/// something already gone, as a no-op.
pub trait RenderSurface {
    fn add_marker_to_view(&mut self, layer: &str, marker: &Marker);
    fn remove_marker_from_view(&mut self, layer: &str, marker: &Marker);
    fn add_layer_to_view(&mut self, layer: &Layer);
    fn remove_layer_from_view(&mut self, layer: &Layer);

    /// A marker already on view changed its completion and should be redrawn.
    fn refresh_marker(&mut self, layer: &str, marker: &Marker) {
        let _ = (layer, marker);
    }
}

/// Counts of renderer calls issued by one visibility pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewDelta {
    pub layers_added: usize,
    pub layers_removed: usize,
    pub markers_added: usize,
    pub markers_removed: usize,
}

impl ViewDelta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn merge(&mut self, other: ViewDelta) {
        self.layers_added += other.layers_added;
        self.layers_removed += other.layers_removed;
        self.markers_added += other.markers_added;
        self.markers_removed += other.markers_removed;
    }
}
