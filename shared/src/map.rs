use crate::category::Category;
use crate::completion::CompletionStore;
use crate::crs::{PlanePoint, WorldGeometry};
use crate::deep_link::DeepLink;
use crate::descriptor::MapDescriptor;
use crate::error::{MapError, Result};
use crate::layer::Layer;
use crate::legend::{Legend, LegendChange};
use crate::marker::{ForcedVisibility, Marker};
use crate::search::{SearchQuery, find_markers};
use crate::surface::{RenderSurface, ViewDelta};
use crate::tags::{TagSettings, TagStore};
use crate::visibility::{self, Verdict, VisibilityContext};

/// Current view, for whoever mirrors it into the page URL.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub zoom: f64,
    pub center: PlanePoint,
    pub layer: Option<String>,
}

impl MapView {
    /// Center rounded down to whole units, as written into links.
    pub fn floored_center(&self) -> PlanePoint {
        PlanePoint::new(self.center.lat.floor(), self.center.lng.floor())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub layer: &'a Layer,
    pub marker: &'a Marker,
}

/// One map instance: owns its layers, the legend, tag settings and the view,
/// and pushes every visibility change into the render surface.
///
/// Every mutating event re-resolves all markers from the latest zoom, legend,
/// tag, completion and override state.
pub struct Map<S, T> {
    directory: String,
    game_title: Option<String>,
    geometry: WorldGeometry,
    zoom: f64,
    center: PlanePoint,
    layers: Vec<Layer>,
    legend: Legend,
    tags: TagSettings,
    selected_layer: Option<String>,
    pending_focus: Option<String>,
    surface: S,
    store: T,
}

impl<S, T> Map<S, T>
where
    S: RenderSurface,
    T: TagStore,
{
    /// An empty map with geometry, view and tag settings in place.
    pub fn new(
        descriptor: &MapDescriptor,
        deep_link: &DeepLink,
        surface: S,
        store: T,
    ) -> Result<Self> {
        let geometry = WorldGeometry::new(
            descriptor.map_size_pixels,
            descriptor.map_size_coords,
            descriptor.tile_size_pixels,
            descriptor.max_zoom,
        )?;
        let zoom = deep_link
            .zoom
            .or(descriptor.initial_zoom)
            .filter(|z| z.is_finite())
            .map(|z| geometry.clamp_zoom(z))
            .unwrap_or_else(|| geometry.default_zoom());
        let center = deep_link
            .center
            .map(|c| geometry.max_bounds().clamp(c))
            .unwrap_or_else(|| geometry.bounds().center());
        let tags = TagSettings::load(descriptor.tags.iter().cloned(), &store);

        Ok(Self {
            directory: descriptor.directory.clone(),
            game_title: descriptor.game_title.clone(),
            geometry,
            zoom,
            center,
            layers: Vec::new(),
            legend: Legend::new(),
            tags,
            selected_layer: deep_link.layer.clone(),
            pending_focus: deep_link.marker_id.clone(),
            surface,
            store,
        })
    }

    /// Build the whole map from its descriptor. Broken categories and layers
    /// are logged and skipped; only broken map geometry fails the load.
    pub fn load(
        descriptor: &MapDescriptor,
        deep_link: &DeepLink,
        surface: S,
        store: T,
    ) -> Result<Self> {
        let mut map = Self::new(descriptor, deep_link, surface, store)?;

        for desc in &descriptor.categories {
            let added =
                Category::from_descriptor(desc, &map.directory).and_then(|c| map.add_category(c));
            if let Err(e) = added {
                tracing::warn!(directory = %map.directory, error = %e, "skipping category");
            }
        }
        for desc in &descriptor.layers {
            let added =
                Layer::from_descriptor(desc, &map.directory).and_then(|l| map.add_layer(l));
            if let Err(e) = added {
                tracing::warn!(directory = %map.directory, error = %e, "skipping layer");
            }
        }

        if let Some(id) = map.pending_focus.take() {
            tracing::warn!(marker = %id, "deep-linked marker not found");
        }
        if let Some(layer) = map.selected_layer.clone() {
            if map.layer(&layer).is_none() {
                tracing::warn!(%layer, "deep-linked layer not found");
                map.selected_layer = None;
            }
        }

        tracing::info!(
            directory = %map.directory,
            layers = map.layers.len(),
            markers = map.layers.iter().map(|l| l.markers().len()).sum::<usize>(),
            categories = map.legend.categories().len(),
            zoom = map.zoom,
            "map loaded"
        );
        Ok(map)
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn game_title(&self) -> Option<&str> {
        self.game_title.as_deref()
    }

    pub fn geometry(&self) -> &WorldGeometry {
        &self.geometry
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn center(&self) -> PlanePoint {
        self.center
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    pub fn tag_settings(&self) -> &TagSettings {
        &self.tags
    }

    pub fn selected_layer(&self) -> Option<&str> {
        self.selected_layer.as_deref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn tag_store(&self) -> &T {
        &self.store
    }

    pub fn view(&self) -> MapView {
        MapView {
            zoom: self.zoom,
            center: self.center,
            layer: self.selected_layer.clone(),
        }
    }

    pub fn add_category(&mut self, category: Category) -> Result<()> {
        self.legend.add_category(category)?;
        self.recompute_visibility()?;
        Ok(())
    }

    /// Attach a layer, push its initial state to the renderer, and honour a
    /// pending deep-link focus if the marker lives here.
    pub fn add_layer(&mut self, mut layer: Layer) -> Result<()> {
        if self.layer(layer.name()).is_some() {
            return Err(MapError::config(
                format!("layer `{}`", layer.name()),
                "registered twice",
            ));
        }
        let uncategorized = layer
            .markers()
            .iter()
            .filter(|m| self.legend.category(m.category()).is_none())
            .count();
        if uncategorized > 0 && !self.legend.categories().is_empty() {
            tracing::warn!(
                layer = %layer.name(),
                uncategorized,
                "markers reference unregistered categories"
            );
        }

        layer.attach();
        let name = layer.name().to_string();
        self.layers.push(layer);
        self.recompute_visibility()?;

        let focus = self
            .pending_focus
            .as_deref()
            .filter(|id| self.layer(&name).and_then(|l| l.marker(id)).is_some())
            .map(str::to_string);
        if let Some(id) = focus {
            self.pending_focus = None;
            self.focus_on(&name, &id)?;
        }
        Ok(())
    }

    /// Change zoom. A non-finite zoom is rejected before anything changes.
    pub fn set_zoom(&mut self, zoom: f64) -> Result<ViewDelta> {
        if !zoom.is_finite() {
            return Err(MapError::InvalidZoom(zoom));
        }
        self.zoom = self.geometry.clamp_zoom(zoom);
        self.recompute_visibility()
    }

    /// Move the view center, clamped to the padded world bounds.
    pub fn pan_to(&mut self, center: PlanePoint) -> Result<()> {
        if !center.is_finite() {
            return Err(MapError::config("view center", "must be finite"));
        }
        self.center = self.geometry.max_bounds().clamp(center);
        Ok(())
    }

    pub fn set_view(&mut self, center: PlanePoint, zoom: f64) -> Result<ViewDelta> {
        if !zoom.is_finite() {
            return Err(MapError::InvalidZoom(zoom));
        }
        self.pan_to(center)?;
        self.set_zoom(zoom)
    }

    pub fn select_all(&mut self) -> Result<Vec<LegendChange>> {
        let changes = self.legend.select_all();
        self.recompute_visibility()?;
        Ok(changes)
    }

    pub fn select_none(&mut self) -> Result<Vec<LegendChange>> {
        let changes = self.legend.select_none();
        self.recompute_visibility()?;
        Ok(changes)
    }

    pub fn toggle_category(&mut self, name: &str) -> Result<Vec<LegendChange>> {
        let changes = self.legend.toggle_category(name)?;
        self.recompute_visibility()?;
        Ok(changes)
    }

    pub fn toggle_group(&mut self, group: &str) -> Result<Vec<LegendChange>> {
        let changes = self.legend.toggle_group(group)?;
        self.recompute_visibility()?;
        Ok(changes)
    }

    /// Show or hide every marker carrying `tag`. Persisted only when it changes.
    pub fn set_tag_shown(&mut self, tag: &str, shown: bool) -> Result<bool> {
        if !self.tags.set_shown(tag, shown) {
            return Ok(false);
        }
        self.store.set_tag_setting(tag, shown);
        self.recompute_visibility()?;
        Ok(true)
    }

    /// Apply an externally fetched completion list. Unknown ids are ignored
    /// and re-applying the same list changes nothing.
    pub fn apply_completed<I>(&mut self, ids: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut newly_completed = Vec::new();
        for id in ids {
            let id = id.as_ref();
            match self.marker_mut(id) {
                Some(marker) => {
                    if marker.complete() {
                        newly_completed.push(id.to_string());
                    }
                }
                None => tracing::debug!(marker = %id, "completed marker not on this map"),
            }
        }
        if !newly_completed.is_empty() {
            let on_view = self.on_view(&newly_completed);
            self.recompute_visibility()?;
            self.refresh_markers(&on_view);
        }
        Ok(newly_completed.len())
    }

    /// Explicit user completion toggle, recorded in `completions`.
    pub fn set_completed(
        &mut self,
        id: &str,
        completed: bool,
        completions: &mut dyn CompletionStore,
    ) -> Result<bool> {
        let marker = self
            .marker_mut(id)
            .ok_or_else(|| MapError::unknown("marker", id))?;
        let changed = if completed {
            marker.complete()
        } else {
            marker.uncomplete()
        };
        if changed {
            completions.record_completion(id, completed);
            let on_view = self.on_view(&[id]);
            self.recompute_visibility()?;
            self.refresh_markers(&on_view);
        }
        Ok(changed)
    }

    /// Forget every completion, both in `completions` and on the markers.
    pub fn clear_completion(&mut self, completions: &mut dyn CompletionStore) -> Result<usize> {
        completions.clear_completion();
        let mut cleared = Vec::new();
        for layer in &mut self.layers {
            for marker in layer.markers_mut() {
                if marker.uncomplete() {
                    cleared.push(marker.id().to_string());
                }
            }
        }
        let on_view = self.on_view(&cleared);
        self.recompute_visibility()?;
        self.refresh_markers(&on_view);
        tracing::info!(cleared = cleared.len(), "completion data cleared");
        Ok(cleared.len())
    }

    /// Reveal one marker: reset the legend, select its layer, zoom in far
    /// enough for it and force it on regardless of legend and tag filters.
    pub fn focus_on(&mut self, layer: &str, marker_id: &str) -> Result<()> {
        let layer_idx = self
            .layers
            .iter()
            .position(|l| l.name() == layer)
            .ok_or_else(|| MapError::unknown("layer", layer))?;
        let target = &mut self.layers[layer_idx];
        let (layer_min, layer_max) = (target.min_zoom(), target.max_zoom());
        let marker = target
            .marker_mut(marker_id)
            .ok_or_else(|| MapError::unknown("marker", marker_id))?;
        marker.force_show();
        let (position, min_zoom) = (marker.position(), marker.min_zoom());

        self.legend.reset();
        self.selected_layer = Some(layer.to_string());
        self.center = self.geometry.max_bounds().clamp(position);
        // Deep enough for both the marker and its layer, never past the layer.
        let zoom = min_zoom.max(layer_min).max(self.zoom).min(layer_max);
        self.zoom = self.geometry.clamp_zoom(zoom);
        self.recompute_visibility()?;
        tracing::debug!(%layer, marker = %marker_id, zoom = self.zoom, "focused marker");
        Ok(())
    }

    /// Focus the first marker with `id` in any layer.
    pub fn navigate_to_marker(&mut self, id: &str) -> Result<()> {
        let layer = self
            .layers
            .iter()
            .find(|l| l.marker(id).is_some())
            .map(|l| l.name().to_string())
            .ok_or_else(|| MapError::unknown("marker", id))?;
        self.focus_on(&layer, id)
    }

    /// Drop every marker-level override.
    pub fn clear_forced_visibility(&mut self) -> Result<ViewDelta> {
        for layer in &mut self.layers {
            for marker in layer.markers_mut() {
                marker.reset_visibility();
            }
        }
        self.recompute_visibility()
    }

    pub fn set_layer_visibility(
        &mut self,
        layer: &str,
        forced: ForcedVisibility,
    ) -> Result<ViewDelta> {
        self.layers
            .iter_mut()
            .find(|l| l.name() == layer)
            .ok_or_else(|| MapError::unknown("layer", layer))?
            .set_forced_visibility(forced);
        self.recompute_visibility()
    }

    pub fn select_layer(&mut self, layer: &str) -> Result<()> {
        if self.layer(layer).is_none() {
            return Err(MapError::unknown("layer", layer));
        }
        self.selected_layer = Some(layer.to_string());
        Ok(())
    }

    /// Search-box lookup across every layer; empty for inputs too short.
    pub fn search(&self, input: &str) -> Vec<SearchHit<'_>> {
        let Some(query) = SearchQuery::from_input(input) else {
            return Vec::new();
        };
        self.layers
            .iter()
            .flat_map(|layer| {
                find_markers(layer, &query)
                    .into_iter()
                    .map(move |marker| SearchHit { layer, marker })
            })
            .collect()
    }

    pub fn find_marker(&self, id: &str) -> Option<SearchHit<'_>> {
        self.layers.iter().find_map(|layer| {
            layer
                .marker(id)
                .map(|marker| SearchHit { layer, marker })
        })
    }

    /// Why a marker is or is not shown under the current state.
    pub fn verdict(&self, id: &str) -> Result<Verdict> {
        let hit = self
            .find_marker(id)
            .ok_or_else(|| MapError::unknown("marker", id))?;
        Ok(visibility::explain(hit.layer, hit.marker, &self.context()))
    }

    /// Resolve every marker in every layer from scratch and push the changes.
    pub fn recompute_visibility(&mut self) -> Result<ViewDelta> {
        let ctx = VisibilityContext {
            zoom: self.zoom,
            selection: self.legend.selection(),
            tags: &self.tags,
        };
        let mut delta = ViewDelta::default();
        for layer in &mut self.layers {
            delta.merge(layer.sync_view(&ctx, &mut self.surface)?);
        }
        if !delta.is_empty() {
            tracing::debug!(?delta, zoom = self.zoom, "visibility updated");
        }
        Ok(delta)
    }

    /// The `(layer, marker)` pairs among `ids` the renderer currently shows.
    fn on_view<I: AsRef<str>>(&self, ids: &[I]) -> Vec<(String, String)> {
        let mut shown = Vec::new();
        for layer in &self.layers {
            for id in ids {
                let id = id.as_ref();
                if layer.is_marker_on_view(id).unwrap_or(false) {
                    shown.push((layer.name().to_string(), id.to_string()));
                }
            }
        }
        shown
    }

    /// Redraw markers whose completion changed while they stayed on view.
    fn refresh_markers(&mut self, before: &[(String, String)]) {
        for (layer_name, id) in before {
            let Some(layer) = self.layers.iter().find(|l| l.name() == layer_name) else {
                continue;
            };
            let Some(marker) = layer.marker(id) else {
                continue;
            };
            if layer.is_marker_on_view(id).unwrap_or(false) {
                self.surface.refresh_marker(layer_name, marker);
            }
        }
    }

    fn context(&self) -> VisibilityContext<'_> {
        VisibilityContext {
            zoom: self.zoom,
            selection: self.legend.selection(),
            tags: &self.tags,
        }
    }

    fn marker_mut(&mut self, id: &str) -> Option<&mut Marker> {
        self.layers.iter_mut().find_map(|l| l.marker_mut(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{CategoryDescriptor, LayerDescriptor, MarkerDescriptor};
    use crate::legend::CategorySelection;
    use crate::tags::COMPLETED_TAG;
    use crate::testing::{MemoryCompletionStore, MemoryTagStore, RecordingSurface, SurfaceCall};

    type TestMap = Map<RecordingSurface, MemoryTagStore>;

    fn marker(
        id: &str,
        name: &str,
        category: &str,
        coords: [f64; 2],
        tags: &[&str],
        min_zoom: Option<f64>,
    ) -> MarkerDescriptor {
        MarkerDescriptor {
            id: id.into(),
            name: name.into(),
            coords: Some(coords),
            category: category.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            min_zoom,
        }
    }

    fn descriptor() -> MapDescriptor {
        MapDescriptor {
            directory: "la".into(),
            game_title: Some("Link's Awakening".into()),
            map_size_pixels: 3280.0,
            map_size_coords: None,
            tile_size_pixels: 205.0,
            max_zoom: None,
            initial_zoom: None,
            tags: vec!["Chest".into()],
            completion_url: None,
            categories: [
                ("Shrine", Some("Dungeons")),
                ("Temple", Some("Dungeons")),
                ("Heart Piece", None),
                ("Chest", None),
            ]
            .into_iter()
            .map(|(name, group)| CategoryDescriptor {
                name: name.into(),
                group: group.map(str::to_string),
                icon: None,
            })
            .collect(),
            layers: vec![
                LayerDescriptor {
                    name: "Overworld".into(),
                    min_zoom: Some(0.0),
                    max_zoom: Some(5.0),
                    icon: None,
                    markers: vec![
                        marker("temple-1", "Forest Temple", "Temple", [100.0, 200.0], &[], Some(2.0)),
                        marker("heart-1", "Heart Piece (Bay)", "Heart Piece", [300.0, 300.0], &[], None),
                        marker("chest-1", "Chest (Rupees)", "Chest", [10.0, 10.0], &["Chest"], Some(3.0)),
                    ],
                },
                LayerDescriptor {
                    name: "Underworld".into(),
                    min_zoom: Some(3.0),
                    max_zoom: None,
                    icon: None,
                    markers: vec![marker("shrine-1", "Dark Shrine", "Shrine", [50.0, 50.0], &[], None)],
                },
            ],
        }
    }

    fn load_with(link: DeepLink, store: MemoryTagStore) -> TestMap {
        Map::load(&descriptor(), &link, RecordingSurface::default(), store).expect("valid map")
    }

    fn map() -> TestMap {
        load_with(DeepLink::default(), MemoryTagStore::default())
    }

    fn shown(map: &TestMap, layer: &str, id: &str) -> bool {
        let on_view = map
            .layer(layer)
            .expect("layer")
            .is_marker_on_view(id)
            .expect("attached");
        assert_eq!(on_view, map.surface().shows_marker(layer, id));
        on_view
    }

    #[test]
    fn initial_view_uses_default_zoom_and_world_center() {
        let map = map();
        assert_eq!(map.zoom(), 2.0);
        assert_eq!(map.center(), PlanePoint::new(1640.0, 1640.0));
        assert!(shown(&map, "Overworld", "temple-1"));
        assert!(shown(&map, "Overworld", "heart-1"));
        assert!(!shown(&map, "Overworld", "chest-1"));
        assert!(!shown(&map, "Underworld", "shrine-1"));
        assert!(map.surface().layers.contains("Overworld"));
        assert!(!map.surface().layers.contains("Underworld"));
        assert_eq!(map.tag_settings().iter().count(), 2);
    }

    #[test]
    fn none_selected_hides_marker_at_every_zoom() {
        let mut map = map();
        map.select_none().expect("resolves");
        for zoom in [2.0, 3.0, 5.0] {
            map.set_zoom(zoom).expect("finite zoom");
            assert_eq!(map.verdict("temple-1"), Ok(Verdict::CategoryDeselected));
            assert!(!shown(&map, "Overworld", "temple-1"));
        }
    }

    #[test]
    fn deep_linked_marker_survives_none_selected() {
        let link = DeepLink::from_pairs([("m", "temple-1")]);
        let mut map = load_with(link, MemoryTagStore::default());
        map.select_none().expect("resolves");
        assert_eq!(map.verdict("temple-1"), Ok(Verdict::ForcedOn));
        assert!(shown(&map, "Overworld", "temple-1"));
        assert!(!shown(&map, "Overworld", "heart-1"));
        assert_eq!(map.selected_layer(), Some("Overworld"));
        assert_eq!(map.center(), PlanePoint::new(200.0, 100.0));
    }

    #[test]
    fn deep_link_focus_zooms_to_marker_and_layer_minimum() {
        let link = DeepLink::from_pairs([("z", "1"), ("id", "shrine-1")]);
        let map = load_with(link, MemoryTagStore::default());
        assert_eq!(map.zoom(), 3.0);
        assert_eq!(map.selected_layer(), Some("Underworld"));
        assert!(shown(&map, "Underworld", "shrine-1"));
    }

    #[test]
    fn unknown_deep_link_targets_are_dropped() {
        let link = DeepLink::from_pairs([("m", "nowhere"), ("l", "Moon")]);
        let map = load_with(link, MemoryTagStore::default());
        assert_eq!(map.selected_layer(), None);
        assert_eq!(map.legend().selection(), &CategorySelection::AllSelected);
    }

    #[test]
    fn group_toggle_from_all_keeps_only_group() {
        let mut map = map();
        map.toggle_group("Dungeons").expect("known group");
        assert_eq!(
            map.legend().selection(),
            &CategorySelection::Custom(["Shrine".to_string(), "Temple".to_string()].into())
        );
        assert!(shown(&map, "Overworld", "temple-1"));
        assert!(!shown(&map, "Overworld", "heart-1"));
    }

    #[test]
    fn unchanged_inputs_issue_no_renderer_calls() {
        let mut map = map();
        let calls = map.surface().calls.len();
        assert!(map.recompute_visibility().expect("resolves").is_empty());
        assert!(map.set_zoom(2.0).expect("finite zoom").is_empty());
        assert!(map.select_all().expect("resolves").is_empty());
        assert_eq!(map.surface().calls.len(), calls);
    }

    #[test]
    fn zoom_changes_reach_every_layer() {
        let mut map = map();
        let delta = map.set_zoom(3.0).expect("finite zoom");
        assert_eq!(delta.layers_added, 1);
        assert_eq!(delta.markers_added, 2);
        assert!(shown(&map, "Overworld", "chest-1"));
        assert!(shown(&map, "Underworld", "shrine-1"));

        map.set_zoom(1.0).expect("finite zoom");
        assert!(!shown(&map, "Overworld", "temple-1"));
        assert!(!map.surface().layers.contains("Underworld"));
        assert_eq!(
            map.surface().calls.last(),
            Some(&SurfaceCall::RemoveLayer("Underworld".into()))
        );
    }

    #[test]
    fn invalid_zoom_leaves_state_untouched() {
        let mut map = map();
        let calls = map.surface().calls.len();
        assert!(matches!(map.set_zoom(f64::NAN), Err(MapError::InvalidZoom(_))));
        assert!(matches!(
            map.set_view(PlanePoint::default(), f64::INFINITY),
            Err(MapError::InvalidZoom(_))
        ));
        assert_eq!(map.zoom(), 2.0);
        assert_eq!(map.surface().calls.len(), calls);
    }

    #[test]
    fn zoom_and_pan_are_clamped() {
        let mut map = map();
        map.set_zoom(10.0).expect("finite zoom");
        assert_eq!(map.zoom(), 4.0);
        map.pan_to(PlanePoint::new(-10_000.0, 10_000.0)).expect("finite");
        assert_eq!(map.center(), PlanePoint::new(-1640.0, 4920.0));
        assert_eq!(map.view().floored_center(), PlanePoint::new(-1640.0, 4920.0));
    }

    #[test]
    fn tag_toggle_filters_and_persists_once() {
        let mut map = map();
        map.set_zoom(3.0).expect("finite zoom");
        assert!(map.set_tag_shown("Chest", false).expect("resolves"));
        assert!(!shown(&map, "Overworld", "chest-1"));
        assert!(!map.set_tag_shown("Chest", false).expect("resolves"));
        assert_eq!(map.tag_store().writes, 1);
        assert_eq!(map.tag_store().get_tag_setting("Chest"), Some(false));
    }

    #[test]
    fn stored_tag_settings_apply_at_startup() {
        let mut store = MemoryTagStore::default();
        store.set_tag_setting("Chest", false);
        let map = load_with(DeepLink::from_pairs([("z", "3")]), store);
        assert_eq!(map.verdict("chest-1"), Ok(Verdict::TagHidden("Chest".into())));
    }

    #[test]
    fn completion_list_is_idempotent() {
        let mut map = map();
        assert_eq!(map.apply_completed(["heart-1", "not-here"]).expect("resolves"), 1);
        assert_eq!(
            map.verdict("heart-1"),
            Ok(Verdict::TagHidden(COMPLETED_TAG.into()))
        );
        let calls = map.surface().calls.len();
        assert_eq!(map.apply_completed(vec!["heart-1".to_string()]).expect("resolves"), 0);
        assert_eq!(map.surface().calls.len(), calls);

        map.set_tag_shown(COMPLETED_TAG, true).expect("resolves");
        assert!(shown(&map, "Overworld", "heart-1"));
    }

    #[test]
    fn clearing_completion_resets_markers_and_store() {
        let mut map = map();
        let mut completions = MemoryCompletionStore::default();
        assert!(map.set_completed("heart-1", true, &mut completions).expect("known"));
        assert!(!map.set_completed("heart-1", true, &mut completions).expect("known"));
        assert!(completions.completed.contains("heart-1"));
        assert!(!shown(&map, "Overworld", "heart-1"));

        assert_eq!(map.clear_completion(&mut completions).expect("resolves"), 1);
        assert_eq!(completions.clears, 1);
        assert!(completions.completed.is_empty());
        assert!(shown(&map, "Overworld", "heart-1"));
    }

    #[test]
    fn completing_unknown_marker_is_invariant_violation() {
        let mut map = map();
        let mut completions = MemoryCompletionStore::default();
        assert_eq!(
            map.set_completed("ghost", true, &mut completions),
            Err(MapError::unknown("marker", "ghost"))
        );
        assert!(map.toggle_category("Ghosts").is_err());
        assert!(map.focus_on("Overworld", "ghost").is_err());
        assert!(map.select_layer("Moon").is_err());
    }

    #[test]
    fn layer_forced_off_beats_marker_forced_on() {
        let mut map = map();
        map.navigate_to_marker("temple-1").expect("known");
        map.set_layer_visibility("Overworld", ForcedVisibility::Off)
            .expect("known layer");
        assert_eq!(map.verdict("temple-1"), Ok(Verdict::LayerHidden));
        assert!(!shown(&map, "Overworld", "temple-1"));
        assert!(!map.surface().layers.contains("Overworld"));

        map.set_layer_visibility("Underworld", ForcedVisibility::On)
            .expect("known layer");
        assert!(shown(&map, "Underworld", "shrine-1"));
    }

    #[test]
    fn focus_resets_legend_until_overrides_cleared() {
        let mut map = map();
        map.select_none().expect("resolves");
        map.navigate_to_marker("heart-1").expect("known");
        assert_eq!(map.legend().selection(), &CategorySelection::AllSelected);
        map.select_none().expect("resolves");
        assert!(shown(&map, "Overworld", "heart-1"));

        map.clear_forced_visibility().expect("resolves");
        assert!(!shown(&map, "Overworld", "heart-1"));
    }

    #[test]
    fn search_spans_layers_and_ignores_visibility() {
        let map = map();
        let hits: Vec<_> = map
            .search("DARK")
            .into_iter()
            .map(|hit| (hit.layer.name(), hit.marker.id()))
            .collect();
        assert_eq!(hits, vec![("Underworld", "shrine-1")]);
        assert!(map.search("e").is_empty());
        assert_eq!(map.search("ple").len(), 1);
        assert_eq!(
            map.find_marker("chest-1").map(|hit| hit.layer.name()),
            Some("Overworld")
        );
    }

    #[test]
    fn broken_descriptor_items_are_skipped() {
        let mut desc = descriptor();
        desc.layers.push(LayerDescriptor {
            name: "Sky".into(),
            min_zoom: Some(4.0),
            max_zoom: Some(1.0),
            icon: None,
            markers: Vec::new(),
        });
        desc.layers.push(desc.layers[0].clone());
        desc.layers[1].markers[0].coords = None;
        desc.categories.push(desc.categories[0].clone());

        let map = Map::load(
            &desc,
            &DeepLink::default(),
            RecordingSurface::default(),
            MemoryTagStore::default(),
        )
        .expect("geometry is valid");
        let names: Vec<_> = map.layers().iter().map(Layer::name).collect();
        assert_eq!(names, vec!["Overworld", "Underworld"]);
        assert!(map.layer("Underworld").expect("layer").markers().is_empty());
        assert_eq!(map.legend().categories().len(), 4);
    }

    #[test]
    fn broken_geometry_fails_load() {
        let mut desc = descriptor();
        desc.tile_size_pixels = 0.0;
        let result = Map::load(
            &desc,
            &DeepLink::default(),
            RecordingSurface::default(),
            MemoryTagStore::default(),
        );
        assert!(matches!(result, Err(MapError::Configuration { .. })));
    }

    #[test]
    fn latest_signals_win() {
        let mut map = map();
        map.set_zoom(4.0).expect("finite zoom");
        map.toggle_category("Chest").expect("known");
        map.set_tag_shown("Chest", false).expect("resolves");
        map.set_tag_shown("Chest", true).expect("resolves");
        assert_eq!(map.verdict("chest-1"), Ok(Verdict::CategoryDeselected));
        map.toggle_category("Chest").expect("known");
        map.set_zoom(2.0).expect("finite zoom");
        assert_eq!(map.verdict("chest-1"), Ok(Verdict::BelowMinZoom));
        map.set_zoom(3.0).expect("finite zoom");
        assert!(shown(&map, "Overworld", "chest-1"));
    }

    #[test]
    fn map_smaller_than_a_tile_keeps_zooming() {
        let desc = MapDescriptor::from_json(
            r#"{"directory":"tiny","mapSizePixels":100,"tileSizePixels":256}"#,
        )
        .expect("valid json");
        let link = DeepLink::from_pairs([("z", "3")]);
        let mut map = Map::load(
            &desc,
            &link,
            RecordingSurface::default(),
            MemoryTagStore::default(),
        )
        .expect("tiny map loads");
        assert_eq!(map.geometry().max_zoom(), 0.0);
        assert_eq!(map.zoom(), 0.0);
        map.set_zoom(0.0).expect("finite zoom");
        map.set_zoom(5.0).expect("finite zoom");
        assert_eq!(map.zoom(), 0.0);
    }

    #[test]
    fn completion_redraws_markers_that_stay_on_view() {
        let mut map = map();
        map.set_tag_shown(COMPLETED_TAG, true).expect("resolves");
        map.apply_completed(["heart-1"]).expect("resolves");
        assert!(shown(&map, "Overworld", "heart-1"));
        assert_eq!(
            map.surface().calls.last(),
            Some(&SurfaceCall::RefreshMarker("Overworld".into(), "heart-1".into()))
        );

        let mut completions = MemoryCompletionStore::default();
        map.set_completed("heart-1", false, &mut completions).expect("known");
        assert_eq!(
            map.surface().calls.last(),
            Some(&SurfaceCall::RefreshMarker("Overworld".into(), "heart-1".into()))
        );
    }

    #[test]
    fn completion_that_hides_or_reveals_does_not_redraw() {
        let mut map = map();
        let mut completions = MemoryCompletionStore::default();
        map.set_completed("heart-1", true, &mut completions).expect("known");
        map.clear_completion(&mut completions).expect("resolves");
        assert!(shown(&map, "Overworld", "heart-1"));
        assert!(
            !map.surface()
                .calls
                .iter()
                .any(|call| matches!(call, SurfaceCall::RefreshMarker(..)))
        );
    }
}
