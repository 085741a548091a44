//! In-memory collaborators for unit tests.

use std::collections::{BTreeSet, HashMap};

use crate::completion::CompletionStore;
use crate::layer::Layer;
use crate::marker::Marker;
use crate::surface::RenderSurface;
use crate::tags::{TagStore, setting_key};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    AddLayer(String),
    RemoveLayer(String),
    AddMarker(String, String),
    RemoveMarker(String, String),
    RefreshMarker(String, String),
}

/// Records every call and keeps the on-view sets an idempotent renderer would.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<SurfaceCall>,
    pub layers: BTreeSet<String>,
    pub markers: BTreeSet<(String, String)>,
}

impl RecordingSurface {
    pub fn shows_marker(&self, layer: &str, id: &str) -> bool {
        self.markers.contains(&(layer.to_string(), id.to_string()))
    }
}

impl RenderSurface for RecordingSurface {
    fn add_marker_to_view(&mut self, layer: &str, marker: &Marker) {
        self.calls
            .push(SurfaceCall::AddMarker(layer.into(), marker.id().into()));
        self.markers.insert((layer.into(), marker.id().into()));
    }

    fn remove_marker_from_view(&mut self, layer: &str, marker: &Marker) {
        self.calls
            .push(SurfaceCall::RemoveMarker(layer.into(), marker.id().into()));
        self.markers.remove(&(layer.to_string(), marker.id().to_string()));
    }

    fn add_layer_to_view(&mut self, layer: &Layer) {
        self.calls.push(SurfaceCall::AddLayer(layer.name().into()));
        self.layers.insert(layer.name().into());
    }

    fn remove_layer_from_view(&mut self, layer: &Layer) {
        self.calls.push(SurfaceCall::RemoveLayer(layer.name().into()));
        self.layers.remove(layer.name());
    }

    fn refresh_marker(&mut self, layer: &str, marker: &Marker) {
        self.calls
            .push(SurfaceCall::RefreshMarker(layer.into(), marker.id().into()));
    }
}

#[derive(Debug, Default)]
pub struct MemoryTagStore {
    pub values: HashMap<String, bool>,
    pub writes: usize,
}

impl TagStore for MemoryTagStore {
    fn get_tag_setting(&self, tag: &str) -> Option<bool> {
        self.values.get(&setting_key(tag)).copied()
    }

    fn set_tag_setting(&mut self, tag: &str, shown: bool) {
        self.writes += 1;
        self.values.insert(setting_key(tag), shown);
    }
}

#[derive(Debug, Default)]
pub struct MemoryCompletionStore {
    pub completed: BTreeSet<String>,
    pub clears: usize,
}

impl CompletionStore for MemoryCompletionStore {
    fn record_completion(&mut self, marker_id: &str, completed: bool) {
        if completed {
            self.completed.insert(marker_id.to_string());
        } else {
            self.completed.remove(marker_id);
        }
    }

    fn clear_completion(&mut self) {
        self.clears += 1;
        self.completed.clear();
    }
}
