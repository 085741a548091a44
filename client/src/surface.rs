//! Bridge from the core's render calls into the page's tile renderer.
//!
//! The page exposes `window.zdmapHost` with `addLayer`, `removeLayer`,
//! `addMarker` and `removeMarker`; payloads are plain objects.

use std::collections::HashSet;

use js_sys::Reflect;
use serde::Serialize;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use zdmap_shared::{Layer, Marker, RenderSurface};

use crate::config::HOST_OBJECT;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = zdmapHost, js_name = addLayer)]
    fn host_add_layer(layer: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = zdmapHost, js_name = removeLayer)]
    fn host_remove_layer(name: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = zdmapHost, js_name = addMarker)]
    fn host_add_marker(layer: &str, marker: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = zdmapHost, js_name = removeMarker)]
    fn host_remove_marker(layer: &str, id: &str) -> Result<(), JsValue>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LayerPayload<'a> {
    name: &'a str,
    min_zoom: f64,
    max_zoom: Option<f64>,
    icon_url: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkerPayload<'a> {
    id: &'a str,
    name: &'a str,
    category: &'a str,
    lat: f64,
    lng: f64,
    tags: Vec<&'a str>,
    completed: bool,
}

impl<'a> From<&'a Marker> for MarkerPayload<'a> {
    fn from(marker: &'a Marker) -> Self {
        let position = marker.position();
        Self {
            id: marker.id(),
            name: marker.name(),
            category: marker.category(),
            lat: position.lat,
            lng: position.lng,
            tags: marker.effective_tags().collect(),
            completed: marker.is_completed(),
        }
    }
}

pub fn host_available() -> bool {
    Reflect::get(&js_sys::global(), &JsValue::from_str(HOST_OBJECT))
        .map(|host| host.is_object())
        .unwrap_or(false)
}

fn report(action: &str, target: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        tracing::warn!(action, target, error = ?e, "renderer call failed");
    }
}

fn send_marker(layer: &str, marker: &Marker) {
    let result = serde_wasm_bindgen::to_value(&MarkerPayload::from(marker))
        .map_err(JsValue::from)
        .and_then(|payload| host_add_marker(layer, payload));
    report("addMarker", marker.id(), result);
}

/// Keeps its own record of what is on view so repeated calls are no-ops.
#[derive(Default)]
pub struct JsSurface {
    layers: HashSet<String>,
    markers: HashSet<(String, String)>,
}

impl RenderSurface for JsSurface {
    fn add_marker_to_view(&mut self, layer: &str, marker: &Marker) {
        if !self.markers.insert((layer.to_string(), marker.id().to_string())) {
            return;
        }
        send_marker(layer, marker);
    }

    fn remove_marker_from_view(&mut self, layer: &str, marker: &Marker) {
        if !self.markers.remove(&(layer.to_string(), marker.id().to_string())) {
            return;
        }
        report("removeMarker", marker.id(), host_remove_marker(layer, marker.id()));
    }

    fn add_layer_to_view(&mut self, layer: &Layer) {
        if !self.layers.insert(layer.name().to_string()) {
            return;
        }
        let payload = LayerPayload {
            name: layer.name(),
            min_zoom: layer.min_zoom(),
            max_zoom: Some(layer.max_zoom()).filter(|z| z.is_finite()),
            icon_url: layer.icon().map(|icon| icon.url.as_str()),
        };
        let result = serde_wasm_bindgen::to_value(&payload)
            .map_err(JsValue::from)
            .and_then(host_add_layer);
        report("addLayer", layer.name(), result);
    }

    fn remove_layer_from_view(&mut self, layer: &Layer) {
        if !self.layers.remove(layer.name()) {
            return;
        }
        report("removeLayer", layer.name(), host_remove_layer(layer.name()));
    }

    /// The host has no update call, so a redraw is a remove followed by an add.
    fn refresh_marker(&mut self, layer: &str, marker: &Marker) {
        if !self.markers.contains(&(layer.to_string(), marker.id().to_string())) {
            return;
        }
        report("removeMarker", marker.id(), host_remove_marker(layer, marker.id()));
        send_marker(layer, marker);
    }
}
