//! Boot sequence and the entry points the page's UI controls call.
//!
//! The page owns every widget; it forwards user events here and this module
//! turns them into map transitions. All state lives in one thread-local slot.

use std::cell::RefCell;

use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use zdmap_shared::{
    CategorySelection, LegendAction, LegendChange, Map, MapDescriptor, MapError, PlanePoint,
    RenderSurface, TagStore,
};

use crate::config;
use crate::query;
use crate::storage::{LocalCompletionStore, LocalTagStore};
use crate::surface::{self, JsSurface};
use crate::wiki::{self, RemoteCompletion};

type ClientMap = Map<JsSurface, LocalTagStore>;

struct AppState {
    map: ClientMap,
    completions: LocalCompletionStore,
    user: Option<String>,
}

thread_local! {
    static APP: RefCell<Option<AppState>> = const { RefCell::new(None) };
}

pub fn boot() {
    spawn_local(async {
        if let Err(e) = start().await {
            tracing::error!(error = %e, "map failed to load");
        }
    });
}

async fn start() -> zdmap_shared::Result<()> {
    let url = config::descriptor_url();
    let timeout = config::fetch_timeout();
    let body = wiki::fetch_text(&url, timeout)
        .await
        .map_err(|e| MapError::ExternalFetch(format!("{url}: {e}")))?;
    let descriptor = MapDescriptor::from_json(&body)
        .map_err(|e| MapError::config("map descriptor", e.to_string()))?;

    if !surface::host_available() {
        tracing::warn!(host = config::HOST_OBJECT, "no renderer host on the page");
    }

    let deep_link = query::deep_link();
    let tags = LocalTagStore::load(&descriptor.directory);
    let mut map = Map::load(&descriptor, &deep_link, JsSurface::default(), tags)?;
    let completions = LocalCompletionStore::load(&descriptor.directory);
    let restored = map.apply_completed(completions.ids())?;
    tracing::debug!(restored, "local completion applied");

    APP.with(|slot| {
        // A second boot replaces the first map outright.
        *slot.borrow_mut() = Some(AppState {
            map,
            completions,
            user: None,
        });
    });

    // The map is interactive from here on; remote completion lands whenever it resolves.
    if let Some(url) = descriptor.completion_url {
        let fetched = wiki::fetch_completion(&url, timeout).await;
        match try_with_app(|app| apply_remote(&mut app.map, &mut app.user, fetched)) {
            Ok(RemoteOutcome::Applied(applied)) => {
                tracing::debug!(applied, "remote completion applied");
            }
            Ok(RemoteOutcome::Unavailable) => web_sys::console::warn_1(
                &"Completion data is unavailable right now; all markers are shown as not completed."
                    .into(),
            ),
            Err(e) => tracing::warn!(error = %e, "remote completion not applied"),
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteOutcome {
    Applied(usize),
    Unavailable,
}

/// Fold a completion fetch into the map. A failed fetch is logged and leaves
/// the map as it was, with nothing completed from the remote side.
fn apply_remote<S, T>(
    map: &mut Map<S, T>,
    user: &mut Option<String>,
    fetched: zdmap_shared::Result<RemoteCompletion>,
) -> zdmap_shared::Result<RemoteOutcome>
where
    S: RenderSurface,
    T: TagStore,
{
    match fetched {
        Ok(remote) => {
            *user = remote.user;
            let applied = map.apply_completed(&remote.completed)?;
            Ok(RemoteOutcome::Applied(applied))
        }
        Err(e) => {
            tracing::warn!(error = %e, "completion fetch failed");
            Ok(RemoteOutcome::Unavailable)
        }
    }
}

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// Run `f` against the loaded map. Fails while booting, or if the renderer
/// calls back into us while a transition is still running.
fn try_with_app<R>(f: impl FnOnce(&mut AppState) -> zdmap_shared::Result<R>) -> Result<R, String> {
    APP.with(|slot| {
        let mut slot = slot.try_borrow_mut().map_err(|_| "map is busy".to_string())?;
        let app = slot.as_mut().ok_or_else(|| "map not loaded".to_string())?;
        f(app).map_err(|e| e.to_string())
    })
}

fn with_app<R>(f: impl FnOnce(&mut AppState) -> zdmap_shared::Result<R>) -> Result<R, JsError> {
    try_with_app(f).map_err(js_error)
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

#[derive(Serialize)]
struct LegendChangePayload {
    category: String,
    shown: bool,
}

fn legend_changes(changes: Vec<LegendChange>) -> Result<JsValue, JsError> {
    let payload: Vec<_> = changes
        .into_iter()
        .map(|change| LegendChangePayload {
            category: change.category,
            shown: change.action == LegendAction::Show,
        })
        .collect();
    to_js(&payload)
}

#[wasm_bindgen(js_name = onZoom)]
pub fn on_zoom(zoom: f64) -> Result<(), JsError> {
    with_app(|app| app.map.set_zoom(zoom).map(drop))
}

#[wasm_bindgen(js_name = onMove)]
pub fn on_move(lat: f64, lng: f64) -> Result<(), JsError> {
    with_app(|app| app.map.pan_to(PlanePoint::new(lat, lng)))
}

#[wasm_bindgen(js_name = selectAllCategories)]
pub fn select_all_categories() -> Result<JsValue, JsError> {
    legend_changes(with_app(|app| app.map.select_all())?)
}

#[wasm_bindgen(js_name = selectNoCategories)]
pub fn select_no_categories() -> Result<JsValue, JsError> {
    legend_changes(with_app(|app| app.map.select_none())?)
}

#[wasm_bindgen(js_name = toggleCategory)]
pub fn toggle_category(name: &str) -> Result<JsValue, JsError> {
    legend_changes(with_app(|app| app.map.toggle_category(name))?)
}

#[wasm_bindgen(js_name = toggleGroup)]
pub fn toggle_group(group: &str) -> Result<JsValue, JsError> {
    legend_changes(with_app(|app| app.map.toggle_group(group))?)
}

#[wasm_bindgen(js_name = setTagShown)]
pub fn set_tag_shown(tag: &str, shown: bool) -> Result<bool, JsError> {
    with_app(|app| app.map.set_tag_shown(tag, shown))
}

#[wasm_bindgen(js_name = selectLayer)]
pub fn select_layer(name: &str) -> Result<(), JsError> {
    with_app(|app| app.map.select_layer(name))
}

#[wasm_bindgen(js_name = focusMarker)]
pub fn focus_marker(id: &str) -> Result<(), JsError> {
    with_app(|app| app.map.navigate_to_marker(id))
}

#[wasm_bindgen(js_name = clearFocus)]
pub fn clear_focus() -> Result<(), JsError> {
    with_app(|app| app.map.clear_forced_visibility().map(drop))
}

#[wasm_bindgen(js_name = setCompleted)]
pub fn set_completed(id: &str, completed: bool) -> Result<bool, JsError> {
    with_app(|app| {
        app.map
            .set_completed(id, completed, &mut app.completions)
    })
}

#[wasm_bindgen(js_name = clearCompletion)]
pub fn clear_completion() -> Result<u32, JsError> {
    let cleared = with_app(|app| app.map.clear_completion(&mut app.completions))?;
    Ok(u32::try_from(cleared).unwrap_or(u32::MAX))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    layer: String,
    id: String,
    name: String,
    lat: f64,
    lng: f64,
}

/// Matching markers for the search box, hidden ones included.
#[wasm_bindgen]
pub fn search(input: &str) -> Result<JsValue, JsError> {
    let results = with_app(|app| {
        Ok(app
            .map
            .search(input)
            .into_iter()
            .map(|hit| SearchResult {
                layer: hit.layer.name().to_string(),
                id: hit.marker.id().to_string(),
                name: hit.marker.name().to_string(),
                lat: hit.marker.position().lat,
                lng: hit.marker.position().lng,
            })
            .collect::<Vec<_>>())
    })?;
    to_js(&results)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewState {
    zoom: f64,
    lat: f64,
    lng: f64,
    layer: Option<String>,
}

/// Current view for the page to write back into its URL.
#[wasm_bindgen(js_name = viewState)]
pub fn view_state() -> Result<JsValue, JsError> {
    let view = with_app(|app| Ok(app.map.view()))?;
    let center = view.floored_center();
    to_js(&ViewState {
        zoom: view.zoom,
        lat: center.lat,
        lng: center.lng,
        layer: view.layer,
    })
}

#[derive(Serialize)]
struct TagState {
    tag: String,
    shown: bool,
}

#[wasm_bindgen(js_name = tagSettings)]
pub fn tag_settings() -> Result<JsValue, JsError> {
    let tags = with_app(|app| {
        Ok(app
            .map
            .tag_settings()
            .iter()
            .map(|(tag, shown)| TagState {
                tag: tag.to_string(),
                shown,
            })
            .collect::<Vec<_>>())
    })?;
    to_js(&tags)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LegendEntry {
    name: String,
    group: Option<String>,
    icon_url: String,
    selected: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LegendState {
    mode: &'static str,
    categories: Vec<LegendEntry>,
}

/// Legend rows plus which of the All/None/custom modes is highlighted.
#[wasm_bindgen(js_name = legendState)]
pub fn legend_state() -> Result<JsValue, JsError> {
    let state = with_app(|app| {
        let legend = app.map.legend();
        let mode = match legend.selection() {
            CategorySelection::AllSelected => "all",
            CategorySelection::NoneSelected => "none",
            CategorySelection::Custom(_) => "custom",
        };
        let categories = legend
            .categories()
            .iter()
            .map(|category| LegendEntry {
                name: category.name().to_string(),
                group: category.group().map(str::to_string),
                icon_url: category.icon().url.clone(),
                selected: legend.selection().is_individually_selected(category.name()),
            })
            .collect();
        Ok(LegendState { mode, categories })
    })?;
    to_js(&state)
}

/// Name the completion endpoint reported, if the visitor is logged in.
#[wasm_bindgen(js_name = loggedInUser)]
pub fn logged_in_user() -> Result<Option<String>, JsError> {
    with_app(|app| Ok(app.user.clone()))
}
