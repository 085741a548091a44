use web_sys::UrlSearchParams;
use zdmap_shared::DeepLink;

const LINK_KEYS: [&str; 8] = ["z", "x", "lat", "y", "lng", "l", "m", "id"];

/// Deep link from the page's query string; empty when there is none.
pub fn deep_link() -> DeepLink {
    let Some(search) = web_sys::window().and_then(|w| w.location().search().ok()) else {
        return DeepLink::default();
    };
    let Ok(params) = UrlSearchParams::new_with_str(&search) else {
        return DeepLink::default();
    };
    DeepLink::from_pairs(
        LINK_KEYS
            .iter()
            .filter_map(|key| params.get(key).map(|value| (*key, value))),
    )
}
