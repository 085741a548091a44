use std::time::Duration;

use gloo_storage::{LocalStorage, Storage};

pub const DEFAULT_DESCRIPTOR_URL: &str = "map.json";
pub const DEFAULT_FETCH_TIMEOUT_MS: u32 = 10_000;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Name of the JS object the render surface calls into.
pub const HOST_OBJECT: &str = "zdmapHost";

const DESCRIPTOR_URL_KEY: &str = "zdmap_descriptor_url";
const FETCH_TIMEOUT_KEY: &str = "zdmap_fetch_timeout_ms";
const LOG_FILTER_KEY: &str = "zdmap_log";

fn override_value(key: &str) -> Option<String> {
    LocalStorage::get::<String>(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn descriptor_url() -> String {
    override_value(DESCRIPTOR_URL_KEY).unwrap_or_else(|| DEFAULT_DESCRIPTOR_URL.to_string())
}

pub fn fetch_timeout() -> Duration {
    let millis = override_value(FETCH_TIMEOUT_KEY)
        .and_then(|value| positive_u32(&value))
        .unwrap_or(DEFAULT_FETCH_TIMEOUT_MS);
    Duration::from_millis(u64::from(millis))
}

/// `tracing_subscriber::EnvFilter` directives, e.g. `zdmap_shared=debug`.
pub fn log_filter() -> String {
    override_value(LOG_FILTER_KEY).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

fn positive_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|value| *value > 0)
}
