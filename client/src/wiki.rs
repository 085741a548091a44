use std::time::Duration;

use futures::future::{self, Either};
use gloo_timers::future::TimeoutFuture;
use serde::Deserialize;
use zdmap_shared::MapError;

/// What the completion endpoint reports for the current visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteCompletion {
    pub user: Option<String>,
    pub completed: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CompletionPayload {
    Account {
        #[serde(default)]
        user: Option<String>,
        #[serde(default)]
        completed: Vec<String>,
    },
    Ids(Vec<String>),
}

fn parse_completion(body: &str) -> Result<RemoteCompletion, String> {
    let payload: CompletionPayload =
        serde_json::from_str(body).map_err(|e| format!("parse error: {e}"))?;
    Ok(match payload {
        CompletionPayload::Account { user, completed } => RemoteCompletion {
            user: user.filter(|name| !name.trim().is_empty()),
            completed,
        },
        CompletionPayload::Ids(completed) => RemoteCompletion {
            user: None,
            completed,
        },
    })
}

/// GET `url` as text, giving up after `timeout`.
pub async fn fetch_text(url: &str, timeout: Duration) -> Result<String, String> {
    let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
    let request = Box::pin(async {
        let resp = gloo_net::http::Request::get(url)
            .send()
            .await
            .map_err(|e| format!("fetch error: {e}"))?;
        if !resp.ok() {
            return Err(format!("HTTP {}", resp.status()));
        }
        resp.text().await.map_err(|e| format!("read error: {e}"))
    });
    match future::select(request, Box::pin(TimeoutFuture::new(millis))).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => Err(format!("timed out after {millis} ms")),
    }
}

/// Fetch the ids the visitor has completed, plus who they are logged in as.
pub async fn fetch_completion(url: &str, timeout: Duration) -> zdmap_shared::Result<RemoteCompletion> {
    let body = fetch_text(url, timeout)
        .await
        .map_err(|e| MapError::ExternalFetch(format!("{url}: {e}")))?;
    parse_completion(&body).map_err(|e| MapError::ExternalFetch(format!("{url}: {e}")))
}
