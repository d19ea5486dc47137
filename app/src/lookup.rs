//! FILENAME: app/src/lookup.rs
// PURPOSE: HTTP transport and async runner for field enrichment lookups.
// CONTEXT: The engine hands back EnrichmentRequests from an accepted edit.
// Each one runs as its own tokio task: GET <endpoint>?value=<value>, then the
// response re-enters the store under its lock. The store decides whether the
// result is still current. Failures are dropped without retry.

use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use grid_engine::EnrichmentRequest;

use crate::error::AppError;
use crate::{log_debug, log_warn, AppState};

pub struct HttpLookup {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl HttpLookup {
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = match base_url.map(str::trim).filter(|b| !b.is_empty()) {
            Some(base) => Some(Url::parse(base).map_err(|_| AppError::Endpoint(base.to_string()))?),
            None => None,
        };
        Ok(HttpLookup { client, base_url })
    }

    /// Absolute endpoints are used as-is; relative ones join the base URL.
    pub fn resolve(&self, endpoint: &str) -> Result<Url, AppError> {
        if let Ok(url) = Url::parse(endpoint) {
            return Ok(url);
        }
        self.base_url
            .as_ref()
            .and_then(|base| base.join(endpoint).ok())
            .ok_or_else(|| AppError::Endpoint(endpoint.to_string()))
    }

    pub async fn fetch(&self, endpoint: &str, value: &str) -> Result<Value, AppError> {
        let url = self.resolve(endpoint)?;
        let response = self.client.get(url).query(&[("value", value)]).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Status(response.status().as_u16()));
        }
        Ok(response.json::<Value>().await?)
    }
}

/// Starts one task per request. Each task resolves to whether its result
/// was written into the grid. Outside a tokio runtime nothing runs and the
/// tickets are dropped.
pub fn spawn_lookups(state: &Arc<AppState>, requests: Vec<EnrichmentRequest>) -> Vec<JoinHandle<bool>> {
    if requests.is_empty() {
        return Vec::new();
    }

    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            log_warn!("LOOKUP", "no async runtime; dropping {} lookups", requests.len());
            if let Ok(mut store) = state.store.lock() {
                for request in &requests {
                    store.abandon_enrichment(&request.ticket);
                }
            }
            return Vec::new();
        }
    };

    requests
        .into_iter()
        .map(|request| {
            let state = Arc::clone(state);
            runtime.spawn(async move { run_lookup(&state, request).await })
        })
        .collect()
}

async fn run_lookup(state: &AppState, request: EnrichmentRequest) -> bool {
    log_debug!(
        "LOOKUP",
        "GET {} value={} -> row {} field {}",
        request.endpoint,
        request.query_value,
        request.ticket.row,
        request.ticket.field_id
    );
    let outcome = state.lookup.fetch(&request.endpoint, &request.query_value).await;

    let Ok(mut store) = state.store.lock() else {
        log_warn!("LOOKUP", "store lock poisoned; lookup result dropped");
        return false;
    };
    match outcome {
        Ok(body) => {
            let applied = store.apply_lookup_response(&request.ticket, &body);
            log_debug!("LOOKUP", "{} for row {} field {}", if applied { "applied" } else { "discarded" }, request.ticket.row, request.ticket.field_id);
            applied
        }
        Err(e) => {
            log_debug!("LOOKUP", "{} failed: {}", request.endpoint, e);
            store.abandon_enrichment(&request.ticket);
            false
        }
    }
}
