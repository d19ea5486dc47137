//! FILENAME: app/src/demo_endpoint.rs
// PURPOSE: Demo lookup endpoint for trying out field enrichment locally.
// CONTEXT: GET /api/value?value=X answers {"value": "Fetched(X)"}.

use axum::extract::Query;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::log_info;

pub const VALUE_ROUTE: &str = "/api/value";

#[derive(Debug, Deserialize)]
pub struct ValueQuery {
    #[serde(default)]
    pub value: String,
}

async fn fetch_value(Query(query): Query<ValueQuery>) -> Json<Value> {
    Json(json!({ "value": format!("Fetched({})", query.value) }))
}

pub fn router() -> Router {
    Router::new().route(VALUE_ROUTE, get(fetch_value))
}

/// Binds `addr` and serves the demo router in the background.
/// Returns the bound address (useful with port 0).
pub async fn serve(addr: &str) -> Result<(SocketAddr, JoinHandle<()>), AppError> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    log_info!("DEMO", "lookup endpoint listening on http://{}{}", local, VALUE_ROUTE);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router()).await {
            crate::log_error!("DEMO", "lookup endpoint stopped: {}", e);
        }
    });
    Ok((local, handle))
}
