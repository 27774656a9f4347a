use super::types::{ForwardError, ProxyState};
use crate::backend::api::Endpoint;
use axum::{
    Json, Router,
    extract::{RawQuery, State},
    http::{StatusCode, Uri},
    routing::get,
};
use serde_json::Value;

pub fn create_router(state: ProxyState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/proxy/{*path}", get(forward))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Upstream address for a local `/proxy/...` request. Path and query pass
/// through untouched.
fn upstream_url(base: &str, uri_path: &str, query: Option<&str>) -> Option<String> {
    let path = uri_path.strip_prefix("/proxy/").unwrap_or(uri_path);
    let url = Endpoint::Direct(base.to_string()).url(path).ok()?;
    Some(match query {
        Some(q) if !q.is_empty() => format!("{}?{}", url, q),
        _ => url,
    })
}

async fn forward(
    State(state): State<ProxyState>,
    uri: Uri,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, ForwardError> {
    let base = state.upstream.as_deref().ok_or(ForwardError::NotConfigured)?;
    let url = upstream_url(base, uri.path(), query.as_deref()).ok_or(ForwardError::NotConfigured)?;
    log::debug!("Forwarding {} -> {}", uri, url);

    let response = state.http.get(&url).send().await.map_err(|e| {
        log::error!("Proxy error for {}: {}", url, e);
        ForwardError::Transport
    })?;

    let status = response.status();
    if !status.is_success() {
        let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        return Err(ForwardError::Upstream(status));
    }

    let body = response.json::<Value>().await.map_err(|e| {
        log::error!("Proxy error for {}: {}", url, e);
        ForwardError::Transport
    })?;

    Ok(Json(body))
}
