use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Shared by every forwarded request. Holds nothing mutable.
#[derive(Clone)]
pub struct ProxyState {
    pub upstream: Option<String>,
    pub http: reqwest::Client,
}

impl ProxyState {
    pub fn new(upstream: Option<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            upstream: upstream.filter(|u| !u.trim().is_empty()),
            http: crate::backend::api::build_http_client()?,
        })
    }
}

#[derive(Debug)]
pub enum ForwardError {
    NotConfigured,
    Upstream(StatusCode),
    Transport,
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ForwardError::NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "API URL not configured. Set MANGA_API_URL in environment variables.".to_string(),
            ),
            ForwardError::Upstream(status) => {
                (status, format!("API responded with {}", status.as_u16()))
            }
            ForwardError::Transport => {
                (StatusCode::BAD_GATEWAY, "Failed to connect to API".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
