//! Request handlers

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use tracing::debug;

/// Answers `GET /hello` with a fixed greeting
#[derive(Debug, Clone)]
pub struct HelloHandler {
    greeting: Arc<str>,
}

impl HelloHandler {
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            greeting: Arc::from(greeting.into()),
        }
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }
}

pub(crate) async fn hello(State(handler): State<Arc<HelloHandler>>) -> String {
    observability::record_http_request("/hello", StatusCode::OK.as_u16());
    debug!(path = "/hello", "greeting served");
    handler.greeting().to_owned()
}

pub(crate) async fn not_found(uri: Uri) -> StatusCode {
    observability::record_http_request(uri.path(), StatusCode::NOT_FOUND.as_u16());
    debug!(path = %uri.path(), "no route");
    StatusCode::NOT_FOUND
}
