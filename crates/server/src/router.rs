//! Route table

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::handler::{hello, not_found, HelloHandler};

/// Single `GET /hello` route; other paths 404, other methods 405
pub fn build_router(handler: HelloHandler) -> Router {
    Router::new()
        .route("/hello", get(hello))
        .fallback(not_found)
        .with_state(Arc::new(handler))
}
