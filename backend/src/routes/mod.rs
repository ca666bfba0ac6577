//! Route definitions for the Climate Forecast Service

use axum::{routing::post, Router};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/collect", post(handlers::collect))
}
