//! HTTP routes exposed to clients
//!
//! This module organizes handlers into logical submodules:
//! - `auth`: Current user extraction and permission checks
//! - `monitorings`: Monitoring creation, editing and progress views
//! - `answers`: Answer sheet submission
//! - `institutions`: Institution CRUD

pub mod answers;
pub mod auth;
pub mod institutions;
pub mod monitorings;

use crate::app::AppState;
use crate::error::Result;
use axum::body::Bytes;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;

pub use auth::CurrentUser;

/// Page selection for listings, counting from 1
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Parse a request body as JSON, reporting malformed input as a client error
pub(crate) fn parse_body(body: &Bytes) -> Result<Value> {
    Ok(serde_json::from_slice(body)?)
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/monitorings",
            get(monitorings::list_monitorings).post(monitorings::create_monitoring),
        )
        .route("/monitorings/autocomplete", get(monitorings::autocomplete))
        .route(
            "/monitorings/:slug",
            get(monitorings::get_monitoring)
                .patch(monitorings::update_monitoring)
                .put(monitorings::update_monitoring)
                .delete(monitorings::delete_monitoring),
        )
        .route("/monitorings/:slug/assign", post(monitorings::assign))
        .route(
            "/monitorings/:slug/institutions",
            get(monitorings::institution_progress),
        )
        .route(
            "/monitorings/:slug/institutions/:institution_slug",
            get(monitorings::list_sheets),
        )
        .route(
            "/monitorings/:slug/institutions/:institution_slug/answer",
            post(answers::submit_answers),
        )
        .route(
            "/institutions",
            get(institutions::list_institutions).post(institutions::create_institution),
        )
        .route(
            "/institutions/:slug",
            get(institutions::get_institution)
                .patch(institutions::update_institution)
                .put(institutions::update_institution)
                .delete(institutions::delete_institution),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
