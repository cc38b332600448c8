//! Monitoring routes

use super::{parse_body, CurrentUser, PageParams};
use crate::app::AppState;
use crate::config::{PERM_ADD_MONITORING, PERM_CHANGE_MONITORING, PERM_DELETE_MONITORING};
use crate::error::Result;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

/// GET /monitorings
pub async fn list_monitorings(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>> {
    let page = params.page();
    let monitorings = state.monitorings_service.list_monitorings(page).await?;

    Ok(Json(json!({ "page": page, "results": monitorings })))
}

/// POST /monitorings
pub async fn create_monitoring(
    State(state): State<AppState>,
    current: CurrentUser,
    body: Bytes,
) -> Result<Json<Value>> {
    current.require(PERM_ADD_MONITORING)?;
    let data = parse_body(&body)?;

    let monitoring = state
        .monitorings_service
        .create_monitoring(&current.user, &data)
        .await?;

    Ok(Json(json!({ "success": true, "url": monitoring.absolute_url() })))
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    #[serde(default)]
    pub q: String,
}

/// GET /monitorings/autocomplete?q=
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> Result<Json<Value>> {
    let results: Vec<Value> = state
        .monitorings_service
        .autocomplete(&params.q)
        .await?
        .into_iter()
        .map(|m| json!({ "id": m.id, "text": m.name, "slug": m.slug }))
        .collect();

    Ok(Json(json!({ "results": results })))
}

/// GET /monitorings/:slug
pub async fn get_monitoring(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>> {
    let detail = state.monitorings_service.monitoring_detail(&slug).await?;
    Ok(Json(json!(detail)))
}

/// PATCH /monitorings/:slug
pub async fn update_monitoring(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    current: CurrentUser,
    body: Bytes,
) -> Result<Json<Value>> {
    current.require(PERM_CHANGE_MONITORING)?;
    let data = parse_body(&body)?;

    let monitoring = state
        .monitorings_service
        .update_monitoring(&slug, &data)
        .await?;

    Ok(Json(json!({ "success": true, "url": monitoring.absolute_url() })))
}

/// DELETE /monitorings/:slug
pub async fn delete_monitoring(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    current: CurrentUser,
) -> Result<Json<Value>> {
    current.require(PERM_DELETE_MONITORING)?;
    state.monitorings_service.delete_monitoring(&slug).await?;

    Ok(Json(json!({ "success": true, "url": "/monitorings" })))
}

/// POST /monitorings/:slug/assign
pub async fn assign(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    current: CurrentUser,
    body: Bytes,
) -> Result<Json<Value>> {
    current.require(PERM_CHANGE_MONITORING)?;
    let data = parse_body(&body)?;

    let added = state.monitorings_service.assign(&slug, &data).await?;

    Ok(Json(json!({
        "success": true,
        "url": format!("/monitorings/{}", slug),
        "assigned": added,
    })))
}

/// GET /monitorings/:slug/institutions
pub async fn institution_progress(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>> {
    let (monitoring, progress) = state
        .monitorings_service
        .institution_progress(&slug)
        .await?;

    let institutions: Vec<Value> = progress
        .into_iter()
        .map(|p| {
            json!({
                "url": monitoring.institution_url(&p.institution),
                "answer_url": monitoring.answer_url(&p.institution),
                "institution": p.institution,
                "sheet_count": p.sheet_count,
            })
        })
        .collect();

    Ok(Json(json!({
        "monitoring": monitoring,
        "institutions": institutions,
    })))
}

/// GET /monitorings/:slug/institutions/:institution_slug
pub async fn list_sheets(
    State(state): State<AppState>,
    Path((slug, institution_slug)): Path<(String, String)>,
    _current: CurrentUser,
) -> Result<Json<Value>> {
    let (assignment, sheets) = state
        .monitorings_service
        .sheets(&slug, &institution_slug)
        .await?;

    let answer_url = assignment.monitoring.answer_url(&assignment.institution);

    Ok(Json(json!({
        "monitoring": assignment.monitoring,
        "institution": assignment.institution,
        "answer_url": answer_url,
        "sheets": sheets,
    })))
}
