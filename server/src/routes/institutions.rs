//! Institution routes

use super::{parse_body, CurrentUser, PageParams};
use crate::app::AppState;
use crate::config::{PERM_CHANGE_INSTITUTION, PERM_DELETE_INSTITUTION};
use crate::error::Result;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct InstitutionListParams {
    pub page: Option<u32>,
    pub name: Option<String>,
}

/// GET /institutions?name=&page=
pub async fn list_institutions(
    State(state): State<AppState>,
    Query(params): Query<InstitutionListParams>,
) -> Result<Json<Value>> {
    let page = PageParams { page: params.page }.page();
    let institutions = state
        .institutions_service
        .list_institutions(params.name.as_deref(), page)
        .await?;

    Ok(Json(json!({ "page": page, "results": institutions })))
}

/// POST /institutions
pub async fn create_institution(
    State(state): State<AppState>,
    _current: CurrentUser,
    body: Bytes,
) -> Result<Json<Value>> {
    let data = parse_body(&body)?;
    let institution = state.institutions_service.create_institution(&data).await?;

    Ok(Json(json!({ "success": true, "url": institution.absolute_url() })))
}

/// GET /institutions/:slug
pub async fn get_institution(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>> {
    let institution = state.institutions_service.get_institution(&slug).await?;
    Ok(Json(json!(institution)))
}

/// PATCH /institutions/:slug
pub async fn update_institution(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    current: CurrentUser,
    body: Bytes,
) -> Result<Json<Value>> {
    current.require(PERM_CHANGE_INSTITUTION)?;
    let data = parse_body(&body)?;

    let institution = state
        .institutions_service
        .update_institution(&slug, &data)
        .await?;

    Ok(Json(json!({ "success": true, "url": institution.absolute_url() })))
}

/// DELETE /institutions/:slug
pub async fn delete_institution(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    current: CurrentUser,
) -> Result<Json<Value>> {
    current.require(PERM_DELETE_INSTITUTION)?;
    state.institutions_service.delete_institution(&slug).await?;

    Ok(Json(json!({ "success": true, "url": "/institutions" })))
}
