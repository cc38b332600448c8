//! Answer submission route

use super::{parse_body, CurrentUser};
use crate::app::AppState;
use crate::error::Result;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

/// POST /monitorings/:slug/institutions/:institution_slug/answer
///
/// Any authenticated user may answer, once per monitoring.
pub async fn submit_answers(
    State(state): State<AppState>,
    Path((slug, institution_slug)): Path<(String, String)>,
    current: CurrentUser,
    body: Bytes,
) -> Result<Json<Value>> {
    let data = parse_body(&body)?;

    let assignment = state
        .answers_service
        .submit(&current.user, &slug, &institution_slug, &data)
        .await?;

    Ok(Json(json!({
        "success": true,
        "return_url": assignment.monitoring.institution_url(&assignment.institution),
    })))
}
