use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{error, instrument};
use uuid::Uuid;

use super::repo::{ArchivedExport, SortOrder};
use super::services::presign_download;
use crate::{auth::extractors::AuthUser, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/exports", get(list_exports))
        .route("/exports/:id/download", get(download_export))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[instrument(skip(state))]
pub async fn list_exports(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<ArchivedExport>>, (StatusCode, String)> {
    let limit = q.limit.clamp(1, 200);
    let offset = q.offset.max(0);
    let items = ArchivedExport::list_by_user(&state.db, user_id, q.order, limit, offset)
        .await
        .map_err(internal)?;
    Ok(Json(items))
}

/// 302 to a short-lived download link.
#[instrument(skip(state))]
pub async fn download_export(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Redirect, (StatusCode, String)> {
    let Some(export) = ArchivedExport::get_for_user(&state.db, user_id, id)
        .await
        .map_err(internal)?
    else {
        return Err((StatusCode::NOT_FOUND, "Export not found".into()));
    };

    let url = presign_download(&state, &export.s3_key).await.map_err(|e| {
        error!(error = %e, %id, "presign failed");
        internal(e)
    })?;
    Ok(Redirect::temporary(&url))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
