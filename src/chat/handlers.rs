use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{ChatView, DashboardQuery, ExportReceipt, ExportRequest, SubmitRequest};
use super::service;
use crate::{auth::extractors::AuthUser, nutrition::metrics::Aggregates, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat", get(get_chat).delete(clear_chat))
        .route("/chat/messages", post(post_message))
        .route("/chat/dashboard", get(get_dashboard))
        .route("/chat/export", post(post_export))
}

#[instrument(skip(state))]
pub async fn get_chat(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Json<ChatView> {
    Json(service::view(&state, user_id).await)
}

#[instrument(skip(state, body))]
pub async fn post_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SubmitRequest>,
) -> Result<Json<ChatView>, (StatusCode, String)> {
    let view = service::submit_message(&state, user_id, body.text).await?;
    Ok(Json(view))
}

#[instrument(skip(state))]
pub async fn clear_chat(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Json<ChatView> {
    Json(service::clear_session(&state, user_id).await)
}

#[instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<Aggregates>, (StatusCode, String)> {
    let aggregates = service::dashboard(&state, user_id, q.meal).await?;
    Ok(Json(aggregates))
}

/// The body is optional; an empty request exports the last stored plan.
#[instrument(skip(state, body))]
pub async fn post_export(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Option<Json<ExportRequest>>,
) -> Result<(StatusCode, Json<ExportReceipt>), (StatusCode, String)> {
    let text = body.and_then(|Json(b)| b.text);
    let receipt = service::export_plan(&state, user_id, text).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
