use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::extractors::AuthUser;
use crate::{chat::service::end_session, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/session", get(session))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub active: bool,
    pub user_id: Uuid,
}

/// Reaching this handler means the bearer token is valid.
#[instrument]
pub async fn session(AuthUser(user_id): AuthUser) -> Json<SessionStatus> {
    Json(SessionStatus {
        active: true,
        user_id,
    })
}

/// Called by the client when its token is dropped; the chat starts over.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> StatusCode {
    end_session(&state, user_id).await;
    info!(%user_id, "chat session ended");
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::service::{submit_message, view};

    #[tokio::test]
    async fn session_reports_the_token_owner() {
        let user_id = Uuid::new_v4();
        let Json(status) = session(AuthUser(user_id)).await;
        assert!(status.active);
        assert_eq!(status.user_id, user_id);
    }

    #[tokio::test]
    async fn logout_clears_the_chat() {
        let st = AppState::fake();
        let user_id = Uuid::new_v4();
        submit_message(&st, user_id, "70".into()).await.unwrap();

        assert_eq!(logout(State(st.clone()), AuthUser(user_id)).await, StatusCode::NO_CONTENT);
        assert_eq!(view(&st, user_id).await.messages.len(), 1);
    }
}
