use axum::http::StatusCode;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{ChatView, ExportReceipt};
use crate::archive::services::{archive_export, build_document};
use crate::nutrition::{
    export::{rows_from_plan, rows_from_summary},
    metrics::{aggregate, Aggregates, SlotFilter},
    wizard::Outcome,
};
use crate::state::AppState;

pub const EXPORT_SAVED: &str = "La exportación se ha guardado correctamente en tu historial.";
const EXPORT_FAILED: &str = "Hubo un problema al guardar la exportación";
const NOTHING_TO_EXPORT: &str = "no hay recetas para exportar";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("a recommendation request is already in progress")]
    Busy,
    #[error("no recommendations available yet")]
    NoResult,
    #[error("nothing to export")]
    NothingToExport,
    #[error("export could not be archived: {0}")]
    Archive(anyhow::Error),
}

impl From<ChatError> for (StatusCode, String) {
    fn from(e: ChatError) -> Self {
        let status = match &e {
            ChatError::Busy => StatusCode::CONFLICT,
            ChatError::NoResult => StatusCode::NOT_FOUND,
            ChatError::NothingToExport => StatusCode::UNPROCESSABLE_ENTITY,
            ChatError::Archive(_) => StatusCode::BAD_GATEWAY,
        };
        (status, e.to_string())
    }
}

pub async fn view(st: &AppState, owner: Uuid) -> ChatView {
    let session = st.sessions.get_or_restore(owner, &st.bridge).await;
    let wizard = session.lock().await;
    ChatView::from(&*wizard)
}

/// Feeds one user message to the wizard. When it completes the record, the
/// recommendation service is called with the session unlocked; the wizard's
/// pending flag turns away further submissions until the call settles.
#[instrument(skip(st, text), fields(len = text.len()))]
pub async fn submit_message(st: &AppState, owner: Uuid, text: String) -> Result<ChatView, ChatError> {
    let session = st.sessions.get_or_restore(owner, &st.bridge).await;

    let (request, ticket) = {
        let mut wizard = session.lock().await;
        match wizard.submit(&text) {
            Outcome::Ignored => return Ok(ChatView::from(&*wizard)),
            Outcome::Busy => return Err(ChatError::Busy),
            Outcome::Finalize(request) => {
                st.bridge.save_snapshot(owner, &wizard.snapshot()).await;
                (request, wizard.pending())
            }
            Outcome::Rejected | Outcome::Advanced(_) | Outcome::Failed => {
                st.bridge.save_snapshot(owner, &wizard.snapshot()).await;
                return Ok(ChatView::from(&*wizard));
            }
        }
    };

    let result = st.recommender.recommend(&request).await;

    let mut wizard = session.lock().await;
    if ticket.is_none() || wizard.pending() != ticket {
        // cleared while the request was in flight
        info!(%owner, "discarding recommendation for a cleared chat");
        return Ok(ChatView::from(&*wizard));
    }
    match result {
        Ok(plan) => {
            let summary = wizard.complete(&request, &plan);
            st.bridge.save_result(owner, &summary, &plan).await;
            info!(%owner, days = plan.days().len(), "recommendations delivered");
        }
        Err(e) => {
            warn!(error = %e, %owner, "recommendation request failed");
            wizard.fail(e.user_message());
        }
    }
    st.bridge.save_snapshot(owner, &wizard.snapshot()).await;
    Ok(ChatView::from(&*wizard))
}

/// Back to the greeting, with every stored key removed.
pub async fn clear_session(st: &AppState, owner: Uuid) -> ChatView {
    let session = st.sessions.get_or_restore(owner, &st.bridge).await;
    let mut wizard = session.lock().await;
    wizard.clear();
    st.bridge.clear(owner).await;
    ChatView::from(&*wizard)
}

/// Logout: clear the chat and forget the live session.
pub async fn end_session(st: &AppState, owner: Uuid) {
    clear_session(st, owner).await;
    st.sessions.evict(owner).await;
}

pub async fn dashboard(st: &AppState, owner: Uuid, filter: SlotFilter) -> Result<Aggregates, ChatError> {
    let saved = st.bridge.load_result(owner).await.ok_or(ChatError::NoResult)?;
    Ok(aggregate(&saved.plan, filter))
}

/// Exports posted plan text, or the stored plan when no text is given, and
/// reports the outcome in the transcript.
#[instrument(skip(st, text))]
pub async fn export_plan(
    st: &AppState,
    owner: Uuid,
    text: Option<String>,
) -> Result<ExportReceipt, ChatError> {
    let rows = match text.filter(|t| !t.trim().is_empty()) {
        Some(text) => rows_from_summary(&text),
        None => {
            let saved = st.bridge.load_result(owner).await.ok_or(ChatError::NoResult)?;
            rows_from_plan(&saved.plan)
        }
    };

    let outcome = if rows.is_empty() {
        Err(ChatError::NothingToExport)
    } else {
        match build_document(&rows) {
            Ok(doc) => archive_export(st, owner, doc).await.map_err(ChatError::Archive),
            Err(e) => Err(ChatError::Archive(e)),
        }
    };

    let session = st.sessions.get_or_restore(owner, &st.bridge).await;
    let mut wizard = session.lock().await;
    let result = match outcome {
        Ok(key) => {
            let message_id = wizard.notify(EXPORT_SAVED);
            Ok(ExportReceipt {
                key,
                rows: rows.len(),
                message_id,
            })
        }
        Err(e) => {
            warn!(error = %e, %owner, "export failed");
            let reason = match e {
                ChatError::NothingToExport => NOTHING_TO_EXPORT,
                _ => EXPORT_FAILED,
            };
            wizard.notify(&format!("Error: {}. Por favor, intenta nuevamente.", reason));
            Err(e)
        }
    };
    st.bridge.save_snapshot(owner, &wizard.snapshot()).await;
    result
}
