mod handlers;
pub mod repo;
pub mod services;
pub mod storage;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}
