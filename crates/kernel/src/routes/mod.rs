//! HTTP route handlers.

pub mod health;
pub mod products;
pub mod search;

use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

/// All routes, with state applied. Middleware layers are added by the binary.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(search::router())
        .fallback(|| async { AppError::NotFound })
        .with_state(state)
}
