//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::catalog::CatalogError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    /// A catalog query failed; the client still receives the endpoint's
    /// empty payload so it can render a "no results" state.
    #[error("catalog query failed: {source}")]
    Catalog {
        source: CatalogError,
        empty: Value,
    },
}

impl AppError {
    /// Wrap a catalog failure together with the endpoint's empty payload.
    pub fn catalog<P: Serialize>(source: CatalogError, empty: &P) -> Self {
        AppError::Catalog {
            source,
            empty: serde_json::to_value(empty).unwrap_or_else(|_| Value::Object(Default::default())),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
            AppError::Catalog { source, empty } => {
                tracing::error!(error = %source, code = source.code(), "catalog query failed");
                let mut body = empty;
                if let Value::Object(map) = &mut body {
                    map.insert("error".to_string(), Value::from(source.code()));
                }
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
