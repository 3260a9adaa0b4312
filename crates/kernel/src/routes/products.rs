//! Product listing route handler.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::catalog::{FilterParams, FilterRequest, ProductPage, ProductView};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Create the product listing router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/products", get(list_products))
}

/// Filtered listing: `GET /api/products?brand=&category=&page=&locale=`.
///
/// Brand and category parameters are comma-joined slugs; twelve products
/// per page, sorted by name.
async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> AppResult<Json<ProductPage<ProductView>>> {
    let request = FilterRequest::for_listing(&params, state.locales());
    let page = state
        .catalog()
        .list_products(&request)
        .await
        .map_err(|e| AppError::catalog(e, &ProductPage::<ProductView>::empty(request.page)))?;

    Ok(Json(page))
}
