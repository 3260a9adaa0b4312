//! Product search route handlers.
//!
//! Both endpoints share one search path ([`SearchShape`]) and differ only in
//! paging and record shape. A store failure yields the endpoint's empty
//! payload plus an `error` code with status 500.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Serialize;

use crate::catalog::{
    CatalogError, FilterParams, ProductSummary, ProductView, SearchPage, SearchShape,
};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Create the search router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/search", get(quick_search))
        .route("/api/search-page", get(search_page))
}

/// Quick search response: at most six compact records.
#[derive(Debug, Serialize)]
pub struct QuickSearchResponse {
    pub results: Vec<ProductSummary>,
}

/// Run the shared search path for `shape`.
async fn run_search<V>(
    state: &AppState,
    params: &FilterParams,
    shape: SearchShape,
) -> Result<SearchPage<V>, CatalogError>
where
    V: for<'a> From<&'a crate::catalog::view::ProductDocument>,
{
    let request = shape.request(params, state.locales());
    state.catalog().search(&request).await
}

/// Type-ahead search: `GET /api/search?q=&locale=`.
async fn quick_search(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> AppResult<Json<QuickSearchResponse>> {
    let page = run_search::<ProductSummary>(&state, &params, SearchShape::Quick)
        .await
        .map_err(|e| AppError::catalog(e, &QuickSearchResponse { results: Vec::new() }))?;

    Ok(Json(QuickSearchResponse {
        results: page.results,
    }))
}

/// Full search results: `GET /api/search-page?q=&locale=&page=&limit=`.
async fn search_page(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> AppResult<Json<SearchPage<ProductView>>> {
    let page = run_search::<ProductView>(&state, &params, SearchShape::Paged)
        .await
        .map_err(|e| AppError::catalog(e, &SearchPage::<ProductView>::empty()))?;

    Ok(Json(page))
}
