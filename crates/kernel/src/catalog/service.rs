//! Catalog query executor.
//!
//! Every catalog read is one [`DocumentStore::find`] call built from a
//! [`FilterRequest`]: predicate, paging, sort, locale, projection and depth.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::filter::{FilterParams, FilterRequest};
use super::predicate::{Visibility, filter_predicate, text_predicate, with_visibility};
use super::schema::PRODUCTS;
use super::store::{DocumentStore, FindQuery, FindResult, SortKey, StoreError};
use super::view::{ProductDocument, map_documents};
use crate::locale::LocaleSettings;

/// Fields a product view needs from the store.
const PRODUCT_VIEW_FIELDS: &[&str] = &["name", "slug", "sku", "brand", "images"];

/// Population depth needed to read brand names and image URLs.
const VIEW_DEPTH: u8 = 1;

/// Catalog failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("document store error: {0}")]
    Store(#[from] StoreError),
}

impl CatalogError {
    /// Stable code reported to clients alongside the empty payload.
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Store(StoreError::Database(_)) => "store_unavailable",
            CatalogError::Store(_) => "query_failed",
        }
    }
}

/// The two free-text search endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchShape {
    /// Type-ahead dropdown: first page, capped, compact records.
    Quick,
    /// Full search results page with caller-chosen paging.
    Paged,
}

impl SearchShape {
    /// Normalize raw parameters for this shape.
    pub fn request(self, params: &FilterParams, locales: &LocaleSettings) -> FilterRequest {
        match self {
            SearchShape::Quick => FilterRequest::for_quick_search(params, locales),
            SearchShape::Paged => FilterRequest::for_paged_search(params, locales),
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage<V> {
    pub results: Vec<V>,
    pub total_docs: u64,
    pub has_next_page: bool,
    pub next_page: Option<u32>,
}

impl<V> SearchPage<V> {
    /// Zeroed page, returned for short queries and failures.
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            total_docs: 0,
            has_next_page: false,
            next_page: None,
        }
    }
}

/// One page of the product listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage<V> {
    pub results: Vec<V>,
    pub total_docs: u64,
    pub page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub next_page: Option<u32>,
}

impl<V> ProductPage<V> {
    pub fn empty(page: u32) -> Self {
        Self {
            results: Vec::new(),
            total_docs: 0,
            page,
            total_pages: 0,
            has_next_page: false,
            next_page: None,
        }
    }

    fn from_result(result: FindResult) -> Self
    where
        V: for<'a> From<&'a ProductDocument>,
    {
        Self {
            total_docs: result.total_docs,
            page: result.page,
            total_pages: result.total_pages,
            has_next_page: result.has_next_page,
            next_page: result.next_page,
            results: map_documents(result.docs),
        }
    }
}

/// Product queries over a document store.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn DocumentStore>,
    locales: LocaleSettings,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DocumentStore>, locales: LocaleSettings) -> Self {
        Self { store, locales }
    }

    pub fn locales(&self) -> &LocaleSettings {
        &self.locales
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Base product query in the request's locale.
    fn product_query(&self, request: &FilterRequest) -> FindQuery {
        FindQuery::new(PRODUCTS, request.locale)
            .with_fallback_locale(self.locales.default_locale())
            .with_pagination(request.page, request.page_size)
            .with_select(PRODUCT_VIEW_FIELDS)
            .with_depth(VIEW_DEPTH)
    }

    /// Published products matching the brand and category groups, by name.
    pub async fn list_products<V>(
        &self,
        request: &FilterRequest,
    ) -> Result<ProductPage<V>, CatalogError>
    where
        V: for<'a> From<&'a ProductDocument>,
    {
        let predicate = with_visibility(filter_predicate(request), Visibility::PublishedOnly);
        let query = self
            .product_query(request)
            .with_predicate(predicate)
            .with_sort(SortKey::asc("name"));

        let result = self.store.find(&query).await?;
        debug!(
            brands = request.brand_slugs.len(),
            categories = request.category_slugs.len(),
            page = request.page,
            total = result.total_docs,
            "product listing"
        );
        Ok(ProductPage::from_result(result))
    }

    /// Published products whose name or SKU contains the search text.
    ///
    /// Text shorter than the minimum returns an empty page without querying
    /// the store. Results keep the store's default order.
    pub async fn search<V>(&self, request: &FilterRequest) -> Result<SearchPage<V>, CatalogError>
    where
        V: for<'a> From<&'a ProductDocument>,
    {
        let Some(text) = request.effective_search_text() else {
            return Ok(SearchPage::empty());
        };

        let query = self
            .product_query(request)
            .with_predicate(Some(text_predicate(&text, Visibility::PublishedOnly)));

        let result = self.store.find(&query).await?;
        debug!(
            query = %text,
            page = request.page,
            limit = request.page_size,
            total = result.total_docs,
            "product search"
        );

        Ok(SearchPage {
            total_docs: result.total_docs,
            has_next_page: result.has_next_page,
            next_page: result.next_page,
            results: map_documents(result.docs),
        })
    }
}
