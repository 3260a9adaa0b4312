//! Document-query collaborator.
//!
//! The catalog never talks to a database directly. Every read goes through
//! [`DocumentStore::find`], which takes a collection, an optional
//! [`Predicate`], pagination, sort, locale, projection and population depth,
//! and returns one page of JSON documents plus paging metadata.
//!
//! Two backends are provided:
//! - [`PgDocumentStore`]: JSONB documents in PostgreSQL, SQL generated with
//!   SeaQuery
//! - [`MemoryDocumentStore`]: documents held in memory, used for fixtures,
//!   local development and tests

mod document;
mod memory;
mod postgres;
pub mod seed;
mod sql;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use document::{localize, project, resolve_path};
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use sql::DocumentQueryBuilder;

use super::predicate::Predicate;
use crate::locale::Locale;

/// Deepest relation population a store performs.
pub const MAX_DEPTH: u8 = 1;

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Top-level field to sort by (localized fields sort by their projected value).
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Asc,
        }
    }
}

/// One `find` call.
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    /// Collection to query.
    pub collection: String,
    /// Filter; `None` matches every document.
    pub predicate: Option<Predicate>,
    /// Page number (1-indexed).
    pub page: u32,
    /// Documents per page.
    pub limit: u32,
    /// Sort order; `None` keeps the store's insertion order.
    pub sort: Option<SortKey>,
    /// Locale localized fields are projected to.
    pub locale: Locale,
    /// Locale used when a field has no value for `locale`.
    pub fallback_locale: Locale,
    /// Top-level fields to return (`id` is always returned); `None` returns all.
    pub select: Option<Vec<String>>,
    /// Relation population depth (0 leaves ids, capped at [`MAX_DEPTH`]).
    pub depth: u8,
}

impl FindQuery {
    /// Query a collection with default paging (first page of 10, depth 1).
    pub fn new(collection: &str, locale: Locale) -> Self {
        Self {
            collection: collection.to_string(),
            predicate: None,
            page: 1,
            limit: 10,
            sort: None,
            locale,
            fallback_locale: locale,
            select: None,
            depth: MAX_DEPTH,
        }
    }

    pub fn with_predicate(mut self, predicate: Option<Predicate>) -> Self {
        self.predicate = predicate;
        self
    }

    /// Set pagination; both values are raised to at least 1.
    pub fn with_pagination(mut self, page: u32, limit: u32) -> Self {
        self.page = page.max(1);
        self.limit = limit.max(1);
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_fallback_locale(mut self, fallback: Locale) -> Self {
        self.fallback_locale = fallback;
        self
    }

    pub fn with_select(mut self, fields: &[&str]) -> Self {
        self.select = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    /// Number of documents to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of documents plus paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindResult {
    pub docs: Vec<serde_json::Value>,
    /// Matching documents across all pages.
    pub total_docs: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
}

impl FindResult {
    /// Create a result with paging calculations.
    pub fn new(docs: Vec<serde_json::Value>, total_docs: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit > 0 {
            u32::try_from(total_docs.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
        } else {
            1
        };
        let has_next_page = page < total_pages;
        let has_prev_page = page > 1;

        Self {
            docs,
            total_docs,
            page,
            limit,
            total_pages,
            has_next_page,
            has_prev_page,
            next_page: has_next_page.then(|| page + 1),
            prev_page: has_prev_page.then(|| page - 1),
        }
    }

    /// Create an empty result.
    pub fn empty(page: u32, limit: u32) -> Self {
        Self::new(Vec::new(), 0, page, limit)
    }
}

/// Document store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("unsupported predicate: {0}")]
    UnsupportedPredicate(String),

    #[error("malformed document data: {0}")]
    Malformed(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

/// Read access to a document collection set.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run one query and return one page of matching documents.
    async fn find(&self, query: &FindQuery) -> Result<FindResult, StoreError>;

    /// Whether the backing storage is reachable.
    async fn is_healthy(&self) -> bool;

    /// Backend name for logs and health output (e.g., "postgres", "memory").
    fn backend(&self) -> &'static str;
}
