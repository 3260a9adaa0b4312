//! Filter request parsing.
//!
//! Turns the raw query-string parameters of the catalog endpoints into a
//! [`FilterRequest`]. Parsing never fails: unknown slugs, out-of-range
//! pagination and malformed numbers are normalized into something the query
//! path can run.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::locale::{Locale, LocaleSettings};

/// Free-text queries shorter than this (after trimming) match nothing.
pub const MIN_QUERY_CHARS: usize = 2;

/// Free-text queries are cut to this many characters before matching.
pub const MAX_QUERY_CHARS: usize = 100;

/// Fixed page size of the product listing.
pub const LISTING_PAGE_SIZE: u32 = 12;

/// Result cap of the quick (type-ahead) search.
pub const QUICK_SEARCH_LIMIT: u32 = 6;

/// Upper bound for caller-chosen page sizes.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Page size of the paginated search when the caller does not pick one.
pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 12;

/// Raw catalog query-string parameters, exactly as received.
///
/// Numbers are kept as strings so that `page=abc` degrades to the default
/// instead of rejecting the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    /// Comma-joined brand slugs.
    pub brand: Option<String>,
    /// Comma-joined category slugs.
    pub category: Option<String>,
    /// Free-text query.
    pub q: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<String>,
    /// Requested page size.
    pub limit: Option<String>,
    /// Requested display locale.
    pub locale: Option<String>,
}

/// A normalized catalog query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    /// Brand slugs; membership within the group is OR.
    pub brand_slugs: BTreeSet<String>,
    /// Category slugs; membership within the group is OR.
    pub category_slugs: BTreeSet<String>,
    /// Trimmed free text (possibly empty).
    pub search_text: String,
    /// Page number, at least 1.
    pub page: u32,
    /// Page size, at least 1.
    pub page_size: u32,
    /// Resolved display locale.
    pub locale: Locale,
}

impl FilterRequest {
    /// Build the request for the product listing (fixed page size).
    pub fn for_listing(params: &FilterParams, locales: &LocaleSettings) -> Self {
        Self {
            brand_slugs: parse_tokens(params.brand.as_deref()),
            category_slugs: parse_tokens(params.category.as_deref()),
            search_text: trimmed(params.q.as_deref()),
            page: parse_page(params.page.as_deref()),
            page_size: LISTING_PAGE_SIZE,
            locale: locales.resolve(params.locale.as_deref()),
        }
    }

    /// Build the request for the paginated search (caller-chosen page size,
    /// clamped into `[1, MAX_PAGE_SIZE]`).
    pub fn for_paged_search(params: &FilterParams, locales: &LocaleSettings) -> Self {
        Self {
            brand_slugs: BTreeSet::new(),
            category_slugs: BTreeSet::new(),
            search_text: trimmed(params.q.as_deref()),
            page: parse_page(params.page.as_deref()),
            page_size: parse_page_size(params.limit.as_deref()),
            locale: locales.resolve(params.locale.as_deref()),
        }
    }

    /// Build the request for the quick search (first page, capped results).
    pub fn for_quick_search(params: &FilterParams, locales: &LocaleSettings) -> Self {
        Self {
            brand_slugs: BTreeSet::new(),
            category_slugs: BTreeSet::new(),
            search_text: trimmed(params.q.as_deref()),
            page: 1,
            page_size: QUICK_SEARCH_LIMIT,
            locale: locales.resolve(params.locale.as_deref()),
        }
    }

    /// The free text to match, if it is long enough to be honoured.
    pub fn effective_search_text(&self) -> Option<String> {
        normalize_search_text(&self.search_text)
    }

    /// Whether neither slug group constrains the result.
    pub fn is_unfiltered(&self) -> bool {
        self.brand_slugs.is_empty() && self.category_slugs.is_empty()
    }
}

/// Split a comma-joined parameter into a set of non-empty tokens.
///
/// Absent and empty input both yield an empty set. Tokens are trimmed and
/// deduplicated; their order is irrelevant.
pub fn parse_tokens(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Normalize free text for matching.
///
/// Trims, cuts to [`MAX_QUERY_CHARS`] characters and returns `None` when
/// fewer than [`MIN_QUERY_CHARS`] characters remain.
pub fn normalize_search_text(raw: &str) -> Option<String> {
    let text: String = raw.trim().chars().take(MAX_QUERY_CHARS).collect();
    let text = text.trim_end();
    if text.chars().count() < MIN_QUERY_CHARS {
        return None;
    }
    Some(text.to_string())
}

fn trimmed(raw: Option<&str>) -> String {
    raw.map(str::trim).unwrap_or_default().to_string()
}

/// Parse a page number; missing, malformed and non-positive values become 1.
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|page| page.clamp(1, i64::from(u32::MAX)) as u32)
        .unwrap_or(1)
}

/// Parse a page size into `[1, MAX_PAGE_SIZE]`.
pub fn parse_page_size(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|size| size.clamp(1, i64::from(MAX_PAGE_SIZE)) as u32)
        .unwrap_or(DEFAULT_SEARCH_PAGE_SIZE)
}
