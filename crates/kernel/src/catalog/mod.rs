//! Product catalog: filter parsing, predicate assembly, store queries and
//! view mapping.

pub mod filter;
pub mod load_more;
pub mod predicate;
pub mod reference;
pub mod schema;
pub mod service;
pub mod store;
pub mod type_ahead;
pub mod view;

pub use filter::{FilterParams, FilterRequest};
pub use service::{CatalogError, CatalogService, ProductPage, SearchPage, SearchShape};
pub use store::{DocumentStore, FindQuery, FindResult, StoreError};
pub use view::{ProductSummary, ProductView};
