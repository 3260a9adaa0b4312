#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Tests drive the REAL kernel router over an in-memory document store
//! seeded with the bearing catalog from `catalog-test-utils`.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use catalog_kernel::AppState;
use catalog_kernel::catalog::schema::catalog_schema;
use catalog_kernel::catalog::store::seed::SeedData;
use catalog_kernel::catalog::store::{
    DocumentStore, FindQuery, FindResult, MemoryDocumentStore, StoreError,
};
use catalog_kernel::locale::LocaleSettings;
use catalog_kernel::routes;

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Application over the seeded bearing catalog.
    pub fn new() -> Self {
        let schema = catalog_schema();
        let seed = SeedData::from_value(catalog_test_utils::bearing_seed(), &schema)
            .expect("Failed to parse seed data");
        let store = MemoryDocumentStore::with_seed(schema, seed).expect("Failed to seed store");
        Self::with_store(Arc::new(store))
    }

    /// Application over an arbitrary store.
    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        let state = AppState::from_store(store, LocaleSettings::default());
        let router = routes::app_router(state.clone());
        Self { router, state }
    }

    /// Application whose store fails every query.
    pub fn failing() -> Self {
        Self::with_store(Arc::new(FailingStore))
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// GET `uri` and decode the JSON body.
    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .request(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        let status = response.status();
        (status, response_json(response).await)
    }
}

/// Decode a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let body = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&body).expect("Response body is not JSON")
}

/// Document store that is always unavailable.
pub struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn find(&self, _query: &FindQuery) -> Result<FindResult, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn is_healthy(&self) -> bool {
        false
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}
