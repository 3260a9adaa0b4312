//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::CatalogService;
use crate::catalog::schema::catalog_schema;
use crate::catalog::store::seed::SeedData;
use crate::catalog::store::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
use crate::config::{Config, StoreBackend};
use crate::db;
use crate::locale::LocaleSettings;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Product queries.
    catalog: CatalogService,
}

impl AppState {
    /// Create application state with the configured document store.
    pub async fn new(config: &Config) -> Result<Self> {
        let schema = catalog_schema();
        let seed = config
            .seed_path
            .as_deref()
            .map(|path| SeedData::load(path, &schema))
            .transpose()?;

        let store: Arc<dyn DocumentStore> = match config.store_backend {
            StoreBackend::Postgres => {
                let pool = db::create_pool(config)
                    .await
                    .context("failed to create database pool")?;

                db::run_migrations(&pool)
                    .await
                    .context("failed to run migrations")?;

                let store = PgDocumentStore::new(pool, schema);
                if let Some(seed) = &seed {
                    seed.apply(&store)
                        .await
                        .context("failed to apply seed data")?;
                }
                Arc::new(store)
            }
            StoreBackend::Memory => {
                let store = MemoryDocumentStore::with_seed(schema, seed.unwrap_or_default())
                    .context("failed to apply seed data")?;
                Arc::new(store)
            }
        };

        info!(backend = store.backend(), "document store ready");

        Ok(Self::from_store(store, config.locale_settings()))
    }

    /// Create state over an existing store.
    pub fn from_store(store: Arc<dyn DocumentStore>, locales: LocaleSettings) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog: CatalogService::new(store, locales),
            }),
        }
    }

    /// Get the catalog service.
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get the locale settings.
    pub fn locales(&self) -> &LocaleSettings {
        self.inner.catalog.locales()
    }

    /// Check if the document store is reachable.
    pub async fn store_healthy(&self) -> bool {
        self.inner.catalog.store().is_healthy().await
    }
}
