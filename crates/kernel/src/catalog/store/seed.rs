//! Seed documents loaded from a JSON file.
//!
//! The file is an object keyed by collection name, each holding an array
//! of documents in insertion order:
//!
//! ```json
//! { "brands": [{ "id": 1, "name": "SKF", "slug": "skf" }], "products": [] }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use super::{PgDocumentStore, StoreError};
use crate::catalog::schema::Schema;

/// Documents per collection, in the order they should be stored.
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    collections: Vec<(String, Vec<Value>)>,
}

impl SeedData {
    /// Parse seed data. Collections are kept in schema order; a collection
    /// the schema does not know is an error.
    pub fn from_value(value: Value, schema: &Schema) -> Result<Self, StoreError> {
        let Value::Object(mut map) = value else {
            return Err(StoreError::Malformed(
                "seed data must be an object keyed by collection".to_string(),
            ));
        };

        if let Some(unknown) = map.keys().find(|name| schema.collection(name).is_none()) {
            return Err(StoreError::UnknownCollection(unknown.clone()));
        }

        let mut collections = Vec::new();
        for name in schema.names() {
            match map.remove(name) {
                Some(Value::Array(docs)) => collections.push((name.to_string(), docs)),
                Some(_) => {
                    return Err(StoreError::Malformed(format!(
                        "seed collection {name} must be an array"
                    )));
                }
                None => {}
            }
        }

        Ok(Self { collections })
    }

    /// Read and parse a seed file.
    pub fn load(path: &Path, schema: &Schema) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse seed file {}", path.display()))?;
        let seed = Self::from_value(value, schema)
            .with_context(|| format!("invalid seed file {}", path.display()))?;
        info!(path = %path.display(), documents = seed.len(), "seed data loaded");
        Ok(seed)
    }

    /// Total number of documents.
    pub fn len(&self) -> usize {
        self.collections.iter().map(|(_, docs)| docs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_collections(self) -> Vec<(String, Vec<Value>)> {
        self.collections
    }

    /// Upsert every document into a PostgreSQL store.
    pub async fn apply(&self, store: &PgDocumentStore) -> Result<(), StoreError> {
        for (collection, docs) in &self.collections {
            for doc in docs {
                store.upsert(collection, doc).await?;
            }
        }
        Ok(())
    }
}
