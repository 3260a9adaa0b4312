//! In-memory document store.
//!
//! Holds documents per collection in insertion order and evaluates
//! predicates directly against the localized, populated JSON.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use super::document::{localize, populate_relation, project, relation_ids, resolve_path, scalar_text};
use super::seed::SeedData;
use super::{DocumentStore, FindQuery, FindResult, MAX_DEPTH, SortDirection, StoreError};
use crate::catalog::predicate::Predicate;
use crate::catalog::reference::DocId;
use crate::catalog::schema::{CollectionSchema, Schema};
use crate::locale::Locale;

/// Document store backed by process memory.
pub struct MemoryDocumentStore {
    schema: Schema,
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryDocumentStore {
    /// Create an empty store serving the collections of `schema`.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store pre-filled with seed data.
    pub fn with_seed(schema: Schema, seed: SeedData) -> Result<Self, StoreError> {
        let store = Self::new(schema);
        for (collection, docs) in seed.into_collections() {
            for doc in docs {
                store.insert(&collection, doc)?;
            }
        }
        Ok(store)
    }

    /// Append a document; it must be a JSON object with an integer `id`.
    pub fn insert(&self, collection: &str, doc: Value) -> Result<(), StoreError> {
        if self.schema.collection(collection).is_none() {
            return Err(StoreError::UnknownCollection(collection.to_string()));
        }
        if doc.get("id").and_then(Value::as_i64).is_none() {
            return Err(StoreError::Malformed(format!(
                "document in {collection} has no integer id"
            )));
        }

        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        Ok(())
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.collections.read().values().all(Vec::is_empty)
    }

    fn schema_for(&self, collection: &str) -> Result<&CollectionSchema, StoreError> {
        self.schema
            .collection(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))
    }

    fn snapshot(&self, collection: &str) -> Vec<Value> {
        self.collections
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace relation ids in `docs` with localized related documents.
    fn populate(
        &self,
        docs: &mut [Value],
        schema: &CollectionSchema,
        locale: Locale,
        fallback: Locale,
    ) -> Result<(), StoreError> {
        for relation in schema.relations {
            let ids = relation_ids(docs, relation);
            if ids.is_empty() {
                continue;
            }
            let target_schema = self.schema_for(relation.collection)?;
            let related: HashMap<DocId, Value> = self
                .snapshot(relation.collection)
                .into_iter()
                .filter_map(|mut doc| {
                    let id = doc.get("id").and_then(Value::as_i64)?;
                    if !ids.contains(&id) {
                        return None;
                    }
                    localize(&mut doc, target_schema, locale, fallback);
                    Some((id, doc))
                })
                .collect();
            populate_relation(docs, relation, &related);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(&self, query: &FindQuery) -> Result<FindResult, StoreError> {
        let schema = self.schema_for(&query.collection)?;

        let mut localized = self.snapshot(&query.collection);
        for doc in &mut localized {
            localize(doc, schema, query.locale, query.fallback_locale);
        }

        // Predicates may address related documents, so evaluate against a
        // populated copy regardless of the requested depth.
        let mut populated = localized.clone();
        self.populate(&mut populated, schema, query.locale, query.fallback_locale)?;

        let output = if query.depth.min(MAX_DEPTH) > 0 {
            populated.clone()
        } else {
            localized
        };

        let mut matched: Vec<Value> = output
            .into_iter()
            .zip(populated.iter())
            .filter(|(_, evaluated)| {
                query
                    .predicate
                    .as_ref()
                    .is_none_or(|predicate| evaluate(predicate, evaluated))
            })
            .map(|(doc, _)| doc)
            .collect();

        if let Some(sort) = &query.sort {
            let key = |doc: &Value| {
                doc.get(&sort.field)
                    .and_then(scalar_text)
                    .map(|s| s.to_lowercase())
            };
            // Missing values sort last ascending, as NULLs do in PostgreSQL.
            matched.sort_by_cached_key(|doc| {
                let key = key(doc);
                (key.is_none(), key)
            });
            if sort.direction == SortDirection::Desc {
                matched.reverse();
            }
        }

        let total = matched.len() as u64;
        let mut docs: Vec<Value> = matched
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .collect();

        if let Some(fields) = &query.select {
            for doc in &mut docs {
                project(doc, fields);
            }
        }

        debug!(
            collection = %query.collection,
            total = total,
            returned = docs.len(),
            "memory store query completed"
        );

        Ok(FindResult::new(docs, total, query.page, query.limit))
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocumentStore").finish()
    }
}

/// Evaluate a predicate against a localized, populated document.
fn evaluate(predicate: &Predicate, doc: &Value) -> bool {
    match predicate {
        Predicate::And(children) => children.iter().all(|p| evaluate(p, doc)),
        Predicate::Or(children) => children.iter().any(|p| evaluate(p, doc)),
        Predicate::In { field, values } => {
            field_texts(doc, field).any(|text| values.contains(&text))
        }
        Predicate::Equals { field, value } => field_texts(doc, field).any(|text| &text == value),
        Predicate::Contains { field, value } => {
            let needle = value.to_lowercase();
            field_texts(doc, field).any(|text| text.to_lowercase().contains(&needle))
        }
    }
}

fn field_texts(doc: &Value, field: &str) -> impl Iterator<Item = String> {
    let segments: Vec<&str> = field.split('.').collect();
    let mut values = Vec::new();
    resolve_path(doc, &segments, &mut values);
    values
        .into_iter()
        .filter_map(scalar_text)
        .collect::<Vec<_>>()
        .into_iter()
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::predicate::{PUBLISHED, STATUS_FIELD, text_predicate, Visibility};
    use crate::catalog::schema::{BRANDS, CATEGORIES, MEDIA, PRODUCTS, catalog_schema};
    use crate::catalog::store::SortKey;
    use serde_json::json;

    fn store() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new(catalog_schema());
        store
            .insert(BRANDS, json!({"id": 1, "name": "SKF", "slug": "skf"}))
            .unwrap();
        store
            .insert(BRANDS, json!({"id": 2, "name": "FAG", "slug": "fag"}))
            .unwrap();
        store
            .insert(
                CATEGORIES,
                json!({"id": 5, "name": {"vi": "Vòng bi cầu", "en": "Ball bearings"}, "slug": "ball"}),
            )
            .unwrap();
        store
            .insert(MEDIA, json!({"id": 9, "url": "/media/6205.png", "alt": {"vi": "Ảnh", "en": "Photo"}}))
            .unwrap();
        store
            .insert(
                PRODUCTS,
                json!({
                    "id": 100,
                    "name": {"vi": "SKF 6205-2RS", "en": "SKF 6205-2RS"},
                    "slug": "skf-6205-2rs",
                    "sku": "6205-2RS",
                    "brand": 1,
                    "categories": [5],
                    "images": [{"image": 9}],
                    "_status": "published",
                }),
            )
            .unwrap();
        store
            .insert(
                PRODUCTS,
                json!({
                    "id": 101,
                    "name": {"vi": "Bạc đạn FAG 22210", "en": "FAG 22210 roller"},
                    "slug": "fag-22210",
                    "sku": "22210-E1",
                    "brand": 2,
                    "categories": [],
                    "images": [],
                    "_status": "draft",
                }),
            )
            .unwrap();
        store
    }

    #[tokio::test]
    async fn find_all_in_insertion_order() {
        let store = store();
        let result = store
            .find(&FindQuery::new(PRODUCTS, Locale::Vi))
            .await
            .unwrap();
        assert_eq!(result.total_docs, 2);
        assert_eq!(result.docs[0]["id"], 100);
        assert_eq!(result.docs[1]["id"], 101);
    }

    #[tokio::test]
    async fn relation_predicate_matches_populated_slug() {
        let store = store();
        let predicate = Predicate::is_in("brand.slug", &["fag".to_string()].into());
        let result = store
            .find(&FindQuery::new(PRODUCTS, Locale::Vi).with_predicate(predicate))
            .await
            .unwrap();
        assert_eq!(result.total_docs, 1);
        assert_eq!(result.docs[0]["slug"], "fag-22210");
    }

    #[tokio::test]
    async fn has_many_relation_predicate() {
        let store = store();
        let predicate = Predicate::is_in("categories.slug", &["ball".to_string()].into());
        let result = store
            .find(&FindQuery::new(PRODUCTS, Locale::Vi).with_predicate(predicate))
            .await
            .unwrap();
        assert_eq!(result.total_docs, 1);
        assert_eq!(result.docs[0]["id"], 100);
    }

    #[tokio::test]
    async fn contains_is_case_insensitive_and_localized() {
        let store = store();
        let query = FindQuery::new(PRODUCTS, Locale::En)
            .with_predicate(Some(text_predicate("ROLLER", Visibility::Any)));
        let result = store.find(&query).await.unwrap();
        assert_eq!(result.total_docs, 1);
        assert_eq!(result.docs[0]["name"], "FAG 22210 roller");

        // The Vietnamese name does not contain "roller".
        let query = FindQuery::new(PRODUCTS, Locale::Vi)
            .with_predicate(Some(text_predicate("roller", Visibility::Any)));
        assert_eq!(store.find(&query).await.unwrap().total_docs, 0);
    }

    #[tokio::test]
    async fn published_only_hides_drafts() {
        let store = store();
        let query = FindQuery::new(PRODUCTS, Locale::Vi)
            .with_predicate(Some(Predicate::equals(STATUS_FIELD, PUBLISHED)));
        let result = store.find(&query).await.unwrap();
        assert_eq!(result.total_docs, 1);
        assert_eq!(result.docs[0]["id"], 100);
    }

    #[tokio::test]
    async fn depth_zero_leaves_ids() {
        let store = store();
        let result = store
            .find(&FindQuery::new(PRODUCTS, Locale::Vi).with_depth(0))
            .await
            .unwrap();
        assert_eq!(result.docs[0]["brand"], 1);

        let result = store
            .find(&FindQuery::new(PRODUCTS, Locale::En).with_depth(1))
            .await
            .unwrap();
        assert_eq!(result.docs[0]["brand"]["name"], "SKF");
        assert_eq!(result.docs[0]["images"][0]["image"]["alt"], "Photo");
    }

    #[tokio::test]
    async fn sort_and_paginate() {
        let store = store();
        let query = FindQuery::new(PRODUCTS, Locale::Vi)
            .with_sort(SortKey::asc("name"))
            .with_pagination(1, 1);
        let result = store.find(&query).await.unwrap();
        // "Bạc đạn ..." sorts before "SKF ..." case-insensitively.
        assert_eq!(result.docs.len(), 1);
        assert_eq!(result.docs[0]["id"], 101);
        assert!(result.has_next_page);
        assert_eq!(result.next_page, Some(2));

        let result = store.find(&query.clone().with_pagination(2, 1)).await.unwrap();
        assert_eq!(result.docs[0]["id"], 100);
        assert!(!result.has_next_page);
    }

    #[tokio::test]
    async fn missing_sort_key_sorts_last() {
        let store = store();
        store
            .insert(
                PRODUCTS,
                json!({"id": 102, "name": {"km": "ប៊ូឡុង"}, "slug": "km-only", "_status": "published"}),
            )
            .unwrap();

        let query = FindQuery::new(PRODUCTS, Locale::Vi).with_sort(SortKey::asc("name"));
        let result = store.find(&query).await.unwrap();
        let ids: Vec<_> = result.docs.iter().map(|d| d["id"].clone()).collect();
        assert_eq!(ids, vec![json!(101), json!(100), json!(102)]);

        let query = FindQuery::new(PRODUCTS, Locale::Vi).with_sort(SortKey {
            direction: SortDirection::Desc,
            ..SortKey::asc("name")
        });
        let result = store.find(&query).await.unwrap();
        assert_eq!(result.docs[0]["id"], 102);
    }

    #[tokio::test]
    async fn select_projects_fields() {
        let store = store();
        let query = FindQuery::new(PRODUCTS, Locale::Vi).with_select(&["name", "sku"]);
        let result = store.find(&query).await.unwrap();
        let doc = result.docs[0].as_object().unwrap();
        assert_eq!(doc.len(), 3);
        assert!(doc.contains_key("id"));
        assert!(!doc.contains_key("slug"));
    }

    #[tokio::test]
    async fn unknown_collection_is_an_error() {
        let store = store();
        let err = store
            .find(&FindQuery::new("orders", Locale::Vi))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownCollection(_)));
    }

    #[test]
    fn insert_requires_integer_id() {
        let store = MemoryDocumentStore::new(catalog_schema());
        let err = store.insert(PRODUCTS, json!({"name": "x"})).unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
        assert!(store.is_empty());
    }
}
