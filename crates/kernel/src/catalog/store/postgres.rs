//! PostgreSQL document store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use super::document::{localize, populate_relation, project, relation_ids};
use super::sql::{DOCUMENT_TABLE, DocumentQueryBuilder};
use super::{DocumentStore, FindQuery, FindResult, MAX_DEPTH, StoreError};
use crate::catalog::reference::DocId;
use crate::catalog::schema::{CollectionSchema, Schema};
use crate::locale::Locale;

/// A stored document row.
#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: i64,
    data: Value,
}

impl DocumentRow {
    /// The document body with its id set.
    fn into_document(self) -> Value {
        let mut data = self.data;
        if let Value::Object(map) = &mut data {
            map.insert("id".to_string(), Value::from(self.id));
        }
        data
    }
}

/// Document store over the `document` table.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    schema: Schema,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, schema: Schema) -> Self {
        Self { pool, schema }
    }

    /// Insert or replace a document. Replacing keeps its original position
    /// in insertion order.
    pub async fn upsert(&self, collection: &str, doc: &Value) -> Result<(), StoreError> {
        if self.schema.collection(collection).is_none() {
            return Err(StoreError::UnknownCollection(collection.to_string()));
        }
        let id = doc.get("id").and_then(Value::as_i64).ok_or_else(|| {
            StoreError::Malformed(format!("document in {collection} has no integer id"))
        })?;

        sqlx::query(&format!(
            "INSERT INTO {DOCUMENT_TABLE} (collection, id, data) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data"
        ))
        .bind(collection)
        .bind(id)
        .bind(doc)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load documents of `collection` by id, localized.
    async fn fetch_related(
        &self,
        collection: &CollectionSchema,
        ids: &[DocId],
        locale: Locale,
        fallback: Locale,
    ) -> Result<HashMap<DocId, Value>, StoreError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
            "SELECT id, data FROM {DOCUMENT_TABLE} WHERE collection = $1 AND id = ANY($2)"
        ))
        .bind(collection.name)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                let mut doc = row.into_document();
                localize(&mut doc, collection, locale, fallback);
                (id, doc)
            })
            .collect())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find(&self, query: &FindQuery) -> Result<FindResult, StoreError> {
        let collection = self
            .schema
            .collection(&query.collection)
            .ok_or_else(|| StoreError::UnknownCollection(query.collection.clone()))?;

        let builder = DocumentQueryBuilder::new(query, &self.schema);
        let count_sql = builder.build_count()?;
        let main_sql = builder.build()?;

        // Count and page come from one snapshot.
        let mut tx = self.pool.begin().await?;
        let total: i64 = sqlx::query_scalar(&count_sql).fetch_one(&mut *tx).await?;
        let rows: Vec<DocumentRow> = sqlx::query_as(&main_sql).fetch_all(&mut *tx).await?;
        tx.commit().await?;

        let mut docs: Vec<Value> = rows
            .into_iter()
            .map(|row| {
                let mut doc = row.into_document();
                localize(&mut doc, collection, query.locale, query.fallback_locale);
                doc
            })
            .collect();

        if query.depth.min(MAX_DEPTH) > 0 {
            for relation in collection.relations {
                let ids = relation_ids(&mut docs, relation);
                if ids.is_empty() {
                    continue;
                }
                let target = self
                    .schema
                    .collection(relation.collection)
                    .ok_or_else(|| StoreError::UnknownCollection(relation.collection.to_string()))?;
                let related = self
                    .fetch_related(target, &ids, query.locale, query.fallback_locale)
                    .await?;
                populate_relation(&mut docs, relation, &related);
            }
        }

        if let Some(fields) = &query.select {
            for doc in &mut docs {
                project(doc, fields);
            }
        }

        debug!(
            collection = %query.collection,
            total = total,
            returned = docs.len(),
            "postgres store query completed"
        );

        Ok(FindResult::new(
            docs,
            u64::try_from(total).unwrap_or(0),
            query.page,
            query.limit,
        ))
    }

    async fn is_healthy(&self) -> bool {
        crate::db::check_health(&self.pool).await
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
