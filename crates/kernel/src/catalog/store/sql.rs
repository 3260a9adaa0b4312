//! SQL generation for the PostgreSQL document store using SeaQuery.
//!
//! Documents live in a single `document` table keyed by `(collection, id)`
//! with the body in a JSONB `data` column. Predicates compile to:
//! - text extraction from `data` (`->>` / `#>>`), with localized fields
//!   resolved through `COALESCE` over the requested and fallback locale
//! - `EXISTS` subqueries for paths that step through a relation
//! - parameterized `ILIKE` for substring matches

use sea_query::{
    Alias, Asterisk, Cond, Expr, ExprTrait, Order, PostgresQueryBuilder, Query, SelectStatement,
    SimpleExpr,
};

use super::{FindQuery, SortDirection, StoreError};
use crate::catalog::predicate::Predicate;
use crate::catalog::schema::{CollectionSchema, Relation, Schema};

/// Table holding every document.
pub const DOCUMENT_TABLE: &str = "document";

/// Alias of the queried collection in generated SQL.
const ROOT_ALIAS: &str = "d";

/// Builds SELECT and COUNT statements for one [`FindQuery`].
pub struct DocumentQueryBuilder<'a> {
    query: &'a FindQuery,
    schema: &'a Schema,
}

impl<'a> DocumentQueryBuilder<'a> {
    pub fn new(query: &'a FindQuery, schema: &'a Schema) -> Self {
        Self { query, schema }
    }

    /// Build the page query: `SELECT d.id, d.data ... ORDER BY ... LIMIT ... OFFSET ...`.
    pub fn build(&self) -> Result<String, StoreError> {
        let collection = self.collection()?;
        let mut query = self.filtered(collection)?;

        query
            .column((Alias::new(ROOT_ALIAS), Alias::new("id")))
            .column((Alias::new(ROOT_ALIAS), Alias::new("data")));

        if let Some(sort) = &self.query.sort {
            let order = match sort.direction {
                SortDirection::Asc => Order::Asc,
                SortDirection::Desc => Order::Desc,
            };
            let field = self.field_sql(collection, ROOT_ALIAS, &sort.field)?;
            query.order_by_expr(Expr::cust(format!("LOWER({field})")), order);
        } else {
            query.order_by((Alias::new(ROOT_ALIAS), Alias::new("created")), Order::Asc);
        }
        query.order_by((Alias::new(ROOT_ALIAS), Alias::new("id")), Order::Asc);

        query.limit(u64::from(self.query.limit));
        query.offset(self.query.offset());

        Ok(query.to_string(PostgresQueryBuilder))
    }

    /// Build a COUNT query over the same filter.
    pub fn build_count(&self) -> Result<String, StoreError> {
        let collection = self.collection()?;
        let mut query = self.filtered(collection)?;
        query.expr(Expr::col(Asterisk).count());
        Ok(query.to_string(PostgresQueryBuilder))
    }

    fn collection(&self) -> Result<&'a CollectionSchema, StoreError> {
        self.schema
            .collection(&self.query.collection)
            .ok_or_else(|| StoreError::UnknownCollection(self.query.collection.clone()))
    }

    /// `FROM document AS d WHERE d.collection = ... AND <predicate>`.
    fn filtered(&self, collection: &CollectionSchema) -> Result<SelectStatement, StoreError> {
        let mut cond = Cond::all().add(
            Expr::col((Alias::new(ROOT_ALIAS), Alias::new("collection"))).eq(collection.name),
        );

        if let Some(predicate) = &self.query.predicate {
            let mut aliases = 0;
            cond = cond.add(self.condition(predicate, collection, ROOT_ALIAS, &mut aliases)?);
        }

        let mut query = Query::select();
        query
            .from_as(Alias::new(DOCUMENT_TABLE), Alias::new(ROOT_ALIAS))
            .cond_where(cond);
        Ok(query)
    }

    fn condition(
        &self,
        predicate: &Predicate,
        collection: &CollectionSchema,
        alias: &str,
        aliases: &mut usize,
    ) -> Result<Cond, StoreError> {
        match predicate {
            Predicate::And(children) => children.iter().try_fold(Cond::all(), |cond, child| {
                Ok(cond.add(self.condition(child, collection, alias, aliases)?))
            }),
            Predicate::Or(children) => children.iter().try_fold(Cond::any(), |cond, child| {
                Ok(cond.add(self.condition(child, collection, alias, aliases)?))
            }),
            Predicate::In { field, .. }
            | Predicate::Contains { field, .. }
            | Predicate::Equals { field, .. } => {
                let segments: Vec<&str> = field.split('.').collect();
                for segment in &segments {
                    validate_segment(segment)?;
                }

                if let Some((relation, rest)) = collection.relation_prefix(&segments) {
                    return self.relation_condition(predicate, alias, relation, rest, aliases);
                }

                let field_sql = self.field_sql(collection, alias, field)?;
                Ok(Cond::all().add(leaf_expr(predicate, field_sql)))
            }
        }
    }

    /// `EXISTS` over the related collection, matching the remaining path there.
    fn relation_condition(
        &self,
        predicate: &Predicate,
        outer: &str,
        relation: &Relation,
        rest: &[&str],
        aliases: &mut usize,
    ) -> Result<Cond, StoreError> {
        let target = self
            .schema
            .collection(relation.collection)
            .ok_or_else(|| StoreError::UnknownCollection(relation.collection.to_string()))?;

        *aliases += 1;
        let alias = format!("r{aliases}");

        let inner = self.condition(&retarget(predicate, &rest.join(".")), target, &alias, aliases)?;

        let json_path = relation
            .segments()
            .iter()
            .map(|s| format!("{s}[*]"))
            .collect::<Vec<_>>()
            .join(".");
        let referenced = format!(
            "{alias}.id IN (SELECT (ref #>> '{{}}')::bigint \
             FROM jsonb_path_query({outer}.data, '$.{json_path}') AS ref \
             WHERE jsonb_typeof(ref) = 'number')"
        );

        let mut subquery = Query::select();
        subquery
            .expr(Expr::cust("1"))
            .from_as(Alias::new(DOCUMENT_TABLE), Alias::new(alias.as_str()))
            .cond_where(
                Cond::all()
                    .add(
                        Expr::col((Alias::new(alias.as_str()), Alias::new("collection")))
                            .eq(target.name),
                    )
                    .add(Expr::cust(referenced))
                    .add(inner),
            );

        Ok(Cond::all().add(Expr::exists(subquery)))
    }

    /// Text expression for a field of the document aliased `alias`.
    fn field_sql(
        &self,
        collection: &CollectionSchema,
        alias: &str,
        field: &str,
    ) -> Result<String, StoreError> {
        let segments: Vec<&str> = field.split('.').collect();
        for segment in &segments {
            validate_segment(segment)?;
        }

        let sql = match segments.as_slice() {
            [name] if collection.is_localized(name) => {
                let locale = self.query.locale.code();
                let fallback = self.query.fallback_locale.code();
                format!(
                    "COALESCE({alias}.data->'{name}'->>'{locale}', \
                     {alias}.data->'{name}'->>'{fallback}', \
                     CASE WHEN jsonb_typeof({alias}.data->'{name}') = 'string' \
                     THEN {alias}.data->>'{name}' END)"
                )
            }
            [name] => format!("({alias}.data->>'{name}')"),
            _ => format!("({alias}.data #>> '{{{}}}')", segments.join(",")),
        };
        Ok(sql)
    }
}

/// Comparison for a leaf predicate applied to `field_sql`.
fn leaf_expr(predicate: &Predicate, field_sql: String) -> SimpleExpr {
    match predicate {
        Predicate::In { values, .. } => Expr::cust(field_sql).is_in(values.iter().cloned()),
        Predicate::Equals { value, .. } => Expr::cust(field_sql).eq(value.clone()),
        Predicate::Contains { value, .. } => Expr::cust_with_values(
            format!("{field_sql} ILIKE $1"),
            [format!("%{}%", escape_like_wildcards(value))],
        ),
        Predicate::And(_) | Predicate::Or(_) => Expr::cust("TRUE"),
    }
}

/// The same leaf predicate addressing `field` instead.
fn retarget(predicate: &Predicate, field: &str) -> Predicate {
    match predicate {
        Predicate::In { values, .. } => Predicate::In {
            field: field.to_string(),
            values: values.clone(),
        },
        Predicate::Contains { value, .. } => Predicate::contains(field, value),
        Predicate::Equals { value, .. } => Predicate::equals(field, value),
        other => other.clone(),
    }
}

/// Field path segments are interpolated into SQL, so only plain identifiers pass.
fn validate_segment(segment: &str) -> Result<(), StoreError> {
    if !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(StoreError::UnsupportedPredicate(format!(
            "invalid field segment: {segment:?}"
        )))
    }
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::predicate::{Visibility, text_predicate, with_visibility};
    use crate::catalog::schema::{PRODUCTS, catalog_schema};
    use crate::catalog::store::SortKey;
    use crate::locale::Locale;

    fn products() -> FindQuery {
        FindQuery::new(PRODUCTS, Locale::En).with_fallback_locale(Locale::Vi)
    }

    #[test]
    fn simple_query_build() {
        let schema = catalog_schema();
        let query = products().with_pagination(2, 12);
        let sql = DocumentQueryBuilder::new(&query, &schema).build().unwrap();

        assert!(sql.contains("FROM \"document\" AS \"d\""));
        assert!(sql.contains("\"d\".\"collection\" = 'products'"));
        assert!(sql.contains("ORDER BY \"d\".\"created\" ASC, \"d\".\"id\" ASC"));
        assert!(sql.contains("LIMIT 12"));
        assert!(sql.contains("OFFSET 12"));
    }

    #[test]
    fn count_query_build() {
        let schema = catalog_schema();
        let query = products();
        let sql = DocumentQueryBuilder::new(&query, &schema)
            .build_count()
            .unwrap();

        assert!(sql.contains("COUNT(*)"));
        assert!(!sql.contains("LIMIT"));
        assert!(!sql.contains("ORDER BY"));
    }

    #[test]
    fn localized_sort_uses_coalesce() {
        let schema = catalog_schema();
        let query = products().with_sort(SortKey::asc("name"));
        let sql = DocumentQueryBuilder::new(&query, &schema).build().unwrap();

        assert!(sql.contains("ORDER BY LOWER(COALESCE(d.data->'name'->>'en', d.data->'name'->>'vi'"));
    }

    #[test]
    fn relation_membership_uses_exists() {
        let schema = catalog_schema();
        let values = ["fag".to_string(), "skf".to_string()].into();
        let query = products().with_predicate(Predicate::is_in("brand.slug", &values));
        let sql = DocumentQueryBuilder::new(&query, &schema).build().unwrap();

        assert!(sql.contains("EXISTS"));
        assert!(sql.contains("SELECT 1 FROM \"document\" AS \"r1\""));
        assert!(sql.contains("\"r1\".\"collection\" = 'brands'"));
        assert!(sql.contains("jsonb_path_query(d.data, '$.brand[*]')"));
        assert!(sql.contains("r1.data->>'slug'"));
        assert!(sql.contains("IN ('fag', 'skf')"));
    }

    #[test]
    fn has_many_and_nested_relations() {
        let schema = catalog_schema();
        let predicate = Predicate::all(vec![
            Predicate::is_in("categories.slug", &["ball".to_string()].into()).unwrap(),
            Predicate::equals("images.image.alt", "front"),
        ]);
        let query = products().with_predicate(predicate);
        let sql = DocumentQueryBuilder::new(&query, &schema).build().unwrap();

        assert!(sql.contains("'$.categories[*]'"));
        assert!(sql.contains("'$.images[*].image[*]'"));
        assert!(sql.contains("\"r2\".\"collection\" = 'media'"));
    }

    #[test]
    fn text_search_is_parameterized_ilike() {
        let schema = catalog_schema();
        let predicate = with_visibility(
            Some(text_predicate("6205-2RS", Visibility::Any)),
            Visibility::PublishedOnly,
        );
        let query = products().with_predicate(predicate);
        let sql = DocumentQueryBuilder::new(&query, &schema).build().unwrap();

        assert!(sql.contains("ILIKE '%6205-2RS%'"));
        assert!(sql.contains("(d.data->>'sku') ILIKE"));
        assert!(sql.contains(" OR "));
        assert!(sql.contains("((d.data->>'_status')) = 'published'"));
    }

    #[test]
    fn like_wildcards_escaped() {
        let schema = catalog_schema();
        let query = products().with_predicate(Some(Predicate::contains("sku", "100%_a")));
        let sql = DocumentQueryBuilder::new(&query, &schema).build().unwrap();

        assert!(
            sql.contains("100\\\\%\\\\_a") || sql.contains("100\\%\\_a"),
            "LIKE wildcards should be escaped: {sql}"
        );
        assert!(!sql.contains("%100%_a%"));
    }

    #[test]
    fn quotes_in_values_are_escaped() {
        let schema = catalog_schema();
        let query = products().with_predicate(Some(Predicate::equals("sku", "a'b")));
        let sql = DocumentQueryBuilder::new(&query, &schema).build().unwrap();

        assert!(!sql.contains("'a'b'"));
    }

    #[test]
    fn invalid_field_rejected() {
        let schema = catalog_schema();
        let query = products().with_predicate(Some(Predicate::equals("name'; DROP", "x")));
        let err = DocumentQueryBuilder::new(&query, &schema)
            .build()
            .unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedPredicate(_)));
    }

    #[test]
    fn unknown_collection_rejected() {
        let schema = catalog_schema();
        let query = FindQuery::new("orders", Locale::Vi);
        let err = DocumentQueryBuilder::new(&query, &schema)
            .build_count()
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownCollection(_)));
    }

    #[test]
    fn escape_like_wildcards_function() {
        assert_eq!(escape_like_wildcards("hello"), "hello");
        assert_eq!(escape_like_wildcards("100%"), "100\\%");
        assert_eq!(escape_like_wildcards("a_b"), "a\\_b");
        assert_eq!(escape_like_wildcards("a\\b"), "a\\\\b");
    }
}
