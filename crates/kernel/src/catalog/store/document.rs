//! JSON document helpers shared by the store backends.

use std::collections::HashMap;

use serde_json::Value;

use crate::catalog::reference::DocId;
use crate::catalog::schema::{CollectionSchema, Relation};
use crate::locale::Locale;

/// Project localized fields of `doc` to a single locale.
///
/// A localized field stored as `{ "vi": ..., "en": ... }` becomes the value
/// for `locale`, else the value for `fallback`, else `null`. Fields already
/// holding a plain value are left alone.
pub fn localize(doc: &mut Value, schema: &CollectionSchema, locale: Locale, fallback: Locale) {
    let Value::Object(map) = doc else {
        return;
    };

    for field in schema.localized {
        if let Some(value) = map.get_mut(*field)
            && let Value::Object(translations) = value
        {
            let picked = translations
                .get(locale.code())
                .filter(|v| !v.is_null())
                .or_else(|| translations.get(fallback.code()))
                .cloned()
                .unwrap_or(Value::Null);
            *value = picked;
        }
    }
}

/// Keep only `fields` (plus `id`) at the top level of `doc`.
pub fn project(doc: &mut Value, fields: &[String]) {
    if let Value::Object(map) = doc {
        map.retain(|key, _| key == "id" || fields.iter().any(|f| f == key));
    }
}

/// All values reachable from `doc` along `segments`.
///
/// Arrays anywhere on the path (including the final value) are flattened,
/// so `categories.slug` over a populated has-many relation yields every
/// category slug.
pub fn resolve_path<'a>(doc: &'a Value, segments: &[&str], out: &mut Vec<&'a Value>) {
    match doc {
        Value::Array(items) => {
            for item in items {
                resolve_path(item, segments, out);
            }
        }
        _ if segments.is_empty() => out.push(doc),
        Value::Object(map) => {
            if let Some(child) = map.get(segments[0]) {
                resolve_path(child, &segments[1..], out);
            }
        }
        _ => {}
    }
}

/// Visit every value stored in a relation field of `doc`.
///
/// Has-many relations store an array; each element is visited.
fn visit_relation_mut(doc: &mut Value, segments: &[&str], f: &mut impl FnMut(&mut Value)) {
    match doc {
        Value::Array(items) => {
            for item in items {
                visit_relation_mut(item, segments, f);
            }
        }
        Value::Object(map) => {
            let Some((head, rest)) = segments.split_first() else {
                return;
            };
            let Some(child) = map.get_mut(*head) else {
                return;
            };
            if !rest.is_empty() {
                visit_relation_mut(child, rest, f);
            } else if let Value::Array(items) = child {
                items.iter_mut().for_each(&mut *f);
            } else {
                f(child);
            }
        }
        _ => {}
    }
}

/// Ids referenced by `relation` across `docs` that are not yet populated.
pub(crate) fn relation_ids(docs: &mut [Value], relation: &Relation) -> Vec<DocId> {
    let segments = relation.segments();
    let mut ids = Vec::new();
    for doc in docs.iter_mut() {
        visit_relation_mut(doc, &segments, &mut |value: &mut Value| {
            if let Some(id) = value.as_i64()
                && !ids.contains(&id)
            {
                ids.push(id);
            }
        });
    }
    ids
}

/// Replace relation ids with the matching documents from `related`.
///
/// Ids with no matching document stay as bare ids.
pub(crate) fn populate_relation(
    docs: &mut [Value],
    relation: &Relation,
    related: &HashMap<DocId, Value>,
) {
    let segments = relation.segments();
    for doc in docs.iter_mut() {
        visit_relation_mut(doc, &segments, &mut |value: &mut Value| {
            if let Some(id) = value.as_i64()
                && let Some(target) = related.get(&id)
            {
                *value = target.clone();
            }
        });
    }
}

/// Text form of a scalar used for comparisons.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::schema::{PRODUCTS, catalog_schema};
    use serde_json::json;

    fn products() -> CollectionSchema {
        catalog_schema().collection(PRODUCTS).cloned().unwrap()
    }

    #[test]
    fn localize_picks_requested_locale() {
        let mut doc = json!({"id": 1, "name": {"vi": "Vòng bi", "en": "Bearing"}, "sku": "6205"});
        localize(&mut doc, &products(), Locale::En, Locale::Vi);
        assert_eq!(doc["name"], "Bearing");
        assert_eq!(doc["sku"], "6205");
    }

    #[test]
    fn localize_falls_back_then_nulls() {
        let mut doc = json!({"name": {"vi": "Vòng bi"}, "description": {"km": "x"}});
        localize(&mut doc, &products(), Locale::En, Locale::Vi);
        assert_eq!(doc["name"], "Vòng bi");
        assert_eq!(doc["description"], Value::Null);
    }

    #[test]
    fn localize_leaves_plain_values() {
        let mut doc = json!({"name": "SKF 6205-2RS"});
        localize(&mut doc, &products(), Locale::En, Locale::Vi);
        assert_eq!(doc["name"], "SKF 6205-2RS");
    }

    #[test]
    fn project_keeps_id() {
        let mut doc = json!({"id": 4, "name": "a", "sku": "b", "body": "c"});
        project(&mut doc, &["name".to_string()]);
        assert_eq!(doc, json!({"id": 4, "name": "a"}));
    }

    #[test]
    fn resolve_path_flattens_arrays() {
        let doc = json!({"categories": [{"slug": "ball"}, {"slug": "roller"}, 9]});
        let mut out = Vec::new();
        resolve_path(&doc, &["categories", "slug"], &mut out);
        assert_eq!(out, vec![&json!("ball"), &json!("roller")]);
    }

    #[test]
    fn populate_has_one_has_many_and_nested() {
        let schema = products();
        let mut docs = vec![json!({
            "id": 1,
            "brand": 10,
            "categories": [20, 21],
            "images": [{"image": 30}, {"image": 31}],
        })];

        let brand = &schema.relations[0];
        let categories = &schema.relations[1];
        let images = &schema.relations[2];

        assert_eq!(relation_ids(&mut docs, brand), vec![10]);
        assert_eq!(relation_ids(&mut docs, categories), vec![20, 21]);
        assert_eq!(relation_ids(&mut docs, images), vec![30, 31]);

        let related: HashMap<DocId, Value> = [
            (10, json!({"id": 10, "name": "SKF"})),
            (20, json!({"id": 20, "slug": "ball"})),
            (30, json!({"id": 30, "url": "/a.png"})),
        ]
        .into_iter()
        .collect();

        for relation in [brand, categories, images] {
            populate_relation(&mut docs, relation, &related);
        }

        assert_eq!(docs[0]["brand"]["name"], "SKF");
        assert_eq!(docs[0]["categories"][0]["slug"], "ball");
        // Missing target stays a bare id.
        assert_eq!(docs[0]["categories"][1], 21);
        assert_eq!(docs[0]["images"][0]["image"]["url"], "/a.png");
        assert_eq!(docs[0]["images"][1]["image"], 31);
    }

    #[test]
    fn populated_relations_are_not_collected_again() {
        let schema = products();
        let mut docs = vec![json!({"brand": {"id": 10, "name": "SKF"}})];
        assert!(relation_ids(&mut docs, &schema.relations[0]).is_empty());
    }
}
