//! Predicate trees passed to the document store.
//!
//! The assembler turns a [`FilterRequest`] into a single predicate:
//! - brand and category groups are ANDed together, each group is a
//!   membership (`∈`) test, so values inside a group are ORed
//! - a group without members contributes no condition at all
//! - no conditions at all means "match everything", expressed as `None`
//! - free text ORs `name contains` with `sku contains`

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::filter::FilterRequest;

/// Relation path matched against brand slugs.
pub const BRAND_SLUG_FIELD: &str = "brand.slug";

/// Relation path matched against category slugs.
pub const CATEGORY_SLUG_FIELD: &str = "categories.slug";

/// Localized product name.
pub const NAME_FIELD: &str = "name";

/// Product stock-keeping unit.
pub const SKU_FIELD: &str = "sku";

/// Publication status field maintained by the CMS.
pub const STATUS_FIELD: &str = "_status";

/// Status value of documents visible to anonymous callers.
pub const PUBLISHED: &str = "published";

/// A filter tree understood by every [`DocumentStore`](super::store::DocumentStore).
///
/// Field names are dotted paths; a segment naming a relation steps into the
/// related document, a segment naming an array matches if any element does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Field equals one of the values. Never constructed with an empty set.
    In {
        field: String,
        values: BTreeSet<String>,
    },
    /// Case-insensitive substring match.
    Contains { field: String, value: String },
    /// Exact match.
    Equals { field: String, value: String },
    /// Every child matches.
    And(Vec<Predicate>),
    /// At least one child matches.
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Membership condition, or `None` when `values` is empty.
    ///
    /// An empty membership test would match nothing and silently empty the
    /// result set, so it is never built.
    pub fn is_in(field: &str, values: &BTreeSet<String>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Predicate::In {
            field: field.to_string(),
            values: values.clone(),
        })
    }

    pub fn contains(field: &str, value: &str) -> Self {
        Predicate::Contains {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn equals(field: &str, value: &str) -> Self {
        Predicate::Equals {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// AND the given conditions; `None` when there are none.
    pub fn all(mut conditions: Vec<Predicate>) -> Option<Self> {
        match conditions.len() {
            0 => None,
            1 => conditions.pop(),
            _ => Some(Predicate::And(conditions)),
        }
    }
}

/// Which documents an anonymous caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// No status restriction (trusted callers).
    Any,
    /// Only published documents.
    PublishedOnly,
}

/// Build the brand/category predicate of a listing request.
pub fn filter_predicate(request: &FilterRequest) -> Option<Predicate> {
    let conditions = [
        Predicate::is_in(BRAND_SLUG_FIELD, &request.brand_slugs),
        Predicate::is_in(CATEGORY_SLUG_FIELD, &request.category_slugs),
    ]
    .into_iter()
    .flatten()
    .collect();

    Predicate::all(conditions)
}

/// Build the free-text predicate: name or SKU contains `text`.
pub fn text_predicate(text: &str, visibility: Visibility) -> Predicate {
    let matches_text = Predicate::Or(vec![
        Predicate::contains(NAME_FIELD, text),
        Predicate::contains(SKU_FIELD, text),
    ]);

    match visibility {
        Visibility::Any => matches_text,
        Visibility::PublishedOnly => Predicate::And(vec![
            matches_text,
            Predicate::equals(STATUS_FIELD, PUBLISHED),
        ]),
    }
}

/// Restrict an optional predicate to what `visibility` allows.
pub fn with_visibility(predicate: Option<Predicate>, visibility: Visibility) -> Option<Predicate> {
    match visibility {
        Visibility::Any => predicate,
        Visibility::PublishedOnly => {
            let status = Predicate::equals(STATUS_FIELD, PUBLISHED);
            match predicate {
                None => Some(status),
                Some(Predicate::And(mut conditions)) => {
                    conditions.push(status);
                    Some(Predicate::And(conditions))
                }
                Some(other) => Some(Predicate::And(vec![other, status])),
            }
        }
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::filter::{FilterParams, parse_tokens};
    use crate::locale::LocaleSettings;

    fn listing(brand: Option<&str>, category: Option<&str>) -> FilterRequest {
        let params = FilterParams {
            brand: brand.map(str::to_string),
            category: category.map(str::to_string),
            ..Default::default()
        };
        FilterRequest::for_listing(&params, &LocaleSettings::default())
    }

    #[test]
    fn no_groups_means_match_all() {
        assert_eq!(filter_predicate(&listing(None, None)), None);
    }

    #[test]
    fn empty_group_is_same_as_absent_group() {
        assert_eq!(
            filter_predicate(&listing(Some(""), None)),
            filter_predicate(&listing(None, None))
        );
        assert_eq!(
            filter_predicate(&listing(Some(","), Some("ball"))),
            filter_predicate(&listing(None, Some("ball")))
        );
    }

    #[test]
    fn single_group_is_a_bare_membership_test() {
        let predicate = filter_predicate(&listing(Some("skf,fag"), None)).unwrap();
        assert_eq!(
            predicate,
            Predicate::In {
                field: BRAND_SLUG_FIELD.to_string(),
                values: parse_tokens(Some("fag,skf")),
            }
        );
    }

    #[test]
    fn two_groups_are_anded() {
        let predicate = filter_predicate(&listing(Some("skf"), Some("ball,roller"))).unwrap();
        let Predicate::And(conditions) = predicate else {
            panic!("expected AND, got {predicate:?}");
        };
        assert_eq!(conditions.len(), 2);
        assert!(matches!(&conditions[0], Predicate::In { field, .. } if field == BRAND_SLUG_FIELD));
        assert!(
            matches!(&conditions[1], Predicate::In { field, values } if field == CATEGORY_SLUG_FIELD && values.len() == 2)
        );
    }

    #[test]
    fn text_predicate_ors_name_and_sku() {
        let predicate = text_predicate("6205", Visibility::Any);
        assert_eq!(
            predicate,
            Predicate::Or(vec![
                Predicate::contains(NAME_FIELD, "6205"),
                Predicate::contains(SKU_FIELD, "6205"),
            ])
        );
    }

    #[test]
    fn published_text_predicate_ands_status() {
        let Predicate::And(conditions) = text_predicate("skf", Visibility::PublishedOnly) else {
            panic!("expected AND");
        };
        assert!(matches!(conditions[0], Predicate::Or(_)));
        assert_eq!(conditions[1], Predicate::equals(STATUS_FIELD, PUBLISHED));
    }

    #[test]
    fn visibility_on_match_all_is_status_only() {
        assert_eq!(
            with_visibility(None, Visibility::PublishedOnly),
            Some(Predicate::equals(STATUS_FIELD, PUBLISHED))
        );
        assert_eq!(with_visibility(None, Visibility::Any), None);
    }

    #[test]
    fn visibility_flattens_into_existing_and() {
        let filtered = filter_predicate(&listing(Some("skf"), Some("ball")));
        let Some(Predicate::And(conditions)) =
            with_visibility(filtered, Visibility::PublishedOnly)
        else {
            panic!("expected AND");
        };
        assert_eq!(conditions.len(), 3);
    }

    #[test]
    fn predicate_serialization() {
        let json = serde_json::to_value(Predicate::equals(STATUS_FIELD, PUBLISHED)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"equals": {"field": "_status", "value": "published"}})
        );
    }
}
