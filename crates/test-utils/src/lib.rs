//! Catalog test utilities.
//!
//! Helpers for integration testing: document builders for the catalog
//! collections, a seed dataset of bearing products, and JSON assertion
//! helpers.

use serde_json::{Map, Value, json};

/// Create a published test product. The slug is derived from `name` and
/// the name is stored for the `vi` locale only.
pub fn test_product(id: i64, name: &str, sku: &str) -> TestProduct {
    TestProduct {
        id,
        names: vec![("vi".to_string(), name.to_string())],
        slug: slugify(name),
        sku: Some(sku.to_string()),
        brand: None,
        categories: Vec::new(),
        images: Vec::new(),
        status: "published".to_string(),
    }
}

/// A product document builder.
#[derive(Debug, Clone)]
pub struct TestProduct {
    pub id: i64,
    pub names: Vec<(String, String)>,
    pub slug: String,
    pub sku: Option<String>,
    pub brand: Option<i64>,
    pub categories: Vec<i64>,
    pub images: Vec<i64>,
    pub status: String,
}

impl TestProduct {
    /// Set the name for another locale.
    pub fn with_name(mut self, locale: &str, name: &str) -> Self {
        self.names.retain(|(l, _)| l != locale);
        self.names.push((locale.to_string(), name.to_string()));
        self
    }

    pub fn with_slug(mut self, slug: &str) -> Self {
        self.slug = slug.to_string();
        self
    }

    pub fn without_sku(mut self) -> Self {
        self.sku = None;
        self
    }

    pub fn with_brand(mut self, brand_id: i64) -> Self {
        self.brand = Some(brand_id);
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.categories.push(category_id);
        self
    }

    pub fn with_image(mut self, media_id: i64) -> Self {
        self.images.push(media_id);
        self
    }

    /// Mark as an unpublished draft.
    pub fn draft(mut self) -> Self {
        self.status = "draft".to_string();
        self
    }

    /// The stored document.
    pub fn to_json(&self) -> Value {
        let names: Map<String, Value> = self
            .names
            .iter()
            .map(|(locale, name)| (locale.clone(), Value::from(name.as_str())))
            .collect();
        let images: Vec<Value> = self.images.iter().map(|id| json!({ "image": id })).collect();

        json!({
            "id": self.id,
            "name": names,
            "slug": self.slug,
            "sku": self.sku,
            "brand": self.brand,
            "categories": self.categories,
            "images": images,
            "_status": self.status,
        })
    }
}

/// Brand document.
pub fn test_brand(id: i64, name: &str, slug: &str) -> Value {
    json!({ "id": id, "name": name, "slug": slug })
}

/// Category document with Vietnamese and English names.
pub fn test_category(id: i64, name_vi: &str, name_en: &str, slug: &str) -> Value {
    json!({ "id": id, "name": { "vi": name_vi, "en": name_en }, "slug": slug })
}

/// Create a media document for an uploaded original.
pub fn test_media(id: i64, url: &str) -> TestMedia {
    TestMedia {
        id,
        url: url.to_string(),
        alt: Vec::new(),
        sizes: Vec::new(),
    }
}

/// A media document builder.
#[derive(Debug, Clone)]
pub struct TestMedia {
    pub id: i64,
    pub url: String,
    pub alt: Vec<(String, String)>,
    pub sizes: Vec<(String, String)>,
}

impl TestMedia {
    pub fn with_alt(mut self, locale: &str, alt: &str) -> Self {
        self.alt.push((locale.to_string(), alt.to_string()));
        self
    }

    /// Add a generated size variant (`thumbnail`, `medium`, `large`).
    pub fn with_size(mut self, size: &str, url: &str) -> Self {
        self.sizes.push((size.to_string(), url.to_string()));
        self
    }

    pub fn to_json(&self) -> Value {
        let alt: Map<String, Value> = self
            .alt
            .iter()
            .map(|(locale, alt)| (locale.clone(), Value::from(alt.as_str())))
            .collect();
        let sizes: Map<String, Value> = self
            .sizes
            .iter()
            .map(|(size, url)| (size.clone(), json!({ "url": url })))
            .collect();

        json!({ "id": self.id, "url": self.url, "alt": alt, "sizes": sizes })
    }
}

/// Lowercase, ASCII alphanumerics separated by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Ids used by [`bearing_seed`].
pub mod ids {
    pub const SKF: i64 = 1;
    pub const FAG: i64 = 2;
    pub const NSK: i64 = 3;
    pub const TIMKEN: i64 = 4;

    pub const BALL_BEARINGS: i64 = 10;
    pub const ROLLER_BEARINGS: i64 = 11;
    pub const BEARING_UNITS: i64 = 12;

    pub const SKF_6205_2RS: i64 = 100;
    pub const FAG_6206: i64 = 101;
    pub const NSK_NJ205: i64 = 102;
    pub const SKF_UCP205: i64 = 103;
    pub const TIMKEN_30205: i64 = 104;
    pub const SKF_6205_ZZ_DRAFT: i64 = 105;
    pub const SKF_6305: i64 = 106;

    /// First id of the generated NSK deep-groove series.
    pub const NSK_SERIES_START: i64 = 200;
    /// Number of products in the generated series.
    pub const NSK_SERIES_LEN: i64 = 14;
}

/// Published products in [`bearing_seed`].
pub const PUBLISHED_PRODUCTS: u64 = 6 + ids::NSK_SERIES_LEN as u64;

/// A bearing catalog: four brands, three categories, three images, seven
/// named products (one a draft) and a fourteen-product NSK series.
pub fn bearing_seed() -> Value {
    use ids::*;

    let brands = vec![
        test_brand(SKF, "SKF", "skf"),
        test_brand(FAG, "FAG", "fag"),
        test_brand(NSK, "NSK", "nsk"),
        test_brand(TIMKEN, "Timken", "timken"),
    ];

    let categories = vec![
        test_category(BALL_BEARINGS, "Vòng bi cầu", "Ball bearings", "ball-bearings"),
        test_category(ROLLER_BEARINGS, "Vòng bi đũa", "Roller bearings", "roller-bearings"),
        test_category(BEARING_UNITS, "Gối đỡ", "Bearing units", "bearing-units"),
    ];

    let media = vec![
        test_media(20, "/media/skf-6205-2rs.png")
            .with_size("thumbnail", "/media/skf-6205-2rs-150x150.png")
            .with_size("medium", "/media/skf-6205-2rs-600x600.png")
            .with_alt("vi", "Vòng bi SKF 6205-2RS")
            .with_alt("en", "SKF 6205-2RS bearing")
            .to_json(),
        test_media(21, "/media/fag-6206.png").to_json(),
        test_media(22, "/media/skf-ucp205.png")
            .with_size("large", "/media/skf-ucp205-1200x1200.png")
            .to_json(),
    ];

    let mut products = vec![
        test_product(SKF_6205_2RS, "SKF 6205-2RS", "6205-2RS")
            .with_name("en", "SKF 6205-2RS")
            .with_brand(SKF)
            .with_category(BALL_BEARINGS)
            .with_image(20),
        test_product(FAG_6206, "Vòng bi FAG 6206-C3", "6206-C3")
            .with_name("en", "FAG 6206-C3 ball bearing")
            .with_slug("fag-6206-c3")
            .with_brand(FAG)
            .with_category(BALL_BEARINGS)
            .with_image(21),
        test_product(NSK_NJ205, "Vòng bi đũa NSK NJ205", "NJ205-EW")
            .with_name("en", "NSK NJ205 cylindrical roller bearing")
            .with_slug("nsk-nj205")
            .with_brand(NSK)
            .with_category(ROLLER_BEARINGS),
        test_product(SKF_UCP205, "Gối đỡ SKF UCP205", "UCP205")
            .with_name("en", "SKF UCP205 pillow block")
            .with_slug("skf-ucp205")
            .with_brand(SKF)
            .with_category(BEARING_UNITS)
            .with_image(22),
        test_product(TIMKEN_30205, "Vòng bi côn Timken 30205", "30205")
            .with_name("en", "Timken 30205 tapered roller bearing")
            .with_slug("timken-30205")
            .with_brand(TIMKEN)
            .with_category(ROLLER_BEARINGS),
        test_product(SKF_6205_ZZ_DRAFT, "SKF 6205-ZZ", "6205-ZZ")
            .with_brand(SKF)
            .with_category(BALL_BEARINGS)
            .draft(),
        // Vietnamese name only.
        test_product(SKF_6305, "Vòng bi SKF 6305-2Z", "6305-2Z")
            .with_slug("skf-6305-2z")
            .with_brand(SKF)
            .with_category(BALL_BEARINGS),
    ];

    for n in 0..NSK_SERIES_LEN {
        let model = format!("60{n:02}DDU");
        products.push(
            test_product(NSK_SERIES_START + n, &format!("NSK {model}"), &model)
                .with_name("en", &format!("NSK {model} deep groove ball bearing"))
                .with_brand(NSK)
                .with_category(BALL_BEARINGS),
        );
    }

    json!({
        "brands": brands,
        "categories": categories,
        "media": media,
        "products": products.iter().map(TestProduct::to_json).collect::<Vec<_>>(),
    })
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON array of records contains one with `id`.
    pub fn contains_id(results: &Value, id: i64) {
        let found = results
            .as_array()
            .is_some_and(|items| items.iter().any(|item| item["id"] == id));
        assert!(found, "Expected results to contain id {id}, got: {results}");
    }

    /// Assert that a JSON array of records does not contain `id`.
    pub fn lacks_id(results: &Value, id: i64) {
        let found = results
            .as_array()
            .is_some_and(|items| items.iter().any(|item| item["id"] == id));
        assert!(!found, "Expected results to NOT contain id {id}, got: {results}");
    }

    /// Ids of a JSON array of records, in order.
    pub fn ids(results: &Value) -> Vec<i64> {
        results
            .as_array()
            .map(|items| items.iter().filter_map(|item| item["id"].as_i64()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_builder() {
        let product = test_product(1, "SKF 6205-2RS", "6205-2RS")
            .with_name("en", "SKF bearing")
            .with_brand(ids::SKF)
            .with_category(10)
            .with_image(20)
            .draft()
            .to_json();

        assert_eq!(product["slug"], "skf-6205-2rs");
        assert_eq!(product["name"]["en"], "SKF bearing");
        assert_eq!(product["brand"], 1);
        assert_eq!(product["images"][0]["image"], 20);
        assert_eq!(product["_status"], "draft");
    }

    #[test]
    fn test_media_builder() {
        let media = test_media(5, "/a.png")
            .with_size("thumbnail", "/a-150.png")
            .with_alt("vi", "Ảnh")
            .to_json();
        assert_eq!(media["sizes"]["thumbnail"]["url"], "/a-150.png");
        assert_eq!(media["alt"]["vi"], "Ảnh");
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("SKF 6205-2RS"), "skf-6205-2rs");
        assert_eq!(slugify("  NSK  60 "), "nsk-60");
        assert_eq!(slugify("Vòng bi"), "v-ng-bi");
    }

    #[test]
    fn seed_contents() {
        let seed = bearing_seed();
        assert_eq!(seed["brands"].as_array().unwrap().len(), 4);
        let products = seed["products"].as_array().unwrap();
        assert_eq!(products.len(), 7 + ids::NSK_SERIES_LEN as usize);

        let published = products
            .iter()
            .filter(|p| p["_status"] == "published")
            .count() as u64;
        assert_eq!(published, PUBLISHED_PRODUCTS);

        let skf = &products[0];
        assert_eq!(skf["name"]["vi"], "SKF 6205-2RS");
        assert_eq!(skf["sku"], "6205-2RS");
    }

    #[test]
    fn test_assertions() {
        let results = serde_json::json!([{"id": 1}, {"id": 2}]);
        assert::contains_id(&results, 2);
        assert::lacks_id(&results, 3);
        assert_eq!(assert::ids(&results), vec![1, 2]);
        assert::has_key(&serde_json::json!({"a": 1}), "a");
    }
}
