//! Collection metadata shared by the document stores.
//!
//! Stores need to know which fields hold per-locale values and which fields
//! point at other documents; everything else in a document is opaque JSON.

/// Product collection.
pub const PRODUCTS: &str = "products";

/// Brand collection.
pub const BRANDS: &str = "brands";

/// Product category collection.
pub const CATEGORIES: &str = "categories";

/// Uploaded media collection.
pub const MEDIA: &str = "media";

/// A field holding the id (or ids) of documents in another collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Dotted path of the field; arrays along the path are traversed.
    pub path: &'static str,
    /// Collection the ids refer to.
    pub collection: &'static str,
}

impl Relation {
    /// Path segments of the relation field.
    pub fn segments(&self) -> Vec<&'static str> {
        self.path.split('.').collect()
    }
}

/// Metadata for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    pub name: &'static str,
    /// Top-level fields stored as `{ "<locale>": value, ... }`.
    pub localized: &'static [&'static str],
    pub relations: &'static [Relation],
}

impl CollectionSchema {
    pub fn is_localized(&self, field: &str) -> bool {
        self.localized.contains(&field)
    }

    /// The relation whose path is a prefix of `segments`, with the
    /// remaining segments addressing a field of the related document.
    pub fn relation_prefix<'s>(&self, segments: &'s [&'s str]) -> Option<(&Relation, &'s [&'s str])> {
        self.relations.iter().find_map(|relation| {
            let rel_segments = relation.segments();
            if segments.len() > rel_segments.len() && segments.starts_with(&rel_segments) {
                Some((relation, &segments[rel_segments.len()..]))
            } else {
                None
            }
        })
    }
}

const PRODUCT_RELATIONS: &[Relation] = &[
    Relation {
        path: "brand",
        collection: BRANDS,
    },
    Relation {
        path: "categories",
        collection: CATEGORIES,
    },
    Relation {
        path: "images.image",
        collection: MEDIA,
    },
];

const BRAND_RELATIONS: &[Relation] = &[Relation {
    path: "logo",
    collection: MEDIA,
}];

/// The set of collections a store serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    collections: Vec<CollectionSchema>,
}

impl Schema {
    pub fn new(collections: Vec<CollectionSchema>) -> Self {
        Self { collections }
    }

    /// Look up a collection by name.
    pub fn collection(&self, name: &str) -> Option<&CollectionSchema> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Names of all collections, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.collections.iter().map(|c| c.name)
    }
}

/// Schema of the bearing catalog.
pub fn catalog_schema() -> Schema {
    Schema::new(vec![
        CollectionSchema {
            name: PRODUCTS,
            localized: &["name", "description"],
            relations: PRODUCT_RELATIONS,
        },
        CollectionSchema {
            name: BRANDS,
            localized: &["description"],
            relations: BRAND_RELATIONS,
        },
        CollectionSchema {
            name: CATEGORIES,
            localized: &["name"],
            relations: &[],
        },
        CollectionSchema {
            name: MEDIA,
            localized: &["alt"],
            relations: &[],
        },
    ])
}
