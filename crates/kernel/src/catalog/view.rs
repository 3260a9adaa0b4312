//! Product view models.
//!
//! Store documents arrive localized, with relations either populated or
//! left as ids. The mappers here flatten them into the records the
//! presentation layer renders.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::reference::{DocId, Identified, Ref};

/// A product as returned by the document store.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDocument {
    pub id: DocId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub brand: Option<Ref<BrandDocument>>,
    #[serde(default)]
    pub images: Option<Vec<ProductImage>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandDocument {
    pub id: DocId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl Identified for BrandDocument {
    fn doc_id(&self) -> DocId {
        self.id
    }
}

/// One entry of a product's ordered image list.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductImage {
    #[serde(default)]
    pub image: Option<Ref<MediaDocument>>,
}

/// An uploaded image with its generated size variants.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaDocument {
    pub id: DocId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub sizes: Option<ImageSizes>,
}

impl Identified for MediaDocument {
    fn doc_id(&self) -> DocId {
        self.id
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageSizes {
    #[serde(default)]
    pub thumbnail: Option<ImageSize>,
    #[serde(default)]
    pub medium: Option<ImageSize>,
    #[serde(default)]
    pub large: Option<ImageSize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageSize {
    #[serde(default)]
    pub url: Option<String>,
}

impl MediaDocument {
    /// URL of the preferred variant: thumbnail, then medium, then large,
    /// then the original upload.
    pub fn preferred_url(&self) -> Option<&str> {
        let sizes = self.sizes.as_ref();
        [
            sizes.and_then(|s| s.thumbnail.as_ref()),
            sizes.and_then(|s| s.medium.as_ref()),
            sizes.and_then(|s| s.large.as_ref()),
        ]
        .into_iter()
        .flatten()
        .filter_map(|size| size.url.as_deref())
        .chain(self.url.as_deref())
        .find(|url| !url.is_empty())
    }
}

impl ProductDocument {
    /// Decode a store document, or `None` (logged) if it is not a product.
    pub fn from_value(doc: Value) -> Option<Self> {
        let id = doc.get("id").cloned();
        match serde_json::from_value(doc) {
            Ok(product) => Some(product),
            Err(e) => {
                warn!(id = ?id, error = %e, "skipping malformed product document");
                None
            }
        }
    }

    /// The media document of the first image, when populated.
    fn first_media(&self) -> Option<&MediaDocument> {
        self.images
            .as_deref()?
            .first()?
            .image
            .as_ref()?
            .populated()
    }
}

/// Brand as shown next to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandView {
    pub id: DocId,
    /// `None` when the relation was not populated.
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

/// Display-ready product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    pub id: DocId,
    pub name: String,
    pub slug: String,
    pub sku: Option<String>,
    pub brand: Option<BrandView>,
    pub image: Option<ImageView>,
}

/// Compact product record for the quick search dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: DocId,
    pub name: String,
    pub slug: String,
    pub sku: Option<String>,
    /// Brand name, if the brand was populated.
    pub brand: Option<String>,
    /// Preferred image URL.
    pub image: Option<String>,
}

impl From<&ProductDocument> for ProductView {
    fn from(doc: &ProductDocument) -> Self {
        let name = doc.name.clone().unwrap_or_default();

        let brand = doc.brand.as_ref().map(|brand| BrandView {
            id: brand.id(),
            name: brand.populated().and_then(|b| b.name.clone()),
        });

        let image = doc.first_media().and_then(|media| {
            let url = media.preferred_url()?;
            Some(ImageView {
                url: url.to_string(),
                alt: media
                    .alt
                    .clone()
                    .filter(|alt| !alt.is_empty())
                    .unwrap_or_else(|| name.clone()),
            })
        });

        Self {
            id: doc.id,
            slug: doc.slug.clone().unwrap_or_default(),
            sku: doc.sku.clone(),
            name,
            brand,
            image,
        }
    }
}

impl From<&ProductDocument> for ProductSummary {
    fn from(doc: &ProductDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.name.clone().unwrap_or_default(),
            slug: doc.slug.clone().unwrap_or_default(),
            sku: doc.sku.clone(),
            brand: doc
                .brand
                .as_ref()
                .and_then(Ref::populated)
                .and_then(|b| b.name.clone()),
            image: doc
                .first_media()
                .and_then(MediaDocument::preferred_url)
                .map(str::to_string),
        }
    }
}

/// Map store documents to views, skipping documents that are not products.
pub fn map_documents<V>(docs: Vec<Value>) -> Vec<V>
where
    V: for<'a> From<&'a ProductDocument>,
{
    docs.into_iter()
        .filter_map(ProductDocument::from_value)
        .map(|doc| V::from(&doc))
        .collect()
}
