//! Product records as scraped, persisted, and returned to callers

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeVariant {
	pub size: String,
	pub in_stock: bool,
}

/// One listing as produced by a scraper. `image_url` may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProduct {
	pub title: String,
	pub price: Option<String>,
	pub url: String,
	#[serde(default)]
	pub image_url: String,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub sizes: Vec<SizeVariant>,
}

impl RawProduct {
	pub fn has_image(&self) -> bool {
		!self.image_url.trim().is_empty()
	}
}

/// Metadata stored alongside each indexed vector, joined by ordinal.
/// Identity is `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMetadata {
	pub title: String,
	pub price: Option<String>,
	pub url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image_url: Option<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tags: Vec<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub sizes: Vec<SizeVariant>,
}

impl ProductMetadata {
	/// The `{title, price, url}` subset kept by the corpus builder
	pub fn summary(product: &RawProduct) -> Self {
		Self {
			title: product.title.clone(),
			price: product.price.clone(),
			url: product.url.clone(),
			image_url: None,
			tags: Vec::new(),
			sizes: Vec::new(),
		}
	}
}

/// A vector paired with its product; serialized as `{meta, vector}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
	pub meta: ProductMetadata,
	pub vector: Vec<f32>,
}

/// A recommendation: the product's metadata with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
	#[serde(flatten)]
	pub meta: ProductMetadata,
	pub score: f32,
}
