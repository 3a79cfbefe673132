//! # Catalog Scrapers
//!
//! Each catalog gets one `Scraper`. Selection is a closed enum, so adding a
//! store means adding a variant here and a module next to this one.

pub mod drmers;
pub mod galore;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use scraper::ElementRef;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub use crate::cli::Catalog;
use crate::core::RawProduct;
use crate::storage::artifacts;

pub use drmers::DrmersScraper;
pub use galore::GaloreScraper;

/// Produces the raw product listing of one catalog
pub trait Scraper {
	fn name(&self) -> &str;

	fn scrape(&self) -> Result<Vec<RawProduct>>;
}

impl Catalog {
	/// Default source name used for artifact files
	pub fn source_name(&self) -> &'static str {
		match self {
			Catalog::Drmers => "drmers",
			Catalog::Galore => "galore",
			Catalog::File => "file",
		}
	}

	/// Build the scraper for this catalog. `input` is required for `file`.
	pub fn scraper(&self, client: &Client, input: Option<&Path>) -> Result<Box<dyn Scraper>> {
		Ok(match self {
			Catalog::Drmers => Box::new(DrmersScraper::new(client.clone())?),
			Catalog::Galore => Box::new(GaloreScraper::new(client.clone())?),
			Catalog::File => {
				let path = input.context("--input is required with --catalog file")?;
				Box::new(JsonFileScraper::new(path))
			}
		})
	}
}

/// Replays a previously saved `<source>_products.json`
pub struct JsonFileScraper {
	path: PathBuf,
}

impl JsonFileScraper {
	pub fn new(path: &Path) -> Self {
		Self { path: path.to_path_buf() }
	}
}

impl Scraper for JsonFileScraper {
	fn name(&self) -> &str {
		"file"
	}

	fn scrape(&self) -> Result<Vec<RawProduct>> {
		let products = artifacts::load_products(&self.path)?;
		Ok(dedupe_by_url(products))
	}
}

pub(crate) fn fetch_page(client: &Client, url: &Url) -> Result<String> {
	crate::ui::debug(&format!("GET {}", url));
	client
		.get(url.clone())
		.send()
		.and_then(|r| r.error_for_status())
		.and_then(|r| r.text())
		.with_context(|| format!("Failed to fetch {}", url))
}

/// Keep the first listing for each product URL
pub fn dedupe_by_url(products: Vec<RawProduct>) -> Vec<RawProduct> {
	let mut seen = HashSet::new();
	products
		.into_iter()
		.filter(|p| {
			let fresh = seen.insert(p.url.clone());
			if !fresh {
				crate::ui::debug(&format!("Skipping duplicate URL: {}", p.url));
			}
			fresh
		})
		.collect()
}

/// Trimmed text content with inner whitespace runs removed between nodes
pub(crate) fn text_of(el: ElementRef) -> String {
	el.text().map(str::trim).filter(|s| !s.is_empty()).collect::<Vec<_>>().join("")
}

/// Highest-resolution candidate of a `srcset`: the URL of its last entry
pub(crate) fn last_srcset_entry(srcset: &str) -> Option<&str> {
	srcset
		.rsplit(',')
		.next()
		.and_then(|entry| entry.split_whitespace().next())
		.filter(|s| !s.is_empty())
}

pub(crate) fn resolve(base: &Url, href: &str) -> Option<String> {
	base.join(href.trim()).ok().map(String::from)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn product(url: &str, title: &str) -> RawProduct {
		RawProduct {
			title: title.into(),
			price: None,
			url: url.into(),
			image_url: String::new(),
			tags: vec![],
			sizes: vec![],
		}
	}

	#[test]
	fn dedupe_keeps_first_occurrence() {
		let products = vec![
			product("https://a/1", "first"),
			product("https://a/2", "other"),
			product("https://a/1", "again"),
		];
		let kept = dedupe_by_url(products);
		assert_eq!(kept.len(), 2);
		assert_eq!(kept[0].title, "first");
	}

	#[test]
	fn srcset_picks_last_entry() {
		let srcset = "//cdn/x_200.jpg 200w, //cdn/x_400.jpg 400w,\n //cdn/x_800.jpg 800w";
		assert_eq!(last_srcset_entry(srcset), Some("//cdn/x_800.jpg"));
		assert_eq!(last_srcset_entry("  "), None);
	}

	#[test]
	fn resolves_relative_links() {
		let base = Url::parse("https://shop.example/collections/all").unwrap();
		assert_eq!(
			resolve(&base, "/products/tee").as_deref(),
			Some("https://shop.example/products/tee")
		);
	}

	#[test]
	fn file_scraper_replays_saved_products() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("saved_products.json");
		artifacts::save_products(&path, &[product("https://a/1", "tee"), product("https://a/1", "dup")]).unwrap();

		let scraper = JsonFileScraper::new(&path);
		let products = scraper.scrape().unwrap();
		assert_eq!(products.len(), 1);
		assert_eq!(products[0].title, "tee");
	}
}
