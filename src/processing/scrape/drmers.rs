//! Drmers Club: Shopify "grid-product" theme

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::collections::HashSet;

use super::{fetch_page, last_srcset_entry, resolve, text_of, Scraper};
use crate::core::{RawProduct, SizeVariant};
use crate::ui;

pub const COLLECTION_URL: &str = "https://drmersclub.com/collections/shop-all";

struct Selectors {
	card: Selector,
	title: Selector,
	price: Selector,
	link: Selector,
	image: Selector,
	secondary: Selector,
	noscript: Selector,
	img: Selector,
	product_data: Selector,
}

impl Selectors {
	fn new() -> Self {
		let parse = |s: &str| Selector::parse(s).expect("valid selector");
		Self {
			card: parse("div.grid__item[data-product-id]"),
			title: parse(".grid-product__title"),
			price: parse(".grid-product__price .money"),
			link: parse("a.grid-product__link"),
			image: parse("img.grid-product__image"),
			secondary: parse(".grid-product__secondary-image img"),
			noscript: parse("noscript"),
			img: parse("img"),
			product_data: parse(".banana-container[data-product-data]"),
		}
	}
}

/// Shape of the percent-encoded JSON on `.banana-container`
#[derive(Deserialize)]
struct ProductData {
	#[serde(default)]
	tags: Vec<String>,
	#[serde(default)]
	variants: Vec<Variant>,
}

#[derive(Deserialize)]
struct Variant {
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	in_stock: bool,
}

pub struct DrmersScraper {
	client: Client,
	url: Url,
}

impl DrmersScraper {
	pub fn new(client: Client) -> Result<Self> {
		Ok(Self {
			client,
			url: Url::parse(COLLECTION_URL)?,
		})
	}
}

impl Scraper for DrmersScraper {
	fn name(&self) -> &str {
		"drmers"
	}

	fn scrape(&self) -> Result<Vec<RawProduct>> {
		let html = fetch_page(&self.client, &self.url)?;
		parse_listing(&html, &self.url).context("Failed to parse drmers listing")
	}
}

pub fn parse_listing(html: &str, base: &Url) -> Result<Vec<RawProduct>> {
	let sel = Selectors::new();
	let doc = Html::parse_document(html);
	let mut seen = HashSet::new();
	let mut products = Vec::new();

	for card in doc.select(&sel.card) {
		let title = card.select(&sel.title).next().map(text_of).filter(|s| !s.is_empty());
		let price = card.select(&sel.price).next().map(text_of).filter(|s| !s.is_empty());
		let url = card
			.select(&sel.link)
			.next()
			.and_then(|a| a.value().attr("href"))
			.and_then(|href| resolve(base, href));

		let (Some(title), Some(price), Some(url)) = (title, price, url) else {
			ui::debug("Skipping incomplete drmers card");
			continue;
		};
		if !seen.insert(url.clone()) {
			ui::debug(&format!("Skipping duplicate URL: {}", url));
			continue;
		}

		let image_url = pick_image_url(card, &sel, base).unwrap_or_default();
		if image_url.is_empty() {
			ui::warn(&format!("No image for: {}", title));
		}

		let (tags, sizes) = product_data(card, &sel);
		products.push(RawProduct {
			title,
			price: Some(price),
			url,
			image_url,
			tags,
			sizes,
		});
	}

	Ok(products)
}

/// Primary image, then secondary image, then the `<noscript>` fallback
fn pick_image_url(card: ElementRef, sel: &Selectors, base: &Url) -> Option<String> {
	let from_img = |img: ElementRef| -> Option<String> {
		let attrs = img.value();
		if let Some(srcset) = attrs.attr("data-srcset").or_else(|| attrs.attr("srcset")) {
			if let Some(last) = last_srcset_entry(srcset) {
				return Some(absolute_cdn(last));
			}
		}
		attrs.attr("src").filter(|s| !s.is_empty()).and_then(|src| {
			if src.starts_with("http") {
				Some(src.to_string())
			} else {
				resolve(base, src)
			}
		})
	};

	if let Some(url) = card.select(&sel.image).next().and_then(from_img) {
		return Some(url);
	}
	if let Some(url) = card.select(&sel.secondary).next().and_then(from_img) {
		return Some(url);
	}

	// Scripting-enabled parsing keeps <noscript> content as raw text
	for noscript in card.select(&sel.noscript) {
		let fragment = Html::parse_fragment(&noscript.inner_html());
		let src = fragment
			.select(&sel.img)
			.next()
			.and_then(|img| img.value().attr("src").map(str::to_string));
		if let Some(src) = src {
			return if src.starts_with("http") { Some(src) } else { resolve(base, &src) };
		}
	}
	None
}

/// Shopify CDN srcsets are protocol-relative (`//cdn.shopify.com/...`)
fn absolute_cdn(url: &str) -> String {
	if url.starts_with("http") {
		url.to_string()
	} else {
		format!("https:{}", url)
	}
}

fn product_data(card: ElementRef, sel: &Selectors) -> (Vec<String>, Vec<SizeVariant>) {
	let Some(raw) = card
		.select(&sel.product_data)
		.next()
		.and_then(|el| el.value().attr("data-product-data"))
	else {
		return (Vec::new(), Vec::new());
	};

	let parsed = urlencoding::decode(raw)
		.map_err(|e| e.to_string())
		.and_then(|json| serde_json::from_str::<ProductData>(&json).map_err(|e| e.to_string()));

	match parsed {
		Ok(data) => {
			let sizes = data
				.variants
				.into_iter()
				.map(|v| SizeVariant {
					size: v.name.unwrap_or_default(),
					in_stock: v.in_stock,
				})
				.collect();
			(data.tags, sizes)
		}
		Err(e) => {
			ui::error(&format!("Bad product-data JSON: {}", e));
			(Vec::new(), Vec::new())
		}
	}
}
