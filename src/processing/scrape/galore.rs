//! Galore YYZ: Shopify "Dawn" card theme

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

use super::{fetch_page, last_srcset_entry, resolve, text_of, Scraper};
use crate::core::RawProduct;
use crate::ui;

pub const COLLECTION_URL: &str = "https://galoreyyz.com/collections/shop-all";

struct Selectors {
	content: Selector,
	title_link: Selector,
	sale: Selector,
	regular: Selector,
	img: Selector,
}

impl Selectors {
	fn new() -> Self {
		let parse = |s: &str| Selector::parse(s).expect("valid selector");
		Self {
			content: parse("div.card__content"),
			title_link: parse("h3.card__heading a.full-unstyled-link"),
			sale: parse(".price-item--sale"),
			regular: parse(".price-item--regular"),
			img: parse("img"),
		}
	}
}

pub struct GaloreScraper {
	client: Client,
	url: Url,
}

impl GaloreScraper {
	pub fn new(client: Client) -> Result<Self> {
		Ok(Self {
			client,
			url: Url::parse(COLLECTION_URL)?,
		})
	}
}

impl Scraper for GaloreScraper {
	fn name(&self) -> &str {
		"galore"
	}

	fn scrape(&self) -> Result<Vec<RawProduct>> {
		let html = fetch_page(&self.client, &self.url)?;
		parse_listing(&html, &self.url).context("Failed to parse galore listing")
	}
}

pub fn parse_listing(html: &str, base: &Url) -> Result<Vec<RawProduct>> {
	let sel = Selectors::new();
	let doc = Html::parse_document(html);
	let mut seen = HashSet::new();
	let mut products = Vec::new();

	for content in doc.select(&sel.content) {
		let Some(card) = enclosing_card(content) else {
			continue;
		};
		let Some(link) = content.select(&sel.title_link).next() else {
			ui::debug("Skipping a card without a title link");
			continue;
		};

		let title = text_of(link);
		let href = link.value().attr("href").map(str::trim).unwrap_or_default();
		if href.is_empty() {
			ui::debug(&format!("Skipping {:?}: missing href", title));
			continue;
		}
		let Some(url) = resolve(base, href) else {
			continue;
		};
		if !seen.insert(url.clone()) {
			continue;
		}

		let image_url = image_url(card, &sel, base).unwrap_or_default();
		if image_url.is_empty() {
			ui::warn(&format!("No image found for product: {}", title));
		}

		products.push(RawProduct {
			title,
			price: price(content, &sel),
			url,
			image_url,
			tags: Vec::new(),
			sizes: Vec::new(),
		});
	}

	Ok(products)
}

fn enclosing_card(content: ElementRef) -> Option<ElementRef> {
	content
		.ancestors()
		.filter_map(ElementRef::wrap)
		.find(|el| el.value().name() == "div" && el.value().classes().any(|c| c == "card"))
}

/// Sale price wins over the regular price
fn price(content: ElementRef, sel: &Selectors) -> Option<String> {
	[&sel.sale, &sel.regular]
		.into_iter()
		.filter_map(|s| content.select(s).next().map(text_of))
		.find(|text| !text.is_empty())
}

fn image_url(card: ElementRef, sel: &Selectors, base: &Url) -> Option<String> {
	let img = card.select(&sel.img).next()?;
	let attrs = img.value();

	if let Some(srcset) = attrs.attr("data-srcset").or_else(|| attrs.attr("srcset")) {
		if let Some(last) = last_srcset_entry(srcset) {
			return if last.starts_with("http") { Some(last.to_string()) } else { resolve(base, last) };
		}
	}

	let src = attrs.attr("src").filter(|s| !s.is_empty())?;
	if src.starts_with("http") {
		Some(src.to_string())
	} else {
		resolve(base, src)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const LISTING: &str = r#"
	<ul>
	  <li><div class="card card--standard">
	    <div class="card__inner"><img srcset="//galoreyyz.com/cdn/hoodie_165.jpg 165w, //galoreyyz.com/cdn/hoodie_533.jpg 533w" src="//galoreyyz.com/cdn/hoodie.jpg"></div>
	    <div class="card__content">
	      <h3 class="card__heading"><a class="full-unstyled-link" href="/products/hoodie"> Heavy Hoodie </a></h3>
	      <span class="price-item price-item--regular">$120.00</span>
	      <span class="price-item price-item--sale">$90.00</span>
	    </div>
	  </div></li>
	  <li><div class="card">
	    <div class="card__content">
	      <h3 class="card__heading"><a class="full-unstyled-link" href="/products/hoodie">Heavy Hoodie again</a></h3>
	    </div>
	  </div></li>
	  <li><div class="card">
	    <img src="https://cdn.example/beanie.jpg">
	    <div class="card__content">
	      <h3 class="card__heading"><a class="full-unstyled-link" href="/products/beanie">Beanie</a></h3>
	      <span class="price-item price-item--sale"> </span>
	      <span class="price-item price-item--regular">$35.00</span>
	    </div>
	  </div></li>
	  <li><div class="card">
	    <div class="card__content">
	      <h3 class="card__heading"><a class="full-unstyled-link" href="">Ghost</a></h3>
	    </div>
	  </div></li>
	  <li><div class="card__content">
	      <h3 class="card__heading"><a class="full-unstyled-link" href="/products/orphan">Orphan</a></h3>
	  </div></li>
	</ul>"#;

	fn parse() -> Vec<RawProduct> {
		let base = Url::parse(COLLECTION_URL).unwrap();
		parse_listing(LISTING, &base).unwrap()
	}

	#[test]
	fn keeps_unique_cards_with_links() {
		let titles: Vec<_> = parse().into_iter().map(|p| p.title).collect();
		assert_eq!(titles, vec!["Heavy Hoodie", "Beanie"]);
	}

	#[test]
	fn prefers_sale_price_when_present() {
		let products = parse();
		assert_eq!(products[0].price.as_deref(), Some("$90.00"));
		assert_eq!(products[1].price.as_deref(), Some("$35.00"));
	}

	#[test]
	fn resolves_images_against_catalog() {
		let products = parse();
		assert_eq!(products[0].url, "https://galoreyyz.com/products/hoodie");
		assert_eq!(products[0].image_url, "https://galoreyyz.com/cdn/hoodie_533.jpg");
		assert_eq!(products[1].image_url, "https://cdn.example/beanie.jpg");
		assert!(products[0].tags.is_empty() && products[0].sizes.is_empty());
	}
}
