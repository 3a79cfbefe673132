//! Recommend command - query every source with a local image

use anyhow::{Context, Result};
use colored::*;
use std::path::Path;
use std::time::Instant;

use crate::config::resolve_sources;
use crate::core::QueryResult;
use crate::models::Embedder;
use crate::runtime::RuntimeOptions;
use crate::serve::Catalog;
use crate::ui;

pub fn run(image: &Path, k: usize, data_dir: &Path, sources: &[String], runtime: &RuntimeOptions) -> Result<()> {
	let paths = resolve_sources(data_dir, sources);
	if paths.is_empty() {
		ui::warn(&format!(
			"No indices found in {}. Run 'stylemate build' first.",
			data_dir.display()
		));
		return Ok(());
	}

	let names: Vec<_> = paths.iter().map(|p| p.name.as_str()).collect();
	ui::debug(&format!("Sources: {}", names.join(", ")));

	let bytes = std::fs::read(image).with_context(|| format!("Failed to read {}", image.display()))?;
	let encoder = super::load_encoder(runtime)?;
	let catalog = Catalog::load(&paths, Some(encoder.dimension())).context("Failed to load indices")?;

	let start = Instant::now();
	ui::info(&format!("Searching {} products similar to {}", catalog.len(), image.display()));
	let query = encoder.embed(&bytes)?;
	let results = catalog.recommend(query.as_slice(), k)?;

	if results.is_empty() {
		ui::warn("No matches found");
		return Ok(());
	}

	ui::success(&format!(
		"Found {} matches in {}ms",
		results.len(),
		start.elapsed().as_millis()
	));
	println!();
	print_results(&results);
	println!();
	Ok(())
}

fn print_results(results: &[QueryResult]) {
	for (i, result) in results.iter().enumerate() {
		let rank = format!("#{}", i + 1).bright_blue().bold();
		let link = ui::url_link(&result.meta.url, &result.meta.title, 60);
		let price = result.meta.price.as_deref().unwrap_or("n/a").yellow();
		let score = format!("{:.0}%", result.score * 100.0).dimmed();
		println!("  {} {} {} {}", rank, link, price, score);
	}
}
