//! Styles command - build and query style reference vectors

use anyhow::{Context, Result};
use colored::*;
use std::path::Path;
use std::time::Instant;

use crate::models::Embedder;
use crate::runtime::RuntimeOptions;
use crate::storage::artifacts;
use crate::styles::{StyleReferences, StyleScore};
use crate::ui;

pub fn build(dir: &Path, output: &Path, runtime: &RuntimeOptions) -> Result<()> {
	ui::banner();
	let start = Instant::now();

	let encoder = super::load_encoder(runtime)?;
	ui::info(&format!("Building style references from {}", dir.display()));
	let (references, stats) = StyleReferences::build(dir, &encoder)?;

	if references.is_empty() {
		ui::warn("No style produced a reference vector");
	}
	artifacts::save_references(output, &references)?;

	ui::summary(references.len(), stats.skipped + stats.empty.len(), stats.failed, start.elapsed());
	ui::success(&format!(
		"{} styles from {} images -> {}",
		references.len(),
		stats.embedded,
		output.display()
	));
	Ok(())
}

pub fn predict(image: &Path, references: &Path, runtime: &RuntimeOptions) -> Result<()> {
	let refs = artifacts::load_references(references)
		.with_context(|| format!("Run 'stylemate styles build' to create {}", references.display()))?;
	if refs.is_empty() {
		ui::warn("No match: the reference file holds no styles");
		return Ok(());
	}

	let bytes = std::fs::read(image).with_context(|| format!("Failed to read {}", image.display()))?;
	let encoder = super::load_encoder(runtime)?;
	let query = encoder.embed(&bytes)?;
	let scores = refs.classify(query.as_slice())?;

	println!();
	print_scores(&scores);
	println!();
	if let Some(best) = scores.first() {
		ui::success(&format!("Predicted style: {} ({:.4})", best.style.bold(), best.score));
	}
	Ok(())
}

fn print_scores(scores: &[StyleScore]) {
	let width = scores.iter().map(|s| s.style.len()).max().unwrap_or(0);
	for score in scores {
		println!(
			"  {:<width$} {}",
			score.style.yellow(),
			format!("{:.4}", score.score).dimmed(),
			width = width
		);
	}
}
