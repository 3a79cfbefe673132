//! Single-source batch pipeline: scrape, embed, build, persist
//!
//! Every stage writes its output before the next one starts, so a crash
//! during embedding still leaves the raw scrape on disk, and an index can be
//! rebuilt from the vector checkpoint without touching the network.

use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use crate::config::SourcePaths;
use crate::core::{normalize_all, CorpusEntry, ProductMetadata};
use crate::models::Embedder;
use crate::storage::{artifacts, persist, FlatIndex};
use crate::ui;

use super::corpus::{CorpusBuilder, CorpusStats};
use super::fetch::ImageSource;
use super::scrape::Scraper;

#[derive(Debug, Clone)]
pub struct PipelineReport {
	pub source: String,
	pub scraped: usize,
	pub stats: CorpusStats,
	pub indexed: usize,
	pub dimension: usize,
	pub duration: Duration,
}

pub struct Pipeline<'a> {
	scraper: &'a dyn Scraper,
	images: &'a dyn ImageSource,
	embedder: &'a dyn Embedder,
	workers: usize,
}

impl<'a> Pipeline<'a> {
	pub fn new(scraper: &'a dyn Scraper, images: &'a dyn ImageSource, embedder: &'a dyn Embedder) -> Self {
		Self {
			scraper,
			images,
			embedder,
			workers: crate::config::DEFAULT_FETCH_WORKERS,
		}
	}

	pub fn workers(mut self, workers: usize) -> Self {
		self.workers = workers;
		self
	}

	pub fn run(&self, paths: &SourcePaths) -> Result<PipelineReport> {
		let start = Instant::now();

		ui::header(&format!("─── Scrape: {} ───", self.scraper.name()));
		let products = self.scraper.scrape().context("Scrape failed")?;
		artifacts::save_products(&paths.products, &products)?;
		ui::success(&format!("Scraped {} products → {}", products.len(), paths.products.display()));

		ui::header("─── Embed ───");
		let (entries, stats) = CorpusBuilder::new(self.images, self.embedder)
			.workers(self.workers)
			.build(&products)?;
		artifacts::save_vectors(&paths.vectors, &entries)?;
		ui::success(&format!("Embedded {} products → {}", entries.len(), paths.vectors.display()));

		ui::header("─── Index ───");
		let index = build_and_persist(entries, Some(self.embedder.dimension()), paths)?;

		Ok(PipelineReport {
			source: paths.name.clone(),
			scraped: products.len(),
			stats,
			indexed: index.len(),
			dimension: index.dimension(),
			duration: start.elapsed(),
		})
	}
}

/// Rebuild the index from a saved `<source>_product_vectors.json`
pub fn rebuild_from_vectors(paths: &SourcePaths, dimension: Option<usize>) -> Result<PipelineReport> {
	let start = Instant::now();

	ui::header("─── Index ───");
	let entries = artifacts::load_vectors(&paths.vectors)?;
	ui::info(&format!("Loaded {} vectors from {}", entries.len(), paths.vectors.display()));

	let count = entries.len();
	let index = build_and_persist(entries, dimension, paths)?;

	Ok(PipelineReport {
		source: paths.name.clone(),
		scraped: count,
		stats: CorpusStats {
			total: count,
			embedded: count,
			..Default::default()
		},
		indexed: index.len(),
		dimension: index.dimension(),
		duration: start.elapsed(),
	})
}

/// Normalize, build, and atomically replace the source's index pair.
/// An empty corpus still produces an (empty) index.
pub fn build_and_persist(entries: Vec<CorpusEntry>, dimension: Option<usize>, paths: &SourcePaths) -> Result<FlatIndex> {
	let (metas, mut vectors): (Vec<ProductMetadata>, Vec<Vec<f32>>) =
		entries.into_iter().map(|e| (e.meta, e.vector)).unzip();

	normalize_all(&mut vectors);

	let index = match dimension {
		Some(dim) => FlatIndex::with_dimension(dim, &vectors),
		None => FlatIndex::build(&vectors),
	}
	.context("Failed to build index")?;

	if index.is_empty() {
		ui::warn("No products were embedded; writing an empty index");
	}

	persist(&index, &metas, &paths.index, &paths.metas)?;
	ui::success(&format!(
		"Indexed {} vectors (dim {}) → {}",
		index.len(),
		index.dimension(),
		paths.index.display()
	));
	Ok(index)
}
