//! Product corpus building: raw listings in, `(metadata, vector)` entries out

use colored::*;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::core::{CorpusEntry, ProductMetadata, RawProduct};
use crate::models::Embedder;
use crate::ui;

use super::fetch::ImageSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorpusStats {
	pub total: usize,
	pub embedded: usize,
	pub skipped_no_image: usize,
	pub fetch_failed: usize,
	pub embed_failed: usize,
}

impl CorpusStats {
	pub fn failed(&self) -> usize {
		self.fetch_failed + self.embed_failed
	}
}

enum Outcome {
	Embedded(CorpusEntry),
	NoImage,
	FetchFailed(String),
	EmbedFailed(String),
}

pub struct CorpusBuilder<'a> {
	images: &'a dyn ImageSource,
	embedder: &'a dyn Embedder,
	workers: usize,
}

impl<'a> CorpusBuilder<'a> {
	pub fn new(images: &'a dyn ImageSource, embedder: &'a dyn Embedder) -> Self {
		Self {
			images,
			embedder,
			workers: 1,
		}
	}

	/// Number of concurrent image downloads
	pub fn workers(mut self, workers: usize) -> Self {
		self.workers = workers.max(1);
		self
	}

	/// Fetch and embed every product that has an image. Failures are logged
	/// and skipped; entries keep the input order.
	pub fn build(&self, products: &[RawProduct]) -> anyhow::Result<(Vec<CorpusEntry>, CorpusStats)> {
		let total = products.len();
		let done = AtomicUsize::new(0);
		let ok = AtomicUsize::new(0);
		let failed = AtomicUsize::new(0);

		let pool = rayon::ThreadPoolBuilder::new()
			.num_threads(self.workers)
			.thread_name(|i| format!("fetch-{}", i))
			.build()?;

		let outcomes: Vec<Outcome> = pool.install(|| {
			products
				.par_iter()
				.map(|product| {
					let outcome = self.process(product);
					let n = done.fetch_add(1, Ordering::Relaxed) + 1;
					let queue = format!("[{}/{}]", n, total).bright_blue().bold();
					match &outcome {
						Outcome::Embedded(_) => {
							let good = ok.fetch_add(1, Ordering::Relaxed) + 1;
							ui::success(&format!(
								"{} {} {}",
								queue,
								product.title,
								format!("({} ok, {} failed)", good, failed.load(Ordering::Relaxed)).dimmed()
							));
						}
						Outcome::NoImage => {
							ui::warn(&format!("{} {}: no image_url, skipped", queue, product.title));
						}
						Outcome::FetchFailed(reason) | Outcome::EmbedFailed(reason) => {
							let bad = failed.fetch_add(1, Ordering::Relaxed) + 1;
							ui::error(&format!(
								"{} {}: {} {}",
								queue,
								product.title,
								reason,
								format!("({} ok, {} failed)", ok.load(Ordering::Relaxed), bad).dimmed()
							));
						}
					}
					outcome
				})
				.collect()
		});

		let mut stats = CorpusStats {
			total,
			..Default::default()
		};
		let mut entries = Vec::with_capacity(outcomes.len());
		for outcome in outcomes {
			match outcome {
				Outcome::Embedded(entry) => {
					stats.embedded += 1;
					entries.push(entry);
				}
				Outcome::NoImage => stats.skipped_no_image += 1,
				Outcome::FetchFailed(_) => stats.fetch_failed += 1,
				Outcome::EmbedFailed(_) => stats.embed_failed += 1,
			}
		}

		Ok((entries, stats))
	}

	fn process(&self, product: &RawProduct) -> Outcome {
		if !product.has_image() {
			return Outcome::NoImage;
		}

		let start = Instant::now();
		let bytes = match self.images.fetch(&product.image_url) {
			Ok(bytes) => bytes,
			Err(e) => return Outcome::FetchFailed(e.to_string()),
		};

		// Encoders serialize internally; only decode and preprocessing overlap
		let embedding = match self.embedder.embed(&bytes) {
			Ok(embedding) => embedding,
			Err(e) => return Outcome::EmbedFailed(e.to_string()),
		};

		let expected = self.embedder.dimension();
		if embedding.dim() != expected {
			return Outcome::EmbedFailed(format!(
				"embedding has {} dimensions, expected {}",
				embedding.dim(),
				expected
			));
		}

		ui::debug(&format!("{} embedded in {}ms", product.url, start.elapsed().as_millis()));
		Outcome::Embedded(CorpusEntry {
			meta: ProductMetadata::summary(product),
			vector: embedding.into_vec(),
		})
	}
}
