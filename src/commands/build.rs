//! Build command - scrape, embed, index one catalog

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::SourcePaths;
use crate::processing::{rebuild_from_vectors, Catalog, ImageFetcher, Pipeline};
use crate::runtime::RuntimeOptions;
use crate::ui;

pub struct BuildArgs {
	pub catalog: Catalog,
	pub source: Option<String>,
	pub input: Option<PathBuf>,
	pub data_dir: PathBuf,
	pub workers: usize,
	pub from_vectors: bool,
}

pub fn run(args: BuildArgs, runtime: &RuntimeOptions) -> Result<()> {
	ui::banner();

	let name = source_name(&args);
	let paths = SourcePaths::new(&args.data_dir, &name);
	ui::info(&format!("Source: {} ({})", name, args.data_dir.display()));

	let report = if args.from_vectors {
		rebuild_from_vectors(&paths, None)?
	} else {
		let fetcher = ImageFetcher::new()?;
		let scraper = args.catalog.scraper(fetcher.client(), args.input.as_deref())?;
		let encoder = super::load_encoder(runtime)?;

		Pipeline::new(scraper.as_ref(), &fetcher, &encoder)
			.workers(args.workers)
			.run(&paths)?
	};

	ui::summary(
		report.indexed,
		report.stats.skipped_no_image,
		report.stats.failed(),
		report.duration,
	);

	if report.stats.failed() > 0 {
		ui::warn(&format!("Completed with {} failed products", report.stats.failed()));
	} else {
		ui::success(&format!("{} ready: {} products indexed", report.source, report.indexed));
	}
	Ok(())
}

/// `--source`, else the input file's stem for replays, else the catalog name
fn source_name(args: &BuildArgs) -> String {
	if let Some(name) = &args.source {
		return name.clone();
	}
	if args.catalog == Catalog::File {
		if let Some(stem) = args.input.as_deref().and_then(input_stem) {
			return stem;
		}
	}
	args.catalog.source_name().to_string()
}

fn input_stem(path: &Path) -> Option<String> {
	let stem = path.file_stem()?.to_str()?;
	let name = stem.strip_suffix("_products").unwrap_or(stem);
	(!name.is_empty()).then(|| name.to_string())
}
