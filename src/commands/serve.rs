//! Serve command - HTTP recommendations

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::resolve_sources;
use crate::models::Embedder;
use crate::runtime::RuntimeOptions;
use crate::serve::{Catalog, CatalogHandle, ServeConfig};
use crate::ui;

pub struct ServeArgs<'a> {
	pub bind: String,
	pub data_dir: &'a Path,
	pub sources: &'a [String],
	pub max_inflight: usize,
	pub timeout_secs: u64,
}

pub fn run(args: ServeArgs, runtime: &RuntimeOptions) -> Result<()> {
	ui::banner();

	let paths = resolve_sources(args.data_dir, args.sources);
	if paths.is_empty() {
		ui::warn(&format!(
			"No indices found in {}; every query will return an empty list",
			args.data_dir.display()
		));
	}

	// A corpus that fails to load is never served
	let catalog = Catalog::load(&paths, None).context("Refusing to serve")?;
	for source in catalog.sources() {
		ui::info(&format!("{}: {} products", source.name(), source.len()));
	}

	let encoder = super::load_encoder(runtime)?;
	let dimension = encoder.dimension();
	if let Some(indexed) = catalog.dimension() {
		if indexed != dimension {
			bail!(
				"Refusing to serve: indices hold {}-d vectors but the model produces {}-d",
				indexed,
				dimension
			);
		}
	}

	let handle = CatalogHandle::new(catalog, paths, Some(dimension));
	let config = ServeConfig {
		bind: args.bind,
		max_inflight: args.max_inflight.max(1),
		timeout: Duration::from_secs(args.timeout_secs.max(1)),
	};

	let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
	rt.block_on(crate::serve::run(config, handle, Arc::new(encoder)))
}
