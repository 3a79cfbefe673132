//! Check command - verify every source loads cleanly

use anyhow::{bail, Result};
use colored::*;
use std::path::Path;

use crate::config::resolve_sources;
use crate::search::common_dimension;
use crate::storage::IndexStore;
use crate::ui;

pub fn run(data_dir: &Path, sources: &[String]) -> Result<()> {
	let paths = resolve_sources(data_dir, sources);
	if paths.is_empty() {
		ui::warn(&format!("No indices found in {}", data_dir.display()));
		return Ok(());
	}

	let mut loaded = Vec::new();
	let mut failures = 0;

	for source in &paths {
		match IndexStore::open(&source.name, &source.index, &source.metas) {
			Ok(store) => {
				ui::success(&format!(
					"{} {} {}",
					source.name,
					format!("{} products", store.len()),
					format!("dim {}", store.index().dimension()).dimmed()
				));
				loaded.push(store);
			}
			Err(e) => {
				ui::error(&format!("{}: {} [{}]", source.name, e, e.kind().as_str()));
				failures += 1;
			}
		}
	}

	if let Err(e) = common_dimension(&loaded) {
		ui::error(&format!("Sources are not comparable: {}", e));
		failures += 1;
	}

	if failures > 0 {
		bail!("Integrity check failed with {} problem(s)", failures);
	}
	ui::success(&format!("All {} sources OK", paths.len()));
	Ok(())
}
