//! JSON artifacts: pipeline checkpoints and style references

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::core::{CorpusEntry, RawProduct};
use crate::styles::StyleReferences;

pub fn save_products(path: &Path, products: &[RawProduct]) -> Result<()> {
	write_json(path, products).context("Failed to write scraped products")
}

pub fn load_products(path: &Path) -> Result<Vec<RawProduct>> {
	read_json(path).context("Failed to read scraped products")
}

pub fn save_vectors(path: &Path, entries: &[CorpusEntry]) -> Result<()> {
	write_json(path, entries).context("Failed to write product vectors")
}

pub fn load_vectors(path: &Path) -> Result<Vec<CorpusEntry>> {
	read_json(path).context("Failed to read product vectors")
}

pub fn save_references(path: &Path, references: &StyleReferences) -> Result<()> {
	write_json(path, references).context("Failed to write style references")
}

pub fn load_references(path: &Path) -> Result<StyleReferences> {
	read_json(path).context("Failed to read style references")
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
	let dir = match path.parent() {
		Some(p) if !p.as_os_str().is_empty() => p,
		_ => Path::new("."),
	};
	fs::create_dir_all(dir).context("Failed to create data directory")?;

	let bytes = serde_json::to_vec_pretty(value).context("Failed to serialize")?;
	let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
	tmp.write_all(&bytes)?;
	tmp.persist(path)
		.with_context(|| format!("Failed to replace {}", path.display()))?;
	Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
	let bytes = fs::read(path).with_context(|| format!("Missing {}", path.display()))?;
	serde_json::from_slice(&bytes).with_context(|| format!("Malformed JSON in {}", path.display()))
}
