//! Index + metadata persistence
//!
//! The index blob and the metadata JSON are one unit. Both are written to
//! temporary files in the destination directory first, then renamed into
//! place. The index header carries the xxh3 of the metadata bytes it was
//! built with, so a reader that catches the pair half-replaced (or mixed by
//! hand) refuses it instead of joining ordinals to the wrong products.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use xxhash_rust::xxh3::xxh3_64;

use crate::core::ProductMetadata;
use crate::error::{RecommendError, Result};
use crate::storage::FlatIndex;

/// A loaded source: index and parallel metadata, position is the join key
#[derive(Debug, Clone)]
pub struct IndexStore {
	name: String,
	index: FlatIndex,
	metas: Vec<ProductMetadata>,
}

impl IndexStore {
	/// Pair an index with its metadata, enforcing equal lengths
	pub fn new(name: impl Into<String>, index: FlatIndex, metas: Vec<ProductMetadata>) -> Result<Self> {
		if index.len() != metas.len() {
			return Err(RecommendError::CorpusIntegrity {
				vectors: index.len(),
				metadata: metas.len(),
			});
		}
		Ok(Self {
			name: name.into(),
			index,
			metas,
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn index(&self) -> &FlatIndex {
		&self.index
	}

	pub fn metas(&self) -> &[ProductMetadata] {
		&self.metas
	}

	pub fn len(&self) -> usize {
		self.metas.len()
	}

	pub fn is_empty(&self) -> bool {
		self.metas.is_empty()
	}

	/// Load a named source; see [`load`]
	pub fn open(name: impl Into<String>, index_path: &Path, metas_path: &Path) -> Result<Self> {
		let (index, metas) = load(index_path, metas_path)?;
		Self::new(name, index, metas)
	}

	pub fn save(&self, index_path: &Path, metas_path: &Path) -> Result<()> {
		persist(&self.index, &self.metas, index_path, metas_path)
	}
}

/// Write both artifacts via temp-file + rename
pub fn persist(index: &FlatIndex, metas: &[ProductMetadata], index_path: &Path, metas_path: &Path) -> Result<()> {
	if index.len() != metas.len() {
		return Err(RecommendError::CorpusIntegrity {
			vectors: index.len(),
			metadata: metas.len(),
		});
	}

	let metas_bytes =
		serde_json::to_vec_pretty(metas).map_err(|e| RecommendError::persist(metas_path, e))?;
	let index_bytes = index
		.to_bytes(xxh3_64(&metas_bytes))
		.map_err(|e| RecommendError::persist(index_path, e))?;

	// Stage both before either becomes visible
	let index_tmp = stage(index_path, &index_bytes)?;
	let metas_tmp = stage(metas_path, &metas_bytes)?;

	index_tmp
		.persist(index_path)
		.map_err(|e| RecommendError::persist(index_path, e))?;
	metas_tmp
		.persist(metas_path)
		.map_err(|e| RecommendError::persist(metas_path, e))?;

	crate::ui::debug(&format!(
		"Persisted {} vectors -> {}, {}",
		metas.len(),
		index_path.display(),
		metas_path.display()
	));

	Ok(())
}

/// Read both artifacts and verify the ordinal correspondence
pub fn load(index_path: &Path, metas_path: &Path) -> Result<(FlatIndex, Vec<ProductMetadata>)> {
	let index_bytes = fs::read(index_path).map_err(|e| RecommendError::load(index_path, e))?;
	let (index, paired_with) =
		FlatIndex::from_bytes(&index_bytes).map_err(|e| RecommendError::load(index_path, e))?;

	let metas_bytes = fs::read(metas_path).map_err(|e| RecommendError::load(metas_path, e))?;
	let metas: Vec<ProductMetadata> =
		serde_json::from_slice(&metas_bytes).map_err(|e| RecommendError::load(metas_path, e))?;

	if metas.len() != index.len() {
		return Err(RecommendError::CorpusIntegrity {
			vectors: index.len(),
			metadata: metas.len(),
		});
	}
	if xxh3_64(&metas_bytes) != paired_with {
		return Err(RecommendError::CorpusUnpaired {
			index: index_path.to_path_buf(),
			metadata: metas_path.to_path_buf(),
		});
	}

	Ok((index, metas))
}

fn stage(target: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
	let dir = match target.parent() {
		Some(p) if !p.as_os_str().is_empty() => p,
		_ => Path::new("."),
	};
	fs::create_dir_all(dir).map_err(|e| RecommendError::persist(target, e))?;

	let mut tmp = NamedTempFile::new_in(dir).map_err(|e| RecommendError::persist(target, e))?;
	tmp.write_all(bytes).map_err(|e| RecommendError::persist(target, e))?;
	tmp.as_file().sync_all().map_err(|e| RecommendError::persist(target, e))?;
	Ok(tmp)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;

	fn meta(title: &str) -> ProductMetadata {
		ProductMetadata {
			title: title.to_string(),
			price: Some("€45,00".into()),
			url: format!("https://shop.example/products/{}", title.to_lowercase().replace(' ', "-")),
			image_url: None,
			tags: vec![],
			sizes: vec![],
		}
	}

	#[test]
	fn metadata_from_another_build_is_refused() {
		let dir = tempfile::tempdir().unwrap();
		let (index_a, metas_a) = (dir.path().join("a.index"), dir.path().join("a_metas.json"));
		let (index_b, metas_b) = (dir.path().join("b.index"), dir.path().join("b_metas.json"));

		let index = FlatIndex::build(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
		persist(&index, &[meta("Tee"), meta("Cap")], &index_a, &metas_a).unwrap();
		persist(&index, &[meta("Cap"), meta("Tee")], &index_b, &metas_b).unwrap();

		// Same count, different products: the length check alone would pass
		fs::copy(&metas_b, &metas_a).unwrap();

		let err = load(&index_a, &metas_a).unwrap_err();
		assert!(matches!(err, RecommendError::CorpusUnpaired { .. }));
		assert_eq!(err.kind(), ErrorKind::CorpusIntegrity);

		let (_, metas) = load(&index_b, &metas_b).unwrap();
		assert_eq!(metas[0].title, "Cap");
	}

	#[test]
	fn metadata_is_written_as_plain_utf8() {
		let dir = tempfile::tempdir().unwrap();
		let (index_path, metas_path) = (dir.path().join("u.index"), dir.path().join("u_metas.json"));
		let index = FlatIndex::build(&[vec![1.0, 0.0]]).unwrap();
		persist(&index, &[meta("Crème Hoodie")], &index_path, &metas_path).unwrap();

		let raw = fs::read_to_string(&metas_path).unwrap();
		assert!(raw.contains("Crème Hoodie"));
		assert!(raw.contains("€45,00"));
		assert!(!raw.contains("\\u"));
	}

	#[test]
	fn persist_refuses_unequal_lengths() {
		let dir = tempfile::tempdir().unwrap();
		let index = FlatIndex::build(&[vec![1.0, 0.0]]).unwrap();
		let err = persist(&index, &[], &dir.path().join("x.index"), &dir.path().join("x_metas.json")).unwrap_err();
		assert!(matches!(err, RecommendError::CorpusIntegrity { vectors: 1, metadata: 0 }));
		assert!(!dir.path().join("x.index").exists());
	}
}
