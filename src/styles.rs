//! Style references
//!
//! Every folder under the style directory names a style. Its images are
//! embedded, averaged and re-normalized into one reference vector. A query
//! is classified by inner product against each reference; both sides are
//! unit length, so that is cosine similarity.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::config::STYLE_IMAGE_EXTS;
use crate::core::embedding::{dot, normalize_in_place};
use crate::error::RecommendError;
use crate::models::Embedder;
use crate::ui;

/// Style name to unit-length reference vector, serialized as a JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleReferences(BTreeMap<String, Vec<f32>>);

#[derive(Debug, Clone, PartialEq)]
pub struct StyleScore {
	pub style: String,
	pub score: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleBuildStats {
	pub embedded: usize,
	pub failed: usize,
	pub skipped: usize,
	/// Style folders without a single usable image
	pub empty: Vec<String>,
}

impl StyleReferences {
	/// Embed every style folder under `dir` and average each into a reference
	pub fn build(dir: &Path, embedder: &dyn Embedder) -> Result<(Self, StyleBuildStats)> {
		if !dir.is_dir() {
			bail!("Style folder {} not found", dir.display());
		}

		let mut references = BTreeMap::new();
		let mut stats = StyleBuildStats::default();

		for style_dir in entries(dir, |e| e.file_type().is_dir()) {
			let Some(name) = style_dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
				continue;
			};
			ui::debug(&format!("Processing style {}", name));

			let mut sum = vec![0.0f32; embedder.dimension()];
			let mut count = 0usize;

			for path in entries(&style_dir, |e| e.file_type().is_file()) {
				if !is_style_image(&path) {
					ui::debug(&format!("Skipping non-image {}", path.display()));
					stats.skipped += 1;
					continue;
				}

				match embed_file(&path, embedder) {
					Ok(vector) => {
						sum.iter_mut().zip(&vector).for_each(|(s, v)| *s += v);
						count += 1;
						stats.embedded += 1;
					}
					Err(reason) => {
						ui::warn(&format!("Failed to embed {}: {}", path.display(), reason));
						stats.failed += 1;
					}
				}
			}

			if count == 0 {
				ui::warn(&format!("No usable images for style {}", name));
				stats.empty.push(name);
				continue;
			}

			sum.iter_mut().for_each(|s| *s /= count as f32);
			normalize_in_place(&mut sum);
			ui::debug(&format!("{}: averaged {} images", name, count));
			references.insert(name, sum);
		}

		Ok((Self(references), stats))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn get(&self, style: &str) -> Option<&[f32]> {
		self.0.get(style).map(Vec::as_slice)
	}

	/// Score a unit query against every style, best first.
	/// Equal scores keep style-name order.
	pub fn classify(&self, query: &[f32]) -> crate::error::Result<Vec<StyleScore>> {
		let mut scores = Vec::with_capacity(self.0.len());
		for (style, reference) in &self.0 {
			if reference.len() != query.len() {
				return Err(RecommendError::DimensionMismatch {
					expected: reference.len(),
					actual: query.len(),
				});
			}
			scores.push(StyleScore {
				style: style.clone(),
				score: dot(reference, query),
			});
		}
		scores.sort_by(|a, b| b.score.total_cmp(&a.score));
		Ok(scores)
	}
}

/// Immediate children of `dir` passing `keep`, in name order
fn entries(dir: &Path, keep: impl Fn(&walkdir::DirEntry) -> bool) -> Vec<PathBuf> {
	WalkDir::new(dir)
		.min_depth(1)
		.max_depth(1)
		.sort_by_file_name()
		.into_iter()
		.filter_map(|e| e.ok())
		.filter(|e| keep(e))
		.map(|e| e.into_path())
		.collect()
}

fn is_style_image(path: &Path) -> bool {
	path.extension()
		.and_then(|e| e.to_str())
		.is_some_and(|e| STYLE_IMAGE_EXTS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

fn embed_file(path: &Path, embedder: &dyn Embedder) -> std::result::Result<Vec<f32>, String> {
	let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
	let embedding = embedder.embed(&bytes).map_err(|e| e.reason)?;
	if embedding.dim() != embedder.dimension() {
		return Err(format!("{}-d embedding, expected {}-d", embedding.dim(), embedder.dimension()));
	}
	Ok(embedding.into_vec())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::Embedding;
	use crate::error::EmbeddingError;
	use std::fs;

	/// File contents name the direction
	struct CompassEmbedder;

	impl Embedder for CompassEmbedder {
		fn dimension(&self) -> usize {
			2
		}

		fn embed(&self, bytes: &[u8]) -> std::result::Result<Embedding, EmbeddingError> {
			match bytes {
				b"east" => Ok(Embedding::new(vec![1.0, 0.0])),
				b"north" => Ok(Embedding::new(vec![0.0, 3.0])),
				_ => Err(EmbeddingError::new("cannot identify image")),
			}
		}
	}

	fn style_tree() -> tempfile::TempDir {
		let dir = tempfile::tempdir().unwrap();
		let root = dir.path();
		for style in ["street", "formal", "empty"] {
			fs::create_dir(root.join(style)).unwrap();
		}
		fs::write(root.join("street/a.jpg"), "east").unwrap();
		fs::write(root.join("street/b.PNG"), "north").unwrap();
		fs::write(root.join("formal/c.jpeg"), "east").unwrap();
		fs::write(root.join("formal/notes.txt"), "east").unwrap();
		fs::write(root.join("formal/broken.jpg"), "garbage").unwrap();
		fs::write(root.join("empty/readme.md"), "nothing here").unwrap();
		fs::write(root.join("loose.jpg"), "east").unwrap();
		dir
	}

	#[test]
	fn averages_each_style_folder() {
		let dir = style_tree();
		let (refs, stats) = StyleReferences::build(dir.path(), &CompassEmbedder).unwrap();

		assert_eq!(refs.len(), 2);
		let street = refs.get("street").unwrap();
		let s = std::f32::consts::FRAC_1_SQRT_2;
		assert!((street[0] - s).abs() < 1e-6 && (street[1] - s).abs() < 1e-6);
		assert_eq!(refs.get("formal").unwrap(), &[1.0, 0.0]);

		assert_eq!(stats.embedded, 3);
		assert_eq!(stats.failed, 1);
		assert_eq!(stats.skipped, 2);
		assert_eq!(stats.empty, vec!["empty".to_string()]);
	}

	#[test]
	fn classifies_by_closest_reference() {
		let dir = style_tree();
		let (refs, _) = StyleReferences::build(dir.path(), &CompassEmbedder).unwrap();

		let east = refs.classify(&[1.0, 0.0]).unwrap();
		assert_eq!(east[0].style, "formal");
		assert!((east[0].score - 1.0).abs() < 1e-6);
		assert!((east[1].score - 0.707).abs() < 1e-3);

		let north = refs.classify(&[0.0, 1.0]).unwrap();
		assert_eq!(north[0].style, "street");
		assert!(north[1].score.abs() < 1e-6);
	}

	#[test]
	fn equal_scores_keep_name_order() {
		let refs = StyleReferences(BTreeMap::from([
			("zeta".to_string(), vec![1.0, 0.0]),
			("alpha".to_string(), vec![1.0, 0.0]),
		]));
		let scores = refs.classify(&[1.0, 0.0]).unwrap();
		assert_eq!(scores[0].style, "alpha");
		assert_eq!(scores[1].style, "zeta");
	}

	#[test]
	fn rejects_queries_of_another_dimension() {
		let refs = StyleReferences(BTreeMap::from([("street".to_string(), vec![1.0, 0.0])]));
		let err = refs.classify(&[1.0, 0.0, 0.0]).unwrap_err();
		assert!(matches!(err, RecommendError::DimensionMismatch { expected: 2, actual: 3 }));
		assert!(StyleReferences::default().classify(&[1.0]).unwrap().is_empty());
	}

	#[test]
	fn missing_folder_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		assert!(StyleReferences::build(&dir.path().join("nope"), &CompassEmbedder).is_err());
	}

	#[test]
	fn saved_as_a_json_object() {
		let dir = style_tree();
		let (refs, _) = StyleReferences::build(dir.path(), &CompassEmbedder).unwrap();
		let path = dir.path().join("out/reference_vectors.json");
		crate::storage::artifacts::save_references(&path, &refs).unwrap();

		let json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
		assert_eq!(json["formal"], serde_json::json!([1.0, 0.0]));
		assert_eq!(crate::storage::artifacts::load_references(&path).unwrap(), refs);
	}
}
