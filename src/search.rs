//! Multi-source recommendation
//!
//! Each source is searched independently with the same query and the same
//! `k`, then the candidate lists are merged by score. A single-source setup
//! is just a slice of one.
//!
//! Scores are only comparable across sources built with the same embedding
//! model and normalization. The engine can check dimensions but not the
//! embedding space; keeping sources consistent is the caller's job.
//!
//! Per-source `k` equals the global `k`, which is enough for an exact merge:
//! no single source can place more than `k` items in the global top-k.

use crate::core::QueryResult;
use crate::error::{RecommendError, Result};
use crate::storage::IndexStore;

/// Global top-k across all sources, descending by score.
/// Equal scores keep source order, then ordinal order.
pub fn recommend(query: &[f32], k: usize, sources: &[IndexStore]) -> Result<Vec<QueryResult>> {
	if k == 0 {
		return Err(RecommendError::InvalidArgument("k must be at least 1".into()));
	}

	// Sized from the data: `k` may be far larger than any source
	let mut candidates = Vec::with_capacity(sources.iter().map(|s| s.len().min(k)).sum());

	for source in sources {
		let hits = source.index().search(query, k)?;
		crate::ui::debug(&format!("{}: {} candidates", source.name(), hits.len()));

		for hit in hits {
			let meta = source.metas().get(hit.ordinal).ok_or(RecommendError::CorpusIntegrity {
				vectors: source.index().len(),
				metadata: source.metas().len(),
			})?;
			candidates.push(QueryResult {
				meta: meta.clone(),
				score: hit.score,
			});
		}
	}

	// Stable: preserves source-then-ordinal order among equal scores
	candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
	candidates.truncate(k);

	Ok(candidates)
}

/// Dimension shared by every non-empty source, if they agree
pub fn common_dimension(sources: &[IndexStore]) -> Result<Option<usize>> {
	let mut dim = None;
	for source in sources.iter().filter(|s| s.index().dimension() != 0) {
		let d = source.index().dimension();
		match dim {
			None => dim = Some(d),
			Some(expected) if expected != d => {
				return Err(RecommendError::DimensionMismatch { expected, actual: d });
			}
			Some(_) => {}
		}
	}
	Ok(dim)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::ProductMetadata;
	use crate::storage::FlatIndex;

	fn meta(title: &str) -> ProductMetadata {
		ProductMetadata {
			title: title.to_string(),
			price: Some("$10.00".into()),
			url: format!("https://shop.example/{}", title),
			image_url: None,
			tags: vec![],
			sizes: vec![],
		}
	}

	/// Source whose items score exactly `scores` against the query [1, 0]
	fn source(name: &str, scores: &[f32]) -> IndexStore {
		let vectors: Vec<Vec<f32>> = scores.iter().map(|&s| vec![s, (1.0 - s * s).sqrt()]).collect();
		let metas = scores.iter().enumerate().map(|(i, _)| meta(&format!("{}-{}", name, i))).collect();
		IndexStore::new(name, FlatIndex::build(&vectors).unwrap(), metas).unwrap()
	}

	#[test]
	fn merges_sources_by_score() {
		let sources = vec![source("a", &[0.9, 0.5]), source("b", &[0.8, 0.7])];
		let results = recommend(&[1.0, 0.0], 2, &sources).unwrap();

		let scores: Vec<f32> = results.iter().map(|r| r.score).collect();
		assert_eq!(results.len(), 2);
		assert!((scores[0] - 0.9).abs() < 1e-5);
		assert!((scores[1] - 0.8).abs() < 1e-5);
		assert_eq!(results[0].meta.title, "a-0");
		assert_eq!(results[1].meta.title, "b-0");
	}

	#[test]
	fn equal_scores_keep_source_order() {
		let sources = vec![source("a", &[0.6]), source("b", &[0.6])];
		let results = recommend(&[1.0, 0.0], 2, &sources).unwrap();
		assert_eq!(results[0].meta.title, "a-0");
		assert_eq!(results[1].meta.title, "b-0");
	}

	#[test]
	fn huge_k_returns_everything() {
		let sources = vec![source("a", &[0.9, 0.5]), source("b", &[0.8, 0.7])];
		for k in [usize::MAX, usize::MAX / 2 + 1] {
			let results = recommend(&[1.0, 0.0], k, &sources).unwrap();
			let titles: Vec<_> = results.iter().map(|r| r.meta.title.as_str()).collect();
			assert_eq!(titles, vec!["a-0", "b-0", "b-1", "a-1"]);
		}

		let single = recommend(&[1.0, 0.0], usize::MAX, &sources[..1]).unwrap();
		assert_eq!(single.len(), 2);
	}

	#[test]
	fn no_sources_means_no_results() {
		assert!(recommend(&[1.0, 0.0], 3, &[]).unwrap().is_empty());
	}

	#[test]
	fn zero_k_is_rejected() {
		let err = recommend(&[1.0, 0.0], 0, &[]).unwrap_err();
		assert!(matches!(err, RecommendError::InvalidArgument(_)));
	}

	#[test]
	fn dimension_mismatch_surfaces() {
		let sources = vec![source("a", &[0.9])];
		let err = recommend(&[1.0, 0.0, 0.0], 1, &sources).unwrap_err();
		assert!(matches!(err, RecommendError::DimensionMismatch { .. }));
	}

	#[test]
	fn empty_sources_do_not_affect_dimension_agreement() {
		let empty = IndexStore::new("e", FlatIndex::build(&[]).unwrap(), vec![]).unwrap();
		let sources = vec![empty, source("a", &[0.5])];
		assert_eq!(common_dimension(&sources).unwrap(), Some(2));
	}
}
