//! The set of loaded sources a server answers from, and its hot swap

use std::sync::{Arc, RwLock};

use crate::config::SourcePaths;
use crate::core::QueryResult;
use crate::error::{RecommendError, Result};
use crate::search::{common_dimension, recommend};
use crate::storage::IndexStore;

/// Immutable snapshot of every configured source
#[derive(Debug)]
pub struct Catalog {
	sources: Vec<IndexStore>,
	dimension: Option<usize>,
}

impl Catalog {
	/// Load every source; any failure fails the whole catalog.
	/// `expected` is the embedding dimension queries will have.
	pub fn load(paths: &[SourcePaths], expected: Option<usize>) -> Result<Self> {
		let sources = paths
			.iter()
			.map(|p| IndexStore::open(&p.name, &p.index, &p.metas))
			.collect::<Result<Vec<_>>>()?;
		Self::from_sources(sources, expected)
	}

	pub fn from_sources(sources: Vec<IndexStore>, expected: Option<usize>) -> Result<Self> {
		let dimension = common_dimension(&sources)?;
		if let (Some(expected), Some(actual)) = (expected, dimension) {
			if expected != actual {
				return Err(RecommendError::DimensionMismatch { expected, actual });
			}
		}
		Ok(Self { sources, dimension })
	}

	pub fn sources(&self) -> &[IndexStore] {
		&self.sources
	}

	pub fn dimension(&self) -> Option<usize> {
		self.dimension
	}

	/// Total products across sources
	pub fn len(&self) -> usize {
		self.sources.iter().map(IndexStore::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn recommend(&self, query: &[f32], k: usize) -> Result<Vec<QueryResult>> {
		recommend(query, k, &self.sources)
	}
}

/// Shared handle; readers take an `Arc` snapshot, reload replaces it whole
pub struct CatalogHandle {
	current: RwLock<Arc<Catalog>>,
	paths: Vec<SourcePaths>,
	expected: Option<usize>,
}

impl CatalogHandle {
	pub fn new(catalog: Catalog, paths: Vec<SourcePaths>, expected: Option<usize>) -> Self {
		Self {
			current: RwLock::new(Arc::new(catalog)),
			paths,
			expected,
		}
	}

	pub fn snapshot(&self) -> Arc<Catalog> {
		let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
		Arc::clone(&guard)
	}

	/// Replace the catalog, returning the previous one
	pub fn swap(&self, next: Catalog) -> Arc<Catalog> {
		let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
		std::mem::replace(&mut *guard, Arc::new(next))
	}

	/// Re-read every source from disk. On failure the current catalog stays.
	pub fn reload(&self) -> Result<Arc<Catalog>> {
		let next = Catalog::load(&self.paths, self.expected)?;
		self.swap(next);
		Ok(self.snapshot())
	}
}
