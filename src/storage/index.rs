//! Exact flat inner-product index
//!
//! Vectors are stored row-major in one buffer. Search scores every row, so
//! build and query are both O(N·D). Callers normalize before `build`; the
//! index never renormalizes, which keeps index-time and query-time metrics
//! identical.

use std::cmp::Ordering;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{RecommendError, Result};

const MAGIC: &str = "SMFI";
const FORMAT_VERSION: u32 = 2;

/// One search hit: similarity score and the vector's insertion ordinal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
	pub score: f32,
	pub ordinal: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
	dim: usize,
	data: Vec<f32>,
}

impl FlatIndex {
	/// Build from a fixed vector set, taking the dimension from the first vector.
	/// An empty set yields an empty index of unknown dimension.
	pub fn build(vectors: &[Vec<f32>]) -> Result<Self> {
		let dim = vectors.first().map(|v| v.len()).unwrap_or(0);
		Self::with_dimension(dim, vectors)
	}

	/// Build with an explicit dimension; every vector must match it
	pub fn with_dimension(dim: usize, vectors: &[Vec<f32>]) -> Result<Self> {
		if dim == 0 && !vectors.is_empty() {
			return Err(RecommendError::InvalidArgument(
				"vectors must have at least one component".into(),
			));
		}

		let mut data = Vec::with_capacity(dim * vectors.len());
		for v in vectors {
			if v.len() != dim {
				return Err(RecommendError::DimensionMismatch {
					expected: dim,
					actual: v.len(),
				});
			}
			data.extend_from_slice(v);
		}

		Ok(Self { dim, data })
	}

	pub fn dimension(&self) -> usize {
		self.dim
	}

	/// Number of indexed vectors
	pub fn len(&self) -> usize {
		if self.dim == 0 {
			0
		} else {
			self.data.len() / self.dim
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn vector(&self, ordinal: usize) -> Option<&[f32]> {
		if ordinal >= self.len() {
			return None;
		}
		let start = ordinal * self.dim;
		Some(&self.data[start..start + self.dim])
	}

	/// Top-k by inner product, descending by score, ties by ascending ordinal.
	/// Returns `min(k, N)` hits; an empty index always returns no hits.
	pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>> {
		if k == 0 {
			return Err(RecommendError::InvalidArgument("k must be at least 1".into()));
		}
		if self.dim != 0 && query.len() != self.dim {
			return Err(RecommendError::DimensionMismatch {
				expected: self.dim,
				actual: query.len(),
			});
		}
		if self.is_empty() {
			return Ok(Vec::new());
		}

		let mut hits: Vec<Hit> = self
			.data
			.chunks_exact(self.dim)
			.enumerate()
			.map(|(ordinal, row)| Hit {
				score: crate::core::embedding::dot(row, query),
				ordinal,
			})
			.collect();

		if k < hits.len() {
			hits.select_nth_unstable_by(k - 1, rank);
			hits.truncate(k);
		}
		hits.sort_by(rank);

		Ok(hits)
	}

	/// Serialize to the on-disk blob. `metadata_checksum` is the xxh3 of the
	/// metadata file written alongside, so a load can tell whether the pair
	/// came from the same build.
	pub fn to_bytes(&self, metadata_checksum: u64) -> std::result::Result<Vec<u8>, String> {
		let file = IndexFile {
			magic: MAGIC.to_string(),
			version: FORMAT_VERSION,
			dimension: self.dim,
			count: self.len(),
			created: Utc::now().to_rfc3339(),
			checksum: checksum(&self.data),
			metadata_checksum,
			data: self.data.clone(),
		};
		rmp_serde::to_vec(&file).map_err(|e| format!("index serialization failed: {}", e))
	}

	/// Parse a blob written by `to_bytes`, verifying its header and checksum.
	/// Returns the index with the metadata checksum it was written against.
	/// Errors are bare reasons; the store attaches the file path.
	pub fn from_bytes(bytes: &[u8]) -> std::result::Result<(Self, u64), String> {
		let file: IndexFile =
			rmp_serde::from_slice(bytes).map_err(|e| format!("not an index file: {}", e))?;

		if file.magic != MAGIC {
			return Err(format!("bad magic {:?}", file.magic));
		}
		if file.version != FORMAT_VERSION {
			return Err(format!("unsupported index version {}", file.version));
		}
		if file.dimension == 0 && file.count > 0 {
			return Err(format!("{} vectors of dimension 0", file.count));
		}
		if file.dimension.checked_mul(file.count) != Some(file.data.len()) {
			return Err(format!(
				"payload holds {} floats, header says {}x{}",
				file.data.len(),
				file.count,
				file.dimension
			));
		}
		if checksum(&file.data) != file.checksum {
			return Err("checksum mismatch".into());
		}

		let index = Self {
			dim: file.dimension,
			data: file.data,
		};
		Ok((index, file.metadata_checksum))
	}
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
	magic: String,
	version: u32,
	dimension: usize,
	count: usize,
	created: String,
	checksum: u64,
	metadata_checksum: u64,
	data: Vec<f32>,
}

fn rank(a: &Hit, b: &Hit) -> Ordering {
	b.score.total_cmp(&a.score).then(a.ordinal.cmp(&b.ordinal))
}

fn checksum(data: &[f32]) -> u64 {
	let mut bytes = Vec::with_capacity(data.len() * 4);
	for v in data {
		bytes.extend_from_slice(&v.to_le_bytes());
	}
	xxh3_64(&bytes)
}
