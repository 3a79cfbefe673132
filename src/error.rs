//! Typed errors for the recommendation engine
//!
//! Commands work with `anyhow`; the library surfaces these so callers can
//! tell a bad upload apart from a corrupt corpus.

use std::path::PathBuf;

/// Broad failure classes, used to pick an exit code or HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// Bad image, bad `k`, wrong query dimension. Reported, never retried.
	ClientInput,
	/// Missing or inconsistent index/metadata pair. Fatal at load time.
	CorpusIntegrity,
	/// Network failure while fetching a product image.
	TransientFetch,
	/// Anything else (I/O while persisting, task join failures).
	Internal,
}

impl ErrorKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorKind::ClientInput => "client_input",
			ErrorKind::CorpusIntegrity => "corpus_integrity",
			ErrorKind::TransientFetch => "transient_fetch",
			ErrorKind::Internal => "internal",
		}
	}
}

/// The embedding provider could not turn the bytes into a vector
#[derive(Debug, Clone, thiserror::Error)]
#[error("Embedding failed: {reason}")]
pub struct EmbeddingError {
	pub reason: String,
}

impl EmbeddingError {
	pub fn new(reason: impl Into<String>) -> Self {
		Self { reason: reason.into() }
	}
}

/// A product image could not be downloaded
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
	#[error("Request to {url} failed: {reason}")]
	Transport { url: String, reason: String },

	#[error("{url} returned HTTP {status}")]
	Status { url: String, status: u16 },

	#[error("{url} returned an empty body")]
	Empty { url: String },
}

#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	#[error("Dimension mismatch: expected {expected}, got {actual}")]
	DimensionMismatch { expected: usize, actual: usize },

	#[error(transparent)]
	Embedding(#[from] EmbeddingError),

	#[error(transparent)]
	Fetch(#[from] FetchError),

	#[error("Failed to load corpus from {path}: {reason}")]
	CorpusLoad { path: PathBuf, reason: String },

	#[error("Corpus integrity check failed: index holds {vectors} vectors but metadata has {metadata} entries")]
	CorpusIntegrity { vectors: usize, metadata: usize },

	#[error("{metadata} does not belong to {index}; they come from different builds")]
	CorpusUnpaired { index: PathBuf, metadata: PathBuf },

	#[error("Failed to persist {path}: {reason}")]
	Persist { path: PathBuf, reason: String },
}

impl RecommendError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			RecommendError::InvalidArgument(_)
			| RecommendError::DimensionMismatch { .. }
			| RecommendError::Embedding(_) => ErrorKind::ClientInput,
			RecommendError::CorpusLoad { .. }
			| RecommendError::CorpusIntegrity { .. }
			| RecommendError::CorpusUnpaired { .. } => ErrorKind::CorpusIntegrity,
			RecommendError::Fetch(_) => ErrorKind::TransientFetch,
			RecommendError::Persist { .. } => ErrorKind::Internal,
		}
	}

	pub(crate) fn load(path: &std::path::Path, reason: impl ToString) -> Self {
		RecommendError::CorpusLoad {
			path: path.to_path_buf(),
			reason: reason.to_string(),
		}
	}

	pub(crate) fn persist(path: &std::path::Path, reason: impl ToString) -> Self {
		RecommendError::Persist {
			path: path.to_path_buf(),
			reason: reason.to_string(),
		}
	}
}

pub type Result<T, E = RecommendError> = std::result::Result<T, E>;
