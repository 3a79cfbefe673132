//! # Embedding Providers
//!
//! Image bytes in, unit-length vector out. The ONNX vision encoder is the
//! production implementation; tests plug in their own.

pub mod vision;

pub use vision::VisionEncoder;

use crate::core::Embedding;
use crate::error::EmbeddingError;

/// Maps raw image bytes to a unit-normalized vector of fixed dimension.
///
/// Implementations must be safe to share across threads. Those wrapping a
/// non-reentrant model serialize calls internally.
pub trait Embedder: Send + Sync {
	fn dimension(&self) -> usize;

	fn embed(&self, image_bytes: &[u8]) -> Result<Embedding, EmbeddingError>;
}

impl<T: Embedder + ?Sized> Embedder for std::sync::Arc<T> {
	fn dimension(&self) -> usize {
		(**self).dimension()
	}

	fn embed(&self, image_bytes: &[u8]) -> Result<Embedding, EmbeddingError> {
		(**self).embed(image_bytes)
	}
}
