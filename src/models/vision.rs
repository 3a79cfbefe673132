//! Vision model (CLIP ViT-B/32) for product image embeddings

use anyhow::{Context, Result};
use image::{imageops::FilterType, DynamicImage, ImageReader};
use ndarray::Array4;
use ort::session::Session;
use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;

use crate::config::{CLIP_MEAN, CLIP_STD, EMBEDDING_DIM, INPUT_SIZE};
use crate::core::Embedding;
use crate::error::EmbeddingError;
use crate::runtime::{create_session, RuntimeOptions};

use super::Embedder;

const OUTPUT_NAMES: &[&str] = &["image_embeds", "pooler_output", "embeddings"];

pub struct VisionEncoder {
	// Sessions are not reentrant; calls queue on this lock
	session: Mutex<Session>,
	dim: usize,
}

impl VisionEncoder {
	pub fn load(model_path: &Path, options: &RuntimeOptions) -> Result<Self> {
		if !model_path.exists() {
			anyhow::bail!("Vision model file does not exist: {}", model_path.display());
		}

		crate::ui::debug(&format!("Loading vision model: {}", model_path.display()));
		let session = create_session(model_path, options).context("Failed to load vision model")?;

		Ok(Self {
			session: Mutex::new(session),
			dim: EMBEDDING_DIM,
		})
	}

	/// Load from the configured models directory
	pub fn from_config(options: &RuntimeOptions) -> Result<Self> {
		let path = crate::config::get_vision_model_path().context(format!(
			"Vision model not found. Ensure {} exists or pass --vision-model",
			crate::config::VISION_MODEL
		))?;
		Self::load(&path, options)
	}

	pub fn encode(&self, image: &DynamicImage) -> Result<Embedding, EmbeddingError> {
		let pixels = preprocess(image);
		let shape = pixels.shape().to_vec();
		let (data, _) = pixels.into_raw_vec_and_offset();
		let input = ort::value::Value::from_array((shape, data))
			.map_err(|e| EmbeddingError::new(format!("input tensor: {}", e)))?;

		let mut session = self
			.session
			.lock()
			.map_err(|e| EmbeddingError::new(format!("session lock: {}", e)))?;

		let outputs = session
			.run(ort::inputs!["pixel_values" => input])
			.map_err(|e| EmbeddingError::new(format!("inference failed: {}", e)))?;

		let raw = extract_embedding(&outputs, self.dim)?;
		Ok(Embedding::new(raw))
	}
}

impl Embedder for VisionEncoder {
	fn dimension(&self) -> usize {
		self.dim
	}

	fn embed(&self, image_bytes: &[u8]) -> Result<Embedding, EmbeddingError> {
		let image = decode(image_bytes)?;
		self.encode(&image)
	}
}

/// Decode with content-based format detection; URLs often lie about type
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, EmbeddingError> {
	ImageReader::new(Cursor::new(bytes))
		.with_guessed_format()
		.map_err(|e| EmbeddingError::new(format!("unreadable image: {}", e)))?
		.decode()
		.map_err(|e| EmbeddingError::new(format!("invalid image: {}", e)))
}

/// Shortest side to INPUT_SIZE, center crop, CLIP mean/std, NCHW
fn preprocess(img: &DynamicImage) -> Array4<f32> {
	let resized = img.resize_to_fill(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);
	let rgb = resized.to_rgb8();
	let size = INPUT_SIZE as usize;

	let mut arr = Array4::<f32>::zeros((1, 3, size, size));
	for (x, y, px) in rgb.enumerate_pixels() {
		for c in 0..3 {
			let value = px[c] as f32 / 255.0;
			arr[[0, c, y as usize, x as usize]] = (value - CLIP_MEAN[c]) / CLIP_STD[c];
		}
	}
	arr
}

fn extract_embedding(outputs: &ort::session::SessionOutputs, dim: usize) -> Result<Vec<f32>, EmbeddingError> {
	let output = OUTPUT_NAMES
		.iter()
		.find_map(|name| outputs.get(*name))
		.unwrap_or(&outputs[0]);

	let (shape, data) = output
		.try_extract_tensor::<f32>()
		.map_err(|e| EmbeddingError::new(format!("unexpected model output: {}", e)))?;
	let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();

	match dims.as_slice() {
		[1, d] if *d == dim => Ok(data.to_vec()),
		[1, n, d] if *d == dim && *n > 0 => {
			// Mean pooling over tokens
			let mut pooled = vec![0.0; dim];
			for token in data.chunks_exact(dim) {
				for (p, v) in pooled.iter_mut().zip(token) {
					*p += v;
				}
			}
			pooled.iter_mut().for_each(|v| *v /= *n as f32);
			Ok(pooled)
		}
		_ => Err(EmbeddingError::new(format!(
			"model output shape {:?} does not match dimension {}",
			dims, dim
		))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn garbage_bytes_are_an_embedding_error() {
		let err = decode(b"<html>not a picture</html>").unwrap_err();
		assert!(err.reason.contains("image"));
	}

	#[test]
	fn preprocess_produces_nchw_tensor() {
		let img = DynamicImage::new_rgb8(640, 320);
		let arr = preprocess(&img);
		assert_eq!(arr.shape(), &[1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize]);
		let expected = (0.0 - CLIP_MEAN[0]) / CLIP_STD[0];
		assert!((arr[[0, 0, 0, 0]] - expected).abs() < 1e-5);
	}

	#[test]
	fn decodes_png_bytes() {
		let img = DynamicImage::new_rgb8(4, 4);
		let mut bytes = Vec::new();
		img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();
		let decoded = decode(&bytes).unwrap();
		assert_eq!(decoded.width(), 4);
	}
}
