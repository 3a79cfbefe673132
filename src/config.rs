//! Application configuration and constants

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static CUSTOM_MODEL_DIR: OnceLock<PathBuf> = OnceLock::new();
static CUSTOM_VISION: OnceLock<PathBuf> = OnceLock::new();

// === Model Files ===
pub const VISION_MODEL: &str = "clip_vit_b32_visual.onnx";
pub const MODELS_ENV: &str = "STYLEMATE_MODELS_DIR";

// === Model Parameters ===
pub const INPUT_SIZE: u32 = 224;
pub const EMBEDDING_DIM: usize = 512;
pub const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
pub const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_6, 0.275_777_1];
pub const INTRA_THREADS: usize = 4;

// === Query Defaults ===
pub const DEFAULT_K: usize = 5;
pub const MAX_K: usize = 100;

// === Network ===
pub const FETCH_TIMEOUT_SECS: u64 = 10;
pub const USER_AGENT: &str = concat!("stylemate/", env!("CARGO_PKG_VERSION"));

// === Concurrency ===
pub const DEFAULT_FETCH_WORKERS: usize = 4;
pub const DEFAULT_MAX_INFLIGHT_EMBEDS: usize = 2;
pub const EMBED_TIMEOUT_SECS: u64 = 30;
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

// === Storage ===
pub const DEFAULT_DATA_DIR: &str = "data";
pub const INDEX_EXT: &str = "index";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

// === Style References ===
pub const DEFAULT_STYLE_DIR: &str = "style_images";
pub const DEFAULT_REFERENCE_FILE: &str = "data/reference_vectors.json";
pub const STYLE_IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png"];

pub fn set_model_dir(path: PathBuf) {
	let _ = CUSTOM_MODEL_DIR.set(path);
}

pub fn set_vision_model(path: PathBuf) {
	let _ = CUSTOM_VISION.set(path);
}

/// Get models directory (--models-dir, STYLEMATE_MODELS_DIR, or next to the executable)
pub fn models_dir() -> Option<PathBuf> {
	if let Some(custom) = CUSTOM_MODEL_DIR.get() {
		crate::ui::debug(&format!("Using custom model dir: {}", custom.display()));
		return Some(custom.clone());
	}

	if let Ok(env_path) = std::env::var(MODELS_ENV) {
		let path = PathBuf::from(&env_path);
		if path.is_dir() {
			crate::ui::debug(&format!("Using {}: {}", MODELS_ENV, env_path));
			return Some(path);
		}
	}

	if let Ok(exe) = std::env::current_exe() {
		if let Some(dir) = exe.parent() {
			let models = dir.join("models");
			if models.is_dir() {
				crate::ui::debug(&format!("Found models at: {}", models.display()));
				return Some(models);
			}
		}
	}

	None
}

pub fn get_vision_model_path() -> Option<PathBuf> {
	if let Some(custom) = CUSTOM_VISION.get() {
		return Some(custom.clone());
	}
	models_dir().map(|d| d.join(VISION_MODEL))
}

/// File locations for one source inside a data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
	pub name: String,
	pub products: PathBuf,
	pub vectors: PathBuf,
	pub index: PathBuf,
	pub metas: PathBuf,
}

impl SourcePaths {
	pub fn new(data_dir: &Path, name: &str) -> Self {
		Self {
			name: name.to_string(),
			products: data_dir.join(format!("{}_products.json", name)),
			vectors: data_dir.join(format!("{}_product_vectors.json", name)),
			index: data_dir.join(format!("{}.{}", name, INDEX_EXT)),
			metas: data_dir.join(format!("{}_metas.json", name)),
		}
	}
}

/// Source names to use: the explicit list, or every `*.index` in the data directory
pub fn resolve_sources(data_dir: &Path, names: &[String]) -> Vec<SourcePaths> {
	if !names.is_empty() {
		return names.iter().map(|n| SourcePaths::new(data_dir, n)).collect();
	}

	let mut found: Vec<String> = walkdir::WalkDir::new(data_dir)
		.max_depth(1)
		.into_iter()
		.filter_map(|e| e.ok())
		.filter(|e| e.file_type().is_file())
		.filter(|e| e.path().extension().is_some_and(|x| x == INDEX_EXT))
		.filter_map(|e| e.path().file_stem().and_then(|s| s.to_str()).map(str::to_string))
		.collect();

	// Directory order is platform dependent; merge tie-breaks follow source order
	found.sort();
	found.iter().map(|n| SourcePaths::new(data_dir, n)).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn source_paths_follow_naming_scheme() {
		let paths = SourcePaths::new(Path::new("data"), "galore");
		assert_eq!(paths.index, Path::new("data/galore.index"));
		assert_eq!(paths.metas, Path::new("data/galore_metas.json"));
		assert_eq!(paths.products, Path::new("data/galore_products.json"));
		assert_eq!(paths.vectors, Path::new("data/galore_product_vectors.json"));
	}

	#[test]
	fn discovers_index_files_in_sorted_order() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("zeta.index"), b"").unwrap();
		std::fs::write(dir.path().join("alpha.index"), b"").unwrap();
		std::fs::write(dir.path().join("alpha_metas.json"), b"[]").unwrap();

		let sources = resolve_sources(dir.path(), &[]);
		let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
		assert_eq!(names, vec!["alpha", "zeta"]);
	}
}
