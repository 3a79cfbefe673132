//! Execution provider selection
//!
//! The provider is chosen once at startup and handed to every session
//! builder through [`RuntimeOptions`].

use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;

use crate::ui;

pub use crate::cli::Provider;

/// Device configuration for ONNX sessions
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
	pub provider: Provider,
	pub intra_threads: usize,
}

impl Default for RuntimeOptions {
	fn default() -> Self {
		Self {
			provider: Provider::Auto,
			intra_threads: crate::config::INTRA_THREADS,
		}
	}
}

pub fn create_session(model_path: &Path, options: &RuntimeOptions) -> Result<Session> {
	let mut builder = Session::builder().context("Failed to create session builder")?;

	let selected = match options.provider {
		Provider::Auto => register_best(&mut builder),
		Provider::Cpu => None,
		Provider::Cuda => require(try_cuda(&mut builder), "CUDA"),
		Provider::Tensorrt => require(try_tensorrt(&mut builder), "TensorRT"),
		Provider::Coreml => {
			#[cfg(target_os = "macos")]
			{
				require(try_coreml(&mut builder), "CoreML")
			}
			#[cfg(not(target_os = "macos"))]
			{
				ui::error("CoreML only available on macOS, falling back to CPU");
				None
			}
		}
		Provider::Xnnpack => require(try_xnnpack(&mut builder), "XNNPACK"),
	};

	match selected {
		Some(name) => ui::success(&format!("Using {} execution provider", name)),
		None => ui::info("Using CPU execution provider"),
	}

	builder
		.with_optimization_level(GraphOptimizationLevel::Level3)?
		.with_intra_threads(options.intra_threads)?
		.commit_from_file(model_path)
		.context("Failed to load model")
}

fn require(selected: Option<&'static str>, name: &str) -> Option<&'static str> {
	if selected.is_none() {
		ui::error(&format!("{} requested but unavailable, falling back to CPU", name));
	}
	selected
}

fn register_best(builder: &mut ort::session::builder::SessionBuilder) -> Option<&'static str> {
	if let Some(name) = try_tensorrt(builder) {
		return Some(name);
	}
	if let Some(name) = try_cuda(builder) {
		return Some(name);
	}

	#[cfg(target_os = "macos")]
	if let Some(name) = try_coreml(builder) {
		return Some(name);
	}

	try_xnnpack(builder)
}

macro_rules! try_provider {
	($builder:expr, $provider_type:ty, $name:expr) => {{
		use ort::ep::ExecutionProvider;

		crate::ui::debug(&format!("Trying provider: {}", $name));

		let provider = <$provider_type>::default();
		if !provider.is_available().unwrap_or(false) {
			crate::ui::debug(&format!("{} not available", $name));
			return None;
		}

		match provider.register($builder) {
			Ok(_) => Some($name),
			Err(e) => {
				crate::ui::debug(&format!("{} registration failed: {}", $name, e));
				None
			}
		}
	}};
}

fn try_cuda(builder: &mut ort::session::builder::SessionBuilder) -> Option<&'static str> {
	use ort::ep::CUDA;
	try_provider!(builder, CUDA, "CUDA")
}

#[cfg(target_os = "macos")]
fn try_coreml(builder: &mut ort::session::builder::SessionBuilder) -> Option<&'static str> {
	use ort::ep::CoreML;
	try_provider!(builder, CoreML, "CoreML")
}

fn try_tensorrt(builder: &mut ort::session::builder::SessionBuilder) -> Option<&'static str> {
	use ort::ep::TensorRT;
	try_provider!(builder, TensorRT, "TensorRT")
}

fn try_xnnpack(builder: &mut ort::session::builder::SessionBuilder) -> Option<&'static str> {
	use ort::ep::XNNPACK;
	try_provider!(builder, XNNPACK, "XNNPACK")
}
