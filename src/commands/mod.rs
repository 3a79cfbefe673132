//! # Command Implementations
//!
//! Each submodule handles one CLI command (build, recommend, serve, check,
//! styles).

pub mod build;
pub mod check;
pub mod recommend;
pub mod serve;
pub mod styles;

use anyhow::Result;
use std::time::Instant;

use crate::models::VisionEncoder;
use crate::runtime::RuntimeOptions;
use crate::ui;

/// Load the vision encoder, logging how long it took
pub(crate) fn load_encoder(options: &RuntimeOptions) -> Result<VisionEncoder> {
	ui::info("Loading vision model...");
	let start = Instant::now();
	let encoder = VisionEncoder::from_config(options)?;
	ui::success(&format!("Model ready in {:.2}s", start.elapsed().as_secs_f32()));
	Ok(encoder)
}
