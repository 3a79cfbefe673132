//! # HTTP Serving
//!
//! `POST /recommend` takes a multipart image upload and returns the global
//! top-k products across every loaded source. Indices are read-only while
//! serving; `POST /reload` swaps in a freshly loaded catalog.

pub mod catalog;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::config::MAX_UPLOAD_BYTES;
use crate::models::Embedder;
use crate::ui;

pub use catalog::{Catalog, CatalogHandle};
pub use handlers::{AppState, EmbedGate};

pub struct ServeConfig {
	pub bind: String,
	pub max_inflight: usize,
	pub timeout: Duration,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/healthz", get(handlers::healthz))
		.route("/sources", get(handlers::sources))
		.route("/recommend", post(handlers::recommend))
		.route("/reload", post(handlers::reload))
		.layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
		.with_state(state)
}

/// Serve until Ctrl-C. The catalog must already be loaded.
pub async fn run(config: ServeConfig, catalog: CatalogHandle, embedder: Arc<dyn Embedder>) -> Result<()> {
	let state = AppState {
		catalog: Arc::new(catalog),
		gate: EmbedGate::new(embedder, config.max_inflight, config.timeout),
	};

	let addr: SocketAddr = config
		.bind
		.parse()
		.with_context(|| format!("Invalid bind address {}", config.bind))?;
	let listener = tokio::net::TcpListener::bind(addr)
		.await
		.with_context(|| format!("Failed to bind {}", addr))?;

	ui::success(&format!("Listening on http://{}", addr));
	ui::debug(&format!(
		"{} concurrent embeddings, {}s timeout",
		config.max_inflight,
		config.timeout.as_secs()
	));

	axum::serve(listener, router(state))
		.with_graceful_shutdown(shutdown_signal())
		.await
		.context("Server error")?;

	ui::info("Server stopped");
	Ok(())
}

async fn shutdown_signal() {
	if tokio::signal::ctrl_c().await.is_err() {
		std::future::pending::<()>().await;
	}
}
