//! Route handlers and the JSON error shape

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::config::{DEFAULT_K, MAX_K};
use crate::core::{Embedding, QueryResult};
use crate::error::{EmbeddingError, ErrorKind, RecommendError};
use crate::models::Embedder;
use crate::ui;

use super::catalog::{Catalog, CatalogHandle};

#[derive(Clone)]
pub struct AppState {
	pub catalog: Arc<CatalogHandle>,
	pub gate: EmbedGate,
}

/// Bounds concurrent embedding work and how long a request waits for it
#[derive(Clone)]
pub struct EmbedGate {
	embedder: Arc<dyn Embedder>,
	permits: Arc<Semaphore>,
	timeout: Duration,
}

impl EmbedGate {
	pub fn new(embedder: Arc<dyn Embedder>, max_inflight: usize, timeout: Duration) -> Self {
		Self {
			embedder,
			permits: Arc::new(Semaphore::new(max_inflight.max(1))),
			timeout,
		}
	}

	pub fn dimension(&self) -> usize {
		self.embedder.dimension()
	}

	pub async fn embed(&self, bytes: Vec<u8>) -> Result<Embedding, ApiError> {
		let embedder = Arc::clone(&self.embedder);
		let permits = Arc::clone(&self.permits);

		let work = async move {
			let permit = permits
				.acquire_owned()
				.await
				.map_err(|_| ApiError::internal("embedding pool is closed"))?;
			// The permit lives as long as the model call, even past a timeout
			tokio::task::spawn_blocking(move || {
				let _permit = permit;
				embedder.embed(&bytes)
			})
			.await
			.map_err(|e| ApiError::internal(format!("embedding task failed: {}", e)))?
			.map_err(ApiError::from)
		};

		tokio::time::timeout(self.timeout, work).await.map_err(|_| ApiError {
			status: StatusCode::REQUEST_TIMEOUT,
			kind: "timeout",
			message: format!("embedding did not finish within {}s", self.timeout.as_secs_f32()),
		})?
	}
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: &'static str,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	pub status: StatusCode,
	pub kind: &'static str,
	pub message: String,
}

impl ApiError {
	pub fn bad_request(message: impl Into<String>) -> Self {
		Self {
			status: StatusCode::BAD_REQUEST,
			kind: ErrorKind::ClientInput.as_str(),
			message: message.into(),
		}
	}

	pub fn internal(message: impl Into<String>) -> Self {
		Self {
			status: StatusCode::INTERNAL_SERVER_ERROR,
			kind: ErrorKind::Internal.as_str(),
			message: message.into(),
		}
	}
}

impl From<RecommendError> for ApiError {
	fn from(err: RecommendError) -> Self {
		let kind = err.kind();
		let status = match kind {
			ErrorKind::ClientInput => StatusCode::BAD_REQUEST,
			ErrorKind::TransientFetch => StatusCode::BAD_GATEWAY,
			ErrorKind::CorpusIntegrity | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
		};
		Self {
			status,
			kind: kind.as_str(),
			message: err.to_string(),
		}
	}
}

impl From<MultipartRejection> for ApiError {
	fn from(rejection: MultipartRejection) -> Self {
		Self {
			status: rejection.status(),
			kind: ErrorKind::ClientInput.as_str(),
			message: rejection.body_text(),
		}
	}
}

impl From<QueryRejection> for ApiError {
	fn from(rejection: QueryRejection) -> Self {
		Self::bad_request(rejection.body_text())
	}
}

impl From<MultipartError> for ApiError {
	/// Keeps axum's status, so an oversized upload stays a 413
	fn from(err: MultipartError) -> Self {
		Self {
			status: err.status(),
			kind: ErrorKind::ClientInput.as_str(),
			message: format!("malformed upload: {}", err.body_text()),
		}
	}
}

impl From<EmbeddingError> for ApiError {
	fn from(err: EmbeddingError) -> Self {
		RecommendError::from(err).into()
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error: self.kind,
			message: self.message,
		};
		(self.status, Json(body)).into_response()
	}
}

#[derive(Debug, Deserialize)]
pub struct RecommendParams {
	k: Option<String>,
}

/// Absent `k` means the default; anything else must be an integer in `1..=MAX_K`
pub fn parse_k(raw: Option<&str>) -> Result<usize, ApiError> {
	let Some(raw) = raw else {
		return Ok(DEFAULT_K);
	};
	match raw.trim().parse::<usize>() {
		Ok(k) if (1..=MAX_K).contains(&k) => Ok(k),
		Ok(k) => Err(ApiError::bad_request(format!("k must be between 1 and {}, got {}", MAX_K, k))),
		Err(_) => Err(ApiError::bad_request(format!("k must be an integer, got {:?}", raw))),
	}
}

/// Embed an uploaded image and query the current catalog snapshot
pub async fn recommend_upload(state: &AppState, bytes: Vec<u8>, k: usize) -> Result<Vec<QueryResult>, ApiError> {
	if bytes.is_empty() {
		return Err(ApiError::bad_request("uploaded file is empty"));
	}
	let embedding = state.gate.embed(bytes).await?;
	let catalog = state.catalog.snapshot();
	Ok(catalog.recommend(embedding.as_slice(), k)?)
}

pub async fn recommend(
	State(state): State<AppState>,
	params: Result<Query<RecommendParams>, QueryRejection>,
	multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<QueryResult>>, ApiError> {
	let start = Instant::now();
	let outcome = async {
		let Query(params) = params?;
		let k = parse_k(params.k.as_deref())?;
		let bytes = read_upload(multipart?).await?;
		recommend_upload(&state, bytes, k).await
	}
	.await;

	match &outcome {
		Ok(results) => ui::info(&format!(
			"POST /recommend → {} results in {}ms",
			results.len(),
			start.elapsed().as_millis()
		)),
		Err(e) => ui::warn(&format!("POST /recommend → {} {}: {}", e.status.as_u16(), e.kind, e.message)),
	}
	outcome.map(Json)
}

async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
	while let Some(field) = multipart.next_field().await? {
		if field.name() == Some("file") {
			let bytes = field.bytes().await?;
			return Ok(bytes.to_vec());
		}
	}
	Err(ApiError::bad_request("missing multipart field 'file'"))
}

pub async fn healthz() -> StatusCode {
	StatusCode::OK
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SourceInfo {
	pub name: String,
	pub size: usize,
	pub dimension: usize,
}

fn describe(catalog: &Catalog) -> Vec<SourceInfo> {
	catalog
		.sources()
		.iter()
		.map(|s| SourceInfo {
			name: s.name().to_string(),
			size: s.len(),
			dimension: s.index().dimension(),
		})
		.collect()
}

pub async fn sources(State(state): State<AppState>) -> Json<Vec<SourceInfo>> {
	Json(describe(&state.catalog.snapshot()))
}

pub async fn reload(State(state): State<AppState>) -> Result<Json<Vec<SourceInfo>>, ApiError> {
	let handle = Arc::clone(&state.catalog);
	let result = tokio::task::spawn_blocking(move || handle.reload())
		.await
		.map_err(|e| ApiError::internal(format!("reload task failed: {}", e)))?;

	match result {
		Ok(catalog) => {
			ui::success(&format!(
				"Reloaded {} sources ({} products)",
				catalog.sources().len(),
				catalog.len()
			));
			Ok(Json(describe(&catalog)))
		}
		Err(e) => {
			ui::error(&format!("Reload failed, keeping current catalog: {}", e));
			let mut err = ApiError::from(e);
			err.status = StatusCode::INTERNAL_SERVER_ERROR;
			Err(err)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::SourcePaths;
	use crate::core::ProductMetadata;
	use crate::storage::{FlatIndex, IndexStore};

	/// First byte picks the axis; "slow" sleeps past any test timeout
	struct AxisEmbedder;

	impl Embedder for AxisEmbedder {
		fn dimension(&self) -> usize {
			2
		}

		fn embed(&self, bytes: &[u8]) -> Result<Embedding, EmbeddingError> {
			match bytes {
				b"slow" => {
					std::thread::sleep(Duration::from_millis(300));
					Ok(Embedding::new(vec![1.0, 0.0]))
				}
				[b'x', ..] => Ok(Embedding::new(vec![1.0, 0.0])),
				[b'y', ..] => Ok(Embedding::new(vec![0.0, 1.0])),
				_ => Err(EmbeddingError::new("cannot identify image")),
			}
		}
	}

	fn meta(title: &str) -> ProductMetadata {
		ProductMetadata {
			title: title.into(),
			price: Some("$10".into()),
			url: format!("https://shop/{}", title),
			image_url: None,
			tags: vec![],
			sizes: vec![],
		}
	}

	fn state(timeout: Duration) -> AppState {
		let index = FlatIndex::build(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
		let store = IndexStore::new("shop", index, vec![meta("red"), meta("blue")]).unwrap();
		let catalog = Catalog::from_sources(vec![store], Some(2)).unwrap();
		let paths: Vec<SourcePaths> = Vec::new();
		AppState {
			catalog: Arc::new(CatalogHandle::new(catalog, paths, Some(2))),
			gate: EmbedGate::new(Arc::new(AxisEmbedder), 1, timeout),
		}
	}

	#[test]
	fn k_defaults_and_bounds() {
		assert_eq!(parse_k(None).unwrap(), DEFAULT_K);
		assert_eq!(parse_k(Some("3")).unwrap(), 3);
		assert_eq!(parse_k(Some("0")).unwrap_err().status, StatusCode::BAD_REQUEST);
		assert_eq!(parse_k(Some("abc")).unwrap_err().status, StatusCode::BAD_REQUEST);
		assert!(parse_k(Some(&(MAX_K + 1).to_string())).is_err());
	}

	#[tokio::test]
	async fn upload_returns_ranked_products() {
		let state = state(Duration::from_secs(5));
		let results = recommend_upload(&state, b"y-image".to_vec(), 2).await.unwrap();
		assert_eq!(results.len(), 2);
		assert_eq!(results[0].meta.title, "blue");
		assert!((results[0].score - 1.0).abs() < 1e-6);
	}

	#[tokio::test]
	async fn undecodable_upload_is_a_client_error() {
		let state = state(Duration::from_secs(5));
		let err = recommend_upload(&state, b"garbage".to_vec(), 2).await.unwrap_err();
		assert_eq!(err.status, StatusCode::BAD_REQUEST);
		assert_eq!(err.kind, "client_input");

		let err = recommend_upload(&state, Vec::new(), 2).await.unwrap_err();
		assert_eq!(err.status, StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn slow_embedding_times_out() {
		let state = state(Duration::from_millis(50));
		let err = recommend_upload(&state, b"slow".to_vec(), 1).await.unwrap_err();
		assert_eq!(err.status, StatusCode::REQUEST_TIMEOUT);
		assert_eq!(err.kind, "timeout");
	}

	#[test]
	fn error_body_carries_kind_and_message() {
		let err: ApiError = RecommendError::CorpusIntegrity { vectors: 2, metadata: 1 }.into();
		assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
		let body = serde_json::to_value(ErrorBody {
			error: err.kind,
			message: err.message,
		})
		.unwrap();
		assert_eq!(body["error"], "corpus_integrity");
	}

	mod routes {
		use super::*;
		use axum::body::Body;
		use axum::http::{header, Request};
		use tower::ServiceExt;

		const BOUNDARY: &str = "stylemate-test-boundary";

		fn upload(field: &str, payload: &[u8]) -> Request<Body> {
			let mut body = format!(
				"--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"q.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n",
				b = BOUNDARY,
				f = field
			)
			.into_bytes();
			body.extend_from_slice(payload);
			body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

			Request::post("/recommend?k=1")
				.header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
				.body(Body::from(body))
				.unwrap()
		}

		async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
			let app = crate::serve::router(state(Duration::from_secs(5)));
			let response = app.oneshot(request).await.unwrap();
			let status = response.status();
			let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
			(status, serde_json::from_slice(&bytes).unwrap())
		}

		#[tokio::test]
		async fn non_multipart_body_gets_a_json_error() {
			let request = Request::post("/recommend")
				.header(header::CONTENT_TYPE, "application/json")
				.body(Body::from("{}"))
				.unwrap();
			let (status, body) = send(request).await;
			assert_eq!(status, StatusCode::BAD_REQUEST);
			assert_eq!(body["error"], "client_input");
			assert!(!body["message"].as_str().unwrap().is_empty());
		}

		#[tokio::test]
		async fn oversized_upload_is_payload_too_large() {
			let big = vec![b'x'; crate::config::MAX_UPLOAD_BYTES + 1];
			let (status, body) = send(upload("file", &big)).await;
			assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
			assert_eq!(body["error"], "client_input");
		}

		#[tokio::test]
		async fn wrong_field_name_is_reported() {
			let (status, body) = send(upload("image", b"x")).await;
			assert_eq!(status, StatusCode::BAD_REQUEST);
			assert_eq!(body["message"], "missing multipart field 'file'");
		}

		#[tokio::test]
		async fn valid_upload_returns_results() {
			let app = crate::serve::router(state(Duration::from_secs(5)));
			let response = app.oneshot(upload("file", b"y-image")).await.unwrap();
			assert_eq!(response.status(), StatusCode::OK);
			let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
			let results: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
			assert_eq!(results[0]["title"], "blue");
		}
	}
}
