//! Product image download

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::time::Duration;

use crate::config::{FETCH_TIMEOUT_SECS, USER_AGENT};
use crate::error::FetchError;

/// Anything that can turn an image URL into bytes
pub trait ImageSource: Send + Sync {
	fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP fetcher shared by the pipeline workers
#[derive(Clone)]
pub struct ImageFetcher {
	client: Client,
}

impl ImageFetcher {
	pub fn new() -> Result<Self> {
		Self::with_timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
	}

	pub fn with_timeout(timeout: Duration) -> Result<Self> {
		let client = Client::builder()
			.timeout(timeout)
			.user_agent(USER_AGENT)
			.build()
			.context("Failed to build HTTP client")?;
		Ok(Self { client })
	}

	pub fn client(&self) -> &Client {
		&self.client
	}
}

impl ImageSource for ImageFetcher {
	fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
		let transport = |e: reqwest::Error| FetchError::Transport {
			url: url.to_string(),
			reason: e.to_string(),
		};

		let resp = self.client.get(url).send().map_err(transport)?;
		let status = resp.status();
		if !status.is_success() {
			return Err(FetchError::Status {
				url: url.to_string(),
				status: status.as_u16(),
			});
		}

		let bytes = resp.bytes().map_err(transport)?;
		if bytes.is_empty() {
			return Err(FetchError::Empty { url: url.to_string() });
		}
		Ok(bytes.to_vec())
	}
}
