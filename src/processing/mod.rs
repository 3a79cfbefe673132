//! Batch side: fetching, scraping, corpus building, and the build pipeline

pub mod corpus;
pub mod fetch;
pub mod pipeline;
pub mod scrape;

pub use corpus::{CorpusBuilder, CorpusStats};
pub use fetch::{ImageFetcher, ImageSource};
pub use pipeline::{rebuild_from_vectors, Pipeline, PipelineReport};
pub use scrape::{Catalog, Scraper};
