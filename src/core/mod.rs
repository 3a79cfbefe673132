//! Core domain types

pub mod embedding;
pub mod product;

pub use embedding::{normalize_all, Embedding};
pub use product::{CorpusEntry, ProductMetadata, QueryResult, RawProduct, SizeVariant};
