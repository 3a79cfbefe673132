//! # StyleMate Library
//!
//! Visual product recommendations using CLIP image embeddings.
//! Scrapes store catalogs, indexes product photos per source, and answers
//! "what looks like this?" across every source at once.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod processing;
pub mod runtime;
pub mod search;
pub mod serve;
pub mod storage;
pub mod styles;
pub mod ui;

pub use error::{ErrorKind, RecommendError};
