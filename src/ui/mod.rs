//! # User Interface
//!
//! Colored terminal output with clickable product links.

pub mod log;

pub use log::{banner, debug, error, header, info, success, summary, url_link, warn, Log};
