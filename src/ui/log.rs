//! Unified logging system

use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub struct Log;

impl Log {
	pub fn set_verbose(enabled: bool) {
		VERBOSE.store(enabled, Ordering::Relaxed);
	}

	pub fn is_verbose() -> bool {
		VERBOSE.load(Ordering::Relaxed)
	}
}

pub fn info(msg: &str) {
	println!("{} {}", "ℹ".bright_blue().bold(), msg.bright_white());
}

pub fn success(msg: &str) {
	println!("{} {}", "✓".bright_green().bold(), msg.bright_white());
}

pub fn warn(msg: &str) {
	println!("{} {}", "⚠".bright_yellow().bold(), msg.bright_white());
}

pub fn error(msg: &str) {
	eprintln!("{} {}", "✗".bright_red().bold(), msg.bright_white());
}

pub fn debug(msg: &str) {
	if Log::is_verbose() {
		println!("{} {}", "⚙".bright_black().bold(), msg.dimmed());
	}
}

pub fn header(text: &str) {
	println!("\n{}", text.bright_blue().bold());
}

pub fn banner() {
	header(&format!("─── StyleMate v{} ───", env!("CARGO_PKG_VERSION")));
}

/// Clickable URL (OSC 8 terminal hyperlink), label truncated to `max_len`
pub fn url_link(url: &str, label: &str, max_len: usize) -> String {
	let display = if label.chars().count() > max_len {
		let head: String = label.chars().take(max_len.saturating_sub(3)).collect();
		format!("{}...", head)
	} else {
		label.to_string()
	};
	format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, display)
}

/// End-of-run block for the build pipeline
pub fn summary(indexed: usize, skipped: usize, failed: usize, duration: Duration) {
	let secs = duration.as_secs_f32();
	header("Summary");

	println!("  {} {}", "Indexed:".bright_blue(), indexed);
	if skipped > 0 {
		println!("  {} {}", "Skipped:".yellow(), skipped);
	}
	if failed > 0 {
		println!("  {} {}", "Failed:".red(), failed);
	}

	println!("  {} {:.2}s", "Duration:".bright_blue(), secs);
	if indexed > 0 {
		let avg_ms = (secs * 1000.0) / indexed as f32;
		println!("  {} {:.0}ms/product", "Average:".bright_blue(), avg_ms);
	}
	println!();
}
