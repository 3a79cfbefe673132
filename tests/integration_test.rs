// Integration tests for the stylemate binary

use std::path::Path;
use std::process::Command;

use stylemate::config::SourcePaths;
use stylemate::core::ProductMetadata;
use stylemate::storage::{persist, FlatIndex};

fn stylemate() -> Command {
	Command::new(env!("CARGO_BIN_EXE_stylemate"))
}

fn write_source(dir: &Path, name: &str, vectors: &[Vec<f32>]) -> SourcePaths {
	let paths = SourcePaths::new(dir, name);
	let index = FlatIndex::build(vectors).unwrap();
	let metas: Vec<_> = (0..vectors.len())
		.map(|i| ProductMetadata {
			title: format!("{} #{}", name, i),
			price: Some("$20.00".into()),
			url: format!("https://{}.example/products/{}", name, i),
			image_url: None,
			tags: vec![],
			sizes: vec![],
		})
		.collect();
	persist(&index, &metas, &paths.index, &paths.metas).unwrap();
	paths
}

#[test]
fn test_version_display() {
	let output = stylemate().arg("--version").output().expect("Failed to run stylemate --version");

	assert!(output.status.success(), "Version command failed");
	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.contains("stylemate"), "Expected 'stylemate' in version output");
}

#[test]
fn test_help_display() {
	let output = stylemate().arg("--help").output().expect("Failed to run stylemate --help");

	assert!(output.status.success(), "Help command failed");
	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(
		stdout.contains("build") && stdout.contains("recommend") && stdout.contains("serve"),
		"Expected build, recommend and serve in help output"
	);
}

#[test]
fn test_check_accepts_consistent_sources() {
	let dir = tempfile::tempdir().unwrap();
	write_source(dir.path(), "drmers", &[vec![1.0, 0.0], vec![0.0, 1.0]]);
	write_source(dir.path(), "galore", &[vec![0.6, 0.8]]);

	let output = stylemate()
		.args(["check", "--data-dir"])
		.arg(dir.path())
		.output()
		.expect("Failed to run stylemate check");

	assert!(output.status.success(), "Check failed on a healthy data dir");
	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.contains("drmers") && stdout.contains("galore"));
}

#[test]
fn test_check_fails_on_truncated_metadata() {
	let dir = tempfile::tempdir().unwrap();
	let paths = write_source(dir.path(), "drmers", &[vec![1.0, 0.0], vec![0.0, 1.0]]);
	std::fs::write(&paths.metas, r#"[{"title":"only one","price":null,"url":"https://x"}]"#).unwrap();

	let output = stylemate()
		.args(["check", "--data-dir"])
		.arg(dir.path())
		.output()
		.expect("Failed to run stylemate check");

	assert!(!output.status.success(), "Check should reject a corrupt source");
}

#[test]
fn test_serve_refuses_corrupt_corpus() {
	let dir = tempfile::tempdir().unwrap();
	let paths = write_source(dir.path(), "drmers", &[vec![1.0, 0.0]]);
	std::fs::write(&paths.index, b"not an index").unwrap();

	// The corpus is checked before the model is loaded
	let output = stylemate()
		.args(["serve", "--bind", "127.0.0.1:0", "--data-dir"])
		.arg(dir.path())
		.output()
		.expect("Failed to run stylemate serve");

	assert!(!output.status.success(), "Serve must not start on a corrupt corpus");
}
