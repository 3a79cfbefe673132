use clap::builder::styling::{AnsiColor, Styles};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{
	DEFAULT_BIND, DEFAULT_DATA_DIR, DEFAULT_FETCH_WORKERS, DEFAULT_K, DEFAULT_MAX_INFLIGHT_EMBEDS, DEFAULT_REFERENCE_FILE,
	DEFAULT_STYLE_DIR, EMBED_TIMEOUT_SECS, MAX_K,
};

/// Execution provider for ONNX Runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Provider {
	/// Auto-detect best available (TensorRT → CUDA → CoreML → XNNPACK → CPU)
	#[default]
	Auto,
	/// CPU only
	Cpu,
	/// NVIDIA CUDA GPU
	Cuda,
	/// NVIDIA TensorRT (optimized inference)
	Tensorrt,
	/// Apple CoreML (macOS only)
	Coreml,
	/// XNNPACK (optimized CPU kernels)
	Xnnpack,
}

/// Product catalogs the build pipeline knows how to scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Catalog {
	/// drmersclub.com "Shop All" collection
	Drmers,
	/// galoreyyz.com "Shop All" collection
	Galore,
	/// Replay a saved products JSON (--input)
	File,
}

fn parse_k(s: &str) -> Result<usize, String> {
	let val: usize = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
	if val == 0 || val > MAX_K {
		Err(format!("k must be between 1 and {}, got {}", MAX_K, val))
	} else {
		Ok(val)
	}
}

fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Blue.on_default().bold())
		.usage(AnsiColor::Blue.on_default().bold())
		.literal(AnsiColor::Blue.on_default())
		.placeholder(AnsiColor::Yellow.on_default())
		.valid(AnsiColor::Blue.on_default())
		.invalid(AnsiColor::Red.on_default())
}

#[derive(Parser, Debug)]
#[command(
	name = "stylemate",
	author,
	version,
	about = "Visually similar product recommendations from a photo",
	styles = styles(),
	after_help = format!(
		"{title}
  {app} {build}      {build_args}        {build_desc}
  {app} {build}      {replay_args}   {replay_desc}
  {app} {recommend}  {recommend_args}             {recommend_desc}
  {app} {serve}      {serve_args}  {serve_desc}
  {app} {styles}     {styles_args}        {styles_desc}",
		title = "Examples:".bright_blue().bold(),
		app = "stylemate".bright_blue(),
		build = "build".yellow(),
		build_args = "--catalog galore",
		build_desc = "Scrape, embed and index a store".dimmed(),
		replay_args = "--catalog drmers --from-vectors",
		replay_desc = "Rebuild index from checkpoint".dimmed(),
		recommend = "recommend".yellow(),
		recommend_args = "outfit.jpg -k 5",
		recommend_desc = "Top matches across all sources".dimmed(),
		serve = "serve".yellow(),
		serve_args = "--bind 0.0.0.0:8000",
		serve_desc = "HTTP upload endpoint".dimmed(),
		styles = "styles".yellow(),
		styles_args = "predict outfit.jpg",
		styles_desc = "Closest reference style".dimmed(),
	),
)]
pub struct Cli {
	/// Enable verbose debug output
	#[arg(short = 'v', long = "verbose", global = true)]
	pub verbose: bool,

	/// Execution provider: auto, cpu, cuda, tensorrt, coreml, xnnpack
	#[arg(short = 'p', long = "provider", global = true, default_value = "auto")]
	pub provider: Provider,

	/// Directory containing the ONNX vision model
	#[arg(long = "models-dir", global = true, value_name = "DIR")]
	pub models_dir: Option<PathBuf>,

	/// Path to the vision model file (overrides --models-dir)
	#[arg(long = "vision-model", global = true, value_name = "FILE")]
	pub vision_model: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Scrape a catalog, embed product images and build its index
	Build {
		/// Catalog to scrape
		#[arg(short = 'c', long = "catalog")]
		catalog: Catalog,

		/// Source name for artifact files (defaults to the catalog name)
		#[arg(short = 's', long = "source")]
		source: Option<String>,

		/// Saved products JSON to replay (with --catalog file)
		#[arg(short = 'i', long = "input", value_name = "FILE")]
		input: Option<PathBuf>,

		/// Directory for indices and checkpoints
		#[arg(short = 'd', long = "data-dir", default_value = DEFAULT_DATA_DIR)]
		data_dir: PathBuf,

		/// Concurrent image downloads
		#[arg(short = 'w', long = "workers", default_value_t = DEFAULT_FETCH_WORKERS)]
		workers: usize,

		/// Skip scraping and embedding; rebuild from <source>_product_vectors.json
		#[arg(long = "from-vectors")]
		from_vectors: bool,
	},

	/// Recommend products similar to a local image
	Recommend {
		/// Query image
		#[arg(value_name = "IMAGE")]
		image: PathBuf,

		/// Number of results
		#[arg(short = 'k', long = "top-k", default_value_t = DEFAULT_K, value_parser = parse_k)]
		k: usize,

		/// Directory holding the indices
		#[arg(short = 'd', long = "data-dir", default_value = DEFAULT_DATA_DIR)]
		data_dir: PathBuf,

		/// Sources to query (default: every *.index in the data directory)
		#[arg(short = 's', long = "source", value_name = "NAME")]
		sources: Vec<String>,
	},

	/// Serve recommendations over HTTP
	Serve {
		/// Address to listen on (host:port)
		#[arg(short = 'b', long = "bind", env = "STYLEMATE_BIND", default_value = DEFAULT_BIND)]
		bind: String,

		/// Directory holding the indices
		#[arg(short = 'd', long = "data-dir", default_value = DEFAULT_DATA_DIR)]
		data_dir: PathBuf,

		/// Sources to serve (default: every *.index in the data directory)
		#[arg(short = 's', long = "source", value_name = "NAME")]
		sources: Vec<String>,

		/// Maximum concurrent embedding calls
		#[arg(long = "max-inflight", default_value_t = DEFAULT_MAX_INFLIGHT_EMBEDS)]
		max_inflight: usize,

		/// Seconds a request may wait for its embedding
		#[arg(long = "timeout-secs", default_value_t = EMBED_TIMEOUT_SECS)]
		timeout_secs: u64,
	},

	/// Load every source and verify index/metadata integrity
	Check {
		/// Directory holding the indices
		#[arg(short = 'd', long = "data-dir", default_value = DEFAULT_DATA_DIR)]
		data_dir: PathBuf,

		/// Sources to check (default: every *.index in the data directory)
		#[arg(short = 's', long = "source", value_name = "NAME")]
		sources: Vec<String>,
	},

	/// Build or query style reference vectors
	Styles {
		#[command(subcommand)]
		action: StylesAction,
	},
}

#[derive(Subcommand, Debug)]
pub enum StylesAction {
	/// Average each style folder's images into one reference vector
	Build {
		/// Folder holding one subfolder of images per style
		#[arg(short = 'd', long = "dir", default_value = DEFAULT_STYLE_DIR)]
		dir: PathBuf,

		/// Where to write the reference vectors
		#[arg(short = 'o', long = "output", default_value = DEFAULT_REFERENCE_FILE)]
		output: PathBuf,
	},

	/// Classify an image as its closest reference style
	Predict {
		/// Query image
		#[arg(value_name = "IMAGE")]
		image: PathBuf,

		/// Reference vectors written by 'styles build'
		#[arg(short = 'r', long = "references", default_value = DEFAULT_REFERENCE_FILE)]
		references: PathBuf,
	},
}
