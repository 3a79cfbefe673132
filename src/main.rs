//! StyleMate - find products that look like your photo

use anyhow::Result;
use clap::Parser;

use stylemate::cli::{Cli, Command, StylesAction};
use stylemate::commands::{self, build::BuildArgs, serve::ServeArgs};
use stylemate::config;
use stylemate::runtime::RuntimeOptions;
use stylemate::ui::{self, Log};

fn main() {
	if let Err(e) = run() {
		ui::error(&format!("{:#}", e));
		std::process::exit(1);
	}
}

fn run() -> Result<()> {
	let cli = Cli::parse();

	Log::set_verbose(cli.verbose);
	if let Some(dir) = cli.models_dir {
		config::set_model_dir(dir);
	}
	if let Some(path) = cli.vision_model {
		config::set_vision_model(path);
	}

	let runtime = RuntimeOptions {
		provider: cli.provider,
		..Default::default()
	};

	match cli.command {
		Command::Build {
			catalog,
			source,
			input,
			data_dir,
			workers,
			from_vectors,
		} => commands::build::run(
			BuildArgs {
				catalog,
				source,
				input,
				data_dir,
				workers,
				from_vectors,
			},
			&runtime,
		),
		Command::Recommend {
			image,
			k,
			data_dir,
			sources,
		} => commands::recommend::run(&image, k, &data_dir, &sources, &runtime),
		Command::Serve {
			bind,
			data_dir,
			sources,
			max_inflight,
			timeout_secs,
		} => commands::serve::run(
			ServeArgs {
				bind,
				data_dir: &data_dir,
				sources: &sources,
				max_inflight,
				timeout_secs,
			},
			&runtime,
		),
		Command::Check { data_dir, sources } => commands::check::run(&data_dir, &sources),
		Command::Styles { action } => match action {
			StylesAction::Build { dir, output } => commands::styles::build(&dir, &output, &runtime),
			StylesAction::Predict { image, references } => {
				commands::styles::predict(&image, &references, &runtime)
			}
		},
	}
}
