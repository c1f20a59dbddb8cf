#![allow(missing_docs)]

use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "blendinfo", about = "SDNA-driven .blend inspection and pointer stripping")]
struct Cli {
	/// Enable verbose logging (can be used multiple times: -v, -vv, -vvv)
	#[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
	verbose: u8,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Header facts and block statistics.
	Info(cmd::info::Args),
	/// Schema listing.
	Dna(cmd::dna::Args),
	/// ID block totals against all blocks.
	Ids(cmd::ids::Args),
	/// Payload bytes per struct type, smallest first.
	Stats(cmd::stats::Args),
	/// Blocks and elements covering an address.
	Locate(cmd::locate::Args),
	/// ID-to-ID pointer graph.
	Graph(cmd::graph::Args),
	/// Every block reflected through the schema.
	Dump(cmd::dump::Args),
	/// Extract, restore, or zero every stored address in place.
	Strip(cmd::strip::Args),
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> blendinfo::blend::Result<()> {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	match cli.command {
		Commands::Info(args) => cmd::info::run(args),
		Commands::Dna(args) => cmd::dna::run(args),
		Commands::Ids(args) => cmd::ids::run(args),
		Commands::Stats(args) => cmd::stats::run(args),
		Commands::Locate(args) => cmd::locate::run(args),
		Commands::Graph(args) => cmd::graph::run(args),
		Commands::Dump(args) => cmd::dump::run(args),
		Commands::Strip(args) => cmd::strip::run(args),
	}
}

/// Route `log` records to stderr; `RUST_LOG` still wins for per-module filters.
fn init_logging(verbose: u8) {
	let level = match verbose {
		0 => log::LevelFilter::Warn,
		1 => log::LevelFilter::Info,
		2 => log::LevelFilter::Debug,
		_ => log::LevelFilter::Trace,
	};

	env_logger::Builder::new()
		.filter_level(level)
		.parse_default_env()
		.format_timestamp(None)
		.format_module_path(false)
		.format_target(false)
		.init();
}
