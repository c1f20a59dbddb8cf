use std::path::PathBuf;

use blendinfo::blend::{BlendFile, Result, SizeKey, size_stats};

use crate::cmd::util::{emit_json, print_warnings, warning_strings};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Emit JSON.
	#[arg(long)]
	pub json: bool,
}

/// Print payload bytes per struct type (or block code for opaque blocks), smallest first.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;

	let mut blend = BlendFile::open(&path)?;
	let dna = blend.dna()?;
	let stats = size_stats(&mut blend, &dna)?;

	if json {
		let payload = StatsJson {
			path: path.display().to_string(),
			entries: stats
				.entries
				.iter()
				.map(|entry| {
					let (kind, name) = key_parts(&entry.key);
					SizeEntryJson {
						kind,
						name,
						bytes: entry.bytes,
						count: entry.count,
						blocks: entry.blocks,
					}
				})
				.collect(),
			warnings: warning_strings(&stats.warnings),
		};
		return emit_json(&payload);
	}

	println!("path: {}", path.display());
	println!("bytes\tcount\tblocks\tkind\tname");
	for entry in &stats.entries {
		let (kind, name) = key_parts(&entry.key);
		println!("{}\t{}\t{}\t{}\t{}", entry.bytes, entry.count, entry.blocks, kind, name);
	}
	print_warnings(&stats.warnings);
	Ok(())
}

fn key_parts(key: &SizeKey) -> (&'static str, String) {
	match key {
		SizeKey::Struct(name) => ("struct", name.to_string()),
		SizeKey::Code(code) => ("code", code.to_string()),
	}
}

#[derive(serde::Serialize)]
struct SizeEntryJson {
	kind: &'static str,
	name: String,
	bytes: u64,
	count: u64,
	blocks: u64,
}

#[derive(serde::Serialize)]
struct StatsJson {
	path: String,
	entries: Vec<SizeEntryJson>,
	warnings: Vec<String>,
}
