use std::path::PathBuf;

use blendinfo::blend::{BlendFile, Result};

use crate::cmd::util::{emit_json, render_code};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Emit JSON.
	#[arg(long)]
	pub json: bool,
}

/// Print header facts and block statistics.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;

	let mut blend = BlendFile::open(&path)?;
	let header = blend.header;
	let stats = blend.scan_block_stats()?;

	let mut entries: Vec<_> = stats.codes.into_iter().collect();
	entries.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));

	if json {
		let payload = InfoJson {
			path: path.display().to_string(),
			compression: blend.compression.as_str(),
			file_size: blend.len(),
			version: header.version_label(),
			version_number: header.version_number(),
			endianness: header.endianness.as_str(),
			pointer_size: header.pointer_size,
			bhead_size: header.bhead_size(),
			block_count: stats.block_count,
			has_dna1: stats.has_dna1,
			has_endb: stats.has_endb,
			last_code: render_code(stats.last_code),
			top_codes: entries
				.iter()
				.take(12)
				.map(|(code, count)| CodeCountJson {
					code: render_code(*code),
					count: *count,
				})
				.collect(),
		};
		return emit_json(&payload);
	}

	println!("path: {}", path.display());
	println!("compression: {}", blend.compression.as_str());
	println!("file_size: {}", blend.len());
	println!("version: {}", header.version_label());
	println!("endianness: {}", header.endianness.as_str());
	println!("pointer_size: {}", header.pointer_size);
	println!("bhead_size: {}", header.bhead_size());
	println!("block_count: {}", stats.block_count);
	println!("has_dna1: {}", stats.has_dna1);
	println!("has_endb: {}", stats.has_endb);
	println!("last_code: {}", render_code(stats.last_code));

	println!("top_codes:");
	for (code, count) in entries.into_iter().take(12) {
		println!("  {}: {}", render_code(code), count);
	}

	Ok(())
}

#[derive(serde::Serialize)]
struct CodeCountJson {
	code: String,
	count: u32,
}

#[derive(serde::Serialize)]
struct InfoJson {
	path: String,
	compression: &'static str,
	file_size: u64,
	version: String,
	version_number: Option<u16>,
	endianness: &'static str,
	pointer_size: usize,
	bhead_size: usize,
	block_count: u32,
	has_dna1: bool,
	has_endb: bool,
	last_code: String,
	top_codes: Vec<CodeCountJson>,
}
