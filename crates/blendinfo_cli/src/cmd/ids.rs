use std::path::PathBuf;

use blendinfo::blend::{BlendFile, Result, count_id_content};

use crate::cmd::util::{emit_json, print_warnings, warning_strings};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Emit JSON.
	#[arg(long)]
	pub json: bool,
}

/// Print ID block totals against whole-file totals.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;

	let mut blend = BlendFile::open(&path)?;
	let dna = blend.dna()?;
	let summary = count_id_content(&mut blend, &dna)?;

	if json {
		let payload = IdsJson {
			path: path.display().to_string(),
			id_blocks: summary.id_blocks,
			total_blocks: summary.total_blocks,
			id_objects: summary.id_objects,
			total_objects: summary.total_objects,
			id_bytes: summary.id_bytes,
			total_bytes: summary.total_bytes,
			warnings: warning_strings(&summary.warnings),
		};
		return emit_json(&payload);
	}

	println!("path: {}", path.display());
	println!("id_blocks: {} / {}", summary.id_blocks, summary.total_blocks);
	println!("id_objects: {} / {}", summary.id_objects, summary.total_objects);
	println!("id_bytes: {} / {} ({})", summary.id_bytes, summary.total_bytes, percent(summary.id_bytes, summary.total_bytes));
	print_warnings(&summary.warnings);
	Ok(())
}

fn percent(part: u64, total: u64) -> String {
	if total == 0 {
		return "-".to_owned();
	}
	format!("{:.1}%", part as f64 * 100.0 / total as f64)
}

#[derive(serde::Serialize)]
struct IdsJson {
	path: String,
	id_blocks: u64,
	total_blocks: u64,
	id_objects: u64,
	total_objects: u64,
	id_bytes: u64,
	total_bytes: u64,
	warnings: Vec<String>,
}
