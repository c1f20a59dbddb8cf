use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use blendinfo::blend::{BlendError, BlendFile, PointerStreams, Result, StripSummary, replace_pointers, zero_pointers};

use crate::cmd::util::emit_json;

#[derive(clap::Args)]
#[command(group(clap::ArgGroup::new("mode").required(true).multiple(true).args(["extract_to", "restore_from", "zero"])))]
pub struct Args {
	/// File rewritten in place; back it up first.
	pub path: PathBuf,
	/// Write every original address to this file.
	#[arg(long)]
	pub extract_to: Option<PathBuf>,
	/// Overwrite every address with values read from this file.
	#[arg(long)]
	pub restore_from: Option<PathBuf>,
	/// Overwrite every address with zero.
	#[arg(long, conflicts_with = "restore_from")]
	pub zero: bool,
	/// Emit JSON.
	#[arg(long)]
	pub json: bool,
}

/// Extract, restore, swap, or zero every stored address of the file in one pass.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		extract_to,
		restore_from,
		zero,
		json,
	} = args;

	check_distinct_files(&path, extract_to.as_deref(), restore_from.as_deref())?;
	let mut blend = BlendFile::open_rw(&path)?;
	let dna = blend.dna()?;

	let mut extract = extract_to.as_ref().map(File::create).transpose()?.map(BufWriter::new);
	let mut restore = restore_from.as_ref().map(File::open).transpose()?.map(BufReader::new);
	let extract_ref = extract.as_mut().map(|out| out as &mut dyn Write);

	let summary = if zero {
		zero_pointers(&mut blend, &dna, extract_ref)?
	} else {
		let streams = PointerStreams {
			restore_from: restore.as_mut().map(|input| input as &mut dyn Read),
			extract_to: extract_ref,
		};
		replace_pointers(&mut blend, &dna, streams)?
	};

	if json {
		let payload = StripJson {
			path: path.display().to_string(),
			mode: mode_label(extract_to.is_some(), restore_from.is_some(), zero),
			blocks: summary.blocks,
			header_pointers: summary.header_pointers,
			field_pointers: summary.field_pointers,
			rewritten_elements: summary.rewritten_elements,
		};
		return emit_json(&payload);
	}

	print_summary(&path, mode_label(extract_to.is_some(), restore_from.is_some(), zero), &summary);
	Ok(())
}

/// Refuse to run when one file fills two roles; creating the extract file would truncate it first.
fn check_distinct_files(path: &Path, extract_to: Option<&Path>, restore_from: Option<&Path>) -> Result<()> {
	let roles = [(Some(path), "the rewritten file"), (restore_from, "the restore source"), (extract_to, "the extract target")];
	for (idx, (left, first)) in roles.iter().enumerate() {
		let Some(left) = left else {
			continue;
		};
		for (right, second) in &roles[idx + 1..] {
			match right {
				Some(right) if same_file(left, right) => {
					return Err(BlendError::SideStreamConflict {
						path: right.display().to_string(),
						first: *first,
						second: *second,
					});
				}
				_ => {}
			}
		}
	}
	Ok(())
}

fn same_file(left: &Path, right: &Path) -> bool {
	if left == right {
		return true;
	}
	match (fs::canonicalize(left), fs::canonicalize(right)) {
		(Ok(left), Ok(right)) => left == right,
		_ => false,
	}
}

fn print_summary(path: &std::path::Path, mode: &str, summary: &StripSummary) {
	println!("path: {}", path.display());
	println!("mode: {mode}");
	println!("blocks: {}", summary.blocks);
	println!("header_pointers: {}", summary.header_pointers);
	println!("field_pointers: {}", summary.field_pointers);
	println!("rewritten_elements: {}", summary.rewritten_elements);
}

fn mode_label(extract: bool, restore: bool, zero: bool) -> &'static str {
	match (extract, restore || zero) {
		(true, true) => "swap",
		(true, false) => "extract",
		(false, true) if zero => "zero",
		_ => "restore",
	}
}

#[derive(serde::Serialize)]
struct StripJson {
	path: String,
	mode: &'static str,
	blocks: u64,
	header_pointers: u64,
	field_pointers: u64,
	rewritten_elements: u64,
}
