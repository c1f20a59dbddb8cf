use std::path::PathBuf;

use blendinfo::blend::{BlendFile, DumpOptions, Result, locate_address};

use crate::cmd::dump::{FieldJson, fields_json, print_fields};
use crate::cmd::util::{emit_json, parse_address, print_warnings, ptr_hex, render_code, warning_strings};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Address to look up, decimal or `0x` hex.
	pub address: String,
	/// Emit JSON.
	#[arg(long)]
	pub json: bool,
}

/// Print every block whose address range covers the target, with the containing element.
pub fn run(args: Args) -> Result<()> {
	let Args { path, address, json } = args;
	let target = parse_address(&address)?;

	let mut blend = BlendFile::open(&path)?;
	let dna = blend.dna()?;
	let result = locate_address(&mut blend, &dna, target, &DumpOptions::default())?;

	if json {
		let payload = LocateJson {
			path: path.display().to_string(),
			target: ptr_hex(target),
			hits: result
				.hits
				.iter()
				.map(|hit| HitJson {
					code: render_code(hit.head.code),
					file_offset: hit.head.file_offset,
					old: ptr_hex(hit.head.old),
					sdna_nr: hit.head.sdna_nr,
					block_offset: hit.block_offset,
					element: hit.element.as_ref().map(|element| ElementHitJson {
						type_name: element.type_name.to_string(),
						index: element.index,
						element_offset: element.element_offset,
						fields: fields_json(&element.fields),
					}),
				})
				.collect(),
			warnings: warning_strings(&result.warnings),
		};
		return emit_json(&payload);
	}

	println!("path: {}", path.display());
	println!("target: {}", ptr_hex(target));
	println!("hits: {}", result.hits.len());
	for hit in &result.hits {
		println!(
			"block {} @{} old={} sdna={} +{}",
			render_code(hit.head.code),
			hit.head.file_offset,
			ptr_hex(hit.head.old),
			hit.head.sdna_nr,
			hit.block_offset
		);
		if let Some(element) = &hit.element {
			println!("  {}[{}] +{}", element.type_name, element.index, element.element_offset);
			print_fields(&element.fields, 2);
		}
	}
	print_warnings(&result.warnings);
	Ok(())
}

#[derive(serde::Serialize)]
struct LocateJson {
	path: String,
	target: String,
	hits: Vec<HitJson>,
	warnings: Vec<String>,
}

#[derive(serde::Serialize)]
struct HitJson {
	code: String,
	file_offset: u64,
	old: String,
	sdna_nr: u32,
	block_offset: u64,
	element: Option<ElementHitJson>,
}

#[derive(serde::Serialize)]
struct ElementHitJson {
	#[serde(rename = "type")]
	type_name: String,
	index: u64,
	element_offset: u64,
	fields: Vec<FieldJson>,
}
