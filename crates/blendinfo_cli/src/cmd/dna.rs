use std::path::PathBuf;

use blendinfo::blend::{BlendError, BlendFile, Dna, Result, StructDef};

use crate::cmd::util::emit_json;

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long = "struct")]
	pub struct_name: Option<String>,
	/// Emit JSON.
	#[arg(long)]
	pub json: bool,
}

/// Print schema tables, or the layout of one struct.
pub fn run(args: Args) -> Result<()> {
	let Args { path, struct_name, json } = args;

	let mut blend = BlendFile::open(&path)?;
	let dna = blend.dna()?;

	let selected: Vec<(u32, &StructDef)> = match struct_name {
		Some(name) => vec![dna.struct_by_name(&name).ok_or(BlendError::DnaStructNotFound { name })?],
		None => dna.structs.iter().enumerate().map(|(idx, item)| (idx as u32, item)).collect(),
	};

	if json {
		let payload = DnaJson {
			path: path.display().to_string(),
			pointer_size: dna.pointer_size,
			endianness: dna.endianness.as_str(),
			names: dna.names.len(),
			types: dna.types.len(),
			structs: selected.iter().map(|(idx, item)| struct_json(&dna, *idx, item)).collect(),
		};
		return emit_json(&payload);
	}

	println!("path: {}", path.display());
	println!("dna_names: {}", dna.names.len());
	println!("dna_types: {}", dna.types.len());
	println!("dna_structs: {}", dna.structs.len());
	for (idx, item) in selected {
		println!("struct {idx}: {} size={} id={}", item.name, item.size, item.is_id);
		for field in &item.fields {
			println!("  {:>6} {:>6}  {} {}", field.offset, field.size, field.type_name, field.name);
		}
	}

	Ok(())
}

fn struct_json(dna: &Dna, sdna_nr: u32, item: &StructDef) -> StructJson {
	StructJson {
		sdna_nr,
		name: item.name.to_string(),
		size: item.size,
		is_id: item.is_id,
		fields_size: item.fields_size(),
		fields: item
			.fields
			.iter()
			.map(|field| FieldJson {
				type_name: dna.type_name(field.type_idx).to_owned(),
				decl: field.name.to_string(),
				offset: field.offset,
				size: field.size,
				pointer: field.is_ptr,
			})
			.collect(),
	}
}

#[derive(serde::Serialize)]
struct DnaJson {
	path: String,
	pointer_size: usize,
	endianness: &'static str,
	names: usize,
	types: usize,
	structs: Vec<StructJson>,
}

#[derive(serde::Serialize)]
struct StructJson {
	sdna_nr: u32,
	name: String,
	size: usize,
	is_id: bool,
	fields_size: usize,
	fields: Vec<FieldJson>,
}

#[derive(serde::Serialize)]
struct FieldJson {
	#[serde(rename = "type")]
	type_name: String,
	decl: String,
	offset: usize,
	size: usize,
	pointer: bool,
}
