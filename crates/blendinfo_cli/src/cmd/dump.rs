use std::path::PathBuf;

use blendinfo::blend::{BlendFile, DumpBlock, DumpBody, DumpField, DumpOptions, Result, Value, dump_blocks_with};

use crate::cmd::util::{emit_json, ptr_hex, render_code};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Bytes previewed from opaque payloads.
	#[arg(long, default_value_t = 64)]
	pub preview: usize,
	/// Print `char` arrays as raw bytes instead of text.
	#[arg(long)]
	pub raw_chars: bool,
	/// Emit JSON.
	#[arg(long)]
	pub json: bool,
}

/// Print every block, reflecting typed payloads through the schema.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		preview,
		raw_chars,
		json,
	} = args;

	let mut blend = BlendFile::open(&path)?;
	let dna = blend.dna()?;
	let options = DumpOptions {
		preview_len: preview,
		char_arrays_as_text: !raw_chars,
	};

	if json {
		let mut blocks = Vec::new();
		dump_blocks_with(&mut blend, &dna, &options, |block| {
			blocks.push(block_json(&block));
			Ok(())
		})?;
		let payload = DumpJson {
			path: path.display().to_string(),
			blocks,
		};
		return emit_json(&payload);
	}

	println!("path: {}", path.display());
	dump_blocks_with(&mut blend, &dna, &options, |block| {
		print_block(&block);
		Ok(())
	})
}

fn print_block(block: &DumpBlock) {
	let head = &block.head;
	println!(
		"block {} @{} old={} sdna={} nr={} len={}{}",
		render_code(head.code),
		head.file_offset,
		ptr_hex(head.old),
		head.sdna_nr,
		head.nr,
		head.len,
		block.type_name.as_deref().map(|name| format!(" type={name}")).unwrap_or_default()
	);
	if let Some(warning) = &block.warning {
		println!("  warning: {warning}");
	}

	match &block.body {
		DumpBody::Opaque { preview, remaining } => {
			let hex: String = preview.iter().map(|byte| format!("{byte:02x}")).collect();
			println!("  data: {hex} (+{remaining} bytes)");
		}
		DumpBody::Elements(elements) => {
			for element in elements {
				println!("  [{}]", element.index);
				print_fields(&element.fields, 2);
			}
		}
	}
}

/// Print flattened fields indented by nesting depth.
pub(crate) fn print_fields(fields: &[DumpField], indent: usize) {
	for field in fields {
		let pad = "  ".repeat(indent + field.depth as usize);
		match &field.value {
			Some(value) => println!("{pad}+{} {} {} = {}", field.offset, field.type_name, field.decl, value),
			None => println!("{pad}+{} {} {}", field.offset, field.type_name, field.decl),
		}
	}
}

fn block_json(block: &DumpBlock) -> BlockJson {
	let head = &block.head;
	let (preview, remaining, elements) = match &block.body {
		DumpBody::Opaque { preview, remaining } => (Some(preview.iter().map(|byte| format!("{byte:02x}")).collect()), Some(*remaining), None),
		DumpBody::Elements(elements) => (
			None,
			None,
			Some(
				elements
					.iter()
					.map(|element| ElementJson {
						index: element.index,
						fields: fields_json(&element.fields),
					})
					.collect(),
			),
		),
	};

	BlockJson {
		code: render_code(head.code),
		file_offset: head.file_offset,
		old: ptr_hex(head.old),
		sdna_nr: head.sdna_nr,
		nr: head.nr,
		len: head.len,
		type_name: block.type_name.as_deref().map(str::to_owned),
		warning: block.warning.as_ref().map(ToString::to_string),
		preview,
		remaining,
		elements,
	}
}

/// Convert flattened fields for JSON output.
pub(crate) fn fields_json(fields: &[DumpField]) -> Vec<FieldJson> {
	fields
		.iter()
		.map(|field| FieldJson {
			depth: field.depth,
			offset: field.offset,
			type_name: field.type_name.to_string(),
			decl: field.decl.to_string(),
			size: field.size,
			value: field.value.as_ref().map(value_to_json_value),
		})
		.collect()
}

fn value_to_json_value(value: &Value) -> serde_json::Value {
	use serde_json::Value as JsonValue;

	match value {
		Value::Char(v) => serde_json::json!(v),
		Value::I64(v) => serde_json::json!(v),
		Value::U64(v) => serde_json::json!(v),
		Value::F32(v) => serde_json::json!(v),
		Value::F64(v) => serde_json::json!(v),
		Value::String(v) => serde_json::json!(v.as_ref()),
		Value::Ptr(v) => serde_json::json!(ptr_hex(*v)),
		Value::Bytes(v) => JsonValue::Array(v.iter().map(|item| serde_json::json!(item)).collect()),
	}
}

#[derive(serde::Serialize)]
struct DumpJson {
	path: String,
	blocks: Vec<BlockJson>,
}

#[derive(serde::Serialize)]
struct BlockJson {
	code: String,
	file_offset: u64,
	old: String,
	sdna_nr: u32,
	nr: u64,
	len: u64,
	#[serde(rename = "type")]
	type_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	warning: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	preview: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	remaining: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	elements: Option<Vec<ElementJson>>,
}

#[derive(serde::Serialize)]
struct ElementJson {
	index: u64,
	fields: Vec<FieldJson>,
}

#[derive(serde::Serialize)]
pub(crate) struct FieldJson {
	depth: u32,
	offset: usize,
	#[serde(rename = "type")]
	type_name: String,
	decl: String,
	size: usize,
	value: Option<serde_json::Value>,
}
