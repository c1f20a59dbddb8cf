use std::io::{Read, Seek};

use crate::blend::stats::typed_struct;
use crate::blend::{BHead, BlendError, BlendFile, BlockWarning, Dna, Field, FieldCtx, FieldVisitor, PointerSlot, Result, StructDef, Value, walk_struct};

/// Options for full block dumps.
#[derive(Debug, Clone, Copy)]
pub struct DumpOptions {
	/// Maximum bytes previewed from opaque payloads.
	pub preview_len: usize,
	/// Render one-dimensional `char` arrays as NUL-terminated text.
	pub char_arrays_as_text: bool,
}

impl Default for DumpOptions {
	fn default() -> Self {
		Self {
			preview_len: 64,
			char_arrays_as_text: true,
		}
	}
}

/// One dumped block.
#[derive(Debug, Clone)]
pub struct DumpBlock {
	/// Block header.
	pub head: BHead,
	/// Struct type name, when the block is typed.
	pub type_name: Option<Box<str>>,
	/// Payload rendering.
	pub body: DumpBody,
	/// Set when the struct index was out of range and the block was dumped as opaque.
	pub warning: Option<BlockWarning>,
}

/// Payload rendering of one block.
#[derive(Debug, Clone)]
pub enum DumpBody {
	/// Opaque payload preview.
	Opaque {
		/// First bytes of the payload.
		preview: Vec<u8>,
		/// Bytes not included in `preview`.
		remaining: u64,
	},
	/// Reflected struct elements.
	Elements(Vec<DumpElement>),
}

/// One reflected element of a typed block.
#[derive(Debug, Clone)]
pub struct DumpElement {
	/// Element index inside the block.
	pub index: u64,
	/// Flattened fields in traversal order.
	pub fields: Vec<DumpField>,
}

/// One flattened field line.
#[derive(Debug, Clone)]
pub struct DumpField {
	/// Embedded-struct nesting depth.
	pub depth: u32,
	/// Byte offset inside the element.
	pub offset: usize,
	/// Base type name.
	pub type_name: Box<str>,
	/// Declarator text.
	pub decl: Box<str>,
	/// Field size in bytes.
	pub size: usize,
	/// Decoded value; `None` for embedded-struct headers whose fields follow one level deeper.
	pub value: Option<Value>,
}

/// Reflect one struct instance into flattened dump fields.
pub fn reflect_element(dna: &Dna, def: &StructDef, bytes: &[u8], options: &DumpOptions) -> Result<Vec<DumpField>> {
	let mut collector = FieldCollector {
		dna,
		options,
		fields: Vec::with_capacity(def.fields.len()),
	};
	walk_struct(dna, def, bytes, 0, &mut collector)?;
	Ok(collector.fields)
}

struct FieldCollector<'a> {
	dna: &'a Dna,
	options: &'a DumpOptions,
	fields: Vec<DumpField>,
}

impl FieldCollector<'_> {
	fn push(&mut self, field: &Field, ctx: &FieldCtx<'_>, value: Option<Value>) {
		self.fields.push(DumpField {
			depth: ctx.depth,
			offset: ctx.offset,
			type_name: field.type_name.clone(),
			decl: field.name.clone(),
			size: field.size,
			value,
		});
	}
}

impl FieldVisitor for FieldCollector<'_> {
	fn enter_struct(&mut self, field: &Field, _def: &StructDef, ctx: &FieldCtx<'_>) {
		self.push(field, ctx, None);
	}

	fn pointer(&mut self, field: &Field, slot: PointerSlot, ctx: &FieldCtx<'_>) {
		self.push(field, ctx, Some(Value::Ptr(slot.value)));
	}

	fn leaf(&mut self, field: &Field, bytes: &[u8], ctx: &FieldCtx<'_>) {
		let value = Value::decode_leaf(field, bytes, self.dna.endianness, self.options.char_arrays_as_text);
		self.push(field, ctx, Some(value));
	}
}

/// Dump every block of `file`, collecting the result.
pub fn dump_blocks<S: Read + Seek>(file: &mut BlendFile<S>, dna: &Dna, options: &DumpOptions) -> Result<Vec<DumpBlock>> {
	let mut out = Vec::new();
	dump_blocks_with(file, dna, options, |block| {
		out.push(block);
		Ok(())
	})?;
	Ok(out)
}

/// Dump every block of `file`, handing each one to `sink` as soon as it is built.
///
/// A typed block whose payload is not `struct.size * count` bytes aborts the dump.
pub fn dump_blocks_with<S, F>(file: &mut BlendFile<S>, dna: &Dna, options: &DumpOptions, mut sink: F) -> Result<()>
where
	S: Read + Seek,
	F: FnMut(DumpBlock) -> Result<()>,
{
	let mut blocks = file.blocks();
	let mut count = 0_u64;
	while let Some(head) = blocks.next_block()? {
		count += 1;
		let mut found = Vec::new();
		let def = typed_struct(dna, &head, &mut found);
		let warning = found.pop();

		let Some(def) = def else {
			let take = head.len.min(options.preview_len as u64) as usize;
			let mut preview = vec![0_u8; take];
			blocks.read_payload_at(0, &mut preview)?;
			sink(DumpBlock {
				head,
				type_name: None,
				body: DumpBody::Opaque {
					preview,
					remaining: head.len - take as u64,
				},
				warning,
			})?;
			continue;
		};

		let expected = (def.size as u64).saturating_mul(head.nr);
		if expected != head.len {
			return Err(BlendError::SizeMismatch {
				code: head.block_code(),
				at: head.file_offset,
				type_name: def.name.clone(),
				expected,
				got: head.len,
			});
		}

		let payload = blocks.read_payload()?;
		let mut elements = Vec::new();
		if def.size > 0 {
			for (index, bytes) in payload.chunks_exact(def.size).enumerate() {
				elements.push(DumpElement {
					index: index as u64,
					fields: reflect_element(dna, def, bytes, options)?,
				});
			}
		}

		sink(DumpBlock {
			head,
			type_name: Some(def.name.clone()),
			body: DumpBody::Elements(elements),
			warning: None,
		})?;
	}
	log::debug!("dumped {count} blocks");

	Ok(())
}

#[cfg(test)]
mod tests;
