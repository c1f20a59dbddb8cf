use crate::blend::bytes::uint_from_bytes;
use crate::blend::{BlendError, Dna, Field, FieldKind, Result, StructDef};

/// Embedded-struct nesting ceiling; real schemas stay far below it.
pub const MAX_NESTING_DEPTH: u32 = 64;

/// Position of the field currently being visited.
#[derive(Debug, Clone, Copy)]
pub struct FieldCtx<'p> {
	/// Byte offset of the field, relative to the caller's `base_offset` origin.
	pub offset: usize,
	/// Embedded-struct nesting depth (0 for top-level fields).
	pub depth: u32,
	/// Dotted identifier path from the walked struct (`id.next`, `mtex`).
	pub path: &'p str,
}

/// The pointer-width value stored in a pointer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerSlot {
	/// Byte offset of the slot inside the walked buffer.
	pub offset: usize,
	/// Stored address.
	pub value: u64,
}

/// Callbacks fired while walking one struct instance.
///
/// Every method has an empty default so visitors only implement what they need.
pub trait FieldVisitor {
	/// Called before the fields of an embedded struct are visited.
	fn enter_struct(&mut self, _field: &Field, _def: &StructDef, _ctx: &FieldCtx<'_>) {}

	/// Called after the fields of an embedded struct were visited.
	fn leave_struct(&mut self, _field: &Field, _def: &StructDef, _ctx: &FieldCtx<'_>) {}

	/// Called once per pointer field, in declaration order.
	fn pointer(&mut self, _field: &Field, _slot: PointerSlot, _ctx: &FieldCtx<'_>) {}

	/// Called for scalars and opaque arrays with the field's exact bytes.
	fn leaf(&mut self, _field: &Field, _bytes: &[u8], _ctx: &FieldCtx<'_>) {}
}

/// Walk every field of `def` laid over `bytes`, descending into embedded structs.
///
/// `bytes` must start at the instance; `base_offset` is added to every reported offset.
pub fn walk_struct<V: FieldVisitor + ?Sized>(dna: &Dna, def: &StructDef, bytes: &[u8], base_offset: usize, visitor: &mut V) -> Result<()> {
	let mut path = String::new();
	walk_fields(dna, def, bytes, base_offset, 0, &mut path, visitor)
}

/// Collect every pointer slot of one instance, offsets relative to the instance start.
pub fn pointer_slots(dna: &Dna, def: &StructDef, bytes: &[u8]) -> Result<Vec<PointerSlot>> {
	let mut collector = SlotCollector::default();
	walk_struct(dna, def, bytes, 0, &mut collector)?;
	Ok(collector.slots)
}

#[derive(Default)]
struct SlotCollector {
	slots: Vec<PointerSlot>,
}

impl FieldVisitor for SlotCollector {
	fn pointer(&mut self, _field: &Field, slot: PointerSlot, _ctx: &FieldCtx<'_>) {
		self.slots.push(slot);
	}
}

fn walk_fields<V: FieldVisitor + ?Sized>(
	dna: &Dna,
	def: &StructDef,
	bytes: &[u8],
	base_offset: usize,
	depth: u32,
	path: &mut String,
	visitor: &mut V,
) -> Result<()> {
	if depth >= MAX_NESTING_DEPTH {
		return Err(BlendError::DnaNestingTooDeep {
			struct_name: def.name.clone(),
			max_depth: MAX_NESTING_DEPTH,
		});
	}

	let prefix_len = path.len();
	for field in &def.fields {
		let end = field.offset + field.size;
		if end > bytes.len() {
			return Err(BlendError::ElementTooSmall {
				type_name: def.name.clone(),
				field: field.name.clone(),
				need: end,
				have: bytes.len(),
			});
		}
		let raw = &bytes[field.offset..end];
		let offset = base_offset + field.offset;

		path.truncate(prefix_len);
		path.push_str(&field.ident);

		match field.kind {
			FieldKind::Pointer => {
				let slot = PointerSlot {
					offset,
					value: uint_from_bytes(raw, dna.endianness),
				};
				visitor.pointer(field, slot, &FieldCtx { offset, depth, path: path.as_str() });
			}
			FieldKind::Struct(sdna_nr) => {
				let Some(inner) = dna.struct_by_sdna(sdna_nr) else {
					return Err(BlendError::DnaIndexOutOfRange {
						kind: "field.struct",
						idx: sdna_nr,
						max: dna.structs.len().saturating_sub(1) as u32,
					});
				};
				visitor.enter_struct(field, inner, &FieldCtx { offset, depth, path: path.as_str() });
				let field_path_len = path.len();
				path.push('.');
				walk_fields(dna, inner, raw, offset, depth + 1, path, visitor)?;
				path.truncate(field_path_len);
				visitor.leave_struct(field, inner, &FieldCtx { offset, depth, path: path.as_str() });
			}
			FieldKind::Scalar(_) | FieldKind::Blob => {
				visitor.leaf(field, raw, &FieldCtx { offset, depth, path: path.as_str() });
			}
		}
	}
	path.truncate(prefix_len);

	Ok(())
}
