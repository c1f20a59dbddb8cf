//! Shared test helpers for workspace crates.
//!
//! Tests never ship binary fixtures; every `.blend` used by the suite is assembled here from a small schema
//! description and a list of blocks.

use std::io::Write;

use tempfile::NamedTempFile;

/// Block code of the schema block.
pub const DNA1: [u8; 4] = *b"DNA1";
/// Block code of the stream terminator.
pub const ENDB: [u8; 4] = *b"ENDB";

/// Builder for an SDNA payload (`SDNA` + `NAME`/`TYPE`/`TLEN`/`STRC`).
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
	names: Vec<String>,
	types: Vec<(String, u16)>,
	structs: Vec<(u16, Vec<(u16, u16)>)>,
}

impl SchemaBuilder {
	/// Create an empty schema.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a type (or return the index of an existing one with the same name).
	pub fn add_type(&mut self, name: &str, len: u16) -> u16 {
		if let Some(idx) = self.types.iter().position(|(item, _)| item == name) {
			self.types[idx].1 = len;
			return idx as u16;
		}
		self.types.push((name.to_owned(), len));
		(self.types.len() - 1) as u16
	}

	/// Register a field declaration string, reusing duplicates.
	pub fn add_name(&mut self, name: &str) -> u16 {
		if let Some(idx) = self.names.iter().position(|item| item == name) {
			return idx as u16;
		}
		self.names.push(name.to_owned());
		(self.names.len() - 1) as u16
	}

	/// Append a struct made of `(type name, declaration)` fields and return its struct index.
	///
	/// Field types must have been registered with [`SchemaBuilder::add_type`] (or be earlier structs).
	pub fn add_struct(&mut self, name: &str, len: u16, fields: &[(&str, &str)]) -> u32 {
		let type_idx = self.add_type(name, len);
		let mut refs = Vec::with_capacity(fields.len());
		for (type_name, decl) in fields {
			let field_type = self
				.types
				.iter()
				.position(|(item, _)| item == type_name)
				.unwrap_or_else(|| panic!("field type {type_name} must be registered first")) as u16;
			refs.push((field_type, self.add_name(decl)));
		}
		self.structs.push((type_idx, refs));
		(self.structs.len() - 1) as u32
	}

	/// Serialize the schema as a `DNA1` payload.
	pub fn encode(&self, big_endian: bool) -> Vec<u8> {
		let mut out = Vec::new();
		out.extend_from_slice(b"SDNA");

		out.extend_from_slice(b"NAME");
		out.extend_from_slice(&encode_u32(self.names.len() as u32, big_endian));
		for name in &self.names {
			out.extend_from_slice(name.as_bytes());
			out.push(0);
		}
		pad4(&mut out);

		out.extend_from_slice(b"TYPE");
		out.extend_from_slice(&encode_u32(self.types.len() as u32, big_endian));
		for (name, _) in &self.types {
			out.extend_from_slice(name.as_bytes());
			out.push(0);
		}
		pad4(&mut out);

		out.extend_from_slice(b"TLEN");
		for (_, len) in &self.types {
			out.extend_from_slice(&encode_u16(*len, big_endian));
		}
		pad4(&mut out);

		out.extend_from_slice(b"STRC");
		out.extend_from_slice(&encode_u32(self.structs.len() as u32, big_endian));
		for (type_idx, fields) in &self.structs {
			out.extend_from_slice(&encode_u16(*type_idx, big_endian));
			out.extend_from_slice(&encode_u16(fields.len() as u16, big_endian));
			for (field_type, field_name) in fields {
				out.extend_from_slice(&encode_u16(*field_type, big_endian));
				out.extend_from_slice(&encode_u16(*field_name, big_endian));
			}
		}

		out
	}
}

/// Builder for a whole uncompressed `.blend` byte stream.
#[derive(Debug, Clone)]
pub struct BlendBuilder {
	pointer_size: usize,
	big_endian: bool,
	version: [u8; 3],
	blocks: Vec<u8>,
}

impl BlendBuilder {
	/// Create a builder for the given pointer width (4 or 8) and byte order.
	pub fn new(pointer_size: usize, big_endian: bool) -> Self {
		assert!(matches!(pointer_size, 4 | 8), "pointer size must be 4 or 8");
		Self {
			pointer_size,
			big_endian,
			version: *b"279",
			blocks: Vec::new(),
		}
	}

	/// Pointer width used for headers and payload helpers.
	pub fn pointer_size(&self) -> usize {
		self.pointer_size
	}

	/// Encoded size of one block header.
	pub fn bhead_size(&self) -> usize {
		16 + self.pointer_size
	}

	/// The 12-byte file header.
	pub fn file_header(&self) -> [u8; 12] {
		let mut out = [0_u8; 12];
		out[..7].copy_from_slice(b"BLENDER");
		out[7] = if self.pointer_size == 4 { b'_' } else { b'-' };
		out[8] = if self.big_endian { b'V' } else { b'v' };
		out[9..].copy_from_slice(&self.version);
		out
	}

	/// Append a raw block.
	pub fn block(&mut self, code: [u8; 4], old: u64, sdna_nr: u32, nr: u32, payload: &[u8]) -> &mut Self {
		self.blocks.extend_from_slice(&code);
		self.blocks.extend_from_slice(&encode_u32(payload.len() as u32, self.big_endian));
		self.blocks.extend_from_slice(&self.ptr_bytes(old));
		self.blocks.extend_from_slice(&encode_u32(sdna_nr, self.big_endian));
		self.blocks.extend_from_slice(&encode_u32(nr, self.big_endian));
		self.blocks.extend_from_slice(payload);
		self
	}

	/// Append the `DNA1` block for `schema`.
	pub fn dna(&mut self, old: u64, schema: &SchemaBuilder) -> &mut Self {
		let payload = schema.encode(self.big_endian);
		self.block(DNA1, old, 0, 1, &payload)
	}

	/// Start a payload writer using this file's pointer width and byte order.
	pub fn payload(&self) -> PayloadWriter {
		PayloadWriter {
			pointer_size: self.pointer_size,
			big_endian: self.big_endian,
			bytes: Vec::new(),
		}
	}

	/// Encode a pointer value in this file's width and byte order.
	pub fn ptr_bytes(&self, value: u64) -> Vec<u8> {
		encode_ptr(value, self.pointer_size, self.big_endian)
	}

	/// Finish the stream with an `ENDB` block.
	pub fn build(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(12 + self.blocks.len() + self.bhead_size());
		out.extend_from_slice(&self.file_header());
		out.extend_from_slice(&self.blocks);
		out.extend_from_slice(&ENDB);
		out.extend_from_slice(&encode_u32(0, self.big_endian));
		out.extend_from_slice(&self.ptr_bytes(0));
		out.extend_from_slice(&encode_u32(0, self.big_endian));
		out.extend_from_slice(&encode_u32(0, self.big_endian));
		out
	}
}

/// Little helper for laying out struct payload bytes.
#[derive(Debug, Clone)]
pub struct PayloadWriter {
	pointer_size: usize,
	big_endian: bool,
	bytes: Vec<u8>,
}

impl PayloadWriter {
	/// Append a pointer.
	pub fn ptr(mut self, value: u64) -> Self {
		self.bytes.extend_from_slice(&encode_ptr(value, self.pointer_size, self.big_endian));
		self
	}

	/// Append an `int`.
	pub fn i32(mut self, value: i32) -> Self {
		self.bytes.extend_from_slice(&encode_u32(value as u32, self.big_endian));
		self
	}

	/// Append a `short`.
	pub fn i16(mut self, value: i16) -> Self {
		self.bytes.extend_from_slice(&encode_u16(value as u16, self.big_endian));
		self
	}

	/// Append a `float`.
	pub fn f32(mut self, value: f32) -> Self {
		self.bytes.extend_from_slice(&encode_u32(value.to_bits(), self.big_endian));
		self
	}

	/// Append a fixed-width, zero-padded text field.
	pub fn text(mut self, value: &str, width: usize) -> Self {
		let mut raw = value.as_bytes().to_vec();
		raw.resize(width, 0);
		self.bytes.extend_from_slice(&raw);
		self
	}

	/// Append raw bytes.
	pub fn raw(mut self, value: &[u8]) -> Self {
		self.bytes.extend_from_slice(value);
		self
	}

	/// Return the accumulated payload.
	pub fn finish(self) -> Vec<u8> {
		self.bytes
	}
}

/// Encode a pointer-width value.
pub fn encode_ptr(value: u64, pointer_size: usize, big_endian: bool) -> Vec<u8> {
	match (pointer_size, big_endian) {
		(4, false) => (value as u32).to_le_bytes().to_vec(),
		(4, true) => (value as u32).to_be_bytes().to_vec(),
		(_, false) => value.to_le_bytes().to_vec(),
		(_, true) => value.to_be_bytes().to_vec(),
	}
}

fn encode_u32(value: u32, big_endian: bool) -> [u8; 4] {
	if big_endian { value.to_be_bytes() } else { value.to_le_bytes() }
}

fn encode_u16(value: u16, big_endian: bool) -> [u8; 2] {
	if big_endian { value.to_be_bytes() } else { value.to_le_bytes() }
}

fn pad4(out: &mut Vec<u8>) {
	while out.len() % 4 != 0 {
		out.push(0);
	}
}

/// Write bytes to a fresh temporary file and return its handle.
pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
	let mut file = NamedTempFile::new().expect("temp file creates");
	file.write_all(bytes).expect("temp file writes");
	file.flush().expect("temp file flushes");
	file
}

/// Canned synthetic files shared by core and CLI tests.
pub mod fixtures {
	use super::{BlendBuilder, SchemaBuilder};

	/// Origin address of the data block in [`int_ptr_pair`].
	pub const PAIR_OLD: u64 = 0x1000;
	/// Origin address of the `Object` block in [`id_library`].
	pub const OB_OLD: u64 = 0x1000;
	/// Origin address of the `Mesh` block in [`id_library`].
	pub const ME_OLD: u64 = 0x2000;
	/// Origin address of the vertex array block in [`id_library`].
	pub const VERTS_OLD: u64 = 0x3000;
	/// Origin address of the opaque block in [`id_library`].
	pub const BLOB_OLD: u64 = 0x4000;
	/// Origin address of the `DNA1` block in both fixtures.
	pub const DNA_OLD: u64 = 0x9000;

	/// Schema with a placeholder at index 0 and `Pair { int value; Pair *next; }` at index 1.
	pub fn int_ptr_pair_schema() -> SchemaBuilder {
		let mut schema = SchemaBuilder::new();
		schema.add_type("int", 4);
		schema.add_struct("Link", 0, &[]);
		schema.add_struct("Pair", 8, &[("int", "value"), ("Pair", "*next")]);
		schema
	}

	/// 4-byte little-endian file: one `DATA` block of two `Pair` elements, then `DNA1`.
	///
	/// Element 0 holds `(7, 0x1008)`, element 1 holds `(9, 0)`.
	pub fn int_ptr_pair() -> Vec<u8> {
		let mut blend = BlendBuilder::new(4, false);
		let payload = blend.payload().i32(7).ptr(PAIR_OLD + 8).i32(9).ptr(0).finish();
		blend.block(*b"DATA", PAIR_OLD, 1, 2, &payload);
		blend.dna(DNA_OLD, &int_ptr_pair_schema());
		blend.build()
	}

	/// Schema describing a tiny ID library.
	///
	/// Struct indices: `Link`=0 (placeholder), `ID`=1, `Object`=2, `Mesh`=3, `Vert`=4.
	pub fn id_library_schema(pointer_size: usize) -> SchemaBuilder {
		let ptr = pointer_size as u16;
		let id_len = 2 * ptr + 8;
		let mut schema = SchemaBuilder::new();
		schema.add_type("char", 1);
		schema.add_type("short", 2);
		schema.add_type("int", 4);
		schema.add_type("float", 4);
		schema.add_type("void", 0);
		schema.add_struct("Link", 0, &[]);
		schema.add_struct("ID", id_len, &[("void", "*next"), ("void", "*prev"), ("char", "name[8]")]);
		schema.add_type("Vert", 16);
		schema.add_struct("Object", id_len + ptr + 16, &[("ID", "id"), ("void", "*data"), ("float", "loc[3]"), ("int", "flag")]);
		schema.add_struct("Mesh", id_len + ptr + 4, &[("ID", "id"), ("Vert", "*verts"), ("int", "totvert")]);
		schema.add_struct("Vert", 16, &[("float", "co[3]"), ("short", "flag"), ("short", "pad")]);
		schema
	}

	/// File with an `Object` and a `Mesh` ID block, a two-element vertex block, an opaque block and `DNA1`.
	///
	/// Pointer layout: `OB.id.next -> ME`, `OB.data -> ME`, `ME.id.prev -> OB`, `ME.verts -> VERTS`.
	pub fn id_library(pointer_size: usize, big_endian: bool) -> Vec<u8> {
		let mut blend = BlendBuilder::new(pointer_size, big_endian);
		let object = blend
			.payload()
			.ptr(ME_OLD)
			.ptr(0)
			.text("OBCube", 8)
			.ptr(ME_OLD)
			.f32(1.0)
			.f32(2.0)
			.f32(3.0)
			.i32(5)
			.finish();
		let mesh = blend.payload().ptr(0).ptr(OB_OLD).text("MECube", 8).ptr(VERTS_OLD).i32(2).finish();
		let verts = blend
			.payload()
			.f32(0.0)
			.f32(0.5)
			.f32(1.0)
			.i16(1)
			.i16(0)
			.f32(-1.0)
			.f32(-0.5)
			.f32(0.0)
			.i16(2)
			.i16(0)
			.finish();

		blend.block(*b"OB\0\0", OB_OLD, 2, 1, &object);
		blend.block(*b"ME\0\0", ME_OLD, 3, 1, &mesh);
		blend.block(*b"DATA", VERTS_OLD, 4, 2, &verts);
		blend.block(*b"TEST", BLOB_OLD, 0, 1, b"0123456789");
		blend.dna(DNA_OLD, &id_library_schema(pointer_size));
		blend.build()
	}

	/// Schema where a pointer-carrying struct only appears as an inline array.
	///
	/// Struct indices: `Link`=0 (placeholder), `ID`=1 (`void *next; int flag`), `Holder`=2 (`ID ids[2]; void *owner`).
	pub fn id_array_schema(pointer_size: usize) -> SchemaBuilder {
		let ptr = pointer_size as u16;
		let id_len = ptr + 4;
		let mut schema = SchemaBuilder::new();
		schema.add_type("int", 4);
		schema.add_type("void", 0);
		schema.add_struct("Link", 0, &[]);
		schema.add_struct("ID", id_len, &[("void", "*next"), ("int", "flag")]);
		schema.add_struct("Holder", 2 * id_len + ptr, &[("ID", "ids[2]"), ("void", "*owner")]);
		schema
	}
}
