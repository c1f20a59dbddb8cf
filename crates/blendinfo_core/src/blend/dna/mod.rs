use crate::blend::bytes::Cursor;
use crate::blend::decl::parse_field_decl;
use crate::blend::{BlendError, Endianness, Result};

/// Parsed SDNA schema with fully resolved struct layouts.
#[derive(Debug)]
pub struct Dna {
	/// Field declarator strings from `NAME`.
	pub names: Vec<Box<str>>,
	/// Type table from `TYPE` + `TLEN`.
	pub types: Vec<DnaType>,
	/// Struct table from `STRC`; the position is the block struct index.
	pub structs: Vec<StructDef>,
	/// Fast mapping `type_idx -> sdna_struct_idx`.
	pub struct_for_type: Vec<Option<u32>>,
	/// Pointer width the layouts were computed with.
	pub pointer_size: usize,
	/// Byte order of the source container.
	pub endianness: Endianness,
}

/// One entry of the type table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnaType {
	/// Primitive or struct type name.
	pub name: Box<str>,
	/// Declared byte length.
	pub len: u16,
}

/// One struct declaration with its computed layout.
#[derive(Debug, Clone)]
pub struct StructDef {
	/// Type index for this struct's name.
	pub type_idx: u16,
	/// Struct type name.
	pub name: Box<str>,
	/// Declared size from the type table.
	pub size: usize,
	/// Fields in declaration order with contiguous offsets.
	pub fields: Vec<Field>,
	/// First field is named exactly `id`.
	pub is_id: bool,
}

/// One resolved field of a struct.
#[derive(Debug, Clone)]
pub struct Field {
	/// Original declarator text (`*next`, `name[64]`, ...).
	pub name: Box<str>,
	/// Bare identifier without stars or dimensions.
	pub ident: Box<str>,
	/// Type table index of the base type.
	pub type_idx: u16,
	/// Base type name.
	pub type_name: Box<str>,
	/// Declared length of the base type.
	pub type_len: u16,
	/// Byte offset inside the owning struct.
	pub offset: usize,
	/// Total byte size after array and pointer-width rules.
	pub size: usize,
	/// Inline array dimensions.
	pub dims: Vec<usize>,
	/// Declarator names a pointer.
	pub is_ptr: bool,
	/// Traversal class resolved once at decode time.
	pub kind: FieldKind,
}

/// How the reflector treats a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
	/// One pointer-width value, array suffix or not.
	Pointer,
	/// Embedded non-array struct, by struct index.
	Struct(u32),
	/// Primitive scalar with a known decoding.
	Scalar(ScalarKind),
	/// Anything else: primitive arrays, struct arrays, unknown primitives.
	Blob,
}

/// Primitive decodings understood by the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
	/// One-byte `char`.
	Char,
	/// Signed 8-bit integer.
	I8,
	/// Unsigned 8-bit integer.
	U8,
	/// Signed 16-bit integer.
	I16,
	/// Unsigned 16-bit integer.
	U16,
	/// Signed 32-bit integer.
	I32,
	/// Unsigned 32-bit integer.
	U32,
	/// Signed 64-bit integer.
	I64,
	/// Unsigned 64-bit integer.
	U64,
	/// IEEE single.
	F32,
	/// IEEE double.
	F64,
}

impl ScalarKind {
	/// Classify a primitive by type name and declared length.
	pub fn classify(type_name: &str, len: u16) -> Option<Self> {
		let unsigned = is_unsigned_type(type_name);
		Some(match (type_name, len) {
			("char", 1) => Self::Char,
			("float", 4) => Self::F32,
			("double", 8) => Self::F64,
			(_, 1) if unsigned => Self::U8,
			(_, 1) => Self::I8,
			(_, 2) if unsigned => Self::U16,
			(_, 2) => Self::I16,
			(_, 4) if unsigned => Self::U32,
			(_, 4) => Self::I32,
			(_, 8) if unsigned => Self::U64,
			(_, 8) => Self::I64,
			_ => return None,
		})
	}
}

fn is_unsigned_type(type_name: &str) -> bool {
	type_name.starts_with('u') || type_name.contains("uint") || type_name.contains("uchar")
}

impl StructDef {
	/// Sum of all field sizes; equals `size` for a consistent schema.
	pub fn fields_size(&self) -> usize {
		self.fields.iter().map(|field| field.size).sum()
	}

	/// Look up a field by bare identifier.
	pub fn field(&self, ident: &str) -> Option<&Field> {
		self.fields.iter().find(|field| field.ident.as_ref() == ident)
	}
}

impl Field {
	/// Whether this is a one-dimensional `char` array rendered as text.
	pub fn is_char_text(&self) -> bool {
		!self.is_ptr && self.type_name.as_ref() == "char" && self.dims.len() == 1
	}
}

struct RawStruct {
	type_idx: u16,
	fields: Vec<(u16, u16)>,
}

impl Dna {
	/// Parse `DNA1` payload bytes into a schema, computing layouts for `pointer_size`.
	pub fn parse(payload: &[u8], endianness: Endianness, pointer_size: usize) -> Result<Self> {
		if !matches!(pointer_size, 4 | 8) {
			return Err(BlendError::UnsupportedPointerSize { pointer_size });
		}
		let mut cursor = Cursor::new(payload, endianness);

		expect_tag(&mut cursor, *b"SDNA")?;
		expect_tag(&mut cursor, *b"NAME")?;

		let name_count = cursor.read_u32()? as usize;
		let mut names = Vec::with_capacity(name_count.min(payload.len()));
		for _ in 0..name_count {
			names.push(read_lossy_string(&mut cursor)?);
		}
		cursor.align4()?;

		expect_tag(&mut cursor, *b"TYPE")?;
		let type_count = cursor.read_u32()? as usize;
		let mut type_names = Vec::with_capacity(type_count.min(payload.len()));
		for _ in 0..type_count {
			type_names.push(read_lossy_string(&mut cursor)?);
		}
		cursor.align4()?;

		expect_tag(&mut cursor, *b"TLEN")?;
		let mut types = Vec::with_capacity(type_count);
		for name in type_names {
			types.push(DnaType { name, len: cursor.read_u16()? });
		}
		cursor.align4()?;

		expect_tag(&mut cursor, *b"STRC")?;
		let struct_count = cursor.read_u32()? as usize;
		let mut raw_structs = Vec::with_capacity(struct_count.min(payload.len()));

		for _ in 0..struct_count {
			let type_idx = cursor.read_u16()?;
			check_index("struct.type_idx", u32::from(type_idx), types.len())?;

			let field_count = cursor.read_u16()? as usize;
			let mut fields = Vec::with_capacity(field_count);
			for _ in 0..field_count {
				let field_type_idx = cursor.read_u16()?;
				let field_name_idx = cursor.read_u16()?;
				check_index("field.type_idx", u32::from(field_type_idx), types.len())?;
				check_index("field.name_idx", u32::from(field_name_idx), names.len())?;
				fields.push((field_type_idx, field_name_idx));
			}

			raw_structs.push(RawStruct { type_idx, fields });
		}

		let mut struct_for_type = vec![None; types.len()];
		for (idx, item) in raw_structs.iter().enumerate() {
			let slot = &mut struct_for_type[item.type_idx as usize];
			if let Some(first) = *slot {
				return Err(BlendError::DnaDuplicateStructType {
					type_idx: item.type_idx,
					first,
					second: idx as u32,
				});
			}
			*slot = Some(idx as u32);
		}

		let mut structs = Vec::with_capacity(raw_structs.len());
		for raw in &raw_structs {
			structs.push(resolve_struct(raw, &names, &types, &struct_for_type, pointer_size)?);
		}

		log::debug!(
			"decoded SDNA: {} names, {} types, {} structs ({}-byte pointers)",
			names.len(),
			types.len(),
			structs.len(),
			pointer_size
		);

		Ok(Self {
			names,
			types,
			structs,
			struct_for_type,
			pointer_size,
			endianness,
		})
	}

	/// Look up struct declaration by SDNA struct index.
	pub fn struct_by_sdna(&self, sdna_nr: u32) -> Option<&StructDef> {
		self.structs.get(sdna_nr as usize)
	}

	/// Look up struct declaration by type index.
	pub fn struct_by_type_idx(&self, type_idx: u16) -> Option<&StructDef> {
		self.struct_for_type
			.get(type_idx as usize)
			.and_then(|index| index.and_then(|value| self.structs.get(value as usize)))
	}

	/// Look up a struct by name, returning its struct index too.
	pub fn struct_by_name(&self, name: &str) -> Option<(u32, &StructDef)> {
		self.structs
			.iter()
			.enumerate()
			.find(|(_, item)| item.name.as_ref() == name)
			.map(|(idx, item)| (idx as u32, item))
	}

	/// Return type name by type index.
	pub fn type_name(&self, type_idx: u16) -> &str {
		&self.types[type_idx as usize].name
	}
}

fn resolve_struct(raw: &RawStruct, names: &[Box<str>], types: &[DnaType], struct_for_type: &[Option<u32>], pointer_size: usize) -> Result<StructDef> {
	let owner = &types[raw.type_idx as usize];
	let mut fields = Vec::with_capacity(raw.fields.len());
	let mut offset = 0_usize;

	for &(type_idx, name_idx) in &raw.fields {
		let name = &names[name_idx as usize];
		let base = &types[type_idx as usize];
		let bad_decl = || BlendError::DnaBadDeclaration {
			struct_name: owner.name.clone(),
			decl: name.clone(),
		};

		let decl = parse_field_decl(name).ok_or_else(bad_decl)?;
		let count = decl.element_count().ok_or_else(bad_decl)?;
		let is_ptr = decl.is_ptr();

		// `*x[k]` still occupies a single pointer slot.
		let (kind, size) = if is_ptr {
			(FieldKind::Pointer, pointer_size)
		} else {
			let size = usize::from(base.len).checked_mul(count).ok_or_else(bad_decl)?;
			let kind = match (decl.dims.is_empty(), struct_for_type[type_idx as usize]) {
				(true, Some(sdna_nr)) => FieldKind::Struct(sdna_nr),
				(true, None) => ScalarKind::classify(&base.name, base.len).map_or(FieldKind::Blob, FieldKind::Scalar),
				(false, _) => FieldKind::Blob,
			};
			(kind, size)
		};

		fields.push(Field {
			name: name.clone(),
			ident: decl.ident.into(),
			type_idx,
			type_name: base.name.clone(),
			type_len: base.len,
			offset,
			size,
			dims: decl.dims,
			is_ptr,
			kind,
		});
		offset = offset.checked_add(size).ok_or_else(bad_decl)?;
	}

	let is_id = fields.first().is_some_and(|field| field.name.as_ref() == "id");
	Ok(StructDef {
		type_idx: raw.type_idx,
		name: owner.name.clone(),
		size: usize::from(owner.len),
		fields,
		is_id,
	})
}

fn expect_tag(cursor: &mut Cursor<'_>, expected: [u8; 4]) -> Result<()> {
	let at = cursor.pos();
	let got = cursor.read_code4()?;
	if got != expected {
		return Err(BlendError::DnaBadTag { expected, got, at });
	}
	Ok(())
}

fn read_lossy_string(cursor: &mut Cursor<'_>) -> Result<Box<str>> {
	let bytes = cursor.read_cstring_bytes()?;
	Ok(String::from_utf8_lossy(bytes).into_owned().into_boxed_str())
}

fn check_index(kind: &'static str, idx: u32, len: usize) -> Result<()> {
	if (idx as usize) >= len {
		return Err(BlendError::DnaIndexOutOfRange {
			kind,
			idx,
			max: len.saturating_sub(1) as u32,
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests;
