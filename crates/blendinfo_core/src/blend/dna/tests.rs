use blendinfo_testkit::SchemaBuilder;
use blendinfo_testkit::fixtures::{id_array_schema, id_library_schema, int_ptr_pair_schema};

use crate::blend::{BlendError, Dna, Endianness, ErrorKind, FieldKind, ScalarKind};

fn parse(schema: &SchemaBuilder, pointer_size: usize) -> Dna {
	Dna::parse(&schema.encode(false), Endianness::Little, pointer_size).expect("dna parses")
}

#[test]
fn pair_struct_layout_matches_declared_size() {
	let dna = parse(&int_ptr_pair_schema(), 4);

	assert_eq!(dna.structs.len(), 2);
	let pair = dna.struct_by_sdna(1).expect("pair exists");
	assert_eq!(pair.name.as_ref(), "Pair");
	assert_eq!(pair.size, 8);
	assert_eq!(pair.fields_size(), 8);
	assert!(!pair.is_id);

	let next = pair.field("next").expect("next field");
	assert_eq!(next.offset, 4);
	assert_eq!(next.size, 4);
	assert_eq!(next.kind, FieldKind::Pointer);
	assert_eq!(pair.fields[0].kind, FieldKind::Scalar(ScalarKind::I32));
}

#[test]
fn pointer_width_follows_container_not_base_type() {
	let dna = parse(&id_library_schema(8), 8);
	let (_, object) = dna.struct_by_name("Object").expect("object exists");
	let data = object.field("data").expect("data field");
	assert_eq!(data.size, 8);
	assert_eq!(data.type_len, 0);
	assert_eq!(data.offset, 24);
}

#[test]
fn offsets_are_contiguous_for_every_struct() {
	for pointer_size in [4, 8] {
		let dna = parse(&id_library_schema(pointer_size), pointer_size);
		for item in &dna.structs {
			let mut expected = 0;
			for field in &item.fields {
				assert_eq!(field.offset, expected, "{}.{}", item.name, field.name);
				expected += field.size;
			}
			assert_eq!(expected, item.size, "{} size", item.name);
		}
	}
}

#[test]
fn id_detection_and_field_kinds() {
	let dna = parse(&id_library_schema(4), 4);
	let (mesh_idx, mesh) = dna.struct_by_name("Mesh").expect("mesh exists");
	assert_eq!(mesh_idx, 3);
	assert!(mesh.is_id);
	assert_eq!(mesh.fields[0].kind, FieldKind::Struct(1));

	let (_, id) = dna.struct_by_name("ID").expect("id exists");
	assert!(!id.is_id);
	let name = id.field("name").expect("name field");
	assert_eq!(name.kind, FieldKind::Blob);
	assert!(name.is_char_text());
	assert_eq!(name.size, 8);

	let (_, vert) = dna.struct_by_name("Vert").expect("vert exists");
	assert_eq!(vert.field("co").expect("co").dims, vec![3]);
	assert_eq!(vert.field("flag").expect("flag").kind, FieldKind::Scalar(ScalarKind::I16));
	assert_eq!(dna.struct_by_type_idx(vert.type_idx).map(|item| item.name.as_ref()), Some("Vert"));
}

#[test]
fn pointer_arrays_occupy_one_pointer_width() {
	let mut schema = SchemaBuilder::new();
	schema.add_type("void", 0);
	schema.add_type("int", 4);
	schema.add_struct("Link", 0, &[]);
	schema.add_struct("Slots", 16, &[("void", "*items[3]"), ("void", "(*free)()"), ("int", "count[2]")]);
	let dna = parse(&schema, 4);

	let slots = dna.struct_by_sdna(1).expect("slots exists");
	assert_eq!(slots.fields[0].kind, FieldKind::Pointer);
	assert_eq!(slots.fields[0].size, 4);
	assert_eq!(slots.fields[0].dims, vec![3]);
	assert_eq!(slots.fields[1].kind, FieldKind::Pointer);
	assert_eq!(slots.fields[1].ident.as_ref(), "free");
	assert_eq!(slots.fields[1].offset, 4);
	assert_eq!(slots.fields[2].kind, FieldKind::Blob);
	assert_eq!(slots.fields[2].offset, 8);
	assert_eq!(slots.fields[2].size, 8);
	assert_eq!(slots.fields_size(), 16);
}

#[test]
fn pointer_size_ignores_array_suffix_at_both_widths() {
	for pointer_size in [4, 8] {
		let mut schema = SchemaBuilder::new();
		schema.add_type("void", 0);
		schema.add_struct("Link", 0, &[]);
		schema.add_struct("Material", pointer_size as u16, &[("void", "*mtex[3]")]);
		let dna = parse(&schema, pointer_size);

		let mtex = dna.struct_by_sdna(1).and_then(|item| item.field("mtex")).expect("mtex field");
		assert_eq!(mtex.size, pointer_size);
		assert_eq!(mtex.kind, FieldKind::Pointer);
	}
}

#[test]
fn embedded_struct_arrays_stay_opaque() {
	for pointer_size in [4, 8] {
		let dna = parse(&id_array_schema(pointer_size), pointer_size);
		let (_, holder) = dna.struct_by_name("Holder").expect("holder exists");

		let ids = holder.field("ids").expect("ids field");
		assert_eq!(ids.kind, FieldKind::Blob);
		assert_eq!(ids.size, 2 * (pointer_size + 4));
		assert_eq!(holder.field("owner").map(|field| field.offset), Some(ids.size));
		assert_eq!(holder.fields_size(), holder.size);
	}
}

#[test]
fn big_endian_schema_decodes() {
	let payload = int_ptr_pair_schema().encode(true);
	let dna = Dna::parse(&payload, Endianness::Big, 4).expect("dna parses");
	assert_eq!(dna.struct_by_sdna(1).map(|item| item.size), Some(8));
}

#[test]
fn bad_section_tag_is_schema_error() {
	let mut payload = int_ptr_pair_schema().encode(false);
	payload[4..8].copy_from_slice(b"NAMX");
	let err = Dna::parse(&payload, Endianness::Little, 4).expect_err("bad tag fails");
	assert!(matches!(err, BlendError::DnaBadTag { expected, at: 4, .. } if expected == *b"NAME"));
	assert_eq!(err.kind(), ErrorKind::Schema);
}

#[test]
fn truncated_payload_is_schema_error() {
	let payload = int_ptr_pair_schema().encode(false);
	let err = Dna::parse(&payload[..payload.len() - 3], Endianness::Little, 4).expect_err("truncated fails");
	assert!(matches!(err, BlendError::UnexpectedEof { .. }));
	assert_eq!(err.kind(), ErrorKind::Schema);
}

#[test]
fn non_numeric_dimension_is_rejected() {
	let mut schema = SchemaBuilder::new();
	schema.add_type("char", 1);
	schema.add_struct("Link", 0, &[]);
	schema.add_struct("Named", 4, &[("char", "name[MAX]")]);
	let err = Dna::parse(&schema.encode(false), Endianness::Little, 8).expect_err("bad decl fails");
	assert!(matches!(err, BlendError::DnaBadDeclaration { .. }));
}

#[test]
fn duplicate_struct_type_is_rejected() {
	let mut schema = SchemaBuilder::new();
	schema.add_type("int", 4);
	schema.add_struct("Twice", 4, &[("int", "a")]);
	schema.add_struct("Twice", 4, &[("int", "b")]);
	let err = Dna::parse(&schema.encode(false), Endianness::Little, 8).expect_err("duplicate fails");
	assert!(matches!(err, BlendError::DnaDuplicateStructType { first: 0, second: 1, .. }));
}

#[test]
fn unsigned_names_classify_as_unsigned() {
	assert_eq!(ScalarKind::classify("uchar", 1), Some(ScalarKind::U8));
	assert_eq!(ScalarKind::classify("ushort", 2), Some(ScalarKind::U16));
	assert_eq!(ScalarKind::classify("uint64_t", 8), Some(ScalarKind::U64));
	assert_eq!(ScalarKind::classify("int64_t", 8), Some(ScalarKind::I64));
	assert_eq!(ScalarKind::classify("double", 8), Some(ScalarKind::F64));
	assert_eq!(ScalarKind::classify("void", 0), None);
}
