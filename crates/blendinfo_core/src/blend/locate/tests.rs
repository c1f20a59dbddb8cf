use std::io::Cursor;

use blendinfo_testkit::BlendBuilder;
use blendinfo_testkit::fixtures::{BLOB_OLD, DNA_OLD, ME_OLD, PAIR_OLD, VERTS_OLD, id_library, int_ptr_pair, int_ptr_pair_schema};

use crate::blend::{BlendFile, BlockWarning, Compression, DumpOptions, Value, locate_address};

fn memory(bytes: Vec<u8>) -> BlendFile<Cursor<Vec<u8>>> {
	BlendFile::from_stream(Cursor::new(bytes), Compression::None).expect("stream opens")
}

#[test]
fn origin_address_is_element_zero_offset_zero() {
	let mut blend = memory(int_ptr_pair());
	let dna = blend.dna().expect("dna parses");
	let result = locate_address(&mut blend, &dna, PAIR_OLD, &DumpOptions::default()).expect("locate succeeds");

	assert_eq!(result.hits.len(), 1);
	let hit = &result.hits[0];
	assert_eq!(hit.block_offset, 0);
	let element = hit.element.as_ref().expect("typed hit");
	assert_eq!(element.index, 0);
	assert_eq!(element.element_offset, 0);
	assert_eq!(element.type_name.as_ref(), "Pair");
	assert_eq!(element.fields[0].value, Some(Value::I64(7)));
}

#[test]
fn interior_address_selects_containing_element() {
	let mut blend = memory(id_library(8, false));
	let dna = blend.dna().expect("dna parses");
	let result = locate_address(&mut blend, &dna, VERTS_OLD + 16 + 12, &DumpOptions::default()).expect("locate succeeds");

	let hit = &result.hits[0];
	assert_eq!(hit.head.old, VERTS_OLD);
	assert_eq!(hit.block_offset, 28);
	let element = hit.element.as_ref().expect("typed hit");
	assert_eq!(element.index, 1);
	assert_eq!(element.element_offset, 12);
	assert_eq!(element.fields[1].value, Some(Value::I64(2)));
}

#[test]
fn opaque_blocks_report_containment_only() {
	let mut blend = memory(id_library(4, true));
	let dna = blend.dna().expect("dna parses");
	let result = locate_address(&mut blend, &dna, BLOB_OLD + 9, &DumpOptions::default()).expect("locate succeeds");

	assert_eq!(result.hits.len(), 1);
	assert_eq!(result.hits[0].block_offset, 9);
	assert!(result.hits[0].element.is_none());
}

#[test]
fn end_of_range_is_exclusive() {
	let mut blend = memory(id_library(8, false));
	let dna = blend.dna().expect("dna parses");
	let mesh_len = dna.struct_by_name("Mesh").expect("mesh").1.size as u64;

	let inside = locate_address(&mut blend, &dna, ME_OLD + mesh_len - 1, &DumpOptions::default()).expect("locate succeeds");
	assert_eq!(inside.hits.len(), 1);
	let outside = locate_address(&mut blend, &dna, ME_OLD + mesh_len, &DumpOptions::default()).expect("locate succeeds");
	assert!(outside.hits.is_empty());
}

#[test]
fn dna_block_range_is_searched_too() {
	let mut blend = memory(int_ptr_pair());
	let dna = blend.dna().expect("dna parses");
	let result = locate_address(&mut blend, &dna, DNA_OLD + 4, &DumpOptions::default()).expect("locate succeeds");
	assert_eq!(result.hits.len(), 1);
	assert_eq!(&result.hits[0].head.code, b"DNA1");
}

#[test]
fn short_trailing_element_is_a_warning() {
	let mut builder = BlendBuilder::new(4, false);
	builder.block(*b"DATA", PAIR_OLD, 1, 2, &[0; 12]);
	builder.dna(DNA_OLD, &int_ptr_pair_schema());
	let mut blend = memory(builder.build());
	let dna = blend.dna().expect("dna parses");

	let result = locate_address(&mut blend, &dna, PAIR_OLD + 10, &DumpOptions::default()).expect("locate succeeds");
	assert!(result.hits[0].element.is_none());
	assert!(matches!(result.warnings[0], BlockWarning::SizeMismatch { expected: 16, got: 12, .. }));

	let result = locate_address(&mut blend, &dna, PAIR_OLD + 2, &DumpOptions::default()).expect("locate succeeds");
	assert_eq!(result.hits[0].element.as_ref().map(|item| item.index), Some(0));
}
