use std::io::Cursor;

use blendinfo_testkit::BlendBuilder;
use blendinfo_testkit::fixtures::{DNA_OLD, PAIR_OLD, id_library, int_ptr_pair, int_ptr_pair_schema};

use crate::blend::{BlendError, BlendFile, BlockWarning, Compression, DumpBody, DumpOptions, ErrorKind, Value, dump_blocks};

fn memory(bytes: Vec<u8>) -> BlendFile<Cursor<Vec<u8>>> {
	BlendFile::from_stream(Cursor::new(bytes), Compression::None).expect("stream opens")
}

#[test]
fn pair_file_dumps_two_elements() {
	let mut blend = memory(int_ptr_pair());
	let dna = blend.dna().expect("dna parses");
	let blocks = dump_blocks(&mut blend, &dna, &DumpOptions::default()).expect("dump succeeds");

	assert_eq!(blocks.len(), 2);
	assert_eq!(blocks[0].type_name.as_deref(), Some("Pair"));
	let DumpBody::Elements(elements) = &blocks[0].body else {
		panic!("typed block should dump elements");
	};
	assert_eq!(elements.len(), 2);
	assert_eq!(elements[0].fields[0].value, Some(Value::I64(7)));
	assert_eq!(elements[0].fields[1].value, Some(Value::Ptr(PAIR_OLD + 8)));
	assert_eq!(elements[0].fields[1].offset, 4);
	assert_eq!(elements[1].index, 1);
	assert_eq!(elements[1].fields[0].value, Some(Value::I64(9)));
	assert_eq!(elements[1].fields[1].value, Some(Value::Ptr(0)));

	assert_eq!(blocks[1].head.old, DNA_OLD);
	let DumpBody::Opaque { preview, remaining } = &blocks[1].body else {
		panic!("DNA1 is opaque");
	};
	let dna_len = int_ptr_pair_schema().encode(false).len() as u64;
	assert_eq!(preview.len(), 64.min(dna_len as usize));
	assert_eq!(&preview[..4], b"SDNA");
	assert_eq!(*remaining, dna_len - preview.len() as u64);
}

#[test]
fn nested_fields_carry_depth_and_text() {
	let mut blend = memory(id_library(8, true));
	let dna = blend.dna().expect("dna parses");
	let blocks = dump_blocks(&mut blend, &dna, &DumpOptions::default()).expect("dump succeeds");

	let DumpBody::Elements(elements) = &blocks[0].body else {
		panic!("object block should dump elements");
	};
	let fields = &elements[0].fields;
	let lines: Vec<_> = fields.iter().map(|field| (field.depth, field.decl.as_ref(), field.offset)).collect();
	assert_eq!(
		lines,
		vec![(0, "id", 0), (1, "*next", 0), (1, "*prev", 8), (1, "name[8]", 16), (0, "*data", 24), (0, "loc[3]", 32), (0, "flag", 44)]
	);
	assert_eq!(fields[0].value, None);
	assert_eq!(fields[3].value, Some(Value::String("OBCube".into())));
	assert_eq!(fields[6].value, Some(Value::I64(5)));

	let DumpBody::Elements(verts) = &blocks[2].body else {
		panic!("vertex block should dump elements");
	};
	assert_eq!(verts.len(), 2);
	assert_eq!(verts[1].fields[1].value, Some(Value::I64(2)));

	let DumpBody::Opaque { preview, remaining } = &blocks[3].body else {
		panic!("TEST block is opaque");
	};
	assert_eq!(preview.as_slice(), b"0123456789");
	assert_eq!(*remaining, 0);
}

#[test]
fn char_arrays_can_stay_raw() {
	let mut blend = memory(id_library(4, false));
	let dna = blend.dna().expect("dna parses");
	let options = DumpOptions {
		preview_len: 4,
		char_arrays_as_text: false,
	};
	let blocks = dump_blocks(&mut blend, &dna, &options).expect("dump succeeds");
	let DumpBody::Elements(elements) = &blocks[1].body else {
		panic!("mesh block should dump elements");
	};
	assert_eq!(elements[0].fields[3].value, Some(Value::Bytes(b"MECube\0\0".to_vec())));

	let DumpBody::Opaque { preview, remaining } = &blocks[3].body else {
		panic!("TEST block is opaque");
	};
	assert_eq!(preview.as_slice(), b"0123");
	assert_eq!(*remaining, 6);
}

#[test]
fn dump_is_idempotent() {
	let mut blend = memory(id_library(8, false));
	let dna = blend.dna().expect("dna parses");
	let first = dump_blocks(&mut blend, &dna, &DumpOptions::default()).expect("first dump");
	let second = dump_blocks(&mut blend, &dna, &DumpOptions::default()).expect("second dump");
	assert_eq!(format!("{first:?}"), format!("{second:?}"));
}

#[test]
fn size_mismatch_is_fatal() {
	let mut builder = BlendBuilder::new(4, false);
	builder.block(*b"DATA", PAIR_OLD, 1, 3, &[0; 16]);
	builder.dna(DNA_OLD, &int_ptr_pair_schema());
	let mut blend = memory(builder.build());
	let dna = blend.dna().expect("dna parses");

	let err = dump_blocks(&mut blend, &dna, &DumpOptions::default()).expect_err("mismatch fails");
	assert!(matches!(err, BlendError::SizeMismatch { expected: 24, got: 16, at: 12, .. }));
	assert_eq!(err.kind(), ErrorKind::SizeMismatch);
}

#[test]
fn out_of_range_index_dumps_opaque_with_warning() {
	let mut builder = BlendBuilder::new(4, false);
	builder.block(*b"DATA", PAIR_OLD, 7, 1, &[1, 2, 3]);
	builder.dna(DNA_OLD, &int_ptr_pair_schema());
	let mut blend = memory(builder.build());
	let dna = blend.dna().expect("dna parses");

	let blocks = dump_blocks(&mut blend, &dna, &DumpOptions::default()).expect("dump succeeds");
	assert!(matches!(
		blocks[0].warning,
		Some(BlockWarning::SchemaIndex {
			sdna_nr: 7,
			struct_count: 2,
			..
		})
	));
	assert!(matches!(&blocks[0].body, DumpBody::Opaque { preview, remaining: 0 } if preview.as_slice() == [1, 2, 3]));
}
