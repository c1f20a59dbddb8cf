use std::io::{self, Read, Seek, Write};

use crate::blend::bytes::uint_to_bytes;
use crate::blend::{BlendError, BlendFile, Dna, Result, pointer_slots};

/// Optional side streams of a strip/restore pass.
///
/// Both streams are flat sequences of pointer-width values in the file's byte order, one per visited pointer:
/// the block header address first, then every pointer of every element in traversal order.
#[derive(Default)]
pub struct PointerStreams<'a> {
	/// Source of replacement values; every visited pointer is overwritten from it.
	pub restore_from: Option<&'a mut dyn Read>,
	/// Sink receiving the original value of every visited pointer.
	pub extract_to: Option<&'a mut dyn Write>,
}

/// Counts reported by a strip/restore pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripSummary {
	/// Blocks visited before `ENDB`.
	pub blocks: u64,
	/// Header address values transferred (one per block).
	pub header_pointers: u64,
	/// Field pointer values transferred.
	pub field_pointers: u64,
	/// Elements written back to the file.
	pub rewritten_elements: u64,
}

/// Extract every pointer into `out`, leaving the file untouched.
pub fn extract_pointers<S: Read + Write + Seek>(file: &mut BlendFile<S>, dna: &Dna, out: &mut dyn Write) -> Result<StripSummary> {
	replace_pointers(
		file,
		dna,
		PointerStreams {
			restore_from: None,
			extract_to: Some(out),
		},
	)
}

/// Overwrite every pointer with the next value read from `input`.
pub fn restore_pointers<S: Read + Write + Seek>(file: &mut BlendFile<S>, dna: &Dna, input: &mut dyn Read) -> Result<StripSummary> {
	replace_pointers(
		file,
		dna,
		PointerStreams {
			restore_from: Some(input),
			extract_to: None,
		},
	)
}

/// Overwrite every pointer with zero, optionally extracting the originals first.
pub fn zero_pointers<S: Read + Write + Seek>(file: &mut BlendFile<S>, dna: &Dna, extract_to: Option<&mut dyn Write>) -> Result<StripSummary> {
	let mut zeros = io::repeat(0);
	run_pass(file, dna, Some(&mut zeros), extract_to)
}

/// Run one forward pass that extracts and/or restores every pointer value in the file.
///
/// Opaque blocks (struct index 0) only have their header address processed. A struct index outside the
/// schema, or a payload that is not `struct.size * count` bytes, aborts the pass: positional side streams
/// cannot tolerate a skipped element.
pub fn replace_pointers<S: Read + Write + Seek>(file: &mut BlendFile<S>, dna: &Dna, streams: PointerStreams<'_>) -> Result<StripSummary> {
	run_pass(file, dna, streams.restore_from, streams.extract_to)
}

fn run_pass<S: Read + Write + Seek>(
	file: &mut BlendFile<S>,
	dna: &Dna,
	mut restore_from: Option<&mut dyn Read>,
	mut extract_to: Option<&mut dyn Write>,
) -> Result<StripSummary> {
	let header = file.header;
	let width = header.pointer_size;
	let mut state = StreamState {
		width,
		restored: 0,
		extracted: 0,
	};
	let mut summary = StripSummary::default();

	let mut blocks = file.blocks();
	while let Some(head) = blocks.next_block()? {
		summary.blocks += 1;

		let original = uint_to_bytes(head.old, width, header.endianness);
		if let Some(input) = restore_from.as_deref_mut() {
			let mut raw = vec![0_u8; width];
			state.read_value(input, &mut raw)?;
			blocks.write_header_old(&raw)?;
		}
		if let Some(output) = extract_to.as_deref_mut() {
			state.write_value(output, &original)?;
		}
		summary.header_pointers += 1;

		if head.sdna_nr == 0 {
			continue;
		}

		let Some(def) = dna.struct_by_sdna(head.sdna_nr) else {
			return Err(BlendError::SdnaIndexOutOfRange {
				code: head.block_code(),
				at: head.file_offset,
				sdna_nr: head.sdna_nr,
				struct_count: dna.structs.len(),
			});
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
		if def.size == 0 {
			continue;
		}

		let size = def.size as u64;
		let mut element = vec![0_u8; def.size];
		for index in 0..head.nr {
			blocks.read_payload_at(index * size, &mut element)?;
			let slots = pointer_slots(dna, def, &element)?;
			if slots.is_empty() {
				continue;
			}

			for slot in &slots {
				let range = slot.offset..slot.offset + width;
				if let Some(output) = extract_to.as_deref_mut() {
					state.write_value(output, &element[range.clone()])?;
				}
				if let Some(input) = restore_from.as_deref_mut() {
					state.read_value(input, &mut element[range])?;
				}
			}
			summary.field_pointers += slots.len() as u64;

			if restore_from.is_some() {
				blocks.write_payload_at(index * size, &element)?;
				summary.rewritten_elements += 1;
			}
		}
	}

	if let Some(output) = extract_to.as_deref_mut() {
		output.flush()?;
	}
	file.flush()?;

	log::debug!(
		"pointer pass: {} blocks, {} header and {} field pointers, {} elements rewritten",
		summary.blocks,
		summary.header_pointers,
		summary.field_pointers,
		summary.rewritten_elements
	);
	Ok(summary)
}

struct StreamState {
	width: usize,
	restored: u64,
	extracted: u64,
}

impl StreamState {
	fn read_value(&mut self, input: &mut dyn Read, out: &mut [u8]) -> Result<()> {
		input.read_exact(out).map_err(|err| match err.kind() {
			io::ErrorKind::UnexpectedEof => BlendError::StreamExhausted {
				stream: "restore",
				values: self.restored,
				pointer_size: self.width,
			},
			_ => BlendError::Io(err),
		})?;
		self.restored += 1;
		Ok(())
	}

	fn write_value(&mut self, output: &mut dyn Write, raw: &[u8]) -> Result<()> {
		output.write_all(raw).map_err(|err| match err.kind() {
			io::ErrorKind::WriteZero => BlendError::StreamExhausted {
				stream: "extract",
				values: self.extracted,
				pointer_size: self.width,
			},
			_ => BlendError::Io(err),
		})?;
		self.extracted += 1;
		Ok(())
	}
}
