use std::collections::HashMap;
use std::io::{Read, Seek};

use crate::blend::{BHead, BlendFile, BlockCode, BlockWarning, Dna, Result, StructDef};

/// Totals of ID blocks against all blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdContentSummary {
	/// Blocks whose struct is an ID struct.
	pub id_blocks: u64,
	/// All blocks before `ENDB`.
	pub total_blocks: u64,
	/// Elements stored in ID blocks.
	pub id_objects: u64,
	/// Elements stored in all blocks.
	pub total_objects: u64,
	/// `count * struct.size` summed over ID blocks.
	pub id_bytes: u64,
	/// Payload bytes summed over all blocks.
	pub total_bytes: u64,
	/// Blocks skipped because their struct index is outside the schema.
	pub warnings: Vec<BlockWarning>,
}

/// Accumulation key for size statistics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeKey {
	/// Typed blocks, grouped by struct name.
	Struct(Box<str>),
	/// Opaque blocks, grouped by block code.
	Code(BlockCode),
}

/// Accumulated size of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeEntry {
	/// Struct name or block code.
	pub key: SizeKey,
	/// Payload bytes.
	pub bytes: u64,
	/// Element count.
	pub count: u64,
	/// Contributing blocks.
	pub blocks: u64,
}

/// Size statistics sorted ascending by bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeStats {
	/// Entries, smallest first.
	pub entries: Vec<SizeEntry>,
	/// Blocks skipped because their struct index is outside the schema.
	pub warnings: Vec<BlockWarning>,
}

/// Resolve a block's struct, turning an out-of-range index into a recorded warning.
///
/// Returns `None` for opaque blocks and for skipped ones.
pub(crate) fn typed_struct<'d>(dna: &'d Dna, head: &BHead, warnings: &mut Vec<BlockWarning>) -> Option<&'d StructDef> {
	if head.sdna_nr == 0 {
		return None;
	}
	let def = dna.struct_by_sdna(head.sdna_nr);
	if def.is_none() {
		let warning = BlockWarning::SchemaIndex {
			code: head.block_code(),
			at: head.file_offset,
			sdna_nr: head.sdna_nr,
			struct_count: dna.structs.len(),
		};
		log::warn!("{warning}");
		warnings.push(warning);
	}
	def
}

/// Count ID blocks, their elements and bytes against file totals.
pub fn count_id_content<S: Read + Seek>(file: &mut BlendFile<S>, dna: &Dna) -> Result<IdContentSummary> {
	let mut summary = IdContentSummary::default();
	let mut blocks = file.blocks();
	while let Some(head) = blocks.next_block()? {
		summary.total_blocks += 1;
		summary.total_objects += head.nr;
		summary.total_bytes += head.len;

		let Some(def) = typed_struct(dna, &head, &mut summary.warnings) else {
			continue;
		};
		if !def.is_id {
			continue;
		}
		summary.id_blocks += 1;
		summary.id_objects += head.nr;
		summary.id_bytes += head.nr.saturating_mul(def.size as u64);
	}

	log::debug!(
		"id content: {} of {} blocks, {} of {} bytes",
		summary.id_blocks,
		summary.total_blocks,
		summary.id_bytes,
		summary.total_bytes
	);
	Ok(summary)
}

/// Accumulate payload bytes and element counts per struct name (or block code when opaque).
pub fn size_stats<S: Read + Seek>(file: &mut BlendFile<S>, dna: &Dna) -> Result<SizeStats> {
	let mut warnings = Vec::new();
	let mut totals: HashMap<SizeKey, (u64, u64, u64)> = HashMap::new();
	let mut blocks = file.blocks();
	while let Some(head) = blocks.next_block()? {
		let key = if head.sdna_nr == 0 {
			SizeKey::Code(head.block_code())
		} else {
			let Some(def) = typed_struct(dna, &head, &mut warnings) else {
				continue;
			};
			SizeKey::Struct(def.name.clone())
		};

		let slot = totals.entry(key).or_insert((0, 0, 0));
		slot.0 += head.len;
		slot.1 += head.nr;
		slot.2 += 1;
	}

	let mut entries: Vec<_> = totals
		.into_iter()
		.map(|(key, (bytes, count, blocks))| SizeEntry { key, bytes, count, blocks })
		.collect();
	entries.sort_by(|left, right| left.bytes.cmp(&right.bytes).then_with(|| left.key.cmp(&right.key)));

	Ok(SizeStats { entries, warnings })
}
