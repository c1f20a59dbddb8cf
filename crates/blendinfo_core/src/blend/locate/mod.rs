use std::io::{Read, Seek};

use crate::blend::stats::typed_struct;
use crate::blend::{BHead, BlendFile, BlockWarning, Dna, DumpField, DumpOptions, Result, reflect_element};

/// All blocks whose address range covers a target address.
#[derive(Debug, Clone)]
pub struct LocateResult {
	/// Address that was searched.
	pub target: u64,
	/// Covering blocks in file order.
	pub hits: Vec<AddressHit>,
	/// Covering blocks whose struct index was outside the schema.
	pub warnings: Vec<BlockWarning>,
}

/// One block covering the target.
#[derive(Debug, Clone)]
pub struct AddressHit {
	/// Covering block header.
	pub head: BHead,
	/// `target - head.old`.
	pub block_offset: u64,
	/// Element details for typed blocks; `None` for opaque ones.
	pub element: Option<ElementHit>,
}

/// Element of a typed block that holds the target.
#[derive(Debug, Clone)]
pub struct ElementHit {
	/// Struct type name.
	pub type_name: Box<str>,
	/// Struct index from the block header.
	pub sdna_nr: u32,
	/// Element index inside the block.
	pub index: u64,
	/// Offset of the target inside the element.
	pub element_offset: u64,
	/// Reflected element contents.
	pub fields: Vec<DumpField>,
}

/// Find every block whose `[old, old + len)` range contains `target`.
///
/// Typed hits reflect the containing element; a struct of size zero reports containment only.
pub fn locate_address<S: Read + Seek>(file: &mut BlendFile<S>, dna: &Dna, target: u64, options: &DumpOptions) -> Result<LocateResult> {
	let mut result = LocateResult {
		target,
		hits: Vec::new(),
		warnings: Vec::new(),
	};

	let mut blocks = file.blocks();
	while let Some(head) = blocks.next_block()? {
		if !head.contains(target) {
			continue;
		}
		let block_offset = target - head.old;
		log::debug!("{target:#x} falls inside block {} at offset {}", head.block_code(), head.file_offset);

		let element = match typed_struct(dna, &head, &mut result.warnings) {
			Some(def) if def.size > 0 => {
				let size = def.size as u64;
				let index = block_offset / size;
				let element_offset = block_offset % size;
				if (index + 1) * size > head.len {
					let warning = BlockWarning::SizeMismatch {
						code: head.block_code(),
						at: head.file_offset,
						expected: size.saturating_mul(head.nr),
						got: head.len,
					};
					log::warn!("{warning}");
					result.warnings.push(warning);
					result.hits.push(AddressHit {
						head,
						block_offset,
						element: None,
					});
					continue;
				}
				let mut bytes = vec![0_u8; def.size];
				blocks.read_payload_at(index * size, &mut bytes)?;
				Some(ElementHit {
					type_name: def.name.clone(),
					sdna_nr: head.sdna_nr,
					index,
					element_offset,
					fields: reflect_element(dna, def, &bytes, options)?,
				})
			}
			_ => None,
		};

		result.hits.push(AddressHit { head, block_offset, element });
	}

	Ok(result)
}

#[cfg(test)]
mod tests;
