use std::collections::HashSet;
use std::io::{Read, Seek};

use crate::blend::stats::typed_struct;
use crate::blend::{BlendFile, BlockWarning, Dna, Field, FieldCtx, FieldVisitor, PointerSlot, Result, walk_struct};

/// Options for whole-file ID-to-ID graph extraction.
#[derive(Debug, Clone)]
pub struct IdGraphOptions {
	/// Maximum number of emitted edges.
	pub max_edges: usize,
	/// Keep edges whose source and target are the same block.
	pub include_self: bool,
}

impl Default for IdGraphOptions {
	fn default() -> Self {
		Self {
			max_edges: 100_000,
			include_self: true,
		}
	}
}

/// Truncation reason for ID graph extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGraphTruncation {
	/// Edge budget was reached.
	MaxEdges,
}

/// One ID block.
#[derive(Debug, Clone)]
pub struct IdGraphNode {
	/// Block origin address.
	pub old: u64,
	/// Block code.
	pub code: [u8; 4],
	/// Struct index of the block.
	pub sdna_nr: u32,
	/// Struct type name.
	pub type_name: Box<str>,
	/// `id.name` of the first element, when the ID struct has one.
	pub id_name: Option<Box<str>>,
}

/// One directed ID-to-ID edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGraphEdge {
	/// Origin address of the owning block.
	pub from: u64,
	/// Origin address of the referenced block.
	pub to: u64,
	/// Identifier of the pointer field (`next`).
	pub field: Box<str>,
	/// Dotted path of that field from the block's struct (`id.next`).
	pub path: Box<str>,
}

/// Full ID graph extraction result.
#[derive(Debug, Clone)]
pub struct IdGraph {
	/// ID nodes sorted by origin address.
	pub nodes: Vec<IdGraphNode>,
	/// Deduplicated edges sorted by `(from, to, field)`.
	pub edges: Vec<IdGraphEdge>,
	/// Optional truncation reason.
	pub truncated: Option<IdGraphTruncation>,
	/// Blocks skipped because of an out-of-range index or a short payload.
	pub warnings: Vec<BlockWarning>,
}

/// Build a graph whose nodes are ID blocks and whose edges are pointers from one ID block's origin to another's.
///
/// Pointers into block interiors or to non-ID blocks are dropped.
pub fn build_id_graph<S: Read + Seek>(file: &mut BlendFile<S>, dna: &Dna, options: &IdGraphOptions) -> Result<IdGraph> {
	let mut warnings = Vec::new();
	let mut nodes = Vec::new();
	let name_at = id_name_location(dna);

	let mut blocks = file.blocks();
	while let Some(head) = blocks.next_block()? {
		let Some(def) = typed_struct(dna, &head, &mut warnings) else {
			continue;
		};
		if !def.is_id {
			continue;
		}

		let mut id_name = None;
		if let Some((offset, len)) = name_at.filter(|(offset, len)| head.nr > 0 && (offset + len) as u64 <= head.len) {
			let mut raw = vec![0_u8; len];
			blocks.read_payload_at(offset as u64, &mut raw)?;
			let end = raw.iter().position(|byte| *byte == 0).unwrap_or(raw.len());
			id_name = Some(String::from_utf8_lossy(&raw[..end]).into_owned().into_boxed_str());
		}

		nodes.push(IdGraphNode {
			old: head.old,
			code: head.code,
			sdna_nr: head.sdna_nr,
			type_name: def.name.clone(),
			id_name,
		});
	}
	nodes.sort_by_key(|node| node.old);

	let known: HashSet<u64> = nodes.iter().map(|node| node.old).collect();
	let mut collector = EdgeCollector {
		known: &known,
		from: 0,
		include_self: options.include_self,
		max_edges: options.max_edges,
		seen: HashSet::new(),
		edges: Vec::new(),
		truncated: None,
	};

	let mut blocks = file.blocks();
	while let Some(head) = blocks.next_block()? {
		if collector.truncated.is_some() {
			break;
		}
		if !known.contains(&head.old) {
			continue;
		}
		let Some(def) = dna.struct_by_sdna(head.sdna_nr).filter(|def| def.is_id) else {
			continue;
		};

		let expected = (def.size as u64).saturating_mul(head.nr);
		if expected != head.len {
			let warning = BlockWarning::SizeMismatch {
				code: head.block_code(),
				at: head.file_offset,
				expected,
				got: head.len,
			};
			log::warn!("{warning}");
			warnings.push(warning);
			continue;
		}

		let payload = blocks.read_payload()?;
		collector.from = head.old;
		if def.size > 0 {
			for element in payload.chunks_exact(def.size) {
				walk_struct(dna, def, element, 0, &mut collector)?;
			}
		}
	}

	let mut edges = collector.edges;
	let truncated = collector.truncated;
	edges.sort_by(|left, right| {
		left.from
			.cmp(&right.from)
			.then_with(|| left.to.cmp(&right.to))
			.then_with(|| left.path.cmp(&right.path))
	});
	log::debug!("id graph: {} nodes, {} edges", nodes.len(), edges.len());

	Ok(IdGraph {
		nodes,
		edges,
		truncated,
		warnings,
	})
}

/// Offset and length of `id.name` inside an ID struct, when the schema has one.
fn id_name_location(dna: &Dna) -> Option<(usize, usize)> {
	let (_, id) = dna.struct_by_name("ID")?;
	let name = id.field("name")?;
	name.is_char_text().then_some((name.offset, name.size))
}

struct EdgeCollector<'a> {
	known: &'a HashSet<u64>,
	from: u64,
	include_self: bool,
	max_edges: usize,
	seen: HashSet<(u64, u64, Box<str>)>,
	edges: Vec<IdGraphEdge>,
	truncated: Option<IdGraphTruncation>,
}

impl FieldVisitor for EdgeCollector<'_> {
	fn pointer(&mut self, field: &Field, slot: PointerSlot, ctx: &FieldCtx<'_>) {
		if self.truncated.is_some() || slot.value == 0 || !self.known.contains(&slot.value) {
			return;
		}
		if !self.include_self && slot.value == self.from {
			return;
		}

		let key = (self.from, slot.value, Box::<str>::from(ctx.path));
		if self.seen.contains(&key) {
			return;
		}
		if self.edges.len() >= self.max_edges {
			self.truncated = Some(IdGraphTruncation::MaxEdges);
			return;
		}

		self.edges.push(IdGraphEdge {
			from: key.0,
			to: key.1,
			field: field.ident.clone(),
			path: key.2.clone(),
		});
		self.seen.insert(key);
	}
}
