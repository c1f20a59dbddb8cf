mod bhead;
mod bytes;
mod compression;
mod decl;
mod dna;
mod dump;
mod error;
mod file;
mod header;
mod idgraph;
mod locate;
mod reflect;
mod stats;
mod strip;
mod value;

/// Parsed block header record.
pub use bhead::BHead;
/// Compression detection and the stream a file is read from.
pub use compression::{Compression, Source, ZSTD_MAGIC};
/// SDNA schema representation.
pub use dna::{Dna, DnaType, Field, FieldKind, ScalarKind, StructDef};
/// Full per-block dump types and entry points.
pub use dump::{DumpBlock, DumpBody, DumpElement, DumpField, DumpOptions, dump_blocks, dump_blocks_with, reflect_element};
/// Error, warning and result aliases.
pub use error::{BlendError, BlockCode, BlockWarning, ErrorKind, Result};
/// File abstraction, block cursor and block statistics.
pub use file::{BlendFile, BlockCursor, BlockStats};
/// File header representation.
pub use header::{BlendHeader, Endianness};
/// Whole-file ID graph extraction types and entry points.
pub use idgraph::{IdGraph, IdGraphEdge, IdGraphNode, IdGraphOptions, IdGraphTruncation, build_id_graph};
/// Address lookup types and entry points.
pub use locate::{AddressHit, ElementHit, LocateResult, locate_address};
/// Generic struct reflection.
pub use reflect::{FieldCtx, FieldVisitor, MAX_NESTING_DEPTH, PointerSlot, pointer_slots, walk_struct};
/// ID content and per-type size aggregation.
pub use stats::{IdContentSummary, SizeEntry, SizeKey, SizeStats, count_id_content, size_stats};
/// Pointer extraction and restore passes.
pub use strip::{PointerStreams, StripSummary, extract_pointers, replace_pointers, restore_pointers, zero_pointers};
/// Decoded leaf values.
pub use value::Value;
