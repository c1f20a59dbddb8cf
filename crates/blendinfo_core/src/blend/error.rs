use std::fmt;

use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, BlendError>;

/// Errors produced while reading, decoding, traversing, and rewriting `.blend` data.
#[derive(Debug, Error)]
pub enum BlendError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Leading bytes are not the `BLENDER` magic.
	#[error("not a .blend file (header={header:?})")]
	InvalidHeader {
		/// Lossy rendering of the bytes that were found.
		header: Box<str>,
	},
	/// A file or block header ended early.
	#[error("truncated {what} at offset {at}: need {need} bytes, got {got}")]
	TruncatedHeader {
		/// Header kind being read.
		what: &'static str,
		/// File offset of the header.
		at: u64,
		/// Expected header size.
		need: usize,
		/// Bytes actually available.
		got: usize,
	},
	/// Block payload length was negative.
	#[error("negative block length {len} at offset {at}")]
	NegativeBlockLength {
		/// Block header file offset.
		at: u64,
		/// Parsed signed length.
		len: i64,
	},
	/// Block element count was negative.
	#[error("negative block count {nr} at offset {at}")]
	NegativeBlockCount {
		/// Block header file offset.
		at: u64,
		/// Parsed signed element count.
		nr: i64,
	},
	/// Block payload would extend past the end of the stream.
	#[error("block {code} at offset {at}: length {len} exceeds remaining {rem}")]
	BlockLenOutOfRange {
		/// Block code.
		code: BlockCode,
		/// Block header file offset.
		at: u64,
		/// Declared payload length.
		len: u64,
		/// Bytes left in the stream after the header.
		rem: u64,
	},
	/// A payload seek, read, or write crossed the end of the stream.
	#[error("payload access at offset {at} of {need} bytes exceeds remaining {rem}")]
	PayloadOutOfRange {
		/// Absolute stream position of the access.
		at: u64,
		/// Requested byte count.
		need: u64,
		/// Bytes available from `at`.
		rem: u64,
	},
	/// Payload primitive used while no block is current.
	#[error("no current block: call next_block first")]
	NoCurrentBlock,
	/// Decompression output exceeded configured safety limit.
	#[error("decompressed output exceeded limit {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum allowed output bytes.
		limit: u64,
	},
	/// Decompressed stream did not start with `BLENDER`.
	#[error("decompressed data does not start with BLENDER magic")]
	NotBlendAfterDecompress,
	/// In-place rewriting was requested on a compressed file.
	#[error("compressed .blend files cannot be rewritten in place; decompress first")]
	CompressedNotWritable,
	/// Pointer width other than 4 or 8 bytes.
	#[error("unsupported pointer size {pointer_size}")]
	UnsupportedPointerSize {
		/// Offending width.
		pointer_size: usize,
	},
	/// No DNA1 block was found before `ENDB`.
	#[error("DNA1 block not found")]
	DnaNotFound,
	/// Unexpected DNA section tag.
	#[error("DNA tag mismatch at {at}: expected {expected:?}, got {got:?}")]
	DnaBadTag {
		/// Expected section tag.
		expected: [u8; 4],
		/// Actual section tag.
		got: [u8; 4],
		/// Cursor offset of the tag read.
		at: usize,
	},
	/// Not enough bytes remained inside the DNA payload.
	#[error("unexpected eof in DNA at offset {at}, need {need} bytes, remaining {rem}")]
	UnexpectedEof {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Out-of-range index inside DNA tables.
	#[error("DNA index out of range for {kind}: idx={idx}, max={max}")]
	DnaIndexOutOfRange {
		/// Logical index kind being validated.
		kind: &'static str,
		/// Offending index value.
		idx: u32,
		/// Maximum valid index.
		max: u32,
	},
	/// Duplicate type->struct mapping in DNA `STRC` section.
	#[error("DNA duplicate struct type index {type_idx}: first={first}, second={second}")]
	DnaDuplicateStructType {
		/// Duplicate type index.
		type_idx: u16,
		/// First struct index observed.
		first: u32,
		/// Second struct index observed.
		second: u32,
	},
	/// Field declarator could not be parsed.
	#[error("DNA field declaration {decl:?} in {struct_name} is malformed")]
	DnaBadDeclaration {
		/// Owning struct name.
		struct_name: Box<str>,
		/// Raw declarator text.
		decl: Box<str>,
	},
	/// Embedded structs nest deeper than any sane schema.
	#[error("struct {struct_name} nests embedded structs deeper than {max_depth}")]
	DnaNestingTooDeep {
		/// Struct where the limit was hit.
		struct_name: Box<str>,
		/// Depth ceiling.
		max_depth: u32,
	},
	/// Requested DNA struct name was not found.
	#[error("DNA struct not found: {name}")]
	DnaStructNotFound {
		/// Requested struct name.
		name: String,
	},
	/// Block references a struct index outside the struct table.
	#[error("block {code} at offset {at} references struct index {sdna_nr}, table has {struct_count}")]
	SdnaIndexOutOfRange {
		/// Block code.
		code: BlockCode,
		/// Block header file offset.
		at: u64,
		/// Offending struct index.
		sdna_nr: u32,
		/// Length of the struct table.
		struct_count: usize,
	},
	/// Typed block payload size differs from `struct.size * count`.
	#[error("block {code} at offset {at}: payload is {got} bytes, {type_name} x count needs {expected}")]
	SizeMismatch {
		/// Block code.
		code: BlockCode,
		/// Block header file offset.
		at: u64,
		/// Struct type name.
		type_name: Box<str>,
		/// `struct.size * count`.
		expected: u64,
		/// Declared payload size.
		got: u64,
	},
	/// Buffer handed to the reflector is shorter than a field requires.
	#[error("{type_name} instance too small: field {field} needs bytes up to {need}, have {have}")]
	ElementTooSmall {
		/// Struct type name.
		type_name: Box<str>,
		/// Field declarator.
		field: Box<str>,
		/// End offset required.
		need: usize,
		/// Buffer length.
		have: usize,
	},
	/// A pointer side stream ran short.
	#[error("{stream} stream exhausted after {values} pointer values of {pointer_size} bytes")]
	StreamExhausted {
		/// `"restore"` or `"extract"`.
		stream: &'static str,
		/// Values successfully transferred before the failure.
		values: u64,
		/// Pointer width of the container.
		pointer_size: usize,
	},
	/// One file was named for two roles of a rewrite pass.
	#[error("{path} is used both as {first} and {second}")]
	SideStreamConflict {
		/// Path as given by the caller.
		path: String,
		/// Role already claimed by the path.
		first: &'static str,
		/// Conflicting role.
		second: &'static str,
	},
	/// Address argument could not be parsed.
	#[error("invalid address literal: {value}")]
	InvalidAddressLiteral {
		/// User-provided text.
		value: String,
	},
}

/// Coarse error classes used by callers deciding how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// Bad magic, truncated header, or payload outside the file.
	Format,
	/// Missing or corrupt SDNA.
	Schema,
	/// Struct index outside the table in a pass that cannot skip it.
	SchemaIndex,
	/// Payload size disagrees with the struct layout.
	SizeMismatch,
	/// Pointer side stream ran short.
	StreamExhausted,
	/// Underlying IO failure.
	Io,
	/// Caller supplied an unusable argument.
	Usage,
}

impl BlendError {
	/// Classify this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Io(_) => ErrorKind::Io,
			Self::InvalidHeader { .. }
			| Self::TruncatedHeader { .. }
			| Self::NegativeBlockLength { .. }
			| Self::NegativeBlockCount { .. }
			| Self::BlockLenOutOfRange { .. }
			| Self::PayloadOutOfRange { .. }
			| Self::DecompressedTooLarge { .. }
			| Self::NotBlendAfterDecompress
			| Self::UnsupportedPointerSize { .. } => ErrorKind::Format,
			Self::DnaNotFound
			| Self::DnaBadTag { .. }
			| Self::UnexpectedEof { .. }
			| Self::DnaIndexOutOfRange { .. }
			| Self::DnaDuplicateStructType { .. }
			| Self::DnaBadDeclaration { .. }
			| Self::DnaNestingTooDeep { .. }
			| Self::ElementTooSmall { .. } => ErrorKind::Schema,
			Self::SdnaIndexOutOfRange { .. } => ErrorKind::SchemaIndex,
			Self::SizeMismatch { .. } => ErrorKind::SizeMismatch,
			Self::StreamExhausted { .. } => ErrorKind::StreamExhausted,
			Self::NoCurrentBlock | Self::CompressedNotWritable | Self::DnaStructNotFound { .. } | Self::InvalidAddressLiteral { .. } => ErrorKind::Usage,
			Self::SideStreamConflict { .. } => ErrorKind::Usage,
		}
	}
}

/// Four-byte block code with a printable `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockCode(pub [u8; 4]);

impl fmt::Display for BlockCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut any = false;
		for byte in self.0 {
			if byte == 0 {
				continue;
			}
			any = true;
			if byte.is_ascii_graphic() || byte == b' ' {
				write!(f, "{}", char::from(byte))?;
			} else {
				f.write_str(".")?;
			}
		}
		if !any {
			f.write_str("....")?;
		}
		Ok(())
	}
}

/// Recoverable condition met by a read-only analysis; the offending block is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockWarning {
	/// Block references a struct index outside the schema.
	SchemaIndex {
		/// Block code.
		code: BlockCode,
		/// Block header file offset.
		at: u64,
		/// Offending struct index.
		sdna_nr: u32,
		/// Length of the struct table.
		struct_count: usize,
	},
	/// Typed payload does not hold exactly `count` elements.
	SizeMismatch {
		/// Block code.
		code: BlockCode,
		/// Block header file offset.
		at: u64,
		/// `struct.size * count`.
		expected: u64,
		/// Declared payload size.
		got: u64,
	},
}

impl fmt::Display for BlockWarning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::SchemaIndex {
				code,
				at,
				sdna_nr,
				struct_count,
			} => write!(f, "block {code} at offset {at} references struct index {sdna_nr} (table has {struct_count})"),
			Self::SizeMismatch { code, at, expected, got } => {
				write!(f, "block {code} at offset {at} has {got} payload bytes, layout needs {expected}")
			}
		}
	}
}
