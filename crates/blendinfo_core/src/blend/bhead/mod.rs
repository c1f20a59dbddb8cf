use std::io::Read;

use crate::blend::bytes::{Cursor, read_up_to};
use crate::blend::{BlendError, BlendHeader, BlockCode, Result};

/// Parsed block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BHead {
	/// Four-byte block code.
	pub code: [u8; 4],
	/// Payload byte length.
	pub len: u64,
	/// Address the payload had in the writing process; an identity key, never dereferenced.
	pub old: u64,
	/// SDNA struct index for payload interpretation (0 = opaque).
	pub sdna_nr: u32,
	/// Number of elements stored in payload.
	pub nr: u64,
	/// Absolute file offset of this header.
	pub file_offset: u64,
}

impl BHead {
	/// Byte offset of the address field inside an encoded header.
	pub const OLD_FIELD_OFFSET: u64 = 8;

	/// Parse one encoded header from `bytes`.
	pub fn parse(bytes: &[u8], header: BlendHeader, file_offset: u64) -> Result<Self> {
		let mut cursor = Cursor::new(bytes, header.endianness);
		let code = cursor.read_code4()?;
		let len = i64::from(cursor.read_i32()?);
		if len < 0 {
			return Err(BlendError::NegativeBlockLength { at: file_offset, len });
		}

		let old = cursor.read_ptr(header.pointer_size)?;
		let sdna_nr = cursor.read_u32()?;
		let nr = i64::from(cursor.read_i32()?);
		if nr < 0 {
			return Err(BlendError::NegativeBlockCount { at: file_offset, nr });
		}

		Ok(Self {
			code,
			len: len as u64,
			old,
			sdna_nr,
			nr: nr as u64,
			file_offset,
		})
	}

	/// Read one header from `reader`; a short read is a format error.
	pub fn read<R: Read + ?Sized>(reader: &mut R, header: BlendHeader, file_offset: u64) -> Result<Self> {
		let mut buf = [0_u8; 24];
		let need = header.bhead_size();
		let got = read_up_to(reader, &mut buf[..need])?;
		if got < need {
			return Err(BlendError::TruncatedHeader {
				what: "block header",
				at: file_offset,
				need,
				got,
			});
		}
		Self::parse(&buf[..need], header, file_offset)
	}

	/// Return `true` when this is the terminal `ENDB` block.
	pub fn is_endb(&self) -> bool {
		self.code == *b"ENDB"
	}

	/// Return `true` when this block carries the SDNA schema.
	pub fn is_dna1(&self) -> bool {
		self.code == *b"DNA1"
	}

	/// Block code with printable formatting.
	pub fn block_code(&self) -> BlockCode {
		BlockCode(self.code)
	}

	/// Absolute file offset of the first payload byte.
	pub fn payload_offset(&self, header: BlendHeader) -> u64 {
		self.file_offset + header.bhead_size() as u64
	}

	/// Return `true` when `addr` falls inside `[old, old + len)`.
	pub fn contains(&self, addr: u64) -> bool {
		addr >= self.old && addr - self.old < self.len
	}
}
