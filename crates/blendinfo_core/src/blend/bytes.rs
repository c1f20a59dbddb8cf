use std::io::{ErrorKind, Read};

use crate::blend::{BlendError, Endianness, Result};

/// Simple bounded cursor over an immutable byte slice.
pub struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
	endianness: Endianness,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at position 0 decoding multi-byte values in `endianness`.
	pub fn new(bytes: &'a [u8], endianness: Endianness) -> Self {
		Self { bytes, pos: 0, endianness }
	}

	/// Return current byte offset.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Return remaining unread bytes.
	pub fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Read exactly `n` bytes and advance cursor.
	pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(BlendError::UnexpectedEof {
				at: self.pos,
				need: n,
				rem: self.remaining(),
			});
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	/// Read a four-byte code.
	pub fn read_code4(&mut self) -> Result<[u8; 4]> {
		let raw = self.read_exact(4)?;
		let mut out = [0_u8; 4];
		out.copy_from_slice(raw);
		Ok(out)
	}

	/// Read a `u16`.
	pub fn read_u16(&mut self) -> Result<u16> {
		let raw = self.read_exact(2)?;
		Ok(uint_from_bytes(raw, self.endianness) as u16)
	}

	/// Read a `u32`.
	pub fn read_u32(&mut self) -> Result<u32> {
		let raw = self.read_exact(4)?;
		Ok(uint_from_bytes(raw, self.endianness) as u32)
	}

	/// Read an `i32`.
	pub fn read_i32(&mut self) -> Result<i32> {
		Ok(self.read_u32()? as i32)
	}

	/// Read a pointer-sized unsigned integer and widen to `u64`.
	pub fn read_ptr(&mut self, pointer_size: usize) -> Result<u64> {
		match pointer_size {
			4 | 8 => {
				let raw = self.read_exact(pointer_size)?;
				Ok(uint_from_bytes(raw, self.endianness))
			}
			_ => Err(BlendError::UnsupportedPointerSize { pointer_size }),
		}
	}

	/// Advance to the next 4-byte aligned position.
	pub fn align4(&mut self) -> Result<()> {
		let aligned = (self.pos + 3) & !3;
		let skip = aligned.saturating_sub(self.pos);
		let _ = self.read_exact(skip)?;
		Ok(())
	}

	/// Read a zero-terminated byte string without the terminator.
	pub fn read_cstring_bytes(&mut self) -> Result<&'a [u8]> {
		let start = self.pos;
		let rem = &self.bytes[self.pos..];
		let Some(rel_end) = rem.iter().position(|byte| *byte == 0) else {
			return Err(BlendError::UnexpectedEof {
				at: self.pos,
				need: 1,
				rem: self.remaining(),
			});
		};

		let end = start + rel_end;
		self.pos = end + 1;
		Ok(&self.bytes[start..end])
	}
}

/// Decode an unsigned integer of 1 to 8 bytes.
pub fn uint_from_bytes(bytes: &[u8], endianness: Endianness) -> u64 {
	let mut value = 0_u64;
	match endianness {
		Endianness::Little => {
			for byte in bytes.iter().rev() {
				value = (value << 8) | u64::from(*byte);
			}
		}
		Endianness::Big => {
			for byte in bytes {
				value = (value << 8) | u64::from(*byte);
			}
		}
	}
	value
}

/// Encode the low `width` bytes of `value` (1 to 8) in `endianness`.
pub fn uint_to_bytes(value: u64, width: usize, endianness: Endianness) -> Vec<u8> {
	match endianness {
		Endianness::Little => value.to_le_bytes()[..width].to_vec(),
		Endianness::Big => value.to_be_bytes()[8 - width..].to_vec(),
	}
}

/// Read until `buf` is full or the reader reports end of stream; returns bytes read.
pub fn read_up_to<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
	let mut filled = 0;
	while filled < buf.len() {
		match reader.read(&mut buf[filled..]) {
			Ok(0) => break,
			Ok(n) => filled += n,
			Err(err) if err.kind() == ErrorKind::Interrupted => {}
			Err(err) => return Err(err),
		}
	}
	Ok(filled)
}

#[cfg(test)]
mod tests {
	use super::{Cursor, uint_from_bytes, uint_to_bytes};
	use crate::blend::{BlendError, Endianness};

	#[test]
	fn decodes_both_byte_orders() {
		assert_eq!(uint_from_bytes(&[0x01, 0x02, 0x03, 0x04], Endianness::Little), 0x0403_0201);
		assert_eq!(uint_from_bytes(&[0x01, 0x02, 0x03, 0x04], Endianness::Big), 0x0102_0304);
		assert_eq!(uint_from_bytes(&[0xFF; 8], Endianness::Big), u64::MAX);
	}

	#[test]
	fn encodes_low_bytes_in_order() {
		assert_eq!(uint_to_bytes(0x0102_0304, 4, Endianness::Little), vec![4, 3, 2, 1]);
		assert_eq!(uint_to_bytes(0x0102_0304, 4, Endianness::Big), vec![1, 2, 3, 4]);
		let raw = uint_to_bytes(0xDEAD_BEEF_0000_0001, 8, Endianness::Big);
		assert_eq!(uint_from_bytes(&raw, Endianness::Big), 0xDEAD_BEEF_0000_0001);
	}

	#[test]
	fn aligns_and_reads_cstrings() {
		let bytes = b"ab\0\0CODE";
		let mut cursor = Cursor::new(bytes, Endianness::Little);
		assert_eq!(cursor.read_cstring_bytes().expect("cstring"), b"ab");
		cursor.align4().expect("align");
		assert_eq!(cursor.pos(), 4);
		assert_eq!(&cursor.read_code4().expect("code"), b"CODE");
	}

	#[test]
	fn short_reads_report_position() {
		let mut cursor = Cursor::new(&[1, 2, 3], Endianness::Little);
		let err = cursor.read_u32().expect_err("short read fails");
		assert!(matches!(err, BlendError::UnexpectedEof { at: 0, need: 4, rem: 3 }));
	}

	#[test]
	fn rejects_odd_pointer_width() {
		let mut cursor = Cursor::new(&[0; 16], Endianness::Little);
		let err = cursor.read_ptr(6).expect_err("width 6 unsupported");
		assert!(matches!(err, BlendError::UnsupportedPointerSize { pointer_size: 6 }));
	}
}
