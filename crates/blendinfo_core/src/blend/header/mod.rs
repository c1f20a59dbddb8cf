use crate::blend::{BlendError, Result};

/// Byte endianness marker stored in blend headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
	/// Little-endian byte order (`v` marker, and anything that is not `V`).
	Little,
	/// Big-endian byte order (`V` marker).
	Big,
}

impl Endianness {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Little => "little",
			Self::Big => "big",
		}
	}
}

/// Parsed 12-byte blend file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendHeader {
	/// Pointer width in bytes (4 or 8).
	pub pointer_size: usize,
	/// File byte order.
	pub endianness: Endianness,
	/// Raw version digits (`b"279"` style), kept uninterpreted.
	pub version: [u8; 3],
}

impl BlendHeader {
	/// Size of the file header.
	pub const SIZE: usize = 12;
	/// Literal magic prefix.
	pub const MAGIC: &'static [u8; 7] = b"BLENDER";

	/// Parse a blend header from the beginning of `bytes`.
	pub fn parse(bytes: &[u8]) -> Result<Self> {
		let Some(header) = bytes.get(0..Self::SIZE) else {
			return Err(BlendError::TruncatedHeader {
				what: "file header",
				at: 0,
				need: Self::SIZE,
				got: bytes.len(),
			});
		};
		if &header[0..7] != Self::MAGIC {
			return Err(BlendError::InvalidHeader {
				header: String::from_utf8_lossy(header).into_owned().into_boxed_str(),
			});
		}

		let pointer_size = if header[7] == b'_' { 4 } else { 8 };
		let endianness = if header[8] == b'V' { Endianness::Big } else { Endianness::Little };
		let mut version = [0_u8; 3];
		version.copy_from_slice(&header[9..12]);

		Ok(Self {
			pointer_size,
			endianness,
			version,
		})
	}

	/// Encoded size of one block header: code, length, address, struct index, count.
	pub fn bhead_size(self) -> usize {
		16 + self.pointer_size
	}

	/// Version digits as a number, when they are all ASCII digits.
	pub fn version_number(self) -> Option<u16> {
		parse_digits(&self.version)
	}

	/// Version digits as text.
	pub fn version_label(self) -> String {
		String::from_utf8_lossy(&self.version).into_owned()
	}
}

fn parse_digits(bytes: &[u8]) -> Option<u16> {
	if bytes.is_empty() {
		return None;
	}

	let mut value = 0_u16;
	for byte in bytes {
		if !byte.is_ascii_digit() {
			return None;
		}
		value = value * 10 + u16::from(*byte - b'0');
	}
	Some(value)
}
