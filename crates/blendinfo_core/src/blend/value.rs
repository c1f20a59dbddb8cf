use std::fmt;

use crate::blend::bytes::uint_from_bytes;
use crate::blend::{Endianness, Field, FieldKind, ScalarKind};

/// Display value of one dumped leaf field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// Single `char`.
	Char(u8),
	/// Signed integer of any width.
	I64(i64),
	/// Unsigned integer of any width.
	U64(u64),
	/// `float`.
	F32(f32),
	/// `double`.
	F64(f64),
	/// One-dimensional `char` array cut at the first NUL.
	String(Box<str>),
	/// One stored address.
	Ptr(u64),
	/// Anything without a known decoding.
	Bytes(Vec<u8>),
}

impl Value {
	/// Decode a scalar or opaque leaf.
	pub fn decode_leaf(field: &Field, bytes: &[u8], endianness: Endianness, char_arrays_as_text: bool) -> Self {
		match field.kind {
			FieldKind::Scalar(kind) => decode_scalar(kind, bytes, endianness),
			_ if char_arrays_as_text && field.is_char_text() => {
				let end = bytes.iter().position(|byte| *byte == 0).unwrap_or(bytes.len());
				Self::String(String::from_utf8_lossy(&bytes[..end]).into_owned().into_boxed_str())
			}
			_ => Self::Bytes(bytes.to_vec()),
		}
	}
}

fn decode_scalar(kind: ScalarKind, bytes: &[u8], endianness: Endianness) -> Value {
	let raw = uint_from_bytes(bytes, endianness);
	match kind {
		ScalarKind::Char => Value::Char(raw as u8),
		ScalarKind::I8 => Value::I64(i64::from(raw as u8 as i8)),
		ScalarKind::I16 => Value::I64(i64::from(raw as u16 as i16)),
		ScalarKind::I32 => Value::I64(i64::from(raw as u32 as i32)),
		ScalarKind::I64 => Value::I64(raw as i64),
		ScalarKind::U8 | ScalarKind::U16 | ScalarKind::U32 | ScalarKind::U64 => Value::U64(raw),
		ScalarKind::F32 => Value::F32(f32::from_bits(raw as u32)),
		ScalarKind::F64 => Value::F64(f64::from_bits(raw)),
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Char(v) if v.is_ascii_graphic() || *v == b' ' => write!(f, "'{}'", char::from(*v)),
			Self::Char(v) => write!(f, "{v}"),
			Self::I64(v) => write!(f, "{v}"),
			Self::U64(v) => write!(f, "{v}"),
			Self::F32(v) => write!(f, "{v}"),
			Self::F64(v) => write!(f, "{v}"),
			Self::String(v) => write!(f, "{v:?}"),
			Self::Ptr(v) => write!(f, "{v:#x}"),
			Self::Bytes(bytes) => {
				for byte in bytes {
					write!(f, "{byte:02x}")?;
				}
				Ok(())
			}
		}
	}
}
