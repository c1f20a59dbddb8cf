use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

use crate::blend::bytes::read_up_to;
use crate::blend::{BlendError, BlendHeader, Result};

const MAX_DECOMPRESSED_BYTES: u64 = 512 * 1024 * 1024;
/// zstd frame magic used by compressed `.blend` files.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Compression mode detected for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
	/// Raw uncompressed stream.
	None,
	/// zstd-compressed stream.
	Zstd,
}

impl Compression {
	/// Render compression mode as a stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Zstd => "zstd",
		}
	}
}

/// Read-only byte source behind [`crate::blend::BlendFile::open`].
///
/// Uncompressed files are streamed from disk; compressed ones are inflated into memory once.
#[derive(Debug)]
pub enum Source {
	/// Seekable file handle.
	File(File),
	/// Decompressed bytes.
	Memory(io::Cursor<Vec<u8>>),
}

impl Read for Source {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		match self {
			Self::File(file) => file.read(buf),
			Self::Memory(cursor) => cursor.read(buf),
		}
	}
}

impl Seek for Source {
	fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
		match self {
			Self::File(file) => file.seek(pos),
			Self::Memory(cursor) => cursor.seek(pos),
		}
	}
}

/// Sniff the first bytes of `file` and return its compression mode, rewound to the start.
pub(crate) fn detect(file: &mut File) -> Result<Compression> {
	let mut magic = [0_u8; 4];
	let got = read_up_to(file, &mut magic)?;
	file.seek(SeekFrom::Start(0))?;
	if got == magic.len() && magic == ZSTD_MAGIC {
		return Ok(Compression::Zstd);
	}
	Ok(Compression::None)
}

/// Wrap `file` as a readable source, inflating zstd input.
pub(crate) fn into_source(mut file: File) -> Result<(Compression, Source)> {
	match detect(&mut file)? {
		Compression::None => Ok((Compression::None, Source::File(file))),
		Compression::Zstd => {
			let bytes = decode_zstd(file)?;
			log::debug!("inflated zstd stream to {} bytes", bytes.len());
			Ok((Compression::Zstd, Source::Memory(io::Cursor::new(bytes))))
		}
	}
}

fn decode_zstd<R: Read>(raw: R) -> Result<Vec<u8>> {
	let decoder = zstd::stream::read::Decoder::new(raw)?;
	let mut out = Vec::new();
	decoder.take(MAX_DECOMPRESSED_BYTES + 1).read_to_end(&mut out)?;
	if out.len() as u64 > MAX_DECOMPRESSED_BYTES {
		return Err(BlendError::DecompressedTooLarge {
			limit: MAX_DECOMPRESSED_BYTES,
		});
	}

	if !out.starts_with(BlendHeader::MAGIC) {
		return Err(BlendError::NotBlendAfterDecompress);
	}

	Ok(out)
}
