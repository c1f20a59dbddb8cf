use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::blend::bytes::read_up_to;
use crate::blend::compression::{detect, into_source};
use crate::blend::{BHead, BlendError, BlendHeader, Compression, Dna, Result, Source};

/// Open `.blend` container positioned over a seekable byte stream.
#[derive(Debug)]
pub struct BlendFile<S> {
	/// Parsed file header.
	pub header: BlendHeader,
	/// Compression the file was stored with.
	pub compression: Compression,
	stream: S,
	stream_len: u64,
}

/// Counts gathered by one pass over all block headers.
#[derive(Debug, Clone, Default)]
pub struct BlockStats {
	/// Blocks seen before `ENDB`.
	pub block_count: u32,
	/// Whether a `DNA1` block was seen.
	pub has_dna1: bool,
	/// Whether the stream was terminated by `ENDB`.
	pub has_endb: bool,
	/// Code of the last block before `ENDB`.
	pub last_code: [u8; 4],
	/// Block count per code.
	pub codes: HashMap<[u8; 4], u32>,
}

impl BlendFile<Source> {
	/// Open a file for read-only analyses, inflating zstd input in memory.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let file = File::open(path)?;
		let (compression, source) = into_source(file)?;
		log::debug!("opened {} (compression: {})", path.display(), compression.as_str());
		Self::from_stream(source, compression)
	}
}

impl BlendFile<File> {
	/// Open an uncompressed file for in-place pointer rewriting.
	pub fn open_rw(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let mut file = OpenOptions::new().read(true).write(true).open(path)?;
		if detect(&mut file)? == Compression::Zstd {
			return Err(BlendError::CompressedNotWritable);
		}
		log::debug!("opened {} for rewriting", path.display());
		Self::from_stream(file, Compression::None)
	}
}

impl<S: Read + Seek> BlendFile<S> {
	/// Validate the 12-byte header of `stream` and wrap it.
	pub fn from_stream(mut stream: S, compression: Compression) -> Result<Self> {
		let stream_len = stream.seek(SeekFrom::End(0))?;
		stream.seek(SeekFrom::Start(0))?;

		let mut raw = [0_u8; BlendHeader::SIZE];
		let got = read_up_to(&mut stream, &mut raw)?;
		let header = BlendHeader::parse(&raw[..got])?;
		log::debug!(
			"header: version {} {}-bit {} endian, {} bytes",
			header.version_label(),
			header.pointer_size * 8,
			header.endianness.as_str(),
			stream_len
		);

		Ok(Self {
			header,
			compression,
			stream,
			stream_len,
		})
	}

	/// Total stream length in bytes.
	pub fn len(&self) -> u64 {
		self.stream_len
	}

	/// Whether the stream holds nothing past the header.
	pub fn is_empty(&self) -> bool {
		self.stream_len <= BlendHeader::SIZE as u64
	}

	/// Start a fresh pass over the block stream, right after the file header.
	///
	/// Only one cursor can exist at a time; each derived operation makes its own.
	pub fn blocks(&mut self) -> BlockCursor<'_, S> {
		BlockCursor {
			header: self.header,
			stream: &mut self.stream,
			stream_len: self.stream_len,
			next_at: BlendHeader::SIZE as u64,
			current: None,
			done: false,
			saw_endb: false,
		}
	}

	/// Scan from the start until `DNA1` and decode the schema it carries.
	pub fn dna(&mut self) -> Result<Dna> {
		let header = self.header;
		let mut blocks = self.blocks();
		while let Some(head) = blocks.next_block()? {
			if head.is_dna1() {
				let payload = blocks.read_payload()?;
				return Dna::parse(&payload, header.endianness, header.pointer_size);
			}
		}
		Err(BlendError::DnaNotFound)
	}

	/// Count blocks per code in one header-only pass.
	pub fn scan_block_stats(&mut self) -> Result<BlockStats> {
		let mut stats = BlockStats::default();
		let mut blocks = self.blocks();
		while let Some(head) = blocks.next_block()? {
			stats.block_count += 1;
			stats.last_code = head.code;
			*stats.codes.entry(head.code).or_insert(0) += 1;
			if head.is_dna1() {
				stats.has_dna1 = true;
			}
		}
		stats.has_endb = blocks.saw_endb();
		Ok(stats)
	}

	/// Give back the underlying stream.
	pub fn into_inner(self) -> S {
		self.stream
	}
}

impl<S: Write> BlendFile<S> {
	/// Flush pending writes to the underlying stream.
	pub fn flush(&mut self) -> Result<()> {
		self.stream.flush()?;
		Ok(())
	}
}

/// Single-pass cursor over block headers, with payload access for the current block.
pub struct BlockCursor<'f, S> {
	header: BlendHeader,
	stream: &'f mut S,
	stream_len: u64,
	next_at: u64,
	current: Option<BHead>,
	done: bool,
	saw_endb: bool,
}

impl<S> BlockCursor<'_, S> {
	/// Pointer width and byte order of the container.
	pub fn header(&self) -> BlendHeader {
		self.header
	}

	/// Header of the most recently yielded block.
	pub fn current(&self) -> Option<&BHead> {
		self.current.as_ref()
	}

	/// Whether the pass ended on an `ENDB` block rather than at end of stream.
	pub fn saw_endb(&self) -> bool {
		self.saw_endb
	}

	fn current_payload(&self) -> Result<(BHead, u64)> {
		let head = self.current.ok_or(BlendError::NoCurrentBlock)?;
		Ok((head, head.payload_offset(self.header)))
	}
}

impl<S: Read + Seek> BlockCursor<'_, S> {
	/// Advance to the next block header; `None` once `ENDB` (or a clean end of stream) is reached.
	///
	/// The stream is left positioned at the first payload byte of the returned block.
	pub fn next_block(&mut self) -> Result<Option<BHead>> {
		if self.done {
			return Ok(None);
		}

		let at = self.next_at;
		if at == self.stream_len {
			log::debug!("stream ended at offset {at} without ENDB");
			self.done = true;
			self.current = None;
			return Ok(None);
		}

		self.stream.seek(SeekFrom::Start(at))?;
		let head = BHead::read(&mut *self.stream, self.header, at)?;
		if head.is_endb() {
			log::trace!("ENDB at offset {at}");
			self.done = true;
			self.saw_endb = true;
			self.current = None;
			return Ok(None);
		}

		let payload_at = head.payload_offset(self.header);
		let rem = self.stream_len.saturating_sub(payload_at);
		if head.len > rem {
			self.done = true;
			return Err(BlendError::BlockLenOutOfRange {
				code: head.block_code(),
				at,
				len: head.len,
				rem,
			});
		}

		log::trace!(
			"block {} at offset {at}: len {} old {:#x} sdna {} nr {}",
			head.block_code(),
			head.len,
			head.old,
			head.sdna_nr,
			head.nr
		);

		self.next_at = payload_at + head.len;
		self.current = Some(head);
		Ok(Some(head))
	}

	/// Absolute stream position of the underlying cursor.
	pub fn position(&mut self) -> Result<u64> {
		Ok(self.stream.stream_position()?)
	}

	/// Read the whole payload of the current block.
	pub fn read_payload(&mut self) -> Result<Vec<u8>> {
		let (head, payload_at) = self.current_payload()?;
		let len = usize::try_from(head.len).map_err(|_| BlendError::PayloadOutOfRange {
			at: payload_at,
			need: head.len,
			rem: self.stream_len.saturating_sub(payload_at),
		})?;
		let mut out = vec![0_u8; len];
		self.stream.seek(SeekFrom::Start(payload_at))?;
		self.stream.read_exact(&mut out)?;
		Ok(out)
	}

	/// Read `buf.len()` bytes of the current payload starting at `offset` inside it.
	pub fn read_payload_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
		let at = self.checked_payload_range(offset, buf.len() as u64)?;
		self.stream.seek(SeekFrom::Start(at))?;
		self.stream.read_exact(buf)?;
		Ok(())
	}

	fn checked_payload_range(&self, offset: u64, need: u64) -> Result<u64> {
		let (head, payload_at) = self.current_payload()?;
		let at = payload_at + offset;
		let rem = head.len.saturating_sub(offset);
		if offset > head.len || need > rem {
			return Err(BlendError::PayloadOutOfRange { at, need, rem });
		}
		Ok(at)
	}
}

impl<S: Read + Write + Seek> BlockCursor<'_, S> {
	/// Overwrite `bytes` of the current payload starting at `offset` inside it.
	pub fn write_payload_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
		let at = self.checked_payload_range(offset, bytes.len() as u64)?;
		self.stream.seek(SeekFrom::Start(at))?;
		self.stream.write_all(bytes)?;
		Ok(())
	}

	/// Overwrite the encoded address field of the current block header.
	///
	/// `raw` must be exactly one pointer width in file byte order.
	pub fn write_header_old(&mut self, raw: &[u8]) -> Result<()> {
		let (head, _) = self.current_payload()?;
		if raw.len() != self.header.pointer_size {
			return Err(BlendError::UnsupportedPointerSize { pointer_size: raw.len() });
		}
		self.stream.seek(SeekFrom::Start(head.file_offset + BHead::OLD_FIELD_OFFSET))?;
		self.stream.write_all(raw)?;
		Ok(())
	}
}
