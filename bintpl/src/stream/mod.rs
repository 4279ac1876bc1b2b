mod endian;

pub use endian::{BitOrder, Endianness};

use std::sync::Arc;

use crate::error::InterpError;

/// Where the raw bytes backing a [`ByteStream`] actually live. Mirrors the
/// teacher's `memmap2`-gated heap loading: small inputs are copied once into
/// an `Arc<[u8]>`, large files can be mapped in behind the `memmap2` feature.
enum ByteSource {
	Bytes(Arc<[u8]>),
	#[cfg(feature = "memmap2")]
	Mapped(memmap2::Mmap),
}

impl ByteSource {
	fn as_slice(&self) -> &[u8] {
		match self {
			ByteSource::Bytes(b) => b,
			#[cfg(feature = "memmap2")]
			ByteSource::Mapped(m) => m,
		}
	}
}

/// A random-access, bit-addressable reader over a byte buffer, with mutable
/// endianness and bit-order state (selected by the running template).
pub struct ByteStream {
	source: ByteSource,
	len_bits: u64,
	bit_pos: u64,
	endian: Endianness,
	bit_order: BitOrder,
	padded: bool,
}

impl ByteStream {
	pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
		let source = ByteSource::Bytes(bytes.into());
		let len_bits = source.as_slice().len() as u64 * 8;
		ByteStream {
			source,
			len_bits,
			bit_pos: 0,
			endian: Endianness::default(),
			bit_order: BitOrder::default(),
			padded: true,
		}
	}

	#[cfg(feature = "memmap2")]
	pub fn from_mmap(mmap: memmap2::Mmap) -> Self {
		let len_bits = mmap.len() as u64 * 8;
		ByteStream {
			source: ByteSource::Mapped(mmap),
			len_bits,
			bit_pos: 0,
			endian: Endianness::default(),
			bit_order: BitOrder::default(),
			padded: true,
		}
	}

	#[inline]
	pub fn endian(&self) -> Endianness {
		self.endian
	}

	#[inline]
	pub fn set_endian(&mut self, endian: Endianness) {
		self.endian = endian;
	}

	#[inline]
	pub fn bit_order(&self) -> BitOrder {
		self.bit_order
	}

	pub fn set_bit_order(&mut self, order: BitOrder) {
		self.bit_order = order;
	}

	pub fn set_padded(&mut self, padded: bool) {
		self.padded = padded;
	}

	#[inline]
	pub fn padded(&self) -> bool {
		self.padded
	}

	#[inline]
	pub fn len_bits(&self) -> u64 {
		self.len_bits
	}

	/// Current bit-cursor position, from the start of the stream.
	#[inline]
	pub fn tell(&self) -> u64 {
		self.bit_pos
	}

	#[inline]
	pub fn tell_bytes(&self) -> u64 {
		self.bit_pos / 8
	}

	#[inline]
	fn is_byte_aligned(&self) -> bool {
		self.bit_pos % 8 == 0
	}

	/// Seek to an absolute byte offset. Seeks past the end are permitted
	/// (union rewinds rely on this); reads following are still bounds-checked.
	pub fn seek(&mut self, byte_offset: u64) {
		self.bit_pos = byte_offset * 8;
	}

	pub fn seek_bits(&mut self, bit_offset: u64) {
		self.bit_pos = bit_offset;
	}

	/// If bitfield padding is enabled, advance the cursor to the next byte
	/// boundary. A no-op when already aligned or when padding is disabled.
	fn align_if_padded(&mut self) {
		if self.padded && !self.is_byte_aligned() {
			self.bit_pos = (self.bit_pos + 7) & !7;
		}
	}

	/// Read `n` bits (`n` <= 64) as an unsigned integer, most-significant-bit
	/// of the logical value first, honoring `bit_order` within each byte.
	pub fn read_bits(&mut self, n: u32) -> Result<u64, InterpError> {
		debug_assert!(n <= 64);
		let end_bit = self.bit_pos + n as u64;
		if end_bit > self.len_bits {
			return Err(InterpError::StreamEOF {
				requested_bits: n as u64,
				available_bits: self.len_bits.saturating_sub(self.bit_pos),
			});
		}

		let data = self.source.as_slice();
		let mut value: u64 = 0;
		for i in 0..n as u64 {
			let bit_index = self.bit_pos + i;
			let byte_index = (bit_index / 8) as usize;
			let bit_in_byte = (bit_index % 8) as u32;
			let byte = data[byte_index];
			let bit = match self.bit_order {
				BitOrder::LeftToRight => (byte >> (7 - bit_in_byte)) & 1,
				BitOrder::RightToLeft => (byte >> bit_in_byte) & 1,
			};
			value = (value << 1) | bit as u64;
		}
		self.bit_pos = end_bit;
		Ok(value)
	}

	/// Read `n` bytes. If bitfield padding is enabled and the cursor is
	/// mid-byte, it is advanced to the next byte boundary first; otherwise the
	/// read continues from the exact bit position (bits carry over).
	pub fn read_bytes(&mut self, n: u64) -> Result<Vec<u8>, InterpError> {
		self.align_if_padded();

		if self.is_byte_aligned() {
			let start = (self.bit_pos / 8) as usize;
			let end = start + n as usize;
			let end_bits = end as u64 * 8;
			if end_bits > self.len_bits {
				return Err(InterpError::StreamEOF {
					requested_bits: n * 8,
					available_bits: self.len_bits.saturating_sub(self.bit_pos),
				});
			}
			let slice = &self.source.as_slice()[start..end];
			self.bit_pos = end_bits;
			return Ok(slice.to_vec());
		}

		let mut bytes = Vec::with_capacity(n as usize);
		for _ in 0..n {
			bytes.push(self.read_bits(8)? as u8);
		}
		Ok(bytes)
	}

	/// Read bytes until (and consuming) a NUL terminator. Used by `string`.
	pub fn read_until_nul(&mut self) -> Result<Vec<u8>, InterpError> {
		self.align_if_padded();
		let mut out = Vec::new();
		loop {
			let byte = self.read_bytes(1)?[0];
			if byte == 0 {
				break;
			}
			out.push(byte);
		}
		Ok(out)
	}

	/// Read 16-bit code units until (and consuming) a zero terminator. Used by `wstring`.
	pub fn read_until_nul_wide(&mut self) -> Result<Vec<u16>, InterpError> {
		self.align_if_padded();
		let mut out = Vec::new();
		loop {
			let bytes = self.read_bytes(2)?;
			let unit = match self.endian {
				Endianness::Little => u16::from_le_bytes([bytes[0], bytes[1]]),
				Endianness::Big => u16::from_be_bytes([bytes[0], bytes[1]]),
			};
			if unit == 0 {
				break;
			}
			out.push(unit);
		}
		Ok(out)
	}
}

impl std::fmt::Debug for ByteStream {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ByteStream")
			.field("len_bits", &self.len_bits)
			.field("bit_pos", &self.bit_pos)
			.field("endian", &self.endian)
			.field("bit_order", &self.bit_order)
			.field("padded", &self.padded)
			.finish()
	}
}
