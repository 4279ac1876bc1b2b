use crate::error::{Coord, InterpError};
use crate::field::Value;
use crate::stream::{ByteStream, Endianness};

/// The built-in numeric classes. `Char` is kept distinct from `U8` only for
/// display purposes — it parses and coerces identically to an unsigned byte.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NumericKind {
	Char,
	I8,
	U8,
	I16,
	U16,
	I32,
	U32,
	I64,
	U64,
	F32,
	F64,
}

impl NumericKind {
	pub fn natural_width_bits(self) -> u32 {
		match self {
			NumericKind::Char | NumericKind::I8 | NumericKind::U8 => 8,
			NumericKind::I16 | NumericKind::U16 => 16,
			NumericKind::I32 | NumericKind::U32 | NumericKind::F32 => 32,
			NumericKind::I64 | NumericKind::U64 | NumericKind::F64 => 64,
		}
	}

	pub fn is_signed(self) -> bool {
		matches!(self, NumericKind::I8 | NumericKind::I16 | NumericKind::I32 | NumericKind::I64)
	}

	pub fn is_float(self) -> bool {
		matches!(self, NumericKind::F32 | NumericKind::F64)
	}

	/// The unsigned counterpart of a signed integer kind, used by the type
	/// resolver when a declaration carries an `unsigned` qualifier.
	pub fn unsigned_counterpart(self) -> NumericKind {
		match self {
			NumericKind::I8 => NumericKind::U8,
			NumericKind::I16 => NumericKind::U16,
			NumericKind::I32 => NumericKind::U32,
			NumericKind::I64 => NumericKind::U64,
			other => other,
		}
	}
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum NumericPayload {
	Signed(i64),
	Unsigned(u64),
	Float(f64),
}

#[derive(Debug, Clone)]
pub struct NumericField {
	pub kind: NumericKind,
	pub payload: NumericPayload,
}

impl NumericField {
	pub fn zero(kind: NumericKind) -> Self {
		let payload = if kind.is_float() {
			NumericPayload::Float(0.0)
		} else if kind.is_signed() {
			NumericPayload::Signed(0)
		} else {
			NumericPayload::Unsigned(0)
		};
		NumericField { kind, payload }
	}

	pub fn from_i64(kind: NumericKind, value: i64) -> Self {
		let mut field = NumericField::zero(kind);
		let _ = field.set_value(Value::Int(value), "", Coord::default());
		field
	}

	/// Parse from the stream. `bitsize`, when present, makes this a true
	/// bitfield read via `read_bits` (no endian applied); otherwise a
	/// byte-aligned read of the natural width, honoring `stream.endian()`.
	pub fn parse(stream: &mut ByteStream, kind: NumericKind, bitsize: Option<u32>) -> Result<(Self, u64), InterpError> {
		if let Some(bits) = bitsize {
			let raw = stream.read_bits(bits)?;
			let payload = if kind.is_signed() {
				NumericPayload::Signed(sign_extend(raw, bits))
			} else {
				NumericPayload::Unsigned(raw)
			};
			return Ok((NumericField { kind, payload }, bits as u64));
		}

		let width_bits = kind.natural_width_bits();
		let bytes = stream.read_bytes(width_bits as u64 / 8)?;
		let payload = decode_bytes(kind, &bytes, stream.endian());
		Ok((NumericField { kind, payload }, width_bits as u64))
	}

	pub fn get_value(&self) -> Value {
		match self.payload {
			NumericPayload::Signed(v) => Value::Int(v),
			NumericPayload::Unsigned(v) => Value::UInt(v),
			NumericPayload::Float(v) => Value::Float(v),
		}
	}

	pub fn set_value(&mut self, value: Value, name: &str, coord: Coord) -> Result<(), InterpError> {
		match (self.kind.is_float(), value) {
			(_, Value::Bytes(_)) | (_, Value::WBytes(_)) => {
				Err(InterpError::UnsupportedConstantType(format!("string -> {name}"), coord))
			}
			(true, Value::Int(v)) => {
				self.payload = NumericPayload::Float(clamp_float(self.kind, v as f64));
				Ok(())
			}
			(true, Value::UInt(v)) => {
				self.payload = NumericPayload::Float(clamp_float(self.kind, v as f64));
				Ok(())
			}
			(true, Value::Float(v)) => {
				self.payload = NumericPayload::Float(clamp_float(self.kind, v));
				Ok(())
			}
			(false, Value::Float(v)) => {
				self.payload = self.coerce_int(v as i64);
				Ok(())
			}
			(false, Value::Int(v)) => {
				self.payload = self.coerce_int(v);
				Ok(())
			}
			(false, Value::UInt(v)) => {
				self.payload = self.coerce_int(v as i64);
				Ok(())
			}
		}
	}

	fn coerce_int(&self, v: i64) -> NumericPayload {
		let width = self.kind.natural_width_bits();
		if self.kind.is_signed() {
			NumericPayload::Signed(sign_extend(v as u64, width))
		} else {
			let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
			NumericPayload::Unsigned((v as u64) & mask)
		}
	}

	/// Serialize back to bytes honoring `endian`; used by round-trip tests
	/// and by any future `write`-style native function.
	pub fn to_bytes(&self, endian: Endianness) -> Vec<u8> {
		match self.payload {
			NumericPayload::Signed(v) => encode_int(v as u64, self.kind.natural_width_bits(), endian),
			NumericPayload::Unsigned(v) => encode_int(v, self.kind.natural_width_bits(), endian),
			NumericPayload::Float(v) => match self.kind {
				NumericKind::F32 => match endian {
					Endianness::Little => (v as f32).to_le_bytes().to_vec(),
					Endianness::Big => (v as f32).to_be_bytes().to_vec(),
				},
				_ => match endian {
					Endianness::Little => v.to_le_bytes().to_vec(),
					Endianness::Big => v.to_be_bytes().to_vec(),
				},
			},
		}
	}
}

fn clamp_float(kind: NumericKind, v: f64) -> f64 {
	match kind {
		NumericKind::F32 => v as f32 as f64,
		_ => v,
	}
}

fn sign_extend(raw: u64, bits: u32) -> i64 {
	if bits == 0 || bits >= 64 {
		return raw as i64;
	}
	let shift = 64 - bits;
	((raw << shift) as i64) >> shift
}

fn encode_int(value: u64, width: u32, endian: Endianness) -> Vec<u8> {
	let bytes = match endian {
		Endianness::Little => value.to_le_bytes(),
		Endianness::Big => value.to_be_bytes(),
	};
	let n = (width / 8) as usize;
	match endian {
		Endianness::Little => bytes[..n].to_vec(),
		Endianness::Big => bytes[8 - n..].to_vec(),
	}
}

fn decode_bytes(kind: NumericKind, bytes: &[u8], endian: Endianness) -> NumericPayload {
	let mut buf = [0u8; 8];
	match endian {
		Endianness::Little => buf[..bytes.len()].copy_from_slice(bytes),
		Endianness::Big => buf[8 - bytes.len()..].copy_from_slice(bytes),
	}
	let raw = match endian {
		Endianness::Little => u64::from_le_bytes(buf),
		Endianness::Big => u64::from_be_bytes(buf),
	};

	match kind {
		NumericKind::F32 => {
			let b: [u8; 4] = bytes.try_into().unwrap();
			let f = match endian {
				Endianness::Little => f32::from_le_bytes(b),
				Endianness::Big => f32::from_be_bytes(b),
			};
			NumericPayload::Float(f as f64)
		}
		NumericKind::F64 => {
			let b: [u8; 8] = bytes.try_into().unwrap();
			let f = match endian {
				Endianness::Little => f64::from_le_bytes(b),
				Endianness::Big => f64::from_be_bytes(b),
			};
			NumericPayload::Float(f)
		}
		_ if kind.is_signed() => NumericPayload::Signed(sign_extend(raw, kind.natural_width_bits())),
		_ => NumericPayload::Unsigned(raw),
	}
}
