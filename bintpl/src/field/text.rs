use crate::error::InterpError;
use crate::stream::ByteStream;

/// A NUL-terminated byte string. `bytes` excludes the terminator;
/// `width_bits` (tracked by the owning [`crate::field::FieldNode`]) includes it.
#[derive(Debug, Clone, Default)]
pub struct StringField {
	pub bytes: Vec<u8>,
}

impl StringField {
	pub fn parse(stream: &mut ByteStream) -> Result<(Self, u64), InterpError> {
		let bytes = stream.read_until_nul()?;
		let width_bits = (bytes.len() as u64 + 1) * 8;
		Ok((StringField { bytes }, width_bits))
	}

	pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
		String::from_utf8_lossy(&self.bytes)
	}
}

/// A NUL-terminated sequence of 16-bit code units.
#[derive(Debug, Clone, Default)]
pub struct WStringField {
	pub units: Vec<u16>,
}

impl WStringField {
	pub fn parse(stream: &mut ByteStream) -> Result<(Self, u64), InterpError> {
		let units = stream.read_until_nul_wide()?;
		let width_bits = (units.len() as u64 + 1) * 16;
		Ok((WStringField { units }, width_bits))
	}
}
