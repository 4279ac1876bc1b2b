/// Byte order used to assemble multi-byte numeric fields. Selected by the
/// template via the `BigEndian()` / `LittleEndian()` native directives.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Endianness {
	Big,
	Little,
}

impl Default for Endianness {
	fn default() -> Self {
		Endianness::Little
	}
}

/// Bit significance order used when assembling a bitfield narrower than a
/// byte. `LeftToRight` takes the most-significant bit of each byte first.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BitOrder {
	LeftToRight,
	RightToLeft,
}

impl Default for BitOrder {
	fn default() -> Self {
		BitOrder::LeftToRight
	}
}
