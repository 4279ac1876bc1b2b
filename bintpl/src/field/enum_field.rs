use std::rc::Rc;

use fxhash::FxHashMap;

use crate::field::{NumericField, NumericKind};

/// The value↔name mapping shared by every field of a given enum type.
/// Injective: each integer value maps to at most one name.
#[derive(Debug)]
pub struct EnumDef {
	pub name: Option<String>,
	pub underlying: NumericKind,
	pub by_value: FxHashMap<i64, String>,
	pub by_name: FxHashMap<String, i64>,
}

impl EnumDef {
	pub fn symbolic_name(&self, value: i64) -> Option<&str> {
		self.by_value.get(&value).map(|s| s.as_str())
	}
}

#[derive(Debug)]
pub struct EnumField {
	pub def: Rc<EnumDef>,
	pub numeric: NumericField,
}

impl EnumField {
	pub fn symbolic_name(&self) -> Option<&str> {
		let value = match self.numeric.get_value() {
			crate::field::Value::Int(v) => v,
			crate::field::Value::UInt(v) => v as i64,
			_ => return None,
		};
		self.def.symbolic_name(value)
	}
}
