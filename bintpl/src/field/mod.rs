pub mod aggregate;
pub mod array;
pub mod enum_field;
pub mod numeric;
pub mod text;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::{Coord, InterpError};
use crate::metadata::FieldMetadata;
use crate::stream::Endianness;

pub use aggregate::{StructField, UnionField};
pub use array::ArrayField;
pub use enum_field::{EnumDef, EnumField};
pub use numeric::{NumericField, NumericKind};
pub use text::{StringField, WStringField};

/// Shared handle to a runtime field. Fields form a mutable, shared tree
/// (parent/child, plus scope `vars` entries aliasing the same node), which is
/// why this crate departs from the teacher's arena-lifetime (`&'l T`) field
/// representation in favor of `Rc<RefCell<_>>` with a `Weak` parent link — see
/// DESIGN.md.
pub type FieldRef = Rc<RefCell<FieldNode>>;

/// A loosely-typed runtime value, used as the result of expression evaluation
/// and as the argument to [`FieldNode::set_value`]. Distinct from `FieldRef`:
/// a `Value` is a transient scalar, a `FieldRef` is a persistent node in the DOM.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Int(i64),
	UInt(u64),
	Float(f64),
	Bytes(Vec<u8>),
	WBytes(Vec<u16>),
}

impl Value {
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Value::Int(v) => Some(*v),
			Value::UInt(v) => Some(*v as i64),
			Value::Float(v) => Some(*v as i64),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Int(v) => Some(*v as f64),
			Value::UInt(v) => Some(*v as f64),
			Value::Float(v) => Some(*v),
			_ => None,
		}
	}

	/// Truthiness used by `if`/`for`/`while` conditions: non-zero numeric value.
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Int(v) => *v != 0,
			Value::UInt(v) => *v != 0,
			Value::Float(v) => *v != 0.0,
			Value::Bytes(b) => !b.is_empty(),
			Value::WBytes(b) => !b.is_empty(),
		}
	}
}

/// Bit-level placement of a field within its byte-aligned container, present
/// only for true bitfields (`int x : 3;`).
#[derive(Debug, Copy, Clone)]
pub struct BitInfo {
	pub bit_width: u32,
}

/// The closed set of field variants. See SPEC_FULL.md §3.
#[derive(Debug)]
pub enum FieldKind {
	Numeric(NumericField),
	String(StringField),
	WString(WStringField),
	Enum(EnumField),
	Array(ArrayField),
	Struct(StructField),
	Union(UnionField),
	Dom(StructField),
}

/// A runtime field: common metadata shared by every variant, plus the
/// variant-specific payload in `kind`.
#[derive(Debug)]
pub struct FieldNode {
	pub name: Option<String>,
	parent: Option<Weak<RefCell<FieldNode>>>,
	pub width_bits: u64,
	pub endian: Endianness,
	pub bit_info: Option<BitInfo>,
	pub frozen: bool,
	pub metadata: Option<FieldMetadata>,
	/// Materialized `packer`/`packtype` decoded view, populated once at parse
	/// time for fields carrying `FieldMetadata::Pack`. `None` otherwise.
	pub packed_view: Option<FieldRef>,
	pub kind: FieldKind,
}

impl FieldNode {
	pub fn new(kind: FieldKind, width_bits: u64, endian: Endianness) -> FieldRef {
		Rc::new(RefCell::new(FieldNode {
			name: None,
			parent: None,
			width_bits,
			endian,
			bit_info: None,
			frozen: false,
			metadata: None,
			packed_view: None,
			kind,
		}))
	}

	#[inline]
	pub fn width_bits(&self) -> u64 {
		self.width_bits
	}

	pub fn parent(&self) -> Option<FieldRef> {
		self.parent.as_ref().and_then(Weak::upgrade)
	}

	pub fn freeze(&mut self) {
		self.frozen = true;
	}

	#[inline]
	pub fn is_frozen(&self) -> bool {
		self.frozen
	}

	/// Read the field's current value as a loosely-typed [`Value`].
	pub fn get_value(&self) -> Value {
		match &self.kind {
			FieldKind::Numeric(n) => n.get_value(),
			FieldKind::String(s) => Value::Bytes(s.bytes.clone()),
			FieldKind::WString(s) => Value::WBytes(s.units.clone()),
			FieldKind::Enum(e) => e.numeric.get_value(),
			FieldKind::Array(_) | FieldKind::Struct(_) | FieldKind::Union(_) | FieldKind::Dom(_) => {
				Value::UInt(self.width_bits)
			}
		}
	}

	/// Assign a new value, coercing per the rules in SPEC_FULL.md §4.B.
	/// Fails with `FieldFrozen` if this field is const.
	pub fn set_value(&mut self, value: Value, name: &str, coord: Coord) -> Result<(), InterpError> {
		if self.frozen {
			return Err(InterpError::FieldFrozen(name.to_string(), coord));
		}
		match &mut self.kind {
			FieldKind::Numeric(n) => n.set_value(value, name, coord),
			FieldKind::Enum(e) => e.numeric.set_value(value, name, coord),
			FieldKind::String(s) => match value {
				Value::Bytes(b) => {
					s.bytes = b;
					Ok(())
				}
				_ => Err(InterpError::UnsupportedConstantType("string".into(), coord)),
			},
			FieldKind::WString(s) => match value {
				Value::WBytes(b) => {
					s.units = b;
					Ok(())
				}
				_ => Err(InterpError::UnsupportedConstantType("wstring".into(), coord)),
			},
			FieldKind::Array(_) | FieldKind::Struct(_) | FieldKind::Union(_) | FieldKind::Dom(_) => {
				Err(InterpError::UnsupportedConstantType("aggregate".into(), coord))
			}
		}
	}

	/// Append a named child to an aggregate field (Struct/Union/Dom). Errors
	/// on non-aggregate kinds.
	pub fn add_child(self_ref: &FieldRef, name: String, child: FieldRef) -> Result<(), InterpError> {
		child.borrow_mut().parent = Some(Rc::downgrade(self_ref));
		let mut me = self_ref.borrow_mut();
		match &mut me.kind {
			FieldKind::Struct(s) | FieldKind::Dom(s) => s.children.push((name, child)),
			FieldKind::Union(u) => u.children.push((name, child)),
			_ => return Err(InterpError::UnsupportedConstantType("non-aggregate field".into(), Coord::default())),
		}
		Ok(())
	}

	/// Look up an aggregate's child by name.
	pub fn get_field(&self, name: &str, coord: Coord) -> Result<FieldRef, InterpError> {
		let children = match &self.kind {
			FieldKind::Struct(s) | FieldKind::Dom(s) => &s.children,
			FieldKind::Union(u) => &u.children,
			_ => return Err(InterpError::UnresolvedID(name.to_string(), coord)),
		};
		children
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, f)| f.clone())
			.ok_or_else(|| InterpError::UnresolvedID(name.to_string(), coord))
	}

	/// Index into an Array field.
	pub fn index(&self, i: i64, coord: Coord) -> Result<FieldRef, InterpError> {
		match &self.kind {
			FieldKind::Array(a) => a.children.get(i as usize).cloned().ok_or_else(|| InterpError::IndexError {
				index: i,
				len: a.children.len(),
				coord,
			}),
			_ => Err(InterpError::IndexError { index: i, len: 0, coord }),
		}
	}
}
