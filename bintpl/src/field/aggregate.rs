use crate::field::FieldRef;

/// Ordered named children of a struct, union, or the DOM root. Declaration
/// order determines stream consumption order (Struct) or is otherwise
/// informational (Union, Dom).
#[derive(Debug, Default)]
pub struct StructField {
	pub children: Vec<(String, FieldRef)>,
}

/// Same shape as [`StructField`]; every child parses from the same starting
/// stream position. The interpreter rewinds the stream between children and
/// advances past the widest one once all members have been evaluated.
#[derive(Debug, Default)]
pub struct UnionField {
	pub children: Vec<(String, FieldRef)>,
}
