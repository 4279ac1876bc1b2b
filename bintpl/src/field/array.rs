use crate::field::FieldRef;

/// A fixed-length homogeneous sequence. The element constructor used to
/// produce `children` lives on the [`crate::resolve::TypeConstructor`] that
/// built this field, not on the field itself.
#[derive(Debug, Default)]
pub struct ArrayField {
	pub children: Vec<FieldRef>,
}
