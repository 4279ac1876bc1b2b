use std::fmt::{Debug, Display, Formatter};

use crate::ast::NodeKind;

/// A source coordinate as reported by the AST collaborator. Column is best-effort;
/// many parsers only track lines.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct Coord {
	pub line: u32,
	pub column: u32,
}

impl Display for Coord {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.line, self.column)
	}
}

#[derive(Debug)]
pub enum InterpError {
	ParseError(String),
	UnsupportedASTNode(NodeKind, Coord),
	UnsupportedBinaryOperator(String, Coord),
	UnsupportedUnaryOperator(String, Coord),
	UnsupportedAssignmentOperator(String, Coord),
	UnsupportedConstantType(String, Coord),
	UnresolvedID(String, Coord),
	UnresolvedType(String, Coord),
	FieldFrozen(String, Coord),
	StreamEOF { requested_bits: u64, available_bits: u64 },
	IndexError { index: i64, len: usize, coord: Coord },
	MetadataError(String, Coord),
	MetadataCycle(String, Coord),
	NativeCallError(String, Coord),
	InterpExit(i64),
}

impl Display for InterpError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::ParseError(msg) => write!(f, "parse error: {msg}"),
			Self::UnsupportedASTNode(kind, coord) => write!(f, "{coord}: unsupported AST node `{kind:?}`"),
			Self::UnsupportedBinaryOperator(op, coord) => write!(f, "{coord}: unsupported binary operator `{op}`"),
			Self::UnsupportedUnaryOperator(op, coord) => write!(f, "{coord}: unsupported unary operator `{op}`"),
			Self::UnsupportedAssignmentOperator(op, coord) => write!(f, "{coord}: unsupported assignment operator `{op}`"),
			Self::UnsupportedConstantType(ty, coord) => write!(f, "{coord}: unsupported constant type `{ty}`"),
			Self::UnresolvedID(name, coord) => write!(f, "{coord}: unresolved identifier `{name}`"),
			Self::UnresolvedType(name, coord) => write!(f, "{coord}: unresolved type `{name}`"),
			Self::FieldFrozen(name, coord) => write!(f, "{coord}: assignment to frozen field `{name}`"),
			Self::StreamEOF { requested_bits, available_bits } => {
				write!(f, "stream EOF: requested {requested_bits} bits, {available_bits} available")
			}
			Self::IndexError { index, len, coord } => write!(f, "{coord}: index {index} out of bounds (len {len})"),
			Self::MetadataError(msg, coord) => write!(f, "{coord}: metadata error: {msg}"),
			Self::MetadataCycle(name, coord) => write!(f, "{coord}: metadata cycle detected through `{name}`"),
			Self::NativeCallError(msg, coord) => write!(f, "{coord}: native call error: {msg}"),
			Self::InterpExit(code) => write!(f, "template requested exit with status {code}"),
		}
	}
}

impl std::error::Error for InterpError {}

impl From<std::io::Error> for InterpError {
	fn from(value: std::io::Error) -> Self {
		InterpError::NativeCallError(value.to_string(), Coord::default())
	}
}
