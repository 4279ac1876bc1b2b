//! The default predefine: typedefs for the conventional short-name integer
//! aliases (`uchar`, `uint`, `int16`, ...) that templates expect to exist
//! without declaring them, built directly as an AST rather than as template
//! source text (no lexer/parser lives in this crate). See SPEC_FULL.md §6.

use crate::ast::{Node, NodeKind};
use crate::error::Coord;

fn ident(names: &[&str]) -> Node {
	Node::new(Coord::default(), NodeKind::IdentifierType { names: names.iter().map(|s| s.to_string()).collect() })
}

fn typedef(name: &str, names: &[&str]) -> Node {
	Node::new(Coord::default(), NodeKind::Typedef { name: name.to_string(), type_node: Box::new(ident(names)) })
}

pub(crate) fn default_predefines() -> Node {
	let decls = vec![
		typedef("uchar", &["unsigned", "char"]),
		typedef("byte", &["unsigned", "char"]),
		typedef("ubyte", &["unsigned", "char"]),
		typedef("ushort", &["unsigned", "short"]),
		typedef("uint", &["unsigned", "int"]),
		typedef("ulong", &["unsigned", "long"]),
		typedef("int8", &["char"]),
		typedef("uint8", &["uchar"]),
		typedef("int16", &["short"]),
		typedef("uint16", &["ushort"]),
		typedef("int32", &["int"]),
		typedef("uint32", &["uint"]),
	];
	Node::new(Coord::default(), NodeKind::FileAST { decls })
}
