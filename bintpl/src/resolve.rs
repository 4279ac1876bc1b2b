//! The Type Resolver: walks typedef chains and identifier-name lists down to
//! a concrete field constructor. See SPEC_FULL.md §4.D.

use std::rc::Rc;

use crate::ast::Node;
use crate::error::{Coord, InterpError};
use crate::field::{EnumDef, NumericKind};
use crate::scope::Scope;

const BUILTINS: &[&str] = &["char", "short", "int", "long", "int64", "uint64", "float", "double", "void", "string", "wstring"];

/// The fully-resolved shape of a struct type: its declared members, evaluated
/// against the scope active at *instantiation* time (structs are not
/// closures the way functions are — see SPEC_FULL.md §9).
#[derive(Debug)]
pub struct StructDef {
	pub name: Option<String>,
	pub members: Vec<Node>,
}

#[derive(Debug)]
pub struct UnionDef {
	pub name: Option<String>,
	pub members: Vec<Node>,
}

/// A value small and cheap enough to carry around that knows how to
/// instantiate (and, for aggregates, parse) a field. Mirrors the "dynamic
/// class creation" design note: a closure-like value standing in for the
/// per-declaration field classes the original interpreter fabricates.
#[derive(Debug, Clone)]
pub enum TypeConstructor {
	Numeric(NumericKind),
	StringT,
	WStringT,
	Struct(Rc<StructDef>),
	Union(Rc<UnionDef>),
	Enum(Rc<EnumDef>),
	/// Fixed-length array; `count` is resolved per-declaration (often from a
	/// runtime expression), matching the "count?" slot on the dynamic class
	/// creation design note rather than being part of the type's identity.
	Array { element: Box<TypeConstructor>, count: i64 },
	/// `void` — valid only as a function return type, never instantiable.
	Void,
}

/// What a name in `Scope::types` maps to: either an already-resolved
/// constructor (struct/union/enum defined via `typedef`), or a name chain to
/// substitute in and re-resolve (a `typedef`'d alias of a builtin or another
/// typedef).
#[derive(Debug, Clone)]
pub enum TypeBinding {
	Constructor(TypeConstructor),
	Chain(Vec<String>),
}

/// Resolve an ordered list of identifier names (e.g. `["unsigned", "int"]`,
/// `["uchar"]`, a typedef name) to a concrete [`TypeConstructor`].
pub fn resolve(names: &[String], scope: &Scope, coord: Coord) -> Result<TypeConstructor, InterpError> {
	let mut names = names.to_vec();
	// Chains can only be substituted finitely many times; guard against a
	// self-referential typedef instead of looping forever.
	for _ in 0..256 {
		let Some(core) = names.last().cloned() else {
			return Err(InterpError::UnresolvedType(String::new(), coord));
		};

		if let Some(kind) = builtin_kind(&core) {
			let unsigned = names.iter().any(|n| n == "unsigned");
			let kind = if unsigned { kind.unsigned_counterpart() } else { kind };
			return Ok(TypeConstructor::Numeric(kind));
		}
		if core == "void" {
			return Ok(TypeConstructor::Void);
		}
		if core == "string" {
			return Ok(TypeConstructor::StringT);
		}
		if core == "wstring" {
			return Ok(TypeConstructor::WStringT);
		}

		match scope.get_type(&core) {
			None => return Err(InterpError::UnresolvedType(core, coord)),
			Some(TypeBinding::Constructor(tc)) => return Ok(tc),
			Some(TypeBinding::Chain(chain)) => {
				names.pop();
				names.extend(chain);
			}
		}
	}
	Err(InterpError::UnresolvedType(names.last().cloned().unwrap_or_default(), coord))
}

fn builtin_kind(core: &str) -> Option<NumericKind> {
	Some(match core {
		"char" => NumericKind::Char,
		"short" => NumericKind::I16,
		"int" => NumericKind::I32,
		"long" => NumericKind::I32,
		"int64" => NumericKind::I64,
		"uint64" => NumericKind::U64,
		"float" => NumericKind::F32,
		"double" => NumericKind::F64,
		_ => return None,
	})
}

pub fn is_builtin_core(name: &str) -> bool {
	BUILTINS.contains(&name)
}
