//! `Decl`, `Struct`/`Union`/`Enum`/`Typedef` dispatch, and the type-node ->
//! `TypeConstructor` resolution that feeds the Type Resolver. See
//! SPEC_FULL.md §4.D/§4.F.

use std::rc::Rc;

use fxhash::FxHashMap;

use crate::ast::{Enumerator, Node, NodeKind, Qualifier};
use crate::control::Outcome;
use crate::error::{Coord, InterpError};
use crate::field::{ArrayField, EnumDef, EnumField, FieldKind, FieldNode, FieldRef, NumericField, NumericKind, StringField, Value, WStringField};
use crate::interp::Interpreter;
use crate::metadata::{self, FieldMetadata};
use crate::resolve::{self, StructDef, TypeBinding, TypeConstructor, UnionDef};

/// Resolve a `Decl`'s `type_node` to a concrete constructor, recursing
/// through the pass-through wrapper kinds (`TypeDecl`, `ByRefDecl`) and
/// building inline anonymous aggregate/array constructors directly.
pub(crate) fn resolve_decl_type(interp: &mut Interpreter, type_node: &Node) -> Result<TypeConstructor, InterpError> {
	match &type_node.kind {
		NodeKind::IdentifierType { names } => resolve::resolve(names, interp.scope(), type_node.coord),
		NodeKind::TypeDecl { inner } | NodeKind::ByRefDecl { inner } => resolve_decl_type(interp, inner),
		NodeKind::Struct { name, members } => {
			Ok(TypeConstructor::Struct(Rc::new(StructDef { name: name.clone(), members: members.clone() })))
		}
		NodeKind::Union { name, members } => {
			Ok(TypeConstructor::Union(Rc::new(UnionDef { name: name.clone(), members: members.clone() })))
		}
		NodeKind::Enum { name, underlying, enumerators } => {
			Ok(TypeConstructor::Enum(build_enum_def(interp, name, underlying.as_deref(), enumerators, type_node.coord)?))
		}
		NodeKind::ArrayDecl { element_type, dim } => {
			let element = resolve_decl_type(interp, element_type)?;
			let count = match dim {
				Some(d) => crate::interp::expr::eval_value(interp, d)?.as_i64().unwrap_or(0),
				None => 0,
			};
			Ok(TypeConstructor::Array { element: Box::new(element), count })
		}
		NodeKind::FuncDecl { .. } => Ok(TypeConstructor::Void),
		_ => Err(InterpError::UnsupportedASTNode(type_node.kind.clone(), type_node.coord)),
	}
}

/// Build a `TypeBinding` for a `Typedef`'s target: a name chain if the target
/// is itself a plain identifier list (so builtin qualifiers like `unsigned`
/// keep working transitively), otherwise a resolved constructor.
fn build_type_binding(interp: &mut Interpreter, type_node: &Node) -> Result<TypeBinding, InterpError> {
	match &type_node.kind {
		NodeKind::IdentifierType { names } => Ok(TypeBinding::Chain(names.clone())),
		NodeKind::TypeDecl { inner } | NodeKind::ByRefDecl { inner } => build_type_binding(interp, inner),
		_ => Ok(TypeBinding::Constructor(resolve_decl_type(interp, type_node)?)),
	}
}

pub(crate) fn eval_typedef(interp: &mut Interpreter, name: &str, type_node: &Node, coord: Coord) -> Result<Outcome, InterpError> {
	let binding = build_type_binding(interp, type_node)?;
	interp.scope_mut().add_type(name.to_string(), binding);
	let _ = coord;
	Ok(Outcome::none())
}

/// Bare `struct Name { ... };` / `union Name { ... };` with no instance
/// declared: registers the type, consumes nothing, produces no field.
pub(crate) fn eval_named_aggregate(interp: &mut Interpreter, name: &Option<String>, members: &[Node], is_union: bool, coord: Coord) -> Result<Outcome, InterpError> {
	if let Some(name) = name {
		let tc = if is_union {
			TypeConstructor::Union(Rc::new(UnionDef { name: Some(name.clone()), members: members.to_vec() }))
		} else {
			TypeConstructor::Struct(Rc::new(StructDef { name: Some(name.clone()), members: members.to_vec() }))
		};
		interp.scope_mut().add_type(name.clone(), TypeBinding::Constructor(tc));
	}
	let _ = coord;
	Ok(Outcome::none())
}

pub(crate) fn eval_named_enum(interp: &mut Interpreter, name: &Option<String>, underlying: Option<&Node>, enumerators: &[Enumerator], coord: Coord) -> Result<Outcome, InterpError> {
	let def = build_enum_def(interp, name, underlying, enumerators, coord)?;
	if let Some(name) = name {
		interp.scope_mut().add_type(name.clone(), TypeBinding::Constructor(TypeConstructor::Enum(def)));
	}
	Ok(Outcome::none())
}

/// Evaluates enumerator expressions in order (auto-incrementing from the
/// previous value, starting at 0), registers each as a frozen local in the
/// current scope, and builds the bidirectional value<->name map.
fn build_enum_def(interp: &mut Interpreter, name: &Option<String>, underlying: Option<&Node>, enumerators: &[Enumerator], coord: Coord) -> Result<Rc<EnumDef>, InterpError> {
	let underlying_kind = match underlying {
		Some(n) => match resolve_decl_type(interp, n)? {
			TypeConstructor::Numeric(k) => k,
			_ => NumericKind::I32,
		},
		None => NumericKind::I32,
	};

	let mut by_value = FxHashMap::default();
	let mut by_name = FxHashMap::default();
	let mut next_value: i64 = 0;

	for enumerator in enumerators {
		let value = match &enumerator.value {
			Some(expr) => crate::interp::expr::eval_value(interp, expr)?.as_i64().unwrap_or(next_value),
			None => next_value,
		};
		by_value.insert(value, enumerator.name.clone());
		by_name.insert(enumerator.name.clone(), value);
		next_value = value + 1;

		let mut field = NumericField::zero(underlying_kind);
		field.set_value(Value::Int(value), &enumerator.name, coord)?;
		let node = FieldNode::new(FieldKind::Numeric(field), underlying_kind.natural_width_bits() as u64, interp.stream_mut().endian());
		node.borrow_mut().freeze();
		interp.scope_mut().add_local(enumerator.name.clone(), node);
	}

	Ok(Rc::new(EnumDef { name: name.clone(), underlying: underlying_kind, by_value, by_name }))
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn eval_decl(
	interp: &mut Interpreter,
	name: &str,
	qualifiers: &[Qualifier],
	type_node: &Node,
	bitsize: Option<&Node>,
	init: Option<&Node>,
	metadata: &[(String, String)],
	_is_param: bool,
	coord: Coord,
) -> Result<Outcome, InterpError> {
	let is_local = qualifiers.contains(&Qualifier::Local);
	let is_const = qualifiers.contains(&Qualifier::Const);
	let tc = resolve_decl_type(interp, type_node)?;

	let bitwidth = match bitsize {
		Some(n) => Some(crate::interp::expr::eval_value(interp, n)?.as_i64().unwrap_or(0) as u32),
		None => None,
	};

	let field = if is_local || is_const {
		let value = match init {
			Some(e) => crate::interp::expr::eval_value(interp, e)?,
			None => Value::Int(0),
		};
		interp.instantiate_value(&tc, value, coord)?
	} else {
		let field = interp.instantiate(&tc, bitwidth, coord)?;
		if let Some(e) = init {
			let v = crate::interp::expr::eval_value(interp, e)?;
			field.borrow_mut().set_value(v, name, coord)?;
		}
		field
	};

	field.borrow_mut().name = Some(name.to_string());

	if !metadata.is_empty() {
		let parsed = metadata::parse_metadata(metadata, coord)?;
		match &parsed {
			FieldMetadata::Watch(watch) => {
				interp.register_watch(&field, name, watch, coord)?;
			}
			FieldMetadata::Pack(pack) => {
				let raw = field.borrow().get_value();
				if let Some(unpacked) = interp.call_by_name(&pack.unpack_fn, vec![raw], coord)? {
					let packtype_tc = resolve::resolve(&pack.packtype, interp.scope(), coord)?;
					let view = interp.instantiate_value(&packtype_tc, unpacked, coord)?;
					field.borrow_mut().packed_view = Some(view);
				}
			}
		}
		field.borrow_mut().metadata = Some(parsed);
	}

	crate::field::FieldNode::add_child(&interp.context(), name.to_string(), field.clone())?;

	if is_local || is_const {
		interp.scope_mut().add_local(name.to_string(), field.clone());
	} else {
		interp.scope_mut().add_var(name.to_string(), field.clone());
	}

	if is_const {
		field.borrow_mut().freeze();
	}

	Ok(Outcome::value(field))
}

/// Instantiate a field of `tc`, consuming bytes from the current stream.
pub(crate) fn instantiate(interp: &mut Interpreter, tc: &TypeConstructor, bitsize: Option<u32>, coord: Coord) -> Result<FieldRef, InterpError> {
	let endian = interp.stream_mut().endian();
	match tc {
		TypeConstructor::Numeric(kind) => {
			let (field, width) = NumericField::parse(interp.stream_mut(), *kind, bitsize)?;
			let node = FieldNode::new(FieldKind::Numeric(field), width, endian);
			if bitsize.is_some() {
				node.borrow_mut().bit_info = Some(crate::field::BitInfo { bit_width: bitsize.unwrap() });
			}
			Ok(node)
		}
		TypeConstructor::StringT => {
			let (field, width) = StringField::parse(interp.stream_mut())?;
			Ok(FieldNode::new(FieldKind::String(field), width, endian))
		}
		TypeConstructor::WStringT => {
			let (field, width) = WStringField::parse(interp.stream_mut())?;
			Ok(FieldNode::new(FieldKind::WString(field), width, endian))
		}
		TypeConstructor::Enum(def) => {
			let (numeric, width) = NumericField::parse(interp.stream_mut(), def.underlying, None)?;
			Ok(FieldNode::new(FieldKind::Enum(EnumField { def: def.clone(), numeric }), width, endian))
		}
		TypeConstructor::Struct(sdef) => instantiate_struct(interp, sdef, coord),
		TypeConstructor::Union(udef) => instantiate_union(interp, udef, coord),
		TypeConstructor::Array { element, count } => instantiate_array(interp, element, *count, coord),
		TypeConstructor::Void => Err(InterpError::UnsupportedConstantType("void".into(), coord)),
	}
}

fn instantiate_struct(interp: &mut Interpreter, sdef: &StructDef, coord: Coord) -> Result<FieldRef, InterpError> {
	let endian = interp.stream_mut().endian();
	let start = interp.stream_mut().tell();
	let field = FieldNode::new(FieldKind::Struct(crate::field::StructField::default()), 0, endian);

	interp.scope_mut().push();
	interp.push_context(field.clone());
	let result: Result<(), InterpError> = (|| {
		for member in &sdef.members {
			interp.dispatch(member)?;
		}
		Ok(())
	})();
	interp.pop_context();
	interp.scope_mut().pop();
	result?;

	let width = interp.stream_mut().tell() - start;
	field.borrow_mut().width_bits = width;
	let _ = coord;
	Ok(field)
}

fn instantiate_union(interp: &mut Interpreter, udef: &UnionDef, coord: Coord) -> Result<FieldRef, InterpError> {
	let endian = interp.stream_mut().endian();
	let start = interp.stream_mut().tell();
	let field = FieldNode::new(FieldKind::Union(crate::field::UnionField::default()), 0, endian);

	interp.scope_mut().push();
	interp.push_context(field.clone());
	let result: Result<u64, InterpError> = (|| {
		let mut max_width = 0u64;
		for member in &udef.members {
			interp.stream_mut().seek_bits(start);
			let outcome = interp.dispatch(member)?;
			let width = outcome.value.map(|f| f.borrow().width_bits()).unwrap_or(0);
			max_width = max_width.max(width);
		}
		Ok(max_width)
	})();
	interp.pop_context();
	interp.scope_mut().pop();
	let max_width = result?;

	interp.stream_mut().seek_bits(start + max_width);
	field.borrow_mut().width_bits = max_width;
	let _ = coord;
	Ok(field)
}

fn instantiate_array(interp: &mut Interpreter, element: &TypeConstructor, count: i64, coord: Coord) -> Result<FieldRef, InterpError> {
	let endian = interp.stream_mut().endian();
	let mut children = Vec::with_capacity(count.max(0) as usize);
	let mut width = 0u64;
	for _ in 0..count.max(0) {
		let child = instantiate(interp, element, None, coord)?;
		width += child.borrow().width_bits();
		children.push(child);
	}
	Ok(FieldNode::new(FieldKind::Array(ArrayField { children }), width, endian))
}

/// Build a field of `tc` from an already-known value, without touching the
/// stream (locals, consts, casts, function-parameter binding).
pub(crate) fn instantiate_value(interp: &mut Interpreter, tc: &TypeConstructor, value: Value, coord: Coord) -> Result<FieldRef, InterpError> {
	let endian = interp.stream_mut().endian();
	match tc {
		TypeConstructor::Numeric(kind) => {
			let mut field = NumericField::zero(*kind);
			field.set_value(value, "", coord)?;
			Ok(FieldNode::new(FieldKind::Numeric(field), 0, endian))
		}
		TypeConstructor::StringT => match value {
			Value::Bytes(b) => Ok(FieldNode::new(FieldKind::String(StringField { bytes: b }), 0, endian)),
			_ => Err(InterpError::UnsupportedConstantType("string".into(), coord)),
		},
		TypeConstructor::WStringT => match value {
			Value::WBytes(b) => Ok(FieldNode::new(FieldKind::WString(WStringField { units: b }), 0, endian)),
			_ => Err(InterpError::UnsupportedConstantType("wstring".into(), coord)),
		},
		TypeConstructor::Enum(def) => {
			let mut numeric = NumericField::zero(def.underlying);
			numeric.set_value(value, "", coord)?;
			Ok(FieldNode::new(FieldKind::Enum(EnumField { def: def.clone(), numeric }), 0, endian))
		}
		TypeConstructor::Array { element, count } => {
			let _ = (element, count);
			Ok(FieldNode::new(FieldKind::Array(ArrayField::default()), 0, endian))
		}
		TypeConstructor::Struct(_) | TypeConstructor::Union(_) | TypeConstructor::Void => {
			Err(InterpError::UnsupportedConstantType("aggregate".into(), coord))
		}
	}
}
