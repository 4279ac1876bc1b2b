//! Expression evaluation: constants, operators, assignment, casts, and
//! lvalue resolution (`Id`, `ArrayRef`). See SPEC_FULL.md §4.F.

use crate::ast::{Literal, Node, NodeKind};
use crate::control::Outcome;
use crate::error::{Coord, InterpError};
use crate::field::{FieldRef, Value};
use crate::interp::Interpreter;

pub(super) fn eval_constant(literal: &Literal) -> Value {
	match literal {
		Literal::Int { value, .. } => classify_int(*value),
		Literal::Float { value, .. } => Value::Float(*value),
		Literal::Char(b) => Value::Int(*b as i64),
		Literal::Str(s) => Value::Bytes(s.clone().into_bytes()),
	}
}

/// Picks the narrowest of {i32, u32, i64, u64} by magnitude, testing the
/// signed range before the unsigned one at each width — preserved exactly as
/// the original interpreter does it (SPEC_FULL.md §9), even for literals that
/// look unsigned at the source level.
fn classify_int(value: i128) -> Value {
	if let Ok(v) = i32::try_from(value) {
		Value::Int(v as i64)
	} else if let Ok(v) = u32::try_from(value) {
		Value::UInt(v as u64)
	} else if let Ok(v) = i64::try_from(value) {
		Value::Int(v)
	} else {
		Value::UInt(value as u64)
	}
}

/// Evaluate `node` as an rvalue, producing a transient `Value`.
pub(super) fn eval_value(interp: &mut Interpreter, node: &Node) -> Result<Value, InterpError> {
	match &node.kind {
		NodeKind::Constant { literal } => Ok(eval_constant(literal)),
		NodeKind::Id { .. } | NodeKind::ArrayRef { .. } => {
			Ok(eval_lvalue(interp, node)?.borrow().get_value())
		}
		NodeKind::BinaryOp { op, lhs, rhs } => {
			let l = eval_value(interp, lhs)?;
			let r = eval_value(interp, rhs)?;
			eval_binary(op, l, r, node.coord)
		}
		NodeKind::UnaryOp { op, operand, postfix } => eval_unary(interp, op, operand, *postfix, node.coord),
		NodeKind::Assignment { op, lvalue, rvalue } => {
			let outcome = eval_assignment(interp, op, lvalue, rvalue, node.coord)?;
			Ok(outcome.value.map(|f| f.borrow().get_value()).unwrap_or(Value::Int(0)))
		}
		NodeKind::Cast { target_type, expr } => {
			let value = eval_value(interp, expr)?;
			let tc = crate::interp::decl::resolve_decl_type(interp, target_type)?;
			let field = interp.instantiate_value(&tc, value, node.coord)?;
			Ok(field.borrow().get_value())
		}
		NodeKind::FuncCall { name, args } => {
			let outcome = crate::interp::call::eval_funccall(interp, name, args, node.coord)?;
			Ok(outcome.value.map(|f| f.borrow().get_value()).unwrap_or(Value::Int(0)))
		}
		_ => Err(InterpError::UnsupportedASTNode(node.kind.clone(), node.coord)),
	}
}

/// Resolve an `Id` name, special-casing `__root` (the DOM root) and
/// `this`/`__this` (the current context field) ahead of ordinary scope
/// lookup, matching the original interpreter's identifier resolution.
pub(super) fn resolve_id(interp: &mut Interpreter, name: &str, coord: Coord) -> Result<FieldRef, InterpError> {
	match name {
		"__root" => Ok(interp.root()),
		"this" | "__this" => Ok(interp.context()),
		_ => interp.scope().get_id(name).ok_or_else(|| InterpError::UnresolvedID(name.to_string(), coord)),
	}
}

/// Resolve `node` to the `FieldRef` it names, for use as an assignment
/// target or as an `Id`/`ArrayRef` expression result.
pub(super) fn eval_lvalue(interp: &mut Interpreter, node: &Node) -> Result<FieldRef, InterpError> {
	match &node.kind {
		NodeKind::Id { name } => resolve_id(interp, name, node.coord),
		NodeKind::ArrayRef { array, subscript } => {
			let array_field = eval_lvalue(interp, array)?;
			let index = eval_value(interp, subscript)?.as_i64().ok_or_else(|| {
				InterpError::UnsupportedConstantType("array subscript".into(), node.coord)
			})?;
			let field = array_field.borrow().index(index, node.coord)?;
			Ok(field)
		}
		_ => Err(InterpError::UnsupportedASTNode(node.kind.clone(), node.coord)),
	}
}

fn eval_binary(op: &str, l: Value, r: Value, coord: Coord) -> Result<Value, InterpError> {
	let is_float = matches!(l, Value::Float(_)) || matches!(r, Value::Float(_));
	if is_float && matches!(op, "&" | "|" | "^" | "<<" | ">>" | "%") {
		return Err(InterpError::UnsupportedBinaryOperator(op.to_string(), coord));
	}
	if is_float {
		let (lf, rf) = (l.as_f64().unwrap(), r.as_f64().unwrap());
		return Ok(match op {
			"+" => Value::Float(lf + rf),
			"-" => Value::Float(lf - rf),
			"*" => Value::Float(lf * rf),
			"/" => Value::Float(if rf == 0.0 { 0.0 } else { lf / rf }),
			"<" => Value::Int((lf < rf) as i64),
			"<=" => Value::Int((lf <= rf) as i64),
			">" => Value::Int((lf > rf) as i64),
			">=" => Value::Int((lf >= rf) as i64),
			"==" => Value::Int((lf == rf) as i64),
			"!=" => Value::Int((lf != rf) as i64),
			"&&" => Value::Int((lf != 0.0 && rf != 0.0) as i64),
			"||" => Value::Int((lf != 0.0 || rf != 0.0) as i64),
			_ => return Err(InterpError::UnsupportedBinaryOperator(op.to_string(), coord)),
		});
	}

	let unsigned = matches!(l, Value::UInt(_)) || matches!(r, Value::UInt(_));
	if unsigned {
		let (lu, ru) = (uint_of(&l), uint_of(&r));
		return Ok(match op {
			"+" => Value::UInt(lu.wrapping_add(ru)),
			"-" => Value::UInt(lu.wrapping_sub(ru)),
			"*" => Value::UInt(lu.wrapping_mul(ru)),
			"/" => Value::UInt(if ru == 0 { 0 } else { lu / ru }),
			"%" => Value::UInt(if ru == 0 { 0 } else { lu % ru }),
			"&" => Value::UInt(lu & ru),
			"|" => Value::UInt(lu | ru),
			"^" => Value::UInt(lu ^ ru),
			"<<" => Value::UInt(lu.wrapping_shl(ru as u32)),
			">>" => Value::UInt(lu.wrapping_shr(ru as u32)),
			"<" => Value::Int((lu < ru) as i64),
			"<=" => Value::Int((lu <= ru) as i64),
			">" => Value::Int((lu > ru) as i64),
			">=" => Value::Int((lu >= ru) as i64),
			"==" => Value::Int((lu == ru) as i64),
			"!=" => Value::Int((lu != ru) as i64),
			"&&" => Value::Int((lu != 0 && ru != 0) as i64),
			"||" => Value::Int((lu != 0 || ru != 0) as i64),
			_ => return Err(InterpError::UnsupportedBinaryOperator(op.to_string(), coord)),
		});
	}

	let (li, ri) = (l.as_i64().unwrap_or(0), r.as_i64().unwrap_or(0));
	Ok(match op {
		"+" => Value::Int(li.wrapping_add(ri)),
		"-" => Value::Int(li.wrapping_sub(ri)),
		"*" => Value::Int(li.wrapping_mul(ri)),
		"/" => Value::Int(if ri == 0 { 0 } else { li / ri }),
		"%" => Value::Int(if ri == 0 { 0 } else { li % ri }),
		"&" => Value::Int(li & ri),
		"|" => Value::Int(li | ri),
		"^" => Value::Int(li ^ ri),
		"<<" => Value::Int(li.wrapping_shl(ri as u32)),
		">>" => Value::Int(li.wrapping_shr(ri as u32)),
		"<" => Value::Int((li < ri) as i64),
		"<=" => Value::Int((li <= ri) as i64),
		">" => Value::Int((li > ri) as i64),
		">=" => Value::Int((li >= ri) as i64),
		"==" => Value::Int((li == ri) as i64),
		"!=" => Value::Int((li != ri) as i64),
		"&&" => Value::Int((li != 0 && ri != 0) as i64),
		"||" => Value::Int((li != 0 || ri != 0) as i64),
		_ => return Err(InterpError::UnsupportedBinaryOperator(op.to_string(), coord)),
	})
}

fn uint_of(v: &Value) -> u64 {
	match v {
		Value::Int(i) => *i as u64,
		Value::UInt(u) => *u,
		Value::Float(f) => *f as u64,
		_ => 0,
	}
}

fn eval_unary(interp: &mut Interpreter, op: &str, operand: &Node, postfix: bool, coord: Coord) -> Result<Value, InterpError> {
	if op == "sizeof" {
		let field = eval_lvalue(interp, operand)?;
		let width_bits = field.borrow().width_bits();
		return Ok(Value::UInt(width_bits / 8));
	}

	if matches!(op, "++" | "--") {
		let field = eval_lvalue(interp, operand)?;
		let old = field.borrow().get_value();
		let delta = if op == "++" { 1 } else { -1 };
		let new_value = match old {
			Value::Float(f) => Value::Float(f + delta as f64),
			Value::UInt(u) => Value::UInt((u as i64 + delta) as u64),
			_ => Value::Int(old.as_i64().unwrap_or(0) + delta),
		};
		field.borrow_mut().set_value(new_value.clone(), "", coord)?;
		if let NodeKind::Id { name } = &operand.kind {
			interp.fire_watchers(name, coord)?;
		}
		return Ok(if postfix { old } else { new_value });
	}

	let v = eval_value(interp, operand)?;
	Ok(match op {
		"-" => match v {
			Value::Float(f) => Value::Float(-f),
			Value::UInt(u) => Value::Int(-(u as i64)),
			other => Value::Int(-other.as_i64().unwrap_or(0)),
		},
		"!" => Value::Int(!v.is_truthy() as i64),
		"~" => Value::Int(!v.as_i64().unwrap_or(0)),
		"+" => v,
		_ => return Err(InterpError::UnsupportedUnaryOperator(op.to_string(), coord)),
	})
}

pub(super) fn eval_assignment(interp: &mut Interpreter, op: &str, lvalue: &Node, rvalue: &Node, coord: Coord) -> Result<Outcome, InterpError> {
	let field = eval_lvalue(interp, lvalue)?;
	let rhs = eval_value(interp, rvalue)?;

	const COMPOUND_OPS: &[&str] = &["+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>="];
	let new_value = if op == "=" {
		rhs
	} else if COMPOUND_OPS.contains(&op) {
		let old = field.borrow().get_value();
		let binop = &op[..op.len() - 1];
		eval_binary(binop, old, rhs, coord)?
	} else {
		return Err(InterpError::UnsupportedAssignmentOperator(op.to_string(), coord));
	};

	field.borrow_mut().set_value(new_value, "", coord)?;

	if let NodeKind::Id { name } = &lvalue.kind {
		interp.fire_watchers(name, coord)?;
	}

	Ok(Outcome::value(field))
}
