//! `FuncDef`/`FuncCall` dispatch and the user-function / native-function call
//! paths. See SPEC_FULL.md §4.E.

use std::rc::Rc;

use crate::ast::{Node, NodeKind};
use crate::control::{Flow, Outcome};
use crate::error::{Coord, InterpError};
use crate::field::Value;
use crate::function::{FunctionDef, Param};
use crate::interp::Interpreter;
use crate::resolve::TypeConstructor;

pub(crate) fn eval_funcdef(interp: &mut Interpreter, declarator: &Node, body: &Node, coord: Coord) -> Result<Outcome, InterpError> {
	let NodeKind::Decl { name, type_node, .. } = &declarator.kind else {
		return Err(InterpError::UnsupportedASTNode(declarator.kind.clone(), coord));
	};
	let NodeKind::FuncDecl { params, .. } = &type_node.kind else {
		return Err(InterpError::UnsupportedASTNode(type_node.kind.clone(), coord));
	};

	let mut built_params = Vec::with_capacity(params.len());
	for p in params {
		let NodeKind::Decl { name: pname, type_node: ptype, .. } = &p.kind else {
			return Err(InterpError::UnsupportedASTNode(p.kind.clone(), p.coord));
		};
		let tc = match &ptype.kind {
			NodeKind::IdentifierType { names } if names.is_empty() => None,
			_ => Some(crate::interp::decl::resolve_decl_type(interp, ptype)?),
		};
		built_params.push(Param { name: pname.clone(), type_constructor: tc });
	}

	let def = FunctionDef { name: name.clone(), params: built_params, body: Rc::new(body.clone()), defining_depth: interp.scope().depth() };
	interp.define_function(def);
	Ok(Outcome::none())
}

pub(crate) fn eval_funccall(interp: &mut Interpreter, name: &str, arg_nodes: &[Node], coord: Coord) -> Result<Outcome, InterpError> {
	if let Some(def) = interp.get_function(name) {
		let mut args = Vec::with_capacity(arg_nodes.len());
		for a in arg_nodes {
			args.push(crate::interp::expr::eval_value(interp, a)?);
		}
		return call_user_function(interp, &def, args, coord);
	}

	let Some(native) = interp.native(name) else {
		return Err(InterpError::UnresolvedID(name.to_string(), coord));
	};
	let mut args = Vec::with_capacity(arg_nodes.len());
	for a in arg_nodes {
		args.push(crate::interp::expr::eval_value(interp, a)?);
	}
	if !native.arity.accepts(args.len()) {
		return Err(InterpError::NativeCallError(format!("`{name}` called with {} arguments", args.len()), coord));
	}
	let result = (native.func)(interp, &args)?;
	Ok(match result {
		Some(v) => Outcome::value(interp.value_to_field(v)),
		None => Outcome::none(),
	})
}

fn call_user_function(interp: &mut Interpreter, def: &Rc<FunctionDef>, args: Vec<Value>, coord: Coord) -> Result<Outcome, InterpError> {
	interp.scope_mut().push();
	let mut bind_err = None;
	for (param, arg) in def.params.iter().zip(args) {
		let tc = param.type_constructor.clone().unwrap_or_else(|| default_constructor_for(&arg));
		match interp.instantiate_value(&tc, arg, coord) {
			Ok(field) => interp.scope_mut().add_local(param.name.clone(), field),
			Err(e) => {
				bind_err = Some(e);
				break;
			}
		}
	}
	if let Some(e) = bind_err {
		interp.scope_mut().pop();
		return Err(e);
	}

	let outcome = interp.dispatch(&def.body);
	interp.scope_mut().pop();
	let outcome = outcome?;

	Ok(match outcome.flow {
		Some(Flow::Return(value)) => Outcome { value, flow: None },
		_ => Outcome::none(),
	})
}

fn default_constructor_for(value: &Value) -> TypeConstructor {
	use crate::field::NumericKind;
	match value {
		Value::Int(_) => TypeConstructor::Numeric(NumericKind::I32),
		Value::UInt(_) => TypeConstructor::Numeric(NumericKind::U32),
		Value::Float(_) => TypeConstructor::Numeric(NumericKind::F64),
		Value::Bytes(_) => TypeConstructor::StringT,
		Value::WBytes(_) => TypeConstructor::WStringT,
	}
}

/// Invoke a function (user or native) purely by name, used by the metadata
/// engine's watch/update and pack/unpack triggers.
pub(crate) fn invoke_by_name(interp: &mut Interpreter, name: &str, args: Vec<Value>, coord: Coord) -> Result<Option<Value>, InterpError> {
	if let Some(def) = interp.get_function(name) {
		let outcome = call_user_function(interp, &def, args, coord)?;
		return Ok(outcome.value.map(|f| f.borrow().get_value()));
	}
	let Some(native) = interp.native(name) else {
		return Err(InterpError::UnresolvedID(name.to_string(), coord));
	};
	if !native.arity.accepts(args.len()) {
		return Err(InterpError::NativeCallError(format!("`{name}` called with {} arguments", args.len()), coord));
	}
	(native.func)(interp, &args)
}
