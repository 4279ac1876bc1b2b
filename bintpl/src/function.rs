//! The Function Model: user-defined function objects and the deferred
//! parameter-binding scheme. See SPEC_FULL.md §4.E.

use std::rc::Rc;

use crate::ast::Node;
use crate::resolve::TypeConstructor;

/// A declared parameter whose type may not be known until the call site binds
/// an argument (SPEC_FULL.md §9, "Lazy function parameters").
#[derive(Debug, Clone)]
pub struct Param {
	pub name: String,
	pub type_constructor: Option<TypeConstructor>,
}

/// A user-defined function. Captures nothing beyond its own declaration; the
/// body runs with a fresh frame pushed on the *caller's* scope stack (see
/// DESIGN.md for why this crate doesn't truncate back to `defining_depth` the
/// way the original interpreter's closure-like `Scope` does).
#[derive(Debug, Clone)]
pub struct FunctionDef {
	pub name: String,
	pub params: Vec<Param>,
	pub body: Rc<Node>,
	/// Number of scope frames open when the function was defined. Recorded
	/// for parity with the original model; not currently consulted at call
	/// time.
	pub defining_depth: usize,
}
