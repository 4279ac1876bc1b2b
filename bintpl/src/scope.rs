//! The Scope: a stack of frames holding type bindings, stream-consuming
//! vars, and locals, with lexical lookup. See SPEC_FULL.md §4.C.

use fxhash::FxHashMap;

use crate::field::FieldRef;
use crate::resolve::TypeBinding;

#[derive(Debug, Default)]
struct Frame {
	types: FxHashMap<String, TypeBinding>,
	vars: FxHashMap<String, FieldRef>,
	locals: FxHashMap<String, FieldRef>,
}

/// The interpreter's lexical environment. A new frame is pushed on entering a
/// struct/union body, a function call, and a `for` loop, and popped on exit —
/// always via [`Scope::push`]/[`Scope::pop`] in strict lexical pairs, with the
/// pop issued from the same call site regardless of the early-return path so a
/// propagated error can't leak an open frame.
#[derive(Debug)]
pub struct Scope {
	frames: Vec<Frame>,
}

impl Scope {
	pub fn new() -> Self {
		Scope { frames: vec![Frame::default()] }
	}

	pub fn push(&mut self) {
		self.frames.push(Frame::default());
	}

	pub fn pop(&mut self) {
		debug_assert!(self.frames.len() > 1, "popped the root scope frame");
		self.frames.pop();
	}

	#[inline]
	pub fn depth(&self) -> usize {
		self.frames.len()
	}

	pub fn add_type(&mut self, name: impl Into<String>, binding: TypeBinding) {
		self.frames.last_mut().unwrap().types.insert(name.into(), binding);
	}

	pub fn add_var(&mut self, name: impl Into<String>, field: FieldRef) {
		self.frames.last_mut().unwrap().vars.insert(name.into(), field);
	}

	pub fn add_local(&mut self, name: impl Into<String>, field: FieldRef) {
		self.frames.last_mut().unwrap().locals.insert(name.into(), field);
	}

	/// Locals searched (innermost frame outward) before vars, matching the
	/// original interpreter's `get_id`.
	pub fn get_id(&self, name: &str) -> Option<FieldRef> {
		for frame in self.frames.iter().rev() {
			if let Some(f) = frame.locals.get(name) {
				return Some(f.clone());
			}
		}
		for frame in self.frames.iter().rev() {
			if let Some(f) = frame.vars.get(name) {
				return Some(f.clone());
			}
		}
		None
	}

	pub fn get_type(&self, name: &str) -> Option<TypeBinding> {
		for frame in self.frames.iter().rev() {
			if let Some(b) = frame.types.get(name) {
				return Some(b.clone());
			}
		}
		None
	}
}

impl Default for Scope {
	fn default() -> Self {
		Scope::new()
	}
}
