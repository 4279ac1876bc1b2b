//! Native function registry: an immutable, process-wide base seeded once per
//! thread plus a per-instance overlay. See SPEC_FULL.md §4.E (ambient note).

mod builtins;

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use fxhash::FxHashMap;

use crate::error::InterpError;
use crate::field::Value;
use crate::interp::Interpreter;
use crate::resolve::TypeConstructor;

/// Argument-count policy for a native function.
#[derive(Debug, Clone, Copy)]
pub enum Arity {
	Exact(usize),
	AtLeast(usize),
}

impl Arity {
	pub fn accepts(self, n: usize) -> bool {
		match self {
			Arity::Exact(k) => n == k,
			Arity::AtLeast(k) => n >= k,
		}
	}
}

pub type NativeFn = Rc<dyn Fn(&mut Interpreter, &[Value]) -> Result<Option<Value>, InterpError>>;

#[derive(Clone)]
pub struct NativeDef {
	pub name: String,
	pub ret_type: Option<TypeConstructor>,
	pub arity: Arity,
	/// Whether the callback wants `&mut Interpreter` (always true in this
	/// crate's signature) surfaced separately from whether it *needs* it —
	/// mirrors `add_native`'s `receive_interp` flag from SPEC_FULL.md §6 for
	/// API parity even though our closures always receive it.
	pub receive_interp: bool,
	pub func: NativeFn,
}

impl fmt::Debug for NativeDef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NativeDef").field("name", &self.name).field("arity", &self.arity).finish()
	}
}

/// The seeded, shared set of natives every interpreter starts with.
#[derive(Debug, Default)]
pub struct NativeRegistryBase {
	fns: FxHashMap<String, Rc<NativeDef>>,
}

thread_local! {
	static BASE: OnceCell<Rc<NativeRegistryBase>> = OnceCell::new();
}

/// Single-threaded stand-in for the "immutable `Arc`, populated once"
/// description in SPEC_FULL.md §4.E: since the interpreter is synchronous and
/// single-threaded (§5), a thread-local `OnceCell<Rc<_>>` gives the same
/// "build once, share cheaply" property without requiring the native closures
/// to be `Send + Sync`.
fn shared_base() -> Rc<NativeRegistryBase> {
	BASE.with(|cell| cell.get_or_init(|| Rc::new(builtins::seed())).clone())
}

/// Per-instance native-function table: the shared base, checked after a
/// small overlay populated by this interpreter's own `add_native` calls.
#[derive(Debug, Clone)]
pub struct NativeRegistry {
	base: Rc<NativeRegistryBase>,
	overlay: FxHashMap<String, Rc<NativeDef>>,
}

impl NativeRegistry {
	pub fn new() -> Self {
		NativeRegistry { base: shared_base(), overlay: FxHashMap::default() }
	}

	pub fn add(&mut self, def: NativeDef) {
		self.overlay.insert(def.name.clone(), Rc::new(def));
	}

	pub fn get(&self, name: &str) -> Option<Rc<NativeDef>> {
		self.overlay.get(name).or_else(|| self.base.fns.get(name)).cloned()
	}
}

impl Default for NativeRegistry {
	fn default() -> Self {
		NativeRegistry::new()
	}
}
