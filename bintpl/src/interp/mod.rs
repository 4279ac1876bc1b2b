//! The Interpreter: AST dispatch by node kind, threading Scope, the current
//! context field, and the byte stream through recursive node handling. See
//! SPEC_FULL.md §4.F.

mod call;
mod control_flow;
mod decl;
mod expr;
mod predefine;

use std::fmt;
use std::rc::Rc;

use fxhash::FxHashMap;

use crate::ast::{Node, NodeKind};
use crate::control::{Flow, Outcome};
use crate::error::{Coord, InterpError};
use crate::field::{FieldNode, FieldRef, StructField, Value};
use crate::function::FunctionDef;
use crate::native::{NativeDef, NativeRegistry};
use crate::resolve::TypeConstructor;
use crate::scope::Scope;
use crate::stream::{BitOrder, ByteStream};

/// The external-parser boundary. Never implemented in this crate — the
/// interpreter only consumes the AST a `TemplateParser` hands back.
pub trait TemplateParser {
	fn parse(&self, source: &str) -> Result<Node, InterpError>;
}

/// Stubbed debugger hook, invoked at "breakable" nodes. The default
/// implementation does nothing; a host application can swap in a real one to
/// drive an interactive debugger without this crate depending on one.
pub trait DebugHook {
	fn on_break(&mut self, _node: &Node) {}
}

#[derive(Default)]
struct NoopDebugHook;
impl DebugHook for NoopDebugHook {}

/// One registered watch dependency: when `watched` changes, `update_fn` is
/// invoked and its result written into `dep_field`.
#[derive(Clone)]
struct WatchEntry {
	dep_name: String,
	dep_field: FieldRef,
	watched: Vec<String>,
	update_fn: String,
}

/// A pure function of (template, stream, configuration, native registry) — no
/// persisted state survives a `parse_ast` call except the native-registry
/// overlay and queued predefines, which are process/instance-wide config.
pub struct Interpreter {
	scope: Scope,
	stream: ByteStream,
	context_stack: Vec<FieldRef>,
	natives: NativeRegistry,
	functions: FxHashMap<String, Rc<FunctionDef>>,
	predefines: Vec<Rc<Node>>,
	bitfield_padded: bool,
	bitfield_order: BitOrder,
	parser: Option<Box<dyn TemplateParser>>,
	debug_hook: Box<dyn DebugHook>,
	coord: Coord,
	watch_index: FxHashMap<String, Vec<WatchEntry>>,
	watch_stack: Vec<usize>,
}

impl fmt::Debug for Interpreter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Interpreter").field("coord", &self.coord).field("functions", &self.functions.keys().collect::<Vec<_>>()).finish()
	}
}

impl Default for Interpreter {
	fn default() -> Self {
		Interpreter::new()
	}
}

impl Interpreter {
	pub fn new() -> Self {
		Interpreter {
			scope: Scope::new(),
			stream: ByteStream::new(Vec::new()),
			context_stack: Vec::new(),
			natives: NativeRegistry::new(),
			functions: FxHashMap::default(),
			predefines: vec![Rc::new(predefine::default_predefines())],
			bitfield_padded: true,
			bitfield_order: BitOrder::default(),
			parser: None,
			debug_hook: Box::new(NoopDebugHook),
			coord: Coord::default(),
			watch_index: FxHashMap::default(),
			watch_stack: Vec::new(),
		}
	}

	pub fn with_parser(parser: impl TemplateParser + 'static) -> Self {
		let mut interp = Interpreter::new();
		interp.parser = Some(Box::new(parser));
		interp
	}

	pub fn with_debug_hook(mut self, hook: impl DebugHook + 'static) -> Self {
		self.debug_hook = Box::new(hook);
		self
	}

	pub fn add_native(&mut self, def: NativeDef) {
		self.natives.add(def);
	}

	pub fn add_predefine(&mut self, ast: Node) {
		self.predefines.push(Rc::new(ast));
	}

	pub fn set_bitfield_padded(&mut self, padded: bool) {
		self.bitfield_padded = padded;
		self.stream.set_padded(padded);
	}

	pub fn set_bitfield_left_right(&mut self) {
		self.bitfield_order = BitOrder::LeftToRight;
		self.stream.set_bit_order(BitOrder::LeftToRight);
	}

	pub fn set_bitfield_right_left(&mut self) {
		self.bitfield_order = BitOrder::RightToLeft;
		self.stream.set_bit_order(BitOrder::RightToLeft);
	}

	#[cfg_attr(feature = "tracing", tracing::instrument(skip(self, stream)))]
	pub fn parse(&mut self, stream: ByteStream, template_source: &str, predefines: bool) -> Result<FieldRef, InterpError> {
		let parser = self.parser.as_ref().ok_or_else(|| InterpError::ParseError("no TemplateParser configured".into()))?;
		let ast = parser.parse(template_source)?;
		self.parse_ast(stream, ast, predefines)
	}

	#[cfg_attr(feature = "tracing", tracing::instrument(skip(self, stream, ast)))]
	pub fn parse_ast(&mut self, mut stream: ByteStream, ast: Node, predefines: bool) -> Result<FieldRef, InterpError> {
		stream.set_padded(self.bitfield_padded);
		stream.set_bit_order(self.bitfield_order);
		self.stream = stream;
		self.scope = Scope::new();
		self.functions.clear();
		self.watch_index.clear();
		self.watch_stack.clear();
		self.coord = Coord::default();

		let dom = FieldNode::new(crate::field::FieldKind::Dom(StructField::default()), 0, self.stream.endian());
		self.context_stack = vec![dom.clone()];

		if predefines {
			for pre in self.predefines.clone() {
				if self.exec_top_level(&pre)? {
					break;
				}
			}
		}
		self.exec_top_level(&ast)?;
		Ok(dom)
	}

	/// Runs a top-level `FileAST`. Returns `Ok(true)` if evaluation was cut
	/// short by an exiting control-flow signal (swallowed silently per
	/// SPEC_FULL.md §9/§7), `Ok(false)` if it ran to completion.
	fn exec_top_level(&mut self, ast: &Node) -> Result<bool, InterpError> {
		match self.dispatch(ast) {
			Ok(outcome) => Ok(outcome.is_exiting()),
			Err(InterpError::InterpExit(_)) => Ok(true),
			Err(e) => Err(e),
		}
	}

	/// Evaluate a single statement fragment against the current state (used
	/// by watch expressions and embedding tooling). Appends a trailing `;`
	/// to `source` if absent before parsing, mirroring the distilled spec.
	pub fn eval(&mut self, statement_source: &str) -> Result<Value, InterpError> {
		let parser = self.parser.as_ref().ok_or_else(|| InterpError::ParseError("no TemplateParser configured".into()))?;
		let source = if statement_source.trim_end().ends_with(';') {
			statement_source.to_string()
		} else {
			format!("{statement_source};")
		};
		let ast = parser.parse(&source)?;
		let outcome = self.dispatch(&ast)?;
		Ok(outcome.value.map(|f| f.borrow().get_value()).unwrap_or(Value::Int(0)))
	}

	pub(crate) fn stream_mut(&mut self) -> &mut ByteStream {
		&mut self.stream
	}

	/// Bit-cursor position in the stream last passed to `parse`/`parse_ast`.
	pub fn stream_position_bits(&self) -> u64 {
		self.stream.tell()
	}

	pub(crate) fn scope_mut(&mut self) -> &mut Scope {
		&mut self.scope
	}

	pub(crate) fn scope(&self) -> &Scope {
		&self.scope
	}

	pub(crate) fn context(&self) -> FieldRef {
		self.context_stack.last().expect("context stack never empty during dispatch").clone()
	}

	/// The DOM root (`context_stack[0]`), resolved by the `__root` identifier.
	pub(crate) fn root(&self) -> FieldRef {
		self.context_stack.first().expect("context stack never empty during dispatch").clone()
	}

	pub(crate) fn push_context(&mut self, field: FieldRef) {
		self.context_stack.push(field);
	}

	pub(crate) fn pop_context(&mut self) {
		self.context_stack.pop();
	}

	pub(crate) fn coord(&self) -> Coord {
		self.coord
	}

	pub(crate) fn define_function(&mut self, def: FunctionDef) {
		self.functions.insert(def.name.clone(), Rc::new(def));
	}

	pub(crate) fn get_function(&self, name: &str) -> Option<Rc<FunctionDef>> {
		self.functions.get(name).cloned()
	}

	pub(crate) fn native(&self, name: &str) -> Option<Rc<NativeDef>> {
		self.natives.get(name)
	}

	/// Wrap a transient computed value in an unparented field so it can be
	/// carried through `Outcome` like any other expression result, mirroring
	/// how the original interpreter hands back a throwaway field for
	/// arithmetic results.
	pub(crate) fn value_to_field(&self, value: Value) -> FieldRef {
		use crate::field::{FieldKind, NumericField, NumericKind, StringField};
		let endian = self.stream.endian();
		match value {
			Value::Int(v) => FieldNode::new(FieldKind::Numeric(NumericField::from_i64(NumericKind::I32, v)), 32, endian),
			Value::UInt(v) => FieldNode::new(FieldKind::Numeric(NumericField::from_i64(NumericKind::U32, v as i64)), 32, endian),
			Value::Float(v) => {
				let mut nf = NumericField::zero(NumericKind::F64);
				let _ = nf.set_value(Value::Float(v), "", self.coord);
				FieldNode::new(FieldKind::Numeric(nf), 64, endian)
			}
			Value::Bytes(b) => FieldNode::new(FieldKind::String(StringField { bytes: b }), 0, endian),
			Value::WBytes(u) => FieldNode::new(FieldKind::WString(crate::field::WStringField { units: u }), 0, endian),
		}
	}

	/// Dispatch a single AST node. Returns the evaluated field (if any) plus
	/// an in-flight control-flow signal the caller must propagate.
	pub(crate) fn dispatch(&mut self, node: &Node) -> Result<Outcome, InterpError> {
		self.coord = node.coord;
		match &node.kind {
			NodeKind::FileAST { decls } => control_flow::exec_sequence(self, decls),
			NodeKind::Compound { stmts } => control_flow::exec_sequence(self, stmts),

			NodeKind::Decl { name, qualifiers, type_node, bitsize, init, metadata, is_param } => {
				self.debug_hook.on_break(node);
				decl::eval_decl(self, name, qualifiers, type_node, bitsize.as_deref(), init.as_deref(), metadata, *is_param, node.coord)
			}
			NodeKind::TypeDecl { .. } | NodeKind::ByRefDecl { .. } | NodeKind::IdentifierType { .. } | NodeKind::ArrayDecl { .. } | NodeKind::FuncDecl { .. } | NodeKind::InitList { .. } => {
				Err(InterpError::UnsupportedASTNode(node.kind.clone(), node.coord))
			}

			NodeKind::Struct { name, members } => decl::eval_named_aggregate(self, name, members, false, node.coord),
			NodeKind::Union { name, members } => decl::eval_named_aggregate(self, name, members, true, node.coord),
			NodeKind::Enum { name, underlying, enumerators } => {
				decl::eval_named_enum(self, name, underlying.as_deref(), enumerators, node.coord)
			}
			NodeKind::Typedef { name, type_node } => decl::eval_typedef(self, name, type_node, node.coord),

			NodeKind::Constant { literal } => {
				let v = expr::eval_constant(literal);
				Ok(Outcome::value(self.value_to_field(v)))
			}
			NodeKind::BinaryOp { .. } | NodeKind::UnaryOp { .. } | NodeKind::Cast { .. } => {
				self.debug_hook.on_break(node);
				let v = expr::eval_value(self, node)?;
				Ok(Outcome::value(self.value_to_field(v)))
			}
			NodeKind::Assignment { op, lvalue, rvalue } => {
				self.debug_hook.on_break(node);
				expr::eval_assignment(self, op, lvalue, rvalue, node.coord)
			}
			NodeKind::Id { name } => {
				let field = expr::resolve_id(self, name, node.coord)?;
				Ok(Outcome::value(field))
			}
			NodeKind::ArrayRef { .. } => {
				let field = expr::eval_lvalue(self, node)?;
				Ok(Outcome::value(field))
			}

			NodeKind::FuncDef { declarator, body } => call::eval_funcdef(self, declarator, body, node.coord),
			NodeKind::FuncCall { name, args } => {
				self.debug_hook.on_break(node);
				call::eval_funccall(self, name, args, node.coord)
			}

			NodeKind::If { cond, iftrue, iffalse } => control_flow::eval_if(self, cond, iftrue, iffalse.as_deref()),
			NodeKind::For { init, cond, next, body } => {
				control_flow::eval_for(self, init.as_deref(), cond.as_deref(), next.as_deref(), body.as_deref())
			}
			NodeKind::While { cond, body } => control_flow::eval_while(self, cond, body.as_deref()),
			NodeKind::Switch { cond, body } => {
				self.debug_hook.on_break(node);
				control_flow::eval_switch(self, cond, body)
			}
			NodeKind::Case { stmts, .. } | NodeKind::Default { stmts } => control_flow::exec_sequence(self, stmts),
			NodeKind::Return { expr } => {
				self.debug_hook.on_break(node);
				let value = match expr {
					Some(e) => Some(self.value_to_field(expr::eval_value(self, e)?)),
					None => None,
				};
				Ok(Outcome::flow(Flow::Return(value)))
			}
			NodeKind::Break => {
				self.debug_hook.on_break(node);
				Ok(Outcome::flow(Flow::Break))
			}
			NodeKind::Continue => {
				self.debug_hook.on_break(node);
				Ok(Outcome::flow(Flow::Continue))
			}
		}
	}

	/// Instantiate a field of the given constructor, consuming from the
	/// current stream. `bitsize`, when present, applies only to `Numeric`.
	#[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
	pub(crate) fn instantiate(&mut self, tc: &TypeConstructor, bitsize: Option<u32>, coord: Coord) -> Result<FieldRef, InterpError> {
		decl::instantiate(self, tc, bitsize, coord)
	}

	/// Build a field of the given constructor directly from an already-known
	/// `Value`, without consuming the stream (function parameters, casts).
	pub(crate) fn instantiate_value(&mut self, tc: &TypeConstructor, value: Value, coord: Coord) -> Result<FieldRef, InterpError> {
		decl::instantiate_value(self, tc, value, coord)
	}

	/// Register a watch dependency, computing and storing its initial value.
	pub(crate) fn register_watch(&mut self, field: &FieldRef, dep_name: &str, watch: &crate::metadata::WatchUpdate, coord: Coord) -> Result<(), InterpError> {
		let args = watch.watched.iter().map(|n| self.lookup_value(n)).collect::<Result<Vec<_>, _>>()?;
		let value = self.call_by_name(&watch.update_fn, args, coord)?;
		if let Some(v) = value {
			field.borrow_mut().set_value(v, dep_name, coord)?;
		}
		for watched_name in &watch.watched {
			self.watch_index.entry(watched_name.clone()).or_default().push(WatchEntry {
				dep_name: dep_name.to_string(),
				dep_field: field.clone(),
				watched: watch.watched.clone(),
				update_fn: watch.update_fn.clone(),
			});
		}
		Ok(())
	}

	fn lookup_value(&self, name: &str) -> Result<Value, InterpError> {
		self.scope.get_id(name).map(|f| f.borrow().get_value()).ok_or_else(|| InterpError::UnresolvedID(name.to_string(), self.coord))
	}

	/// Fire any watchers registered on `name`, depth-first, failing with
	/// `MetadataCycle` if a dependent field is revisited within one chain.
	pub(crate) fn fire_watchers(&mut self, name: &str, coord: Coord) -> Result<(), InterpError> {
		let Some(entries) = self.watch_index.get(name).cloned() else { return Ok(()) };
		for entry in entries {
			let ptr = entry.dep_field.as_ptr() as usize;
			if self.watch_stack.contains(&ptr) {
				return Err(InterpError::MetadataCycle(entry.dep_name.clone(), coord));
			}
			let args = entry.watched.iter().map(|n| self.lookup_value(n)).collect::<Result<Vec<_>, _>>()?;
			let value = self.call_by_name(&entry.update_fn, args, coord)?;
			if let Some(v) = value {
				self.watch_stack.push(ptr);
				entry.dep_field.borrow_mut().set_value(v, &entry.dep_name, coord)?;
				self.fire_watchers(&entry.dep_name, coord)?;
				self.watch_stack.pop();
			}
		}
		Ok(())
	}

	pub(crate) fn call_by_name(&mut self, name: &str, args: Vec<Value>, coord: Coord) -> Result<Option<Value>, InterpError> {
		call::invoke_by_name(self, name, args, coord)
	}
}
