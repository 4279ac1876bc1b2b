//! End-to-end scenarios exercising `Interpreter::parse_ast` against hand-built
//! `Node` trees (no lexer/parser lives in this crate, so there is no template
//! source text to parse here). See SPEC_FULL.md §8.

use bintpl::ast::{Enumerator, Literal, Node, NodeKind, Qualifier};
use bintpl::error::Coord;
use bintpl::field::{FieldKind, NumericKind, Value};
use bintpl::{ByteStream, FieldRef, InterpError, Interpreter};

fn int_lit(value: i64) -> Node {
	Node::new(Coord::default(), NodeKind::Constant { literal: Literal::Int { value: value as i128, hex: false, unsigned_suffix: false } })
}

fn ident(names: &[&str]) -> Node {
	Node::new(Coord::default(), NodeKind::IdentifierType { names: names.iter().map(|s| s.to_string()).collect() })
}

fn id(name: &str) -> Node {
	Node::new(Coord::default(), NodeKind::Id { name: name.to_string() })
}

#[allow(clippy::too_many_arguments)]
fn decl(name: &str, qualifiers: Vec<Qualifier>, type_node: Node, init: Option<Node>) -> Node {
	Node::new(
		Coord::default(),
		NodeKind::Decl {
			name: name.to_string(),
			qualifiers,
			type_node: Box::new(type_node),
			bitsize: None,
			init: init.map(Box::new),
			metadata: vec![],
			is_param: false,
		},
	)
}

fn plain_decl(name: &str, type_names: &[&str]) -> Node {
	decl(name, vec![], ident(type_names), None)
}

fn file(decls: Vec<Node>) -> Node {
	Node::new(Coord::default(), NodeKind::FileAST { decls })
}

fn call(name: &str) -> Node {
	Node::new(Coord::default(), NodeKind::FuncCall { name: name.to_string(), args: vec![] })
}

fn field_value(field: &FieldRef) -> Value {
	field.borrow().get_value()
}

fn child(dom: &FieldRef, name: &str) -> FieldRef {
	dom.borrow().get_field(name, Coord::default()).unwrap()
}

#[test]
fn simple_struct() {
	let members = vec![plain_decl("a", &["uchar"]), plain_decl("b", &["uchar"]), plain_decl("c", &["uchar"]), plain_decl("d", &["uchar"])];
	let data_decl = decl("data", vec![], Node::new(Coord::default(), NodeKind::Struct { name: None, members }), None);
	let ast = file(vec![data_decl]);

	let mut interp = Interpreter::new();
	let stream = ByteStream::new(vec![0x01, 0x02, 0x03, 0x04]);
	let dom = interp.parse_ast(stream, ast, true).unwrap();

	let data = child(&dom, "data");
	assert_eq!(field_value(&child(&data, "a")), Value::UInt(1));
	assert_eq!(field_value(&child(&data, "b")), Value::UInt(2));
	assert_eq!(field_value(&child(&data, "c")), Value::UInt(3));
	assert_eq!(field_value(&child(&data, "d")), Value::UInt(4));
	assert_eq!(interp.stream_position_bits(), 32);
}

#[test]
fn endianness_switch() {
	let ast = file(vec![call("BigEndian"), plain_decl("x", &["uint"]), call("LittleEndian"), plain_decl("y", &["uint"])]);

	let mut interp = Interpreter::new();
	let stream = ByteStream::new(vec![0x00, 0x00, 0x00, 0x01, 0x02, 0x00, 0x00, 0x00]);
	let dom = interp.parse_ast(stream, ast, true).unwrap();

	assert_eq!(field_value(&child(&dom, "x")), Value::UInt(1));
	assert_eq!(field_value(&child(&dom, "y")), Value::UInt(2));
}

#[test]
fn union_same_start_rewind() {
	let array_decl = decl(
		"as_bytes",
		vec![],
		Node::new(Coord::default(), NodeKind::ArrayDecl { element_type: Box::new(ident(&["uchar"])), dim: Some(Box::new(int_lit(4))) }),
		None,
	);
	let members = vec![plain_decl("as_int", &["uint"]), array_decl];
	let u_decl = decl("u", vec![], Node::new(Coord::default(), NodeKind::Union { name: None, members }), None);
	let ast = file(vec![u_decl]);

	let mut interp = Interpreter::new();
	let stream = ByteStream::new(vec![0x78, 0x56, 0x34, 0x12]);
	let dom = interp.parse_ast(stream, ast, true).unwrap();

	let u = child(&dom, "u");
	assert_eq!(field_value(&child(&u, "as_int")), Value::UInt(0x12345678));

	let as_bytes = child(&u, "as_bytes");
	let expected = [0x78u8, 0x56, 0x34, 0x12];
	for (i, want) in expected.iter().enumerate() {
		let elem = as_bytes.borrow().index(i as i64, Coord::default()).unwrap();
		assert_eq!(field_value(&elem), Value::UInt(*want as u64));
	}
	assert_eq!(interp.stream_position_bits(), 32);
}

#[test]
fn enum_with_mixed_values_and_symbolic_lookup() {
	let enumerators = vec![
		Enumerator { name: "A".to_string(), value: None },
		Enumerator { name: "B".to_string(), value: Some(int_lit(5)) },
		Enumerator { name: "C".to_string(), value: None },
	];
	let enum_decl = Node::new(Coord::default(), NodeKind::Enum { name: Some("E".to_string()), underlying: Some(Box::new(ident(&["uchar"]))), enumerators });
	let v_decl = plain_decl("v", &["E"]);
	let ast = file(vec![enum_decl, v_decl]);

	let mut interp = Interpreter::new();
	let stream = ByteStream::new(vec![0x05]);
	let dom = interp.parse_ast(stream, ast, true).unwrap();

	let v = child(&dom, "v");
	assert_eq!(field_value(&v), Value::UInt(5));
	let name = match &v.borrow().kind {
		FieldKind::Enum(e) => e.symbolic_name().map(|s| s.to_string()),
		_ => panic!("expected an enum field"),
	};
	assert_eq!(name.as_deref(), Some("B"));
}

#[test]
fn string_reads_until_nul() {
	let ast = file(vec![plain_decl("s", &["string"])]);

	let mut interp = Interpreter::new();
	let stream = ByteStream::new(vec![b'h', b'i', 0, b'x', b'x']);
	let dom = interp.parse_ast(stream, ast, true).unwrap();

	let s = child(&dom, "s");
	match &s.borrow().kind {
		FieldKind::String(sf) => assert_eq!(sf.as_str_lossy(), "hi"),
		_ => panic!("expected a string field"),
	}
	assert_eq!(interp.stream_position_bits(), 24);
}

#[test]
fn fixed_array_with_control_flow_sum() {
	let n_decl = plain_decl("n", &["uchar"]);
	let xs_decl = decl(
		"xs",
		vec![],
		Node::new(Coord::default(), NodeKind::ArrayDecl { element_type: Box::new(ident(&["uchar"])), dim: Some(Box::new(id("n"))) }),
		None,
	);
	let sum_decl = decl("sum", vec![Qualifier::Local], ident(&["uint"]), Some(int_lit(0)));
	let i_decl = decl("i", vec![Qualifier::Local], ident(&["uint"]), None);

	let for_init = Node::new(
		Coord::default(),
		NodeKind::Assignment { op: "=".to_string(), lvalue: Box::new(id("i")), rvalue: Box::new(int_lit(0)) },
	);
	let for_cond = Node::new(Coord::default(), NodeKind::BinaryOp { op: "<".to_string(), lhs: Box::new(id("i")), rhs: Box::new(id("n")) });
	let for_next = Node::new(Coord::default(), NodeKind::UnaryOp { op: "++".to_string(), operand: Box::new(id("i")), postfix: true });
	let array_ref = Node::new(Coord::default(), NodeKind::ArrayRef { array: Box::new(id("xs")), subscript: Box::new(id("i")) });
	let body_stmt = Node::new(
		Coord::default(),
		NodeKind::Assignment { op: "+=".to_string(), lvalue: Box::new(id("sum")), rvalue: Box::new(array_ref) },
	);
	let for_body = Node::new(Coord::default(), NodeKind::Compound { stmts: vec![body_stmt] });
	let for_node = Node::new(
		Coord::default(),
		NodeKind::For { init: Some(Box::new(for_init)), cond: Some(Box::new(for_cond)), next: Some(Box::new(for_next)), body: Some(Box::new(for_body)) },
	);

	let ast = file(vec![n_decl, xs_decl, sum_decl, i_decl, for_node]);

	let mut interp = Interpreter::new();
	let stream = ByteStream::new(vec![0x03, 0x0A, 0x14, 0x1E]);
	let dom = interp.parse_ast(stream, ast, true).unwrap();

	assert_eq!(field_value(&child(&dom, "n")), Value::UInt(3));
	let xs = child(&dom, "xs");
	let expected = [10u64, 20, 30];
	for (i, want) in expected.iter().enumerate() {
		let elem = xs.borrow().index(i as i64, Coord::default()).unwrap();
		assert_eq!(field_value(&elem), Value::UInt(*want));
	}
	assert_eq!(field_value(&child(&dom, "sum")), Value::UInt(60));
}

#[test]
fn const_field_rejects_reassignment() {
	let ast = file(vec![decl("k", vec![Qualifier::Const], ident(&["uint"]), Some(int_lit(7)))]);

	let mut interp = Interpreter::new();
	let stream = ByteStream::new(Vec::new());
	let dom = interp.parse_ast(stream, ast, true).unwrap();

	let k = child(&dom, "k");
	assert_eq!(field_value(&k), Value::UInt(7));
	let err = k.borrow_mut().set_value(Value::UInt(9), "k", Coord::default()).unwrap_err();
	assert!(matches!(err, InterpError::FieldFrozen(..)));
	assert_eq!(field_value(&k), Value::UInt(7));
}

#[test]
fn numeric_round_trip_preserves_bytes() {
	for (kind, bytes) in [
		(NumericKind::U8, vec![0xAB]),
		(NumericKind::U16, vec![0x12, 0x34]),
		(NumericKind::U32, vec![0x01, 0x02, 0x03, 0x04]),
		(NumericKind::U64, vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]),
	] {
		let mut stream = ByteStream::new(bytes.clone());
		stream.set_endian(bintpl::Endianness::Big);
		let (field, _width) = bintpl::field::NumericField::parse(&mut stream, kind, None).unwrap();
		assert_eq!(field.to_bytes(bintpl::Endianness::Big), bytes);
	}
}

#[test]
fn zero_length_array_consumes_nothing() {
	let xs_decl = decl(
		"xs",
		vec![],
		Node::new(Coord::default(), NodeKind::ArrayDecl { element_type: Box::new(ident(&["uchar"])), dim: Some(Box::new(int_lit(0))) }),
		None,
	);
	let ast = file(vec![xs_decl]);

	let mut interp = Interpreter::new();
	let stream = ByteStream::new(vec![0xFF, 0xFF]);
	let dom = interp.parse_ast(stream, ast, true).unwrap();

	let xs = child(&dom, "xs");
	match &xs.borrow().kind {
		FieldKind::Array(a) => assert_eq!(a.children.len(), 0),
		_ => panic!("expected an array field"),
	}
	assert_eq!(interp.stream_position_bits(), 0);
}
