//! Demo binary: builds the AST for a small struct template by hand (no
//! lexer/parser lives in the `bintpl` crate) and runs it through
//! `Interpreter::parse_ast` against a byte buffer, printing the resulting DOM.

use std::time::SystemTime;

use bintpl::ast::{Node, NodeKind};
use bintpl::error::Coord;
use bintpl::{ByteStream, Interpreter};

fn setup_global_subscriber() {
	tracing_subscriber::fmt().with_target(false).with_level(true).init();
}

fn ident(names: &[&str]) -> Node {
	Node::new(Coord::default(), NodeKind::IdentifierType { names: names.iter().map(|s| s.to_string()).collect() })
}

fn uchar_field(name: &str) -> Node {
	Node::new(
		Coord::default(),
		NodeKind::Decl {
			name: name.to_string(),
			qualifiers: vec![],
			type_node: Box::new(ident(&["uchar"])),
			bitsize: None,
			init: None,
			metadata: vec![],
			is_param: false,
		},
	)
}

/// `struct { uchar a; uchar b; uchar c; uchar d; } data;`
fn build_template() -> Node {
	let members = vec![uchar_field("a"), uchar_field("b"), uchar_field("c"), uchar_field("d")];
	let struct_decl = Node::new(
		Coord::default(),
		NodeKind::Decl {
			name: "data".to_string(),
			qualifiers: vec![],
			type_node: Box::new(Node::new(Coord::default(), NodeKind::Struct { name: None, members })),
			bitsize: None,
			init: None,
			metadata: vec![],
			is_param: false,
		},
	);
	Node::new(Coord::default(), NodeKind::FileAST { decls: vec![struct_decl] })
}

fn main() {
	setup_global_subscriber();

	let start = SystemTime::now();
	let mut interp = Interpreter::new();
	let stream = ByteStream::new(vec![0x01u8, 0x02, 0x03, 0x04]);
	let ast = build_template();

	let dom = interp.parse_ast(stream, ast, true).expect("template evaluation failed");
	tracing::info!("evaluation time: {:?}", start.elapsed().unwrap());

	println!("{:#?}", dom);
}
