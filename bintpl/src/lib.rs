//! An AST-walking interpreter for C-like binary templates: it executes a
//! template program (supplied as an AST, or as source text through a
//! pluggable [`TemplateParser`]) against a byte stream and produces a typed
//! tree of fields describing the parsed structure of the input.

pub mod ast;
pub mod control;
pub mod error;
pub mod field;
mod function;
mod interp;
pub mod metadata;
mod native;
pub mod resolve;
mod scope;
pub mod stream;

pub use control::{Flow, Outcome};
pub use error::{Coord, InterpError};
pub use field::{FieldKind, FieldNode, FieldRef, Value};
pub use interp::{DebugHook, Interpreter, TemplateParser};
pub use native::{Arity, NativeDef, NativeFn};
pub use stream::{BitOrder, ByteStream, Endianness};
