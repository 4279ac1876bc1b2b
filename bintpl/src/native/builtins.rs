//! Seed natives shipped with the registry — enough to run the scenarios in
//! SPEC_FULL.md §8, not a standard library (explicitly out of scope).

use std::rc::Rc;

use crate::error::InterpError;
use crate::field::Value;
use crate::native::{Arity, NativeDef, NativeRegistryBase};
use crate::stream::Endianness;

pub fn seed() -> NativeRegistryBase {
	let mut base = NativeRegistryBase::default();
	let mut add = |def: NativeDef| {
		base.fns.insert(def.name.clone(), Rc::new(def));
	};

	add(NativeDef {
		name: "BigEndian".into(),
		ret_type: None,
		arity: Arity::Exact(0),
		receive_interp: true,
		func: Rc::new(|interp, _args| {
			interp.stream_mut().set_endian(Endianness::Big);
			Ok(None)
		}),
	});

	add(NativeDef {
		name: "LittleEndian".into(),
		ret_type: None,
		arity: Arity::Exact(0),
		receive_interp: true,
		func: Rc::new(|interp, _args| {
			interp.stream_mut().set_endian(Endianness::Little);
			Ok(None)
		}),
	});

	add(NativeDef {
		name: "Exit".into(),
		ret_type: None,
		arity: Arity::Exact(1),
		receive_interp: true,
		func: Rc::new(|_interp, args| {
			let code = args.first().and_then(Value::as_i64).unwrap_or(0);
			Err(InterpError::InterpExit(code))
		}),
	});

	base
}
