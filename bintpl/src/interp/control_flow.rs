//! `Compound`/`If`/`For`/`While`/`Switch`/`Case`/`Default` dispatch. See
//! SPEC_FULL.md §4.F and the preserved open-question resolutions in §9.

use crate::ast::{Node, NodeKind};
use crate::control::{Flow, Outcome};
use crate::error::InterpError;
use crate::interp::Interpreter;

/// Execute a list of statements in order, without pushing a scope frame —
/// `Compound` deliberately leaks locals into the enclosing scope (SPEC_FULL.md
/// §9), and `FileAST`/`Case`/`Default` reuse the exact same sequencing.
pub(crate) fn exec_sequence(interp: &mut Interpreter, stmts: &[Node]) -> Result<Outcome, InterpError> {
	let mut last = Outcome::none();
	for stmt in stmts {
		last = interp.dispatch(stmt)?;
		if last.is_exiting() {
			return Ok(last);
		}
	}
	Ok(last)
}

pub(crate) fn eval_if(interp: &mut Interpreter, cond: &Node, iftrue: &Node, iffalse: Option<&Node>) -> Result<Outcome, InterpError> {
	let truthy = crate::interp::expr::eval_value(interp, cond)?.is_truthy();
	if truthy {
		interp.dispatch(iftrue)
	} else if let Some(iffalse) = iffalse {
		interp.dispatch(iffalse)
	} else {
		Ok(Outcome::none())
	}
}

pub(crate) fn eval_for(interp: &mut Interpreter, init: Option<&Node>, cond: Option<&Node>, next: Option<&Node>, body: Option<&Node>) -> Result<Outcome, InterpError> {
	interp.scope_mut().push();
	let result = run_for(interp, init, cond, next, body);
	interp.scope_mut().pop();
	result
}

fn run_for(interp: &mut Interpreter, init: Option<&Node>, cond: Option<&Node>, next: Option<&Node>, body: Option<&Node>) -> Result<Outcome, InterpError> {
	if let Some(init) = init {
		interp.dispatch(init)?;
	}
	loop {
		if let Some(cond) = cond {
			if !crate::interp::expr::eval_value(interp, cond)?.is_truthy() {
				break;
			}
		}
		if let Some(body) = body {
			let outcome = interp.dispatch(body)?;
			match outcome.flow {
				Some(Flow::Break) => break,
				Some(Flow::Return(_)) => return Ok(outcome),
				Some(Flow::Continue) | None => {}
			}
		}
		if let Some(next) = next {
			interp.dispatch(next)?;
		}
	}
	Ok(Outcome::none())
}

pub(crate) fn eval_while(interp: &mut Interpreter, cond: &Node, body: Option<&Node>) -> Result<Outcome, InterpError> {
	loop {
		if !crate::interp::expr::eval_value(interp, cond)?.is_truthy() {
			break;
		}
		if let Some(body) = body {
			let outcome = interp.dispatch(body)?;
			match outcome.flow {
				Some(Flow::Break) => break,
				Some(Flow::Return(_)) => return Ok(outcome),
				Some(Flow::Continue) | None => {}
			}
		}
	}
	Ok(Outcome::none())
}

/// Builds the case list from the switch body's *direct* `Case`/`Default`
/// children only — statements between cases that aren't themselves a case
/// block are dropped, matching the original interpreter exactly (SPEC_FULL.md
/// §9, preserved rather than treated as a bug).
pub(crate) fn eval_switch(interp: &mut Interpreter, cond: &Node, body: &Node) -> Result<Outcome, InterpError> {
	let NodeKind::Compound { stmts } = &body.kind else {
		return Err(InterpError::UnsupportedASTNode(body.kind.clone(), body.coord));
	};

	let cases: Vec<&Node> = stmts.iter().filter(|n| matches!(n.kind, NodeKind::Case { .. } | NodeKind::Default { .. })).collect();

	let cond_value = crate::interp::expr::eval_value(interp, cond)?;

	let mut start = None;
	for (i, case) in cases.iter().enumerate() {
		if let NodeKind::Case { expr, .. } = &case.kind {
			let case_value = crate::interp::expr::eval_value(interp, expr)?;
			if values_equal(&cond_value, &case_value) {
				start = Some(i);
				break;
			}
		}
	}
	if start.is_none() {
		start = cases.iter().position(|c| matches!(c.kind, NodeKind::Default { .. }));
	}

	let Some(start) = start else { return Ok(Outcome::none()) };

	for case in &cases[start..] {
		let stmts = match &case.kind {
			NodeKind::Case { stmts, .. } | NodeKind::Default { stmts } => stmts,
			_ => unreachable!(),
		};
		let outcome = exec_sequence(interp, stmts)?;
		match outcome.flow {
			Some(Flow::Break) => return Ok(Outcome::none()),
			Some(Flow::Return(_)) | Some(Flow::Continue) => return Ok(outcome),
			None => {}
		}
	}
	Ok(Outcome::none())
}

fn values_equal(a: &crate::field::Value, b: &crate::field::Value) -> bool {
	match (a.as_i64(), b.as_i64()) {
		(Some(x), Some(y)) => x == y,
		_ => false,
	}
}
