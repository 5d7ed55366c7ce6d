//! Lazy column expressions and the windowed engine that materializes them.
pub mod bytecode;
pub mod engine;
pub mod expr;
pub mod kernel;
pub mod ledger;

pub use bytecode::{Compiler, OpCode, Program};
pub use engine::Engine;
pub use expr::{col, date_diff, lit, when, BinaryOp, Expr, WindowSpec};
pub use ledger::{ComputeError, Ledger};

use crate::store::{Scalar, Table};

/// Compiles and runs `expr` against `table` in one step.
pub fn evaluate(expr: &Expr, table: &Table) -> Result<Vec<Scalar>, ComputeError> {
    let program = Compiler::new(table).compile(expr)?;
    tracing::debug!(instructions = program.len(), windows = program.windows.len(), "compiled expression {}", expr);
    Engine::run(&program, table)
}
