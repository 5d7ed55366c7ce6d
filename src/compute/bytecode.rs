use super::expr::{BinaryOp, Expr, WindowSpec};
use super::ledger::ComputeError;
use crate::store::{Scalar, Table};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    LoadColumn = 0,
    LoadConst = 1,
    Lag = 2,
    Sub = 3,
    Lt = 4,
    LtEq = 5,
    And = 6,
    DateDiff = 7,
    IsNull = 8,
    IsNan = 9,
    Not = 10,
    Case = 11,
}

impl From<BinaryOp> for OpCode {
    fn from(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Sub => OpCode::Sub,
            BinaryOp::Lt => OpCode::Lt,
            BinaryOp::LtEq => OpCode::LtEq,
            BinaryOp::And => OpCode::And,
        }
    }
}

/// Structure-of-Arrays layout for the execution tape.
///
/// Instruction `i` always writes register `i`; the last register is the result.
/// Operand meaning per opcode:
/// - `LoadColumn`: `aux` = index into `columns`.
/// - `LoadConst`: `aux` = index into `constants`.
/// - `Lag`: `p1` = source, `p2` = window index, `aux` = offset.
/// - binary ops and `DateDiff`: `p1`, `p2`.
/// - `IsNull`, `IsNan`, `Not`: `p1`.
/// - `Case`: `p1` = condition, `p2` = then, `aux` = otherwise.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub ops: Vec<OpCode>,
    pub p1: Vec<u32>,
    pub p2: Vec<u32>,
    pub aux: Vec<u32>,

    pub constants: Vec<Scalar>,
    /// Per loaded column: top-level index, then struct field indices.
    pub columns: Vec<Vec<usize>>,
    /// Per window: registers holding its order keys. Empty means native row order.
    pub windows: Vec<Vec<u32>>,
}

impl Program {
    pub fn len(&self) -> usize { self.ops.len() }
    pub fn is_empty(&self) -> bool { self.ops.is_empty() }

    fn push(&mut self, op: OpCode, p1: u32, p2: u32, aux: u32) -> u32 {
        self.ops.push(op);
        self.p1.push(p1);
        self.p2.push(p2);
        self.aux.push(aux);
        (self.ops.len() - 1) as u32
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.ops.len() {
            writeln!(f, "r{:<3} = {:?}({}, {}, {})", i, self.ops[i], self.p1[i], self.p2[i], self.aux[i])?;
        }
        Ok(())
    }
}

pub struct Compiler<'a> {
    table: &'a Table,
}

impl<'a> Compiler<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self { table }
    }

    /// Lowers an expression tree into a linear program.
    ///
    /// Children are emitted before their parent (post-order), so every operand
    /// register precedes the instruction reading it. Column loads and windows
    /// are shared between identical references.
    pub fn compile(&self, expr: &Expr) -> Result<Program, ComputeError> {
        let mut program = Program::default();
        let mut state = CompileState::default();
        self.emit(expr, &mut program, &mut state)?;
        Ok(program)
    }

    fn emit(&self, expr: &Expr, program: &mut Program, state: &mut CompileState) -> Result<u32, ComputeError> {
        let reg = match expr {
            Expr::Column(name) => {
                let path = self
                    .table
                    .column_path(name)
                    .ok_or_else(|| ComputeError::UnknownColumn(name.clone()))?;
                if let Some(&reg) = state.columns.get(&path) {
                    return Ok(reg);
                }
                let reg = program.push(OpCode::LoadColumn, 0, 0, program.columns.len() as u32);
                program.columns.push(path.clone());
                state.columns.insert(path, reg);
                reg
            }
            Expr::Literal(value) => {
                let idx = program.constants.len() as u32;
                program.constants.push(value.clone());
                program.push(OpCode::LoadConst, 0, 0, idx)
            }
            Expr::Lag { expr, offset, window } => {
                let src = self.emit(expr, program, state)?;
                let window_idx = self.emit_window(window, program, state)?;
                program.push(OpCode::Lag, src, window_idx, *offset)
            }
            Expr::Binary { op, left, right } => {
                let l = self.emit(left, program, state)?;
                let r = self.emit(right, program, state)?;
                program.push((*op).into(), l, r, 0)
            }
            Expr::DateDiff { end, start } => {
                let e = self.emit(end, program, state)?;
                let s = self.emit(start, program, state)?;
                program.push(OpCode::DateDiff, e, s, 0)
            }
            Expr::IsNull(inner) => {
                let r = self.emit(inner, program, state)?;
                program.push(OpCode::IsNull, r, 0, 0)
            }
            Expr::IsNan(inner) => {
                let r = self.emit(inner, program, state)?;
                program.push(OpCode::IsNan, r, 0, 0)
            }
            Expr::Not(inner) => {
                let r = self.emit(inner, program, state)?;
                program.push(OpCode::Not, r, 0, 0)
            }
            Expr::Case { when, then, otherwise } => {
                let c = self.emit(when, program, state)?;
                let t = self.emit(then, program, state)?;
                let o = self.emit(otherwise, program, state)?;
                program.push(OpCode::Case, c, t, o)
            }
        };
        Ok(reg)
    }

    fn emit_window(
        &self,
        window: &WindowSpec,
        program: &mut Program,
        state: &mut CompileState,
    ) -> Result<u32, ComputeError> {
        if let Some(pos) = state.windows.iter().position(|w| w == window) {
            return Ok(pos as u32);
        }

        // Literal keys sort every row equal, which leaves the native order.
        let keys = if window.order_by.iter().all(Expr::is_literal) {
            Vec::new()
        } else {
            window
                .order_by
                .iter()
                .map(|key| self.emit(key, program, state))
                .collect::<Result<Vec<_>, _>>()?
        };

        program.windows.push(keys);
        state.windows.push(window.clone());
        Ok((program.windows.len() - 1) as u32)
    }
}

#[derive(Default)]
struct CompileState {
    columns: HashMap<Vec<usize>, u32>,
    windows: Vec<WindowSpec>,
}
