use crate::compute::bytecode::{OpCode, Program};
use crate::compute::kernel;
use crate::compute::ledger::{ComputeError, Ledger};
use crate::store::{Scalar, Table};

pub struct Engine;

impl Engine {
    /// Executes the bytecode program against the table and returns the result register.
    pub fn run(program: &Program, table: &Table) -> Result<Vec<Scalar>, ComputeError> {
        // 1. Validate operand references once so the loop can index freely.
        Self::validate_layout(program, table)?;

        let row_count = table.row_count();
        let mut ledger = Ledger::with_capacity(row_count, program.len());
        // Window orders are computed on first use and shared by every lag over that window.
        let mut orders: Vec<Option<Option<Vec<usize>>>> = vec![None; program.windows.len()];

        // 2. Execute
        for i in 0..program.len() {
            let (p1, p2, aux) = (program.p1[i] as usize, program.p2[i] as usize, program.aux[i] as usize);
            let reg = |slot: usize| ledger.get(slot).unwrap_or(&[]);

            let out = match program.ops[i] {
                OpCode::LoadColumn => table
                    .project(&program.columns[aux])
                    .ok_or_else(|| ComputeError::Mismatch { msg: format!("Column path {} does not resolve", aux) })?,
                OpCode::LoadConst => vec![program.constants[aux].clone(); row_count],
                OpCode::Lag => {
                    if orders[p2].is_none() {
                        let keys: Vec<&[Scalar]> = program.windows[p2].iter().map(|&k| reg(k as usize)).collect();
                        let order = (!keys.is_empty()).then(|| kernel::window_order(&keys, row_count));
                        orders[p2] = Some(order);
                    }
                    let order = orders[p2].as_ref().and_then(|o| o.as_deref());
                    kernel::execute_lag(reg(p1), order, aux as u32)
                }
                op @ (OpCode::Sub
                | OpCode::Lt
                | OpCode::LtEq
                | OpCode::And
                | OpCode::DateDiff) => kernel::execute_binary(op, reg(p1), reg(p2))?,
                op @ (OpCode::IsNull | OpCode::IsNan | OpCode::Not) => kernel::execute_unary(op, reg(p1))?,
                OpCode::Case => kernel::execute_case(reg(p1), reg(p2), reg(aux))?,
            };

            ledger.push(out)?;
        }

        ledger
            .into_result()
            .ok_or_else(|| ComputeError::Mismatch { msg: "Program produced no result".into() })
    }

    /// Checks every operand reference before execution starts.
    fn validate_layout(program: &Program, table: &Table) -> Result<(), ComputeError> {
        let len = program.len();
        if program.p1.len() != len || program.p2.len() != len || program.aux.len() != len {
            return Err(ComputeError::Mismatch { msg: "Operand arrays differ in length".into() });
        }

        let earlier = |i: usize, slot: u32, what: &str| -> Result<(), ComputeError> {
            if (slot as usize) < i {
                Ok(())
            } else {
                Err(ComputeError::Mismatch {
                    msg: format!("Instruction {} reads {} register {} that is not yet written", i, what, slot),
                })
            }
        };

        for i in 0..len {
            let (p1, p2, aux) = (program.p1[i], program.p2[i], program.aux[i]);
            match program.ops[i] {
                OpCode::LoadColumn => {
                    let head = program.columns.get(aux as usize).and_then(|path| path.first());
                    if !head.is_some_and(|&h| h < table.columns().len()) {
                        return Err(ComputeError::Mismatch { msg: format!("Column path {} out of range", aux) });
                    }
                }
                OpCode::LoadConst => {
                    if aux as usize >= program.constants.len() {
                        return Err(ComputeError::Mismatch { msg: format!("Constant index {} out of range", aux) });
                    }
                }
                OpCode::Lag => {
                    earlier(i, p1, "source")?;
                    let keys = program.windows.get(p2 as usize).ok_or_else(|| ComputeError::Mismatch {
                        msg: format!("Window index {} out of range", p2),
                    })?;
                    for &k in keys {
                        earlier(i, k, "order key")?;
                    }
                }
                OpCode::IsNull | OpCode::IsNan | OpCode::Not => earlier(i, p1, "operand")?,
                OpCode::Case => {
                    earlier(i, p1, "condition")?;
                    earlier(i, p2, "then")?;
                    earlier(i, aux, "otherwise")?;
                }
                _ => {
                    earlier(i, p1, "left")?;
                    earlier(i, p2, "right")?;
                }
            }
        }
        Ok(())
    }
}
