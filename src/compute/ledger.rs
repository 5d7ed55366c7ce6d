use crate::store::Scalar;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
    #[error("Type mismatch: cannot apply '{op}' to {left} and {right}")]
    TypeMismatch { op: &'static str, left: &'static str, right: &'static str },
    #[error("Structural mismatch: {msg}")]
    Mismatch { msg: String },
}

/// Register file for one program run: slot `i` holds the output of instruction `i`.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    registers: Vec<Vec<Scalar>>,
    row_count: usize,
}

impl Ledger {
    pub fn with_capacity(row_count: usize, slots: usize) -> Self {
        Self { registers: Vec::with_capacity(slots), row_count }
    }

    #[inline(always)]
    pub fn get(&self, slot: usize) -> Option<&[Scalar]> {
        self.registers.get(slot).map(Vec::as_slice)
    }

    /// Appends the next register. Every register must span the full row count.
    pub fn push(&mut self, values: Vec<Scalar>) -> Result<usize, ComputeError> {
        if values.len() != self.row_count {
            return Err(ComputeError::Mismatch {
                msg: format!(
                    "Register {} has {} rows, expected {}",
                    self.registers.len(),
                    values.len(),
                    self.row_count
                ),
            });
        }
        self.registers.push(values);
        Ok(self.registers.len() - 1)
    }

    /// Takes the last register, which holds the program result.
    pub fn into_result(mut self) -> Option<Vec<Scalar>> {
        self.registers.pop()
    }
}
