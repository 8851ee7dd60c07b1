//! Bit-width inference by tracing a kernel over an input set.
//!
//! Kernels are branch-free, so every input vector drives the exact same sequence of
//! operations. Running the kernel over probe values that record the width of each result
//! gives, per operation index, the widest value that operation produced on the input set.
//! That is all a compiler knows about the ranges of the circuit: a value combination the set
//! never exercised may need more bits than were traced.

use super::CircuitError;
use crate::inputset::{InputSet, InputVector};
use crate::kernels::{lanes, Kernel, Oblivious, LANES};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Min,
    Max,
    Add,
    Mul,
    DivClear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracedOp {
    pub kind: OpKind,
    pub width: u32,
}

/// Number of bits needed to represent `value`, at least one.
pub fn bit_width(value: u64) -> u32 {
    (u64::BITS - value.leading_zeros()).max(1)
}

/// Keep the low `width` bits of `value`.
pub fn truncate(value: u64, width: u32) -> u64 {
    if width >= u64::BITS {
        value
    } else {
        value & ((1 << width) - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Record,
    Replay,
}

/// Operation log shared by every probe of one kernel evaluation.
#[derive(Debug)]
struct Tape {
    mode: Mode,
    ops: RefCell<Vec<TracedOp>>,
    cursor: Cell<usize>,
    drifted: Cell<bool>,
}

impl Tape {
    fn recording() -> Self {
        Self {
            mode: Mode::Record,
            ops: RefCell::new(Vec::new()),
            cursor: Cell::new(0),
            drifted: Cell::new(false),
        }
    }

    fn replaying(ops: &[TracedOp]) -> Self {
        Self {
            mode: Mode::Replay,
            ops: RefCell::new(ops.to_vec()),
            cursor: Cell::new(0),
            drifted: Cell::new(false),
        }
    }

    fn rewind(&self) {
        self.cursor.set(0);
    }

    /// Log the result of the next operation and return the value the circuit would hold.
    fn step(&self, kind: OpKind, value: u64) -> u64 {
        let idx = self.cursor.get();
        self.cursor.set(idx + 1);
        let mut ops = self.ops.borrow_mut();
        if self.mode == Mode::Record && idx == ops.len() {
            ops.push(TracedOp {
                kind,
                width: bit_width(value),
            });
            return value;
        }
        match ops.get_mut(idx) {
            Some(op) if op.kind == kind => match self.mode {
                Mode::Record => {
                    op.width = op.width.max(bit_width(value));
                    value
                }
                Mode::Replay => truncate(value, op.width),
            },
            _ => {
                self.drifted.set(true);
                value
            }
        }
    }

    /// Check the pass that just ended executed the traced sequence, then rewind.
    fn end_pass(&self, kernel: Kernel) -> Result<(), CircuitError> {
        let actual = self.cursor.get();
        let expected = self.ops.borrow().len();
        self.rewind();
        if self.drifted.replace(false) || actual != expected {
            return Err(CircuitError::TraceDrift {
                kernel,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

/// A value flowing through a traced kernel.
#[derive(Debug, Clone)]
struct Probe {
    value: u64,
    tape: Rc<Tape>,
}

impl Probe {
    fn apply(&self, kind: OpKind, value: u64) -> Self {
        Self {
            value: self.tape.step(kind, value),
            tape: Rc::clone(&self.tape),
        }
    }
}

impl Oblivious for Probe {
    fn min(&self, other: &Self) -> Self {
        self.apply(OpKind::Min, self.value.min(other.value))
    }

    fn max(&self, other: &Self) -> Self {
        self.apply(OpKind::Max, self.value.max(other.value))
    }

    fn add(&self, other: &Self) -> Self {
        self.apply(OpKind::Add, self.value.wrapping_add(other.value))
    }

    fn mul(&self, other: &Self) -> Self {
        self.apply(OpKind::Mul, self.value.wrapping_mul(other.value))
    }

    fn div_clear(&self, divisor: u64) -> Self {
        self.apply(OpKind::DivClear, self.value / divisor)
    }
}

fn run(kernel: Kernel, tape: &Rc<Tape>, input: &[u64; LANES]) -> Vec<u64> {
    let probes = input.map(|value| Probe {
        value,
        tape: Rc::clone(tape),
    });
    kernel
        .evaluate(&probes)
        .into_iter()
        .map(|p| p.value)
        .collect()
}

/// Widths a kernel was found to need on one input set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calibration {
    kernel: Kernel,
    input_width: u32,
    ops: Vec<TracedOp>,
}

impl Calibration {
    pub fn record(kernel: Kernel, inputs: &InputSet) -> Result<Self, CircuitError> {
        if inputs.is_empty() {
            return Err(CircuitError::EmptyInputSet);
        }
        let tape = Rc::new(Tape::recording());
        let mut input_width = 1;
        for vector in inputs {
            let values = lanes(vector.values())?;
            input_width = values
                .iter()
                .fold(input_width, |w, &v| w.max(bit_width(v)));
            run(kernel, &tape, &values);
            tape.end_pass(kernel)?;
        }
        let ops = tape.ops.borrow().clone();
        let calibration = Self {
            kernel,
            input_width,
            ops,
        };
        debug!(
            %kernel,
            input_width,
            ops = calibration.ops.len(),
            max_width = calibration.max_width(),
            "calibrated"
        );
        Ok(calibration)
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// Widest input element seen while calibrating.
    pub fn input_width(&self) -> u32 {
        self.input_width
    }

    pub fn ops(&self) -> &[TracedOp] {
        &self.ops
    }

    /// Widest value anywhere in the circuit, inputs included.
    pub fn max_width(&self) -> u32 {
        self.ops
            .iter()
            .map(|op| op.width)
            .fold(self.input_width, u32::max)
    }

    /// Lane array of `input`, rejected if any element is wider than the calibrated inputs.
    pub fn check_input(&self, input: &InputVector) -> Result<[u64; LANES], CircuitError> {
        let values = lanes(input.values())?;
        match values.iter().find(|&&v| bit_width(v) > self.input_width) {
            Some(&value) => Err(CircuitError::InputOutOfRange {
                value,
                width: self.input_width,
            }),
            None => Ok(values),
        }
    }

    /// Evaluate with every operation result cut to its calibrated width.
    pub fn replay(&self, input: &InputVector) -> Result<Vec<u64>, CircuitError> {
        let values = self.check_input(input)?;
        let tape = Rc::new(Tape::replaying(&self.ops));
        let out = run(self.kernel, &tape, &values);
        tape.end_pass(self.kernel)?;
        Ok(out)
    }
}
