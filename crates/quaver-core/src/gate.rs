//! Unitary gate descriptions.
//!
//! A [`GateOp`] is a dense `2^k × 2^k` unitary block acting on `k` target
//! wires, optionally conditioned on a set of control wires holding given
//! values. The block's local basis orders the targets most-significant
//! first, matching the register convention (`targets[0]` is the high bit).

use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

use ndarray::{Array2, array};
use num_complex::Complex64;
use rustc_hash::FxHashSet;

use crate::error::{CircuitError, CircuitResult};

/// Dense matrix of a gate block.
pub type GateMatrix = Array2<Complex64>;

/// Control wires and the value each one must hold for a gate to fire.
///
/// The empty set means "apply unconditionally".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Controls {
    qubits: Vec<usize>,
    values: Vec<bool>,
}

impl Controls {
    /// No controls: the gate always fires.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build controls from parallel qubit / value lists.
    ///
    /// Values must be `0` or `1` and both lists must have the same length.
    pub fn new(qubits: &[usize], values: &[u8]) -> CircuitResult<Self> {
        if qubits.len() != values.len() {
            return Err(CircuitError::InvalidDimension(format!(
                "{} control qubits but {} control values",
                qubits.len(),
                values.len()
            )));
        }
        let values = values
            .iter()
            .map(|&v| match v {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(CircuitError::InvalidDimension(format!(
                    "control value must be 0 or 1, got {other}"
                ))),
            })
            .collect::<CircuitResult<Vec<_>>>()?;
        Ok(Self {
            qubits: qubits.to_vec(),
            values,
        })
    }

    /// Controls that all require `|1⟩`.
    pub fn ones(qubits: &[usize]) -> Self {
        Self {
            qubits: qubits.to_vec(),
            values: vec![true; qubits.len()],
        }
    }

    /// Add one more control.
    #[must_use]
    pub fn and(mut self, qubit: usize, value: bool) -> Self {
        self.qubits.push(qubit);
        self.values.push(value);
        self
    }

    /// Control qubits, in insertion order.
    pub fn qubits(&self) -> &[usize] {
        &self.qubits
    }

    /// Required values, parallel to [`Controls::qubits`].
    pub fn values(&self) -> &[bool] {
        &self.values
    }

    /// Iterate over `(qubit, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, bool)> + '_ {
        self.qubits.iter().copied().zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.qubits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qubits.is_empty()
    }
}

/// One (optionally controlled) unitary block.
#[derive(Debug, Clone, PartialEq)]
pub struct GateOp {
    name: String,
    matrix: GateMatrix,
    targets: Vec<usize>,
    controls: Controls,
}

impl GateOp {
    /// Create an uncontrolled gate from an explicit matrix.
    ///
    /// Shape is checked by [`GateOp::validate`], not here, so that ops can be
    /// assembled freely and rejected as a whole before evaluation.
    pub fn new(name: impl Into<String>, matrix: GateMatrix, targets: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            matrix,
            targets,
            controls: Controls::none(),
        }
    }

    /// Hadamard on `qubit`.
    pub fn h(qubit: usize) -> Self {
        Self::new("h", matrices::hadamard(), vec![qubit])
    }

    /// Pauli-X on `qubit`.
    pub fn x(qubit: usize) -> Self {
        Self::new("x", matrices::pauli_x(), vec![qubit])
    }

    /// Y-axis rotation `RY(θ)` on `qubit`.
    pub fn ry(theta: f64, qubit: usize) -> Self {
        Self::new("ry", matrices::ry(theta), vec![qubit])
    }

    /// Real rotation `[[cos θ, −sin θ], [sin θ, cos θ]]` on `qubit`.
    ///
    /// This is the block the Fourier cascades write onto their target wire;
    /// it equals `RY(2θ)`.
    pub fn rotation(theta: f64, qubit: usize) -> Self {
        Self::new("rot", matrices::rotation(theta), vec![qubit])
    }

    /// SWAP of `a` and `b`.
    pub fn swap(a: usize, b: usize) -> Self {
        Self::new("swap", matrices::swap(), vec![a, b])
    }

    /// Condition this gate on `controls` (appended to any existing ones).
    #[must_use]
    pub fn controlled(mut self, controls: &Controls) -> Self {
        for (qubit, value) in controls.iter() {
            self.controls = self.controls.and(qubit, value);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matrix(&self) -> &GateMatrix {
        &self.matrix
    }

    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// Check the op against a register of `num_qubits` qubits.
    ///
    /// Rejects empty target lists, out-of-range or repeated wires (targets
    /// and controls together), and matrices whose shape is not
    /// `2^targets × 2^targets`.
    pub fn validate(&self, num_qubits: usize) -> CircuitResult<()> {
        if self.targets.is_empty() {
            return Err(CircuitError::InvalidDimension(format!(
                "gate '{}' has no target wires",
                self.name
            )));
        }

        let mut seen = FxHashSet::default();
        for &qubit in self.targets.iter().chain(self.controls.qubits()) {
            if qubit >= num_qubits {
                return Err(CircuitError::out_of_range(qubit, num_qubits));
            }
            if !seen.insert(qubit) {
                return Err(CircuitError::duplicate(qubit));
            }
        }

        let dim = 1usize << self.targets.len();
        if self.matrix.dim() != (dim, dim) {
            let (rows, cols) = self.matrix.dim();
            return Err(CircuitError::InvalidDimension(format!(
                "gate '{}' on {} wires needs a {dim}x{dim} matrix, got {rows}x{cols}",
                self.name,
                self.targets.len()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for GateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (i, t) in self.targets.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}q{t}")?;
        }
        if !self.controls.is_empty() {
            write!(f, " if")?;
            for (q, v) in self.controls.iter() {
                write!(f, " q{q}={}", u8::from(v))?;
            }
        }
        Ok(())
    }
}

/// Standard gate matrices.
pub mod matrices {
    use super::*;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    pub fn hadamard() -> GateMatrix {
        let h = FRAC_1_SQRT_2;
        array![[c(h), c(h)], [c(h), c(-h)]]
    }

    pub fn pauli_x() -> GateMatrix {
        array![[c(0.0), c(1.0)], [c(1.0), c(0.0)]]
    }

    pub fn ry(theta: f64) -> GateMatrix {
        rotation(theta / 2.0)
    }

    pub fn rotation(theta: f64) -> GateMatrix {
        let (s, co) = theta.sin_cos();
        array![[c(co), c(-s)], [c(s), c(co)]]
    }

    pub fn swap() -> GateMatrix {
        array![
            [c(1.0), c(0.0), c(0.0), c(0.0)],
            [c(0.0), c(0.0), c(1.0), c(0.0)],
            [c(0.0), c(1.0), c(0.0), c(0.0)],
            [c(0.0), c(0.0), c(0.0), c(1.0)]
        ]
    }
}
