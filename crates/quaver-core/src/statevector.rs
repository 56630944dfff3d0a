//! Dense statevector storage and the in-process gate kernel.
//!
//! Bit convention: qubit 0 is the most significant bit of a basis index.
//! For an `n`-qubit register, qubit `q` lives at bit `n - 1 - q`.

use ndarray::Array1;
use num_complex::Complex64;

use crate::error::{CircuitError, CircuitResult};
use crate::gate::GateOp;
use crate::{MAX_QUBITS, NORM_TOLERANCE};

/// A statevector representing a quantum state.
#[derive(Debug, Clone, PartialEq)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> CircuitResult<Self> {
        check_register_size(num_qubits)?;
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Ok(Self {
            amplitudes,
            num_qubits,
        })
    }

    /// Wrap caller-provided amplitudes.
    ///
    /// The vector must have length `2^num_qubits` and unit norm.
    pub fn from_amplitudes(num_qubits: usize, amplitudes: Vec<Complex64>) -> CircuitResult<Self> {
        check_register_size(num_qubits)?;
        if amplitudes.len() != 1 << num_qubits {
            return Err(CircuitError::InvalidDimension(format!(
                "{} amplitudes do not describe a {num_qubits}-qubit register",
                amplitudes.len()
            )));
        }
        let state = Self::from_raw(num_qubits, amplitudes);
        let norm = state.norm();
        if (norm - 1.0).abs() > NORM_TOLERANCE {
            return Err(CircuitError::InvalidDimension(format!(
                "amplitudes have norm {norm}, expected 1"
            )));
        }
        Ok(state)
    }

    /// Unchecked constructor for vectors already known to be `2^n` long.
    pub(crate) fn from_raw(num_qubits: usize, amplitudes: Vec<Complex64>) -> Self {
        debug_assert_eq!(amplitudes.len(), 1 << num_qubits);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Length of the amplitude vector, `2^n`.
    pub fn dimension(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    pub fn into_amplitudes(self) -> Vec<Complex64> {
        self.amplitudes
    }

    /// L2 norm of the amplitude vector.
    pub fn norm(&self) -> f64 {
        l2_norm(&self.amplitudes)
    }

    /// Index mask selecting `qubit`'s bit. `qubit` must be in range.
    #[inline]
    pub(crate) fn mask(&self, qubit: usize) -> usize {
        debug_assert!(
            qubit < self.num_qubits,
            "qubit {qubit} out of range for {} qubits",
            self.num_qubits
        );
        1 << (self.num_qubits - 1 - qubit)
    }

    /// Apply one validated gate block in place.
    ///
    /// Every basis index whose target bits are all zero and whose control
    /// bits match is the base of one `2^k`-dimensional subspace; the block
    /// matrix is applied to the amplitudes gathered from that subspace.
    pub(crate) fn apply_op(&mut self, op: &GateOp) {
        let target_masks: Vec<usize> = op.targets().iter().map(|&q| self.mask(q)).collect();
        let all_targets = target_masks.iter().fold(0, |acc, m| acc | m);
        let (ctrl_mask, ctrl_value) =
            op.controls()
                .iter()
                .fold((0usize, 0usize), |(mask, value), (qubit, on)| {
                    let bit = self.mask(qubit);
                    (mask | bit, if on { value | bit } else { value })
                });

        let width = target_masks.len();
        let local_dim = 1 << width;
        let matrix = op.matrix();
        let mut indices = vec![0usize; local_dim];
        let mut local = Array1::<Complex64>::zeros(local_dim);

        for base in 0..self.amplitudes.len() {
            if base & all_targets != 0 || base & ctrl_mask != ctrl_value {
                continue;
            }
            for (l, slot) in indices.iter_mut().enumerate() {
                let mut i = base;
                for (t, &m) in target_masks.iter().enumerate() {
                    if l & (1 << (width - 1 - t)) != 0 {
                        i |= m;
                    }
                }
                *slot = i;
                local[l] = self.amplitudes[i];
            }
            let out = matrix.dot(&local);
            for (l, &i) in indices.iter().enumerate() {
                self.amplitudes[i] = out[l];
            }
        }
    }

    /// Convert a basis index to a bitstring, qubit 0 first.
    pub fn index_to_bitstring(&self, index: usize) -> String {
        format!("{:0width$b}", index, width = self.num_qubits)
    }
}

pub(crate) fn l2_norm(amplitudes: &[Complex64]) -> f64 {
    amplitudes.iter().map(Complex64::norm_sqr).sum::<f64>().sqrt()
}

fn check_register_size(num_qubits: usize) -> CircuitResult<()> {
    if num_qubits == 0 {
        return Err(CircuitError::InvalidDimension(
            "a register needs at least one qubit".into(),
        ));
    }
    if num_qubits > MAX_QUBITS {
        return Err(CircuitError::InvalidDimension(format!(
            "{num_qubits} qubits exceeds the statevector limit of {MAX_QUBITS}"
        )));
    }
    Ok(())
}
