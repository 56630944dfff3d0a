//! Unitary evaluation backends.
//!
//! The [`Circuit`](crate::Circuit) facade never touches amplitudes while
//! evolving a state: it hands the current [`Statevector`] and a list of
//! [`GateOp`]s to an [`EvaluationBackend`] and commits whatever comes back.
//! [`DenseBackend`] is the in-process implementation; anything else (a
//! remote simulator, a GPU kernel) only has to honour the same contract.
//!
//! ## Contract
//!
//! - `evaluate()` MUST NOT mutate its input; the facade relies on that to
//!   leave the visible state untouched when evaluation fails.
//! - The returned state MUST have the same qubit count as the input.
//! - Ops arrive pre-validated against the register size.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::gate::GateOp;
use crate::statevector::Statevector;

/// Errors surfaced by an evaluation backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    /// The backend cannot evaluate this gate.
    #[error("Unsupported gate: {0}")]
    UnsupportedGate(String),

    /// Evaluation ran but did not produce a state.
    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    /// Returned state does not fit the register.
    #[error("Backend returned {got} amplitudes, expected {expected}")]
    DimensionMismatch {
        /// Expected vector length.
        expected: usize,
        /// Length actually returned.
        got: usize,
    },
}

/// A capability that evolves a state through a sequence of unitary blocks.
pub trait EvaluationBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Apply `ops` in order to a copy of `state` and return the result.
    fn evaluate(&self, state: &Statevector, ops: &[GateOp]) -> Result<Statevector, BackendError>;
}

/// Direct complex linear algebra on the full `2^n` vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseBackend;

impl DenseBackend {
    pub fn new() -> Self {
        Self
    }
}

impl EvaluationBackend for DenseBackend {
    fn name(&self) -> &str {
        "dense"
    }

    #[instrument(skip_all, fields(num_qubits = state.num_qubits(), ops = ops.len()))]
    fn evaluate(&self, state: &Statevector, ops: &[GateOp]) -> Result<Statevector, BackendError> {
        let start = Instant::now();
        let mut scratch = state.clone();
        for op in ops {
            trace!(%op, "applying gate");
            scratch.apply_op(op);
        }
        debug!(elapsed = ?start.elapsed(), "evaluation complete");
        Ok(scratch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_dense_backend_leaves_input_untouched() {
        let backend = DenseBackend::new();
        let input = Statevector::new(2).unwrap();
        let out = backend
            .evaluate(&input, &[GateOp::x(0), GateOp::x(1)])
            .unwrap();

        assert_eq!(input.amplitudes()[0], Complex64::new(1.0, 0.0));
        assert_eq!(out.amplitudes()[3], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_empty_sequence_is_identity() {
        let backend = DenseBackend::new();
        let input = Statevector::new(3).unwrap();
        let out = backend.evaluate(&input, &[]).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_backend_error_messages() {
        let err = BackendError::DimensionMismatch {
            expected: 4,
            got: 3,
        };
        assert_eq!(err.to_string(), "Backend returned 3 amplitudes, expected 4");
    }
}
