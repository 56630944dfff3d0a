//! Error types for the core crate.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur in circuit operations.
///
/// Every fallible [`Circuit`](crate::Circuit) method validates its inputs
/// before touching the state, so receiving one of these means the state is
/// exactly what it was before the call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CircuitError {
    /// A qubit index, wire list, control list or vector length does not fit
    /// the register.
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),

    /// Renormalisation after a collapse would divide by a zero norm.
    #[error("Outcome {outcome} on qubit {qubit} has zero probability in the current state")]
    ZeroProbabilityState {
        /// The measured qubit.
        qubit: usize,
        /// The outcome that was requested.
        outcome: u8,
    },

    /// The evaluation backend failed.
    #[error("Backend failure: {0}")]
    BackendFailure(#[from] BackendError),
}

impl CircuitError {
    pub(crate) fn out_of_range(qubit: usize, num_qubits: usize) -> Self {
        CircuitError::InvalidDimension(format!(
            "qubit {qubit} out of range for a {num_qubits}-qubit register"
        ))
    }

    pub(crate) fn duplicate(qubit: usize) -> Self {
        CircuitError::InvalidDimension(format!("qubit {qubit} appears more than once"))
    }
}

/// Result type for circuit operations.
pub type CircuitResult<T> = Result<T, CircuitError>;
