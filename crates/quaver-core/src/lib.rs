//! Quaver Statevector Circuit Engine
//!
//! This crate keeps a dense classical representation of an n-qubit register
//! and evolves it with gates, measurements and Fourier transforms. It is the
//! numeric core that batch pipelines instantiate once per data chunk.
//!
//! # Overview
//!
//! - **Amplitude store**: [`Statevector`], `2^n` complex amplitudes with
//!   qubit 0 as the most significant index bit
//! - **Gates**: [`GateOp`] dense unitary blocks with optional [`Controls`]
//! - **Evaluation**: [`EvaluationBackend`] capability, [`DenseBackend`]
//!   in-process implementation
//! - **Measurement**: marginal probabilities, collapse, shot sampling
//! - **Transforms**: controlled QFT and uncontrolled inverse QFT cascades
//! - **Facade**: [`Circuit`] ties the above together
//!
//! # Example: QFT round trip
//!
//! ```rust
//! use quaver_core::{Circuit, Controls};
//!
//! let mut circuit = Circuit::new(4).unwrap();
//! circuit.hadamard(&[0, 2]).unwrap();
//! let before = circuit.snapshot();
//!
//! circuit.qft(&[0, 1, 2], 3, &Controls::none()).unwrap();
//! circuit.iqft(&[0, 1, 2], 3).unwrap();
//!
//! for (a, b) in circuit.state().iter().zip(before.amplitudes()) {
//!     assert!((a - b).norm() < 1e-9);
//! }
//! ```
//!
//! # Memory
//!
//! | Qubits | Memory |
//! |--------|--------|
//! | 10 | ~16 KB |
//! | 20 | ~16 MB |
//! | 25 | ~512 MB |
//! | 30 | ~16 GB |

pub mod backend;
pub mod circuit;
pub mod error;
pub mod gate;
pub mod measure;
pub mod statevector;
pub mod transform;

pub use backend::{BackendError, DenseBackend, EvaluationBackend};
pub use circuit::Circuit;
pub use error::{CircuitError, CircuitResult};
pub use gate::{Controls, GateMatrix, GateOp};
pub use measure::{Counts, Measurement};
pub use statevector::Statevector;

/// Tolerance on ‖ψ‖₂ = 1.
pub const NORM_TOLERANCE: f64 = 1e-9;

/// Largest register a [`Statevector`] will allocate.
pub const MAX_QUBITS: usize = 30;
