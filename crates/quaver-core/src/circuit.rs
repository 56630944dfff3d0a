//! The `Circuit` facade.

use std::fmt;
use std::sync::Arc;

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use tracing::{debug, instrument};

use crate::backend::{BackendError, DenseBackend, EvaluationBackend};
use crate::error::{CircuitError, CircuitResult};
use crate::gate::{Controls, GateOp};
use crate::measure::{self, Counts, Measurement};
use crate::statevector::Statevector;
use crate::transform;

/// An n-qubit register evolved in place.
///
/// The circuit exclusively owns its [`Statevector`]. Every mutating method
/// validates its arguments first, evaluates on a scratch copy and only then
/// swaps the result in, so an `Err` return leaves the state exactly as it
/// was.
///
/// # Example
///
/// ```rust
/// use quaver_core::{Circuit, Controls};
///
/// let mut circuit = Circuit::with_seed(3, 7).unwrap();
/// circuit.hadamard(&[0, 1]).unwrap();
///
/// let probs = circuit.amplitudes(&[0]).unwrap();
/// assert!((probs[0] - 0.5).abs() < 1e-9);
///
/// circuit.qft(&[0, 1], 2, &Controls::none()).unwrap();
/// circuit.iqft(&[0, 1], 2).unwrap();
///
/// let m = circuit.measure(0, Some(1)).unwrap();
/// assert_eq!(m.outcome, 1);
/// ```
pub struct Circuit {
    state: Statevector,
    backend: Arc<dyn EvaluationBackend>,
    rng: StdRng,
}

impl Circuit {
    /// Create a register of `num_qubits` qubits in |0…0⟩.
    ///
    /// Unforced measurements draw from an entropy-seeded RNG; use
    /// [`Circuit::with_seed`] for reproducible runs.
    pub fn new(num_qubits: usize) -> CircuitResult<Self> {
        Ok(Self::from_statevector(Statevector::new(num_qubits)?))
    }

    /// Create a register whose measurement RNG is seeded with `seed`.
    pub fn with_seed(num_qubits: usize, seed: u64) -> CircuitResult<Self> {
        Ok(Self::new(num_qubits)?.with_rng(StdRng::seed_from_u64(seed)))
    }

    /// Start from an existing state instead of |0…0⟩.
    pub fn from_statevector(state: Statevector) -> Self {
        Self {
            state,
            backend: Arc::new(DenseBackend::new()),
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the evaluation backend.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn EvaluationBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Replace the measurement RNG.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn num_qubits(&self) -> usize {
        self.state.num_qubits()
    }

    /// Read-only view of the amplitudes.
    pub fn state(&self) -> &[Complex64] {
        self.state.amplitudes()
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> Statevector {
        self.state.clone()
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Marginal probability distribution over `wires`.
    ///
    /// Despite the name this returns probabilities, not amplitudes: entry `j`
    /// is the probability that `wires` (first wire most significant) read
    /// `j` in binary.
    pub fn amplitudes(&self, wires: &[usize]) -> CircuitResult<Vec<f64>> {
        self.check_wires(wires)?;
        Ok(measure::marginal_probabilities(&self.state, wires))
    }

    /// Alias of [`Circuit::amplitudes`].
    pub fn probabilities(&self, wires: &[usize]) -> CircuitResult<Vec<f64>> {
        self.amplitudes(wires)
    }

    /// Sample `shots` readouts of `wires` without collapsing the state.
    pub fn sample(&mut self, wires: &[usize], shots: u32) -> CircuitResult<Counts> {
        self.check_wires(wires)?;
        if shots == 0 {
            return Err(CircuitError::InvalidDimension(
                "shots must be at least 1".into(),
            ));
        }
        Ok(measure::sample_counts(
            &self.state,
            wires,
            shots,
            &mut self.rng,
        ))
    }

    // =========================================================================
    // Measurement
    // =========================================================================

    /// Measure `qubit`, collapsing the state.
    ///
    /// With `result = None` the outcome is drawn from the circuit's RNG;
    /// otherwise the given outcome is forced. Forcing an outcome of zero
    /// probability fails with [`CircuitError::ZeroProbabilityState`].
    #[instrument(skip(self))]
    pub fn measure(&mut self, qubit: usize, result: Option<u8>) -> CircuitResult<Measurement> {
        self.check_qubit(qubit)?;
        if let Some(forced) = result {
            if forced > 1 {
                return Err(CircuitError::InvalidDimension(format!(
                    "measurement outcome must be 0 or 1, got {forced}"
                )));
            }
        }

        let p = measure::marginal_probabilities(&self.state, &[qubit])[1].clamp(0.0, 1.0);
        let outcome = match result {
            Some(forced) => forced,
            None => u8::from(self.rng.r#gen::<f64>() < p),
        };

        let collapsed = measure::collapse(&self.state, qubit, outcome)
            .ok_or(CircuitError::ZeroProbabilityState { qubit, outcome })?;
        self.state = collapsed;

        debug!(probability_of_one = p, outcome, "measured");
        Ok(Measurement {
            probability_of_one: p,
            outcome,
        })
    }

    // =========================================================================
    // Gates
    // =========================================================================

    /// Hadamard on every wire in `qubits`, evaluated as one joint unitary.
    pub fn hadamard(&mut self, qubits: &[usize]) -> CircuitResult<()> {
        self.check_wires(qubits)?;
        let ops: Vec<_> = qubits.iter().map(|&q| GateOp::h(q)).collect();
        self.commit(&ops)
    }

    /// Flip `qubit` with Pauli-X when `flag` is set; otherwise do nothing.
    pub fn reset(&mut self, qubit: usize, flag: bool) -> CircuitResult<()> {
        self.check_qubit(qubit)?;
        if flag {
            self.commit(&[GateOp::x(qubit)])?;
        }
        Ok(())
    }

    /// Pauli-X on `qubit`.
    pub fn x(&mut self, qubit: usize) -> CircuitResult<()> {
        self.reset(qubit, true)
    }

    /// `RY(theta)` on `qubit`.
    pub fn ry(&mut self, theta: f64, qubit: usize) -> CircuitResult<()> {
        self.check_qubit(qubit)?;
        self.commit(&[GateOp::ry(theta, qubit)])
    }

    /// Apply an externally built gate sequence.
    ///
    /// All ops are validated before any of them is evaluated.
    pub fn run(&mut self, ops: &[GateOp]) -> CircuitResult<()> {
        for op in ops {
            op.validate(self.num_qubits())?;
        }
        self.commit(ops)
    }

    /// Evolve the state with an opaque gate function.
    ///
    /// `gate` receives the current amplitudes and `params` and returns the
    /// evolved amplitudes. Only the length of the result is checked;
    /// unitarity is the caller's responsibility.
    pub fn apply<P, F>(&mut self, gate: F, params: P) -> CircuitResult<()>
    where
        F: FnOnce(&[Complex64], P) -> Result<Vec<Complex64>, BackendError>,
    {
        let evolved = gate(self.state.amplitudes(), params)?;
        if evolved.len() != self.state.dimension() {
            return Err(CircuitError::InvalidDimension(format!(
                "gate function returned {} amplitudes, expected {}",
                evolved.len(),
                self.state.dimension()
            )));
        }
        self.state = Statevector::from_raw(self.num_qubits(), evolved);
        Ok(())
    }

    // =========================================================================
    // Fourier transforms
    // =========================================================================

    /// Quantum Fourier transform of `wires`, with phases rotated onto
    /// `target`, conditioned on `controls`.
    pub fn qft(&mut self, wires: &[usize], target: usize, controls: &Controls) -> CircuitResult<()> {
        self.check_transform(wires, target, controls)?;
        self.commit(&transform::qft_ops(wires, target, controls))
    }

    /// Inverse of [`Circuit::qft`] for the uncontrolled case.
    pub fn iqft(&mut self, wires: &[usize], target: usize) -> CircuitResult<()> {
        self.check_transform(wires, target, &Controls::none())?;
        self.commit(&transform::iqft_ops(wires, target))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn commit(&mut self, ops: &[GateOp]) -> CircuitResult<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let evolved = self.backend.evaluate(&self.state, ops)?;
        if evolved.dimension() != self.state.dimension() {
            return Err(BackendError::DimensionMismatch {
                expected: self.state.dimension(),
                got: evolved.dimension(),
            }
            .into());
        }
        debug!(
            backend = self.backend.name(),
            ops = ops.len(),
            "committed evaluation"
        );
        self.state = evolved;
        Ok(())
    }

    fn check_qubit(&self, qubit: usize) -> CircuitResult<()> {
        if qubit >= self.num_qubits() {
            return Err(CircuitError::out_of_range(qubit, self.num_qubits()));
        }
        Ok(())
    }

    fn check_wires(&self, wires: &[usize]) -> CircuitResult<()> {
        let mut seen = FxHashSet::default();
        for &q in wires {
            self.check_qubit(q)?;
            if !seen.insert(q) {
                return Err(CircuitError::duplicate(q));
            }
        }
        Ok(())
    }

    /// `wires`, `target` and control qubits must be distinct and in range.
    fn check_transform(
        &self,
        wires: &[usize],
        target: usize,
        controls: &Controls,
    ) -> CircuitResult<()> {
        let mut all = Vec::with_capacity(wires.len() + controls.len() + 1);
        all.extend_from_slice(wires);
        all.push(target);
        all.extend_from_slice(controls.qubits());
        self.check_wires(&all)
    }
}

impl fmt::Debug for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Circuit")
            .field("num_qubits", &self.num_qubits())
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}
