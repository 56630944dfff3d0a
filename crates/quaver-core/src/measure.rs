//! Classical post-processing of a statevector.
//!
//! - [`marginal_probabilities`] - trace out every qubit not in `wires`
//! - [`collapse`] - project one qubit onto an outcome and renormalise
//! - [`sample_counts`] - draw shots from a marginal distribution
//!
//! Everything here operates on validated inputs; range and duplicate
//! checks happen in the [`Circuit`](crate::Circuit) facade.

use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use num_complex::Complex64;

use crate::statevector::{Statevector, l2_norm};

/// Norms below this are treated as zero when renormalising.
pub const ZERO_NORM: f64 = 1e-12;

/// Result of measuring a single qubit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Probability that the qubit was `1` before the collapse.
    pub probability_of_one: f64,
    /// Realised (or forced) outcome, `0` or `1`.
    pub outcome: u8,
}

/// Marginal distribution over `wires`.
///
/// Entry `j` sums `|amp|²` over every basis state whose bits on `wires`
/// spell `j`, with `wires[0]` as the most significant bit of `j`.
pub fn marginal_probabilities(state: &Statevector, wires: &[usize]) -> Vec<f64> {
    let masks: Vec<usize> = wires.iter().map(|&q| state.mask(q)).collect();
    let mut probs = vec![0.0; 1 << wires.len()];

    for (index, amp) in state.amplitudes().iter().enumerate() {
        let j = masks
            .iter()
            .fold(0usize, |acc, &m| (acc << 1) | usize::from(index & m != 0));
        probs[j] += amp.norm_sqr();
    }

    probs
}

/// Collapse `qubit` onto `outcome` and renormalise.
///
/// The vector splits into `2^(qubit+1)` contiguous blocks whose parity is
/// the value of `qubit`; blocks of the other parity are zeroed. Returns
/// `None` when nothing survives, i.e. the outcome had zero probability.
pub fn collapse(state: &Statevector, qubit: usize, outcome: u8) -> Option<Statevector> {
    let blocks = 1usize << (qubit + 1);
    let block_len = state.dimension() / blocks;
    let keep = usize::from(outcome);

    let mut amplitudes = state.amplitudes().to_vec();
    for (b, block) in amplitudes.chunks_mut(block_len).enumerate() {
        if b % 2 != keep {
            block.fill(Complex64::new(0.0, 0.0));
        }
    }

    let norm = l2_norm(&amplitudes);
    if norm < ZERO_NORM {
        return None;
    }
    for amp in &mut amplitudes {
        *amp /= norm;
    }
    Some(Statevector::from_raw(state.num_qubits(), amplitudes))
}

/// Draw `shots` samples from the marginal distribution over `wires`.
///
/// The state is not collapsed; each shot is an independent draw.
pub fn sample_counts<R: Rng + ?Sized>(
    state: &Statevector,
    wires: &[usize],
    shots: u32,
    rng: &mut R,
) -> Counts {
    let probs = marginal_probabilities(state, wires);
    let mut tallies = vec![0u64; probs.len()];
    for _ in 0..shots {
        tallies[sample_index(&probs, rng)] += 1;
    }

    let mut counts = Counts::new();
    for (j, &n) in tallies.iter().enumerate() {
        if n > 0 {
            counts.insert(format!("{:0width$b}", j, width = wires.len()), n);
        }
    }
    counts
}

fn sample_index<R: Rng + ?Sized>(probs: &[f64], rng: &mut R) -> usize {
    let r: f64 = rng.r#gen();
    let mut cumulative = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        cumulative += p;
        if r < cumulative {
            return i;
        }
    }

    // Rounding left the cumulative sum a hair under 1.
    probs.iter().rposition(|&p| p > 0.0).unwrap_or(probs.len() - 1)
}

/// Outcome histogram keyed by bitstring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    counts: FxHashMap<String, u64>,
}

impl Counts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` occurrences of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, n: u64) {
        *self.counts.entry(bitstring.into()).or_insert(0) += n;
    }

    /// Occurrences of `bitstring` (zero if never seen).
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Relative frequency of `bitstring`.
    pub fn probability(&self, bitstring: &str) -> f64 {
        let total = self.total_shots();
        if total == 0 {
            return 0.0;
        }
        self.get(bitstring) as f64 / total as f64
    }

    /// Entries sorted by descending count, ties broken by bitstring.
    pub fn sorted(&self) -> Vec<(&String, &u64)> {
        let mut entries: Vec<_> = self.counts.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateOp;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn plus_zero() -> Statevector {
        let mut sv = Statevector::new(2).unwrap();
        sv.apply_op(&GateOp::h(0));
        sv
    }

    #[test]
    fn test_marginal_orders_wires() {
        let mut sv = Statevector::new(3).unwrap();
        sv.apply_op(&GateOp::x(2));

        assert_eq!(marginal_probabilities(&sv, &[2, 0]), vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(marginal_probabilities(&sv, &[0, 2]), vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_marginal_of_superposition() {
        let probs = marginal_probabilities(&plus_zero(), &[0]);
        assert!((probs[0] - 0.5).abs() < 1e-12);
        assert!((probs[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_collapse_keeps_matching_blocks() {
        let collapsed = collapse(&plus_zero(), 0, 1).unwrap();
        let amps = collapsed.amplitudes();
        assert!(amps[0].norm() < 1e-12);
        assert!((amps[0b10].norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_collapse_zero_probability() {
        let sv = Statevector::new(1).unwrap();
        assert!(collapse(&sv, 0, 1).is_none());
    }

    #[test]
    fn test_sample_counts_deterministic_state() {
        let mut sv = Statevector::new(2).unwrap();
        sv.apply_op(&GateOp::x(1));
        let mut rng = StdRng::seed_from_u64(3);

        let counts = sample_counts(&sv, &[0, 1], 200, &mut rng);
        assert_eq!(counts.get("01"), 200);
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn test_counts_sorted_and_probability() {
        let mut counts = Counts::new();
        counts.insert("00", 3);
        counts.insert("11", 7);
        counts.insert("00", 1);

        assert_eq!(counts.total_shots(), 11);
        let sorted = counts.sorted();
        assert_eq!(sorted[0].0, "11");
        assert!((counts.probability("00") - 4.0 / 11.0).abs() < 1e-12);
        assert_eq!(counts.probability("10"), 0.0);
    }
}
