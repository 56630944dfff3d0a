//! Quantum Fourier transform gate cascades.
//!
//! The forward transform writes its phase information onto a separate
//! `target` wire as controlled rotations instead of phase kicks on the
//! register itself:
//!
//! ```text
//!   for j in 0..n:
//!       H(wires[j])                         if controls
//!       for k in j+1..n:
//!           R(2π / 2^(1+k-j)) on target     if controls, wires[j]=1, wires[k]=1
//!   for j in 0..n/2:
//!       SWAP(wires[j], wires[n-1-j])        if controls
//! ```
//!
//! [`iqft_ops`] is the gate-by-gate reversal of [`qft_ops`] without external
//! controls; the two are exact inverses only in that case.

use std::f64::consts::PI;

use crate::gate::{Controls, GateOp};

/// Rotation angle between `wires[j]` and `wires[k]`, `k > j`.
pub fn rotation_angle(j: usize, k: usize) -> f64 {
    debug_assert!(k > j);
    2.0 * PI / 2f64.powi((1 + k - j) as i32)
}

/// Forward transform over `wires`, rotating `target`, gated by `controls`.
pub fn qft_ops(wires: &[usize], target: usize, controls: &Controls) -> Vec<GateOp> {
    let n = wires.len();
    let mut ops = Vec::with_capacity(n * (n + 1) / 2 + n / 2);

    for j in 0..n {
        ops.push(GateOp::h(wires[j]).controlled(controls));
        for k in (j + 1)..n {
            let pair = controls
                .clone()
                .and(wires[j], true)
                .and(wires[k], true);
            ops.push(GateOp::rotation(rotation_angle(j, k), target).controlled(&pair));
        }
    }
    ops.extend(bit_reversal(wires, controls));
    ops
}

/// Inverse transform over `wires`, rotating `target`. Never controlled.
pub fn iqft_ops(wires: &[usize], target: usize) -> Vec<GateOp> {
    let n = wires.len();
    let mut ops = bit_reversal(wires, &Controls::none());

    for j in (0..n).rev() {
        for k in ((j + 1)..n).rev() {
            let pair = Controls::ones(&[wires[j], wires[k]]);
            ops.push(GateOp::rotation(-rotation_angle(j, k), target).controlled(&pair));
        }
        ops.push(GateOp::h(wires[j]));
    }
    ops
}

/// Pairwise SWAPs reversing the order of `wires`.
fn bit_reversal(wires: &[usize], controls: &Controls) -> Vec<GateOp> {
    let n = wires.len();
    (0..n / 2)
        .map(|j| GateOp::swap(wires[j], wires[n - 1 - j]).controlled(controls))
        .collect()
}
