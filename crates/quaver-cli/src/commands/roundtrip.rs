//! Round-trip command implementation.

use anyhow::{Context, Result};
use console::style;

use quaver_core::{Controls, NORM_TOLERANCE};

use super::common::prepare_circuit;

/// Execute the roundtrip command.
///
/// Fails when the state after `qft` + `iqft` deviates from the prepared
/// state by more than the norm tolerance.
pub fn execute(qubits: usize, wires: &[usize], target: usize, hadamard: &[usize]) -> Result<()> {
    println!(
        "{} QFT round trip on wires {:?} with target {}",
        style("→").cyan().bold(),
        wires,
        style(target).yellow()
    );

    let mut circuit = prepare_circuit(qubits, hadamard, None)?;
    let before = circuit.snapshot();

    circuit
        .qft(wires, target, &Controls::none())
        .context("Forward transform failed")?;
    let peak = circuit
        .state()
        .iter()
        .zip(before.amplitudes())
        .map(|(a, b)| (a - b).norm())
        .fold(0.0, f64::max);

    circuit
        .iqft(wires, target)
        .context("Inverse transform failed")?;
    let deviation = circuit
        .state()
        .iter()
        .zip(before.amplitudes())
        .map(|(a, b)| (a - b).norm())
        .fold(0.0, f64::max);

    println!("  Peak change after qft:  {peak:.3e}");
    println!("  Max deviation after iqft: {}", style(format!("{deviation:.3e}")).yellow());

    if deviation > NORM_TOLERANCE {
        anyhow::bail!("round trip deviated by {deviation:.3e}");
    }

    println!("\n{} State restored", style("✓").green().bold());
    Ok(())
}
