//! Probe command implementation.

use anyhow::{Context, Result};
use console::style;

use super::common::{prepare_circuit, print_probabilities, resolve_wires};

/// Execute the probe command.
pub fn execute(qubits: usize, hadamard: &[usize], wires: Option<&[usize]>) -> Result<()> {
    println!(
        "{} Probing a {}-qubit register",
        style("→").cyan().bold(),
        style(qubits).yellow()
    );

    let circuit = prepare_circuit(qubits, hadamard, None)?;
    let wires = resolve_wires(&circuit, wires);
    let probs = circuit
        .amplitudes(&wires)
        .context("Failed to compute marginal probabilities")?;

    print_probabilities(&wires, &probs);
    Ok(())
}
