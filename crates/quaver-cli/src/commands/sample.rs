//! Sample command implementation.

use anyhow::{Context, Result};
use console::style;

use super::common::{prepare_circuit, print_counts, resolve_wires};

/// Execute the sample command.
pub fn execute(
    qubits: usize,
    hadamard: &[usize],
    wires: Option<&[usize]>,
    shots: u32,
    seed: Option<u64>,
) -> Result<()> {
    println!(
        "{} Sampling a {}-qubit register ({} shots)",
        style("→").cyan().bold(),
        style(qubits).yellow(),
        shots
    );

    let mut circuit = prepare_circuit(qubits, hadamard, seed)?;
    let wires = resolve_wires(&circuit, wires);
    let counts = circuit
        .sample(&wires, shots)
        .context("Failed to sample register")?;

    print_counts(&counts);
    Ok(())
}
