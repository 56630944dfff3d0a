//! Shared helpers for CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use tracing::debug;

use quaver_core::{Circuit, Counts};
use quaver_stream::StreamConfig;

/// Build a register with a Hadamard on every qubit in `hadamard`.
pub fn prepare_circuit(qubits: usize, hadamard: &[usize], seed: Option<u64>) -> Result<Circuit> {
    let mut circuit = match seed {
        Some(seed) => Circuit::with_seed(qubits, seed),
        None => Circuit::new(qubits),
    }
    .with_context(|| format!("Failed to create a {qubits}-qubit register"))?;

    if !hadamard.is_empty() {
        circuit
            .hadamard(hadamard)
            .context("Failed to apply Hadamard")?;
    }
    Ok(circuit)
}

/// `wires` if given, otherwise every qubit in order.
pub fn resolve_wires(circuit: &Circuit, wires: Option<&[usize]>) -> Vec<usize> {
    wires.map_or_else(|| (0..circuit.num_qubits()).collect(), <[usize]>::to_vec)
}

/// Default configuration file location (~/.quaver/config.yaml).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".quaver").join("config.yaml"))
}

/// Load the stream configuration.
///
/// An explicit path must exist; otherwise the default location is used
/// when present, and built-in defaults when not. Environment overrides
/// apply in every case.
pub fn load_config(path: Option<&str>) -> Result<StreamConfig> {
    let file = match path {
        Some(p) => Some(PathBuf::from(p)),
        None => default_config_path().filter(|p| p.exists()),
    };

    let config = StreamConfig::load(file.as_deref()).with_context(|| match &file {
        Some(p) => format!("Failed to load configuration from {}", p.display()),
        None => "Invalid configuration".to_string(),
    })?;
    debug!(file = ?file, ?config, "loaded configuration");
    Ok(config)
}

/// Read a JSON array of samples.
pub fn read_samples(path: &str) -> Result<Vec<f64>> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    let source =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    serde_json::from_str(&source)
        .with_context(|| format!("Expected a JSON array of numbers in {path}"))
}

/// Read a JSON array of equally long sample arrays, one per channel.
pub fn read_channels(path: &str) -> Result<Vec<Vec<f64>>> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    let source =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    serde_json::from_str(&source)
        .with_context(|| format!("Expected a JSON array of sample arrays in {path}"))
}

/// Print a marginal distribution as a bar table.
pub fn print_probabilities(wires: &[usize], probs: &[f64]) {
    println!(
        "\n{} Marginal over wires {:?}:",
        style("✓").green().bold(),
        wires
    );

    for (j, p) in probs.iter().enumerate() {
        let bitstring = format!("{:0width$b}", j, width = wires.len());
        println!(
            "  {}: {:.6} {}",
            style(bitstring).cyan(),
            p,
            style(bar(p * 100.0)).green()
        );
    }
}

/// Print sampled counts, most frequent first.
pub fn print_counts(counts: &Counts) {
    println!(
        "\n{} Results ({} shots):",
        style("✓").green().bold(),
        counts.total_shots()
    );

    let sorted = counts.sorted();
    let total = counts.total_shots() as f64;

    for (bitstring, count) in sorted.iter().take(16) {
        let prob = **count as f64 / total * 100.0;
        println!(
            "  {}: {:>6} ({:>5.2}%) {}",
            style(bitstring).cyan(),
            count,
            prob,
            style(bar(prob)).green()
        );
    }

    if sorted.len() > 16 {
        println!("  ... and {} more outcomes", sorted.len() - 16);
    }
}

fn bar(percent: f64) -> String {
    "█".repeat((percent / 2.0).round() as usize)
}
