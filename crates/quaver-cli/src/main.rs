//! Quaver Command-Line Interface
//!
//! The main entry point for the `quaver` tool: inspect small registers,
//! sample them, check QFT round trips, and push sample streams through the
//! batch pipeline.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{batch, probe, roundtrip, sample, version};

/// Quaver - statevector circuits for sample-stream processing
#[derive(Parser)]
#[command(name = "quaver")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to ~/.quaver/config.yaml if present)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print marginal probabilities of a prepared register
    Probe {
        /// Number of qubits
        #[arg(short, long)]
        qubits: usize,

        /// Qubits to put through a Hadamard (comma separated)
        #[arg(long, value_delimiter = ',')]
        hadamard: Vec<usize>,

        /// Wires to report (all qubits if omitted)
        #[arg(short, long, value_delimiter = ',')]
        wires: Option<Vec<usize>>,
    },

    /// Sample a prepared register without collapsing it
    Sample {
        /// Number of qubits
        #[arg(short, long)]
        qubits: usize,

        /// Qubits to put through a Hadamard (comma separated)
        #[arg(long, value_delimiter = ',')]
        hadamard: Vec<usize>,

        /// Wires to read out (all qubits if omitted)
        #[arg(short, long, value_delimiter = ',')]
        wires: Option<Vec<usize>>,

        /// Number of shots
        #[arg(short, long, default_value = "1024")]
        shots: u32,

        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run a QFT followed by its inverse and report the deviation
    Roundtrip {
        /// Number of qubits
        #[arg(short, long)]
        qubits: usize,

        /// Transform wires (comma separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        wires: Vec<usize>,

        /// Rotation target qubit
        #[arg(short, long)]
        target: usize,

        /// Qubits to put through a Hadamard first (comma separated)
        #[arg(long, value_delimiter = ',')]
        hadamard: Vec<usize>,
    },

    /// Shot-resample a JSON array of samples in parallel chunks
    Batch {
        /// Input file (JSON array of numbers in [-1, 1])
        #[arg(short, long)]
        input: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Samples per chunk
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Shots per sample estimate
        #[arg(short, long)]
        shots: Option<u32>,

        /// Maximum concurrent workers
        #[arg(long)]
        workers: Option<usize>,

        /// Base RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Also emit the X-basis term (output becomes an array of two arrays)
        #[arg(long, conflicts_with = "rotate_channels")]
        terms: bool,

        /// Rotate a stereo input (array of two arrays) by RATE half turns
        /// per run, scaled by chunk position
        #[arg(long, value_name = "RATE")]
        rotate_channels: Option<f64>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Probe {
            qubits,
            hadamard,
            wires,
        } => probe::execute(qubits, &hadamard, wires.as_deref()),

        Commands::Sample {
            qubits,
            hadamard,
            wires,
            shots,
            seed,
        } => sample::execute(qubits, &hadamard, wires.as_deref(), shots, seed),

        Commands::Roundtrip {
            qubits,
            wires,
            target,
            hadamard,
        } => roundtrip::execute(qubits, &wires, target, &hadamard),

        Commands::Batch {
            input,
            output,
            chunk_size,
            shots,
            workers,
            seed,
            terms,
            rotate_channels,
        } => {
            let overrides = batch::Overrides {
                chunk_size,
                shots,
                workers,
                seed,
            };
            batch::execute(
                &input,
                output.as_deref(),
                cli.config.as_deref(),
                overrides,
                terms,
                rotate_channels,
            )
            .await
        }

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("quaver").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_probe() {
        let cli = parse(&["probe", "-q", "3", "--hadamard", "0,2"]).unwrap();
        match cli.command {
            Commands::Probe {
                qubits,
                hadamard,
                wires,
            } => {
                assert_eq!(qubits, 3);
                assert_eq!(hadamard, vec![0, 2]);
                assert!(wires.is_none());
            }
            _ => panic!("expected Probe"),
        }
    }

    #[test]
    fn test_parse_sample_defaults() {
        let cli = parse(&["sample", "--qubits", "2", "--wires", "1,0"]).unwrap();
        match cli.command {
            Commands::Sample {
                shots, seed, wires, ..
            } => {
                assert_eq!(shots, 1024);
                assert!(seed.is_none());
                assert_eq!(wires, Some(vec![1, 0]));
            }
            _ => panic!("expected Sample"),
        }
    }

    #[test]
    fn test_parse_roundtrip_requires_wires() {
        assert!(parse(&["roundtrip", "-q", "3", "-t", "2"]).is_err());
        assert!(parse(&["roundtrip", "-q", "3", "-t", "2", "-w", "0,1"]).is_ok());
    }

    #[test]
    fn test_parse_batch_with_overrides() {
        let cli = parse(&[
            "--config",
            "cfg.yaml",
            "batch",
            "-i",
            "in.json",
            "--chunk-size",
            "32",
            "--workers",
            "2",
            "--terms",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("cfg.yaml"));
        match cli.command {
            Commands::Batch {
                input,
                output,
                chunk_size,
                workers,
                terms,
                ..
            } => {
                assert_eq!(input, "in.json");
                assert!(output.is_none());
                assert_eq!(chunk_size, Some(32));
                assert_eq!(workers, Some(2));
                assert!(terms);
            }
            _ => panic!("expected Batch"),
        }
    }

    #[test]
    fn test_parse_rotate_channels() {
        let cli = parse(&["batch", "-i", "in.json", "--rotate-channels", "10"]).unwrap();
        match cli.command {
            Commands::Batch {
                rotate_channels, ..
            } => assert_eq!(rotate_channels, Some(10.0)),
            _ => panic!("expected Batch"),
        }
        assert!(parse(&["batch", "-i", "in.json", "--terms", "--rotate-channels", "1"]).is_err());
    }

    #[test]
    fn test_parse_verbose_count() {
        let cli = parse(&["-vv", "version"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_no_subcommand() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
