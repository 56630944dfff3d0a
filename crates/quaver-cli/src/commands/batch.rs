//! Batch command implementation.

use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use quaver_stream::{BatchProcessor, effects};

use super::common::{load_config, read_channels, read_samples};

/// Command-line values that take precedence over the loaded configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub chunk_size: Option<usize>,
    pub shots: Option<u32>,
    pub workers: Option<usize>,
    pub seed: Option<u64>,
}

/// Execute the batch command.
pub async fn execute(
    input: &str,
    output: Option<&str>,
    config_path: Option<&str>,
    overrides: Overrides,
    terms: bool,
    rotate_channels: Option<f64>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(v) = overrides.chunk_size {
        config.chunk_size = v;
    }
    if let Some(v) = overrides.shots {
        config.shots = v;
    }
    if let Some(v) = overrides.workers {
        config.max_workers = Some(v);
    }
    if let Some(v) = overrides.seed {
        config.seed = Some(v);
    }
    config.validate().context("Invalid batch settings")?;

    let start = Instant::now();

    // Progress goes to stderr when the samples themselves go to stdout.
    let report = |line: String| {
        if output.is_some() {
            println!("{line}");
        } else {
            eprintln!("{line}");
        }
    };
    let settings = format!(
        "chunk {}, {} shots, {} workers",
        config.chunk_size,
        config.shots,
        config.workers()
    );
    let processor = BatchProcessor::new(config);

    let json = if let Some(rate) = rotate_channels {
        let channels = read_channels(input)?;
        report(format!(
            "{} Rotating {} channels of {} samples from {} ({settings})",
            style("→").cyan().bold(),
            channels.len(),
            channels.first().map_or(0, Vec::len),
            style(input).green(),
        ));
        let streams = processor
            .process_channels(&channels, move |ctx, chunk| {
                effects::channel_rotation(&ctx, &chunk, rate)
            })
            .await
            .context("Batch processing failed")?;
        serde_json::to_string(&streams)?
    } else {
        let signal = read_samples(input)?;
        report(format!(
            "{} Processing {} samples from {} ({settings})",
            style("→").cyan().bold(),
            signal.len(),
            style(input).green(),
        ));
        if terms {
            let streams = processor
                .process_terms(&signal, |ctx, chunk| {
                    effects::shot_resample_terms(&ctx, &chunk)
                })
                .await
                .context("Batch processing failed")?;
            serde_json::to_string(&streams)?
        } else {
            let samples = processor
                .process(&signal, |ctx, chunk| effects::shot_resample(&ctx, &chunk))
                .await
                .context("Batch processing failed")?;
            serde_json::to_string(&samples)?
        }
    };

    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write output file: {path}"))?;
            report(format!(
                "\n{} Wrote {} in {} ms",
                style("✓").green().bold(),
                style(path).green(),
                start.elapsed().as_millis()
            ));
        }
        None => println!("{json}"),
    }

    Ok(())
}
