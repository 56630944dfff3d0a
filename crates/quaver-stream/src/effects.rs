//! Chunk functions built on the circuit engine.

use std::f64::consts::PI;

use quaver_core::{Circuit, CircuitError, CircuitResult, Controls, GateOp};
use tracing::{debug, trace, warn};

use crate::batch::ChunkContext;
use crate::chunk;

/// RY angle that encodes `sample ∈ [-1, 1]` as `P(|1⟩) = (1 + sample) / 2`.
pub fn encode_angle(sample: f64) -> f64 {
    2.0 * ((1.0 - sample) / 2.0).sqrt().acos()
}

/// Re-estimate every sample from `ctx.shots` measurements.
///
/// Each sample is loaded into a single qubit with [`encode_angle`], read
/// out `ctx.shots` times and decoded as `2·p₁ − 1`. The output therefore
/// carries binomial shot noise that shrinks as `1/√shots`. Samples outside
/// `[-1, 1]` are clipped; non-finite samples decode as silence.
pub fn shot_resample(ctx: &ChunkContext, chunk: &[f64]) -> CircuitResult<Vec<f64>> {
    let mut circuit = ctx.circuit(1)?;
    let mut out = Vec::with_capacity(chunk.len());

    for &sample in chunk {
        if !sample.is_finite() {
            warn!(chunk = ctx.index, "non-finite sample replaced with 0");
        }
        let sample = clip(sample);
        let theta = encode_angle(sample);

        circuit.ry(theta, 0)?;
        let counts = circuit.sample(&[0], ctx.shots)?;
        circuit.ry(-theta, 0)?;

        let estimate = 2.0 * counts.probability("1") - 1.0;
        trace!(sample, estimate, "resampled");
        out.push(estimate);
    }

    Ok(out)
}

/// Two-term variant of [`shot_resample`].
///
/// Term 0 is the resampled signal. Term 1 is the exact X-basis readout of
/// the encoded qubit, `2·P(|1⟩ after H) − 1 = −sin θ`, which is zero at
/// both ends of the range. For use with
/// [`BatchProcessor::process_terms`](crate::BatchProcessor::process_terms).
pub fn shot_resample_terms(ctx: &ChunkContext, chunk: &[f64]) -> CircuitResult<Vec<Vec<f64>>> {
    let resampled = shot_resample(ctx, chunk)?;

    let mut circuit = ctx.circuit(1)?;
    let mut mixed = Vec::with_capacity(chunk.len());
    for &sample in chunk {
        let theta = encode_angle(clip(sample));
        circuit.ry(theta, 0)?;
        circuit.hadamard(&[0])?;
        let p1 = circuit.amplitudes(&[0])?[1];
        circuit.hadamard(&[0])?;
        circuit.ry(-theta, 0)?;
        mixed.push(2.0 * p1 - 1.0);
    }

    Ok(vec![resampled, mixed])
}

/// Channel-qubit rotation for a chunk: `rate · index / total · π`.
///
/// The angle sweeps across the run, so `rate` sets how many half turns
/// the stereo image makes between the first and last chunk.
pub fn rotation_angle(ctx: &ChunkContext, rate: f64) -> f64 {
    if ctx.total == 0 {
        return 0.0;
    }
    rate * ctx.index as f64 / ctx.total as f64 * PI
}

/// Rotate a stereo pair through a channel qubit.
///
/// Every frame is loaded into two qubits: qubit 0 selects the channel
/// (prepared in an even superposition) and qubit 1 holds the sample of the
/// selected channel. `RY(`[`rotation_angle`]`)` on the channel qubit then
/// mixes the two channels; an angle of 0 leaves them alone and π swaps
/// them. Each channel is decoded from `ctx.shots` readouts as
/// `2·P(value = 1 | channel) − 1`, or 0 when no readout landed on it.
///
/// `chunk` must hold exactly two channels of equal length.
pub fn channel_rotation(
    ctx: &ChunkContext,
    chunk: &[Vec<f64>],
    rate: f64,
) -> CircuitResult<Vec<Vec<f64>>> {
    let [left, right] = chunk else {
        return Err(CircuitError::InvalidDimension(format!(
            "channel rotation needs 2 channels, got {}",
            chunk.len()
        )));
    };
    if left.len() != right.len() {
        return Err(CircuitError::InvalidDimension(format!(
            "channel lengths differ: {} and {}",
            left.len(),
            right.len()
        )));
    }

    let alpha = rotation_angle(ctx, rate);
    let left_only = Controls::new(&[0], &[0])?;
    let right_only = Controls::ones(&[0]);
    debug!(chunk = ctx.index, alpha, "rotating channels");

    let mut out = vec![Vec::with_capacity(left.len()), Vec::with_capacity(right.len())];
    for (frame, (&l, &r)) in left.iter().zip(right).enumerate() {
        let mut circuit = Circuit::with_seed(2, chunk::chunk_seed(ctx.seed, frame))?;
        circuit.hadamard(&[0])?;
        circuit.run(&[
            GateOp::ry(encode_angle(clip(l)), 1).controlled(&left_only),
            GateOp::ry(encode_angle(clip(r)), 1).controlled(&right_only),
            GateOp::ry(alpha, 0),
        ])?;

        let counts = circuit.sample(&[0, 1], ctx.shots)?;
        for (channel, stream) in out.iter_mut().enumerate() {
            let ones = counts.get(&format!("{channel}1"));
            let seen = counts.get(&format!("{channel}0")) + ones;
            stream.push(if seen == 0 {
                0.0
            } else {
                2.0 * ones as f64 / seen as f64 - 1.0
            });
        }
    }

    Ok(out)
}

fn clip(sample: f64) -> f64 {
    if sample.is_finite() {
        sample.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
