//! Splitting a signal into chunks and stitching results back together.

use crate::error::{StreamError, StreamResult};

/// Split `signal` into contiguous chunks of `chunk_size` samples.
///
/// The last chunk is short unless `pad` is set, in which case it is
/// zero-padded to full length. An empty signal yields no chunks.
pub fn split(signal: &[f64], chunk_size: usize, pad: bool) -> StreamResult<Vec<Vec<f64>>> {
    if chunk_size == 0 {
        return Err(StreamError::InvalidChunkSize);
    }
    Ok(signal
        .chunks(chunk_size)
        .map(|chunk| {
            let mut chunk = chunk.to_vec();
            if pad {
                chunk.resize(chunk_size, 0.0);
            }
            chunk
        })
        .collect())
}

/// Split equally long channels with shared chunk boundaries.
///
/// The result is indexed `[chunk][channel]`. Channels of different
/// lengths are rejected; no channels yields no chunks.
pub fn split_channels(
    channels: &[Vec<f64>],
    chunk_size: usize,
    pad: bool,
) -> StreamResult<Vec<Vec<Vec<f64>>>> {
    if chunk_size == 0 {
        return Err(StreamError::InvalidChunkSize);
    }
    let Some(expected) = channels.first().map(Vec::len) else {
        return Ok(Vec::new());
    };
    if let Some((channel, got)) = channels
        .iter()
        .map(Vec::len)
        .enumerate()
        .find(|&(_, len)| len != expected)
    {
        return Err(StreamError::ChannelLengthMismatch {
            channel,
            expected,
            got,
        });
    }

    let per_channel = channels
        .iter()
        .map(|channel| split(channel, chunk_size, pad))
        .collect::<StreamResult<Vec<_>>>()?;
    let total = per_channel.first().map_or(0, Vec::len);

    let mut iters: Vec<_> = per_channel.into_iter().map(Vec::into_iter).collect();
    Ok((0..total)
        .map(|_| iters.iter_mut().filter_map(Iterator::next).collect())
        .collect())
}

/// Concatenate processed chunks and truncate to `original_len`.
pub fn join(chunks: Vec<Vec<f64>>, original_len: usize) -> Vec<f64> {
    let mut out: Vec<f64> = chunks.into_iter().flatten().collect();
    out.truncate(original_len);
    out
}

/// Transpose per-chunk multi-term output into one stream per term.
///
/// `outputs[chunk][term]` is the samples of `term` produced for `chunk`;
/// the result holds, for every term, those samples concatenated in chunk
/// order. Every chunk must produce the same number of terms.
pub fn split_terms(outputs: Vec<Vec<Vec<f64>>>) -> StreamResult<Vec<Vec<f64>>> {
    let Some(expected) = outputs.first().map(Vec::len) else {
        return Ok(Vec::new());
    };

    let mut terms: Vec<Vec<f64>> = vec![Vec::new(); expected];
    for (chunk, chunk_terms) in outputs.into_iter().enumerate() {
        if chunk_terms.len() != expected {
            return Err(StreamError::TermMismatch {
                chunk,
                expected,
                got: chunk_terms.len(),
            });
        }
        for (stream, samples) in terms.iter_mut().zip(chunk_terms) {
            stream.extend(samples);
        }
    }
    Ok(terms)
}

/// Per-chunk RNG seed derived from a base seed with the SplitMix64 mixer.
pub fn chunk_seed(base: u64, index: usize) -> u64 {
    let step = (index as u64).wrapping_add(1);
    let mut z = base.wrapping_add(step.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
