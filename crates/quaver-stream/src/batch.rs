//! Parallel per-chunk evaluation.
//!
//! A signal is split into chunks, each chunk is handed to a user function
//! together with a [`ChunkContext`], and the functions run on tokio's
//! blocking pool with at most `max_workers` in flight. Outputs come back
//! in chunk order regardless of completion order.

use std::sync::Arc;
use std::time::Instant;

use quaver_core::{Circuit, CircuitError, CircuitResult};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::chunk;
use crate::config::StreamConfig;
use crate::error::{StreamError, StreamResult};

/// What a chunk function knows about its chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkContext {
    /// Position of the chunk in the signal.
    pub index: usize,
    /// Total number of chunks in the run.
    pub total: usize,
    /// Seed for this chunk's RNG.
    pub seed: u64,
    /// Shots per estimate.
    pub shots: u32,
}

impl ChunkContext {
    /// Fresh `num_qubits` circuit seeded with this chunk's seed.
    pub fn circuit(&self, num_qubits: usize) -> CircuitResult<Circuit> {
        Circuit::with_seed(num_qubits, self.seed)
    }
}

/// Runs a chunk function over a signal.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    config: StreamConfig,
}

impl BatchProcessor {
    pub fn new(config: StreamConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Evaluate `f` on every chunk of `signal` and return the outputs in
    /// chunk order.
    ///
    /// The first failing chunk (by index) fails the batch.
    #[instrument(skip_all, fields(samples = signal.len(), chunk_size = self.config.chunk_size))]
    pub async fn run<T, F>(&self, signal: &[f64], f: F) -> StreamResult<Vec<T>>
    where
        T: Send + 'static,
        F: Fn(ChunkContext, Vec<f64>) -> Result<T, CircuitError> + Send + Sync + 'static,
    {
        let chunks = chunk::split(signal, self.config.chunk_size, self.config.pad_last_chunk)?;
        self.dispatch(chunks, f).await
    }

    /// Multi-channel [`run`](Self::run).
    ///
    /// Every channel is split at the same boundaries and `f` receives one
    /// `Vec` per channel for each chunk. Channels must be equally long.
    #[instrument(skip_all, fields(channels = channels.len(), chunk_size = self.config.chunk_size))]
    pub async fn run_channels<T, F>(&self, channels: &[Vec<f64>], f: F) -> StreamResult<Vec<T>>
    where
        T: Send + 'static,
        F: Fn(ChunkContext, Vec<Vec<f64>>) -> Result<T, CircuitError> + Send + Sync + 'static,
    {
        let chunks =
            chunk::split_channels(channels, self.config.chunk_size, self.config.pad_last_chunk)?;
        self.dispatch(chunks, f).await
    }

    async fn dispatch<C, T, F>(&self, chunks: Vec<C>, f: F) -> StreamResult<Vec<T>>
    where
        C: Send + 'static,
        T: Send + 'static,
        F: Fn(ChunkContext, C) -> Result<T, CircuitError> + Send + Sync + 'static,
    {
        let total = chunks.len();
        let workers = self.config.workers().min(total.max(1));
        let base_seed = self.config.seed.unwrap_or_else(rand::random);
        let start = Instant::now();

        info!(chunks = total, workers, "starting batch");

        let permits = Arc::new(Semaphore::new(workers));
        let f = Arc::new(f);
        let mut handles: Vec<JoinHandle<Result<T, CircuitError>>> = Vec::with_capacity(total);

        for (index, samples) in chunks.into_iter().enumerate() {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|e| StreamError::Worker(e.to_string()))?;
            let ctx = ChunkContext {
                index,
                total,
                seed: chunk::chunk_seed(base_seed, index),
                shots: self.config.shots,
            };
            let f = Arc::clone(&f);
            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                f(ctx, samples)
            }));
        }

        let mut outputs = Vec::with_capacity(total);
        for (index, handle) in handles.into_iter().enumerate() {
            let output = handle
                .await
                .map_err(|e| StreamError::Worker(format!("chunk {index}: {e}")))?
                .map_err(|source| StreamError::Chunk { index, source })?;
            debug!(index, "chunk complete");
            outputs.push(output);
        }

        info!(
            chunks = total,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch complete"
        );
        Ok(outputs)
    }

    /// Run a sample-to-sample function and reassemble the stream.
    ///
    /// Padding added to the last chunk is removed from the result.
    pub async fn process<F>(&self, signal: &[f64], f: F) -> StreamResult<Vec<f64>>
    where
        F: Fn(ChunkContext, Vec<f64>) -> Result<Vec<f64>, CircuitError> + Send + Sync + 'static,
    {
        let outputs = self.run(signal, f).await?;
        Ok(chunk::join(outputs, signal.len()))
    }

    /// Run a function producing several output streams per chunk and
    /// return one concatenated stream per term.
    pub async fn process_terms<F>(&self, signal: &[f64], f: F) -> StreamResult<Vec<Vec<f64>>>
    where
        F: Fn(ChunkContext, Vec<f64>) -> Result<Vec<Vec<f64>>, CircuitError>
            + Send
            + Sync
            + 'static,
    {
        let outputs = self.run(signal, f).await?;
        let mut terms = chunk::split_terms(outputs)?;
        for term in &mut terms {
            term.truncate(signal.len());
        }
        Ok(terms)
    }

    /// Run a multi-channel function and return one reassembled stream per
    /// output channel.
    ///
    /// `f` may return a different number of streams than it receives, but
    /// the same number for every chunk.
    pub async fn process_channels<F>(
        &self,
        channels: &[Vec<f64>],
        f: F,
    ) -> StreamResult<Vec<Vec<f64>>>
    where
        F: Fn(ChunkContext, Vec<Vec<f64>>) -> Result<Vec<Vec<f64>>, CircuitError>
            + Send
            + Sync
            + 'static,
    {
        let len = channels.first().map_or(0, Vec::len);
        let outputs = self.run_channels(channels, f).await?;
        let mut streams = chunk::split_terms(outputs)?;
        for stream in &mut streams {
            stream.truncate(len);
        }
        Ok(streams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, workers: usize) -> StreamConfig {
        StreamConfig {
            chunk_size,
            shots: 100,
            max_workers: Some(workers),
            seed: Some(1),
            pad_last_chunk: false,
        }
    }

    #[tokio::test]
    async fn test_outputs_in_chunk_order() {
        let processor = BatchProcessor::new(config(2, 4));
        let signal: Vec<f64> = (0..9).map(f64::from).collect();
        let indices = processor
            .run(&signal, |ctx, _| Ok((ctx.index, ctx.total)))
            .await
            .unwrap();
        assert_eq!(indices.len(), 5);
        for (i, (index, total)) in indices.into_iter().enumerate() {
            assert_eq!(index, i);
            assert_eq!(total, 5);
        }
    }

    #[tokio::test]
    async fn test_context_builds_seeded_circuit() {
        let processor = BatchProcessor::new(config(1, 2));
        let qubits = processor
            .run(&[0.0, 0.0], |ctx, _| Ok(ctx.circuit(3)?.num_qubits()))
            .await
            .unwrap();
        assert_eq!(qubits, vec![3, 3]);
    }

    #[tokio::test]
    async fn test_workers_capped_by_chunk_count() {
        let processor = BatchProcessor::new(config(4, usize::MAX));
        let out = processor
            .process(&[0.5, -0.5], |_, chunk| Ok(chunk))
            .await
            .unwrap();
        assert_eq!(out, vec![0.5, -0.5]);
    }

    #[tokio::test]
    async fn test_channels_share_context() {
        let processor = BatchProcessor::new(config(2, 2));
        let channels = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let widths = processor
            .run_channels(&channels, |ctx, chunk| {
                Ok((ctx.index, chunk.len(), chunk[0].len()))
            })
            .await
            .unwrap();
        assert_eq!(widths, vec![(0, 2, 2), (1, 2, 1)]);
    }

    #[tokio::test]
    async fn test_empty_signal() {
        let processor = BatchProcessor::new(config(4, 1));
        let out = processor.process(&[], |_, chunk| Ok(chunk)).await.unwrap();
        assert!(out.is_empty());
    }
}
