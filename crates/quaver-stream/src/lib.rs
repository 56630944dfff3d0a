//! Quaver Batch Stream Processing
//!
//! Splits a sample stream into fixed-size chunks, runs a circuit-backed
//! function over every chunk on a bounded pool of blocking workers, and
//! reassembles the outputs in order.
//!
//! Each chunk gets its own [`ChunkContext`] carrying a seed derived from
//! the run's base seed and the chunk index, so a seeded run produces the
//! same output no matter how the chunks were scheduled.
//!
//! # Example
//!
//! ```rust
//! use quaver_stream::{BatchProcessor, StreamConfig, effects};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let config = StreamConfig {
//!     chunk_size: 4,
//!     shots: 256,
//!     seed: Some(7),
//!     ..StreamConfig::default()
//! };
//! let signal = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
//!
//! let out = BatchProcessor::new(config)
//!     .process(&signal, |ctx, chunk| effects::shot_resample(&ctx, &chunk))
//!     .await
//!     .unwrap();
//! assert_eq!(out.len(), signal.len());
//! # });
//! ```

pub mod batch;
pub mod chunk;
pub mod config;
pub mod effects;
pub mod error;

pub use batch::{BatchProcessor, ChunkContext};
pub use config::StreamConfig;
pub use error::{ConfigError, StreamError, StreamResult};
