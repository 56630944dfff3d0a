//! Integration tests for batch processing.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use proptest::prelude::*;
use quaver_core::{CircuitError, Controls};
use quaver_stream::{BatchProcessor, StreamConfig, StreamError, chunk, effects};

fn config(chunk_size: usize, workers: usize, seed: u64) -> StreamConfig {
    StreamConfig {
        chunk_size,
        shots: 512,
        max_workers: Some(workers),
        seed: Some(seed),
        pad_last_chunk: false,
    }
}

fn ramp(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 2.0 * i as f64 / len.max(1) as f64 - 1.0)
        .collect()
}

// ---------------------------------------------------------------------------
// Ordering and reproducibility
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn outputs_keep_chunk_order_under_uneven_work() {
    let processor = BatchProcessor::new(config(3, 4, 1));
    let signal = ramp(20);

    // Early chunks sleep longest so they finish last.
    let out = processor
        .process(&signal, |ctx, chunk| {
            std::thread::sleep(Duration::from_millis(((ctx.total - ctx.index) * 3) as u64));
            Ok(chunk)
        })
        .await
        .unwrap();
    assert_eq!(out, signal);
}

#[tokio::test]
async fn seeded_runs_match_across_worker_counts() {
    let signal = ramp(50);
    let f = |ctx: quaver_stream::ChunkContext, chunk: Vec<f64>| {
        effects::shot_resample(&ctx, &chunk)
    };

    let serial = BatchProcessor::new(config(8, 1, 42))
        .process(&signal, f)
        .await
        .unwrap();
    let parallel = BatchProcessor::new(config(8, 6, 42))
        .process(&signal, f)
        .await
        .unwrap();
    assert_eq!(serial, parallel);

    let reseeded = BatchProcessor::new(config(8, 6, 43))
        .process(&signal, f)
        .await
        .unwrap();
    assert_ne!(serial, reseeded);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrency_never_exceeds_max_workers() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let processor = BatchProcessor::new(config(1, 2, 0));

    let (a, p) = (Arc::clone(&active), Arc::clone(&peak));
    processor
        .run(&ramp(12), move |_, _| {
            let now = a.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            a.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap();

    assert!(peak.load(Ordering::SeqCst) <= 2);
}

// ---------------------------------------------------------------------------
// Padding and terms
// ---------------------------------------------------------------------------

#[tokio::test]
async fn padded_chunks_are_trimmed_on_join() {
    let mut cfg = config(4, 2, 3);
    cfg.pad_last_chunk = true;
    let processor = BatchProcessor::new(cfg);

    let lens = processor
        .run(&ramp(10), |_, chunk| Ok(chunk.len()))
        .await
        .unwrap();
    assert_eq!(lens, vec![4, 4, 4]);

    let out = processor
        .process(&ramp(10), |_, chunk| Ok(chunk))
        .await
        .unwrap();
    assert_eq!(out, ramp(10));
}

#[tokio::test]
async fn multi_term_output_is_transposed() {
    let processor = BatchProcessor::new(config(4, 3, 5));
    let signal = ramp(10);

    let terms = processor
        .process_terms(&signal, |ctx, chunk| {
            effects::shot_resample_terms(&ctx, &chunk)
        })
        .await
        .unwrap();
    assert_eq!(terms.len(), 2);
    assert!(terms.iter().all(|t| t.len() == signal.len()));
}

#[tokio::test]
async fn uneven_term_counts_fail() {
    let processor = BatchProcessor::new(config(2, 2, 5));
    let err = processor
        .process_terms(&ramp(4), |ctx, chunk| {
            Ok(vec![chunk; ctx.index + 1])
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StreamError::TermMismatch {
            chunk: 1,
            expected: 1,
            got: 2
        }
    ));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_chunk_reports_its_index() {
    let processor = BatchProcessor::new(config(2, 2, 0));
    let err = processor
        .run(&ramp(8), |ctx, _| {
            let mut circuit = ctx.circuit(2)?;
            if ctx.index == 2 {
                // Target inside the wire list.
                circuit.qft(&[0, 1], 1, &Controls::none())?;
            }
            Ok(())
        })
        .await
        .unwrap_err();

    match err {
        StreamError::Chunk { index, source } => {
            assert_eq!(index, 2);
            assert!(matches!(source, CircuitError::InvalidDimension(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn panicking_worker_is_reported() {
    let processor = BatchProcessor::new(config(2, 2, 0));
    let err = processor
        .run(&ramp(4), |ctx, _| {
            assert!(ctx.index != 1, "chunk one blew up");
            Ok(())
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StreamError::Worker(_)));
}

#[tokio::test]
async fn zero_chunk_size_is_rejected() {
    let mut cfg = config(1, 1, 0);
    cfg.chunk_size = 0;
    let err = BatchProcessor::new(cfg)
        .run(&ramp(4), |_, _| Ok(()))
        .await
        .unwrap_err();
    assert!(matches!(err, StreamError::InvalidChunkSize));
}

#[tokio::test]
async fn unbounded_worker_setting_still_runs() {
    let cfg = config(4, usize::MAX, 2);
    let out = BatchProcessor::new(cfg)
        .process(&ramp(10), |_, chunk| Ok(chunk))
        .await
        .unwrap();
    assert_eq!(out, ramp(10));
}

// ---------------------------------------------------------------------------
// Multi-channel input
// ---------------------------------------------------------------------------

#[tokio::test]
async fn channels_are_split_at_shared_boundaries() {
    let channels = vec![ramp(7), ramp(7).iter().map(|s| -s).collect()];
    let out = BatchProcessor::new(config(3, 2, 5))
        .process_channels(&channels, |_, chunk| {
            assert_eq!(chunk.len(), 2);
            assert_eq!(chunk[0].len(), chunk[1].len());
            Ok(chunk)
        })
        .await
        .unwrap();
    assert_eq!(out, channels);
}

#[tokio::test]
async fn uneven_channels_are_rejected() {
    let err = BatchProcessor::new(config(2, 2, 5))
        .run_channels(&[ramp(6), ramp(5)], |_, _| Ok(()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StreamError::ChannelLengthMismatch {
            channel: 1,
            expected: 6,
            got: 5
        }
    ));
}

#[tokio::test]
async fn channel_rotation_follows_chunk_position() {
    // Ten one-frame chunks at rate 10: chunk i turns the channel qubit by
    // i·π, so odd chunks swap the pair and even ones leave it.
    let channels = vec![vec![1.0; 10], vec![-1.0; 10]];
    let out = BatchProcessor::new(config(1, 4, 8))
        .process_channels(&channels, |ctx, chunk| {
            effects::channel_rotation(&ctx, &chunk, 10.0)
        })
        .await
        .unwrap();

    assert_eq!(out[0][0], 1.0);
    assert_eq!(out[1][0], -1.0);
    assert_eq!(out[0][9], -1.0);
    assert_eq!(out[1][9], 1.0);
    for i in 0..10 {
        let expected = if i % 2 == 0 { 1.0 } else { -1.0 };
        assert_eq!(out[0][i], expected, "frame {i}");
        assert_eq!(out[1][i], -expected, "frame {i}");
    }
}

// ---------------------------------------------------------------------------
// Configuration files
// ---------------------------------------------------------------------------

#[test]
fn config_file_fills_missing_fields_with_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "chunk_size: 16\nseed: 9").unwrap();

    let cfg = StreamConfig::from_file(file.path()).unwrap();
    assert_eq!(cfg.chunk_size, 16);
    assert_eq!(cfg.seed, Some(9));
    assert_eq!(cfg.shots, 10_000);
}

#[test]
fn invalid_config_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "shots: 0").unwrap();
    assert!(StreamConfig::from_file(file.path()).is_err());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "chunk_size: [not, a, number]").unwrap();
    assert!(StreamConfig::from_file(file.path()).is_err());

    assert!(StreamConfig::from_file("/nonexistent/quaver.yaml").is_err());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn split_then_join_is_identity(
        signal in prop::collection::vec(-1.0f64..1.0, 0..200),
        chunk_size in 1usize..40,
        pad in any::<bool>(),
    ) {
        let chunks = chunk::split(&signal, chunk_size, pad).unwrap();
        prop_assert_eq!(chunks.len(), signal.len().div_ceil(chunk_size));
        if pad {
            prop_assert!(chunks.iter().all(|c| c.len() == chunk_size));
        }
        prop_assert_eq!(chunk::join(chunks, signal.len()), signal);
    }
}
