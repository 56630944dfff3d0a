//! CLI command implementations.

pub mod batch;
pub mod common;
pub mod probe;
pub mod roundtrip;
pub mod sample;
pub mod version;
