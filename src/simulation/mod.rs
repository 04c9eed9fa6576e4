//! Synthetic IOU networks for stress tests and benchmarks.

pub mod generator;
