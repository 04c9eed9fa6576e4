//! Debt graph construction and party (debt cycle) detection.

pub mod cycle_detection;
pub mod debt_graph;
