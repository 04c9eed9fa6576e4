//! # iou-party
//!
//! Tracks favors owed between users as IOUs and detects when the
//! outstanding ones form a closed debt cycle, a "party": alice owes bob,
//! bob owes carol, carol owes alice.
//!
//! ## Architecture
//!
//! - **core** — Users and the IOU entity with its claim lifecycle
//! - **store** — The IOU store contract and an in-memory implementation
//! - **graph** — Debt graph construction and cycle (party) detection
//! - **detection** — Party detection run after each new IOU
//! - **book** — IOU creation and completion, wired to party detection
//! - **config** — Detector configuration
//! - **simulation** — Random IOU networks for stress testing

pub mod book;
pub mod config;
pub mod core;
pub mod detection;
pub mod graph;
pub mod simulation;
pub mod store;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::book::{BookError, Created, IouBook};
    pub use crate::config::DetectorConfig;
    pub use crate::core::iou::Iou;
    pub use crate::core::user::UserId;
    pub use crate::detection::{DetectionError, PartyDetector};
    pub use crate::graph::cycle_detection::{Party, Traversal};
    pub use crate::graph::debt_graph::DebtGraph;
    pub use crate::store::memory::InMemoryIouStore;
    pub use crate::store::{IouFilter, IouStore, StoreError};
}
