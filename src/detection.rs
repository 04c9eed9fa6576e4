//! Party detection service.
//!
//! Runs right after an IOU is created: reads every unsettled IOU, builds
//! a fresh [`DebtGraph`] and searches for a party from the new IOU's
//! giver. Nothing is written back; the caller decides what a party
//! means. Each call owns its graph, so concurrent calls share only the
//! store.

use crate::config::DetectorConfig;
use crate::core::iou::Iou;
use crate::graph::cycle_detection::{find_party_with, Party};
use crate::graph::debt_graph::DebtGraph;
use crate::store::{IouFilter, IouStore, StoreError};
use log::{debug, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectionError {
    /// The unsettled-IOU read failed. Not retried.
    #[error(transparent)]
    StoreRead(#[from] StoreError),
}

pub struct PartyDetector<S> {
    store: S,
    config: DetectorConfig,
}

impl<S: IouStore> PartyDetector<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, DetectorConfig::default())
    }

    pub fn with_config(store: S, config: DetectorConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Check whether `new_iou` closes a party.
    ///
    /// The new IOU's edge is always considered: if the store does not
    /// return it yet (not persisted), it is added after the stored
    /// records. Returns `Ok(None)` when there is no party.
    pub fn detect(&self, new_iou: &Iou) -> Result<Option<Party>, DetectionError> {
        let unsettled = self.store.query(&IouFilter::unsettled())?;
        let mut graph = DebtGraph::from_ious(&unsettled);
        if !unsettled.iter().any(|iou| iou.id() == new_iou.id()) && graph.add_iou(new_iou) {
            debug!("added unpersisted IOU {} to the debt graph", new_iou.id());
        }

        let party = find_party_with(&graph, new_iou.giver(), self.config.traversal);
        match &party {
            Some(p) => info!(
                "party detected after IOU {}: {}",
                new_iou.id(),
                p.members()
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(" -> ")
            ),
            None => debug!("no party detected after IOU {}", new_iou.id()),
        }
        Ok(party)
    }

    /// Build the current unsettled debt graph without searching it.
    pub fn snapshot(&self) -> Result<DebtGraph, DetectionError> {
        let unsettled = self.store.query(&IouFilter::unsettled())?;
        Ok(DebtGraph::from_ious(&unsettled))
    }
}
