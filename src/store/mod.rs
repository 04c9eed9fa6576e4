//! Contract with the durable IOU store.
//!
//! The detection core only reads unsettled IOUs; the lifecycle
//! operations in [`crate::book`] also insert records and claim them.
//! [`memory::InMemoryIouStore`] is the reference implementation.

pub mod memory;

use crate::core::iou::{ClaimError, Iou, IouId, ItemId, RequestId};
use crate::core::user::UserId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by an [`IouStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IOU store unavailable: {0}")]
    Unavailable(String),
    #[error("IOU {0} already exists")]
    Duplicate(IouId),
    #[error("IOU {0} not found")]
    NotFound(IouId),
    #[error(transparent)]
    Claim(#[from] ClaimError),
}

/// Equality filter over IOU fields. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IouFilter {
    pub id: Option<IouId>,
    pub giver: Option<UserId>,
    pub receiver: Option<UserId>,
    pub parent_request: Option<RequestId>,
    pub item: Option<ItemId>,
    pub is_claimed: Option<bool>,
}

impl IouFilter {
    /// All IOUs still owed (`is_claimed = false`).
    pub fn unsettled() -> Self {
        Self {
            is_claimed: Some(false),
            ..Default::default()
        }
    }

    pub fn by_id(id: IouId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn with_giver(mut self, giver: UserId) -> Self {
        self.giver = Some(giver);
        self
    }

    pub fn with_receiver(mut self, receiver: UserId) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn matches(&self, iou: &Iou) -> bool {
        self.id.map_or(true, |id| iou.id() == id)
            && self.giver.as_ref().map_or(true, |g| iou.giver() == g)
            && self
                .receiver
                .as_ref()
                .map_or(true, |r| iou.receiver() == Some(r))
            && self
                .parent_request
                .map_or(true, |p| iou.parent_request() == Some(p))
            && self.item.map_or(true, |item| iou.item() == item)
            && self.is_claimed.map_or(true, |c| iou.is_claimed() == c)
    }
}

/// Record storage for IOUs.
///
/// Implementations are shared between concurrent callers, so every
/// method takes `&self`.
pub trait IouStore: Send + Sync {
    /// All records matching `filter`. Ordering is implementation defined.
    fn query(&self, filter: &IouFilter) -> Result<Vec<Iou>, StoreError>;

    /// Persist a new record and return its id.
    fn insert(&self, iou: Iou) -> Result<IouId, StoreError>;

    /// The first record matching `filter`, if any.
    fn find_one(&self, filter: &IouFilter) -> Result<Option<Iou>, StoreError>;

    /// Overwrite an existing record with the same id.
    fn update(&self, iou: &Iou) -> Result<(), StoreError>;

    /// Find the record matching `filter` and move it to claimed.
    ///
    /// Returns `Ok(None)` when nothing matches. The default goes through
    /// `find_one` + `update` and is not atomic; stores that can lock or
    /// run a transaction should override it.
    fn claim_one(
        &self,
        filter: &IouFilter,
        proof_of_completion: Option<String>,
    ) -> Result<Option<Iou>, StoreError> {
        let Some(mut iou) = self.find_one(filter)? else {
            return Ok(None);
        };
        iou.claim(proof_of_completion)?;
        self.update(&iou)?;
        Ok(Some(iou))
    }
}

impl<S: IouStore + ?Sized> IouStore for Arc<S> {
    fn query(&self, filter: &IouFilter) -> Result<Vec<Iou>, StoreError> {
        (**self).query(filter)
    }

    fn insert(&self, iou: Iou) -> Result<IouId, StoreError> {
        (**self).insert(iou)
    }

    fn find_one(&self, filter: &IouFilter) -> Result<Option<Iou>, StoreError> {
        (**self).find_one(filter)
    }

    fn update(&self, iou: &Iou) -> Result<(), StoreError> {
        (**self).update(iou)
    }

    fn claim_one(
        &self,
        filter: &IouFilter,
        proof_of_completion: Option<String>,
    ) -> Result<Option<Iou>, StoreError> {
        (**self).claim_one(filter, proof_of_completion)
    }
}
