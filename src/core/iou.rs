use crate::core::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type IouId = Uuid;
/// Reference into the item/reward catalog.
pub type ItemId = Uuid;
/// Reference to the request an IOU was raised from.
pub type RequestId = Uuid;

/// Errors arising from the claim transition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("IOU {0} is already claimed")]
    AlreadyClaimed(IouId),
    #[error("IOU {0} has inconsistent claim state (is_claimed={1}, claimed_time set={2})")]
    Inconsistent(IouId, bool, bool),
}

/// A single favor owed by `giver` to `receiver`.
///
/// An IOU starts unsettled and is claimed exactly once. While unsettled
/// and with both parties known it is a live edge `giver -> receiver` in
/// the debt graph. A missing receiver marks an open offer.
///
/// # Examples
///
/// ```
/// use iou_party::core::iou::Iou;
/// use iou_party::core::user::UserId;
/// use uuid::Uuid;
///
/// let mut iou = Iou::owed(UserId::new("alice"), UserId::new("bob"), Uuid::new_v4(), "receipt-1");
/// assert!(!iou.is_claimed());
///
/// iou.claim(None).unwrap();
/// assert!(iou.is_claimed());
/// assert!(iou.claimed_time().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iou {
    id: IouId,
    item: ItemId,
    /// The user who owes the favor. Blank only in malformed records.
    #[serde(default)]
    giver: UserId,
    /// The user who is owed the favor.
    #[serde(default)]
    receiver: Option<UserId>,
    #[serde(default)]
    parent_request: Option<RequestId>,
    #[serde(default)]
    proof_of_debt: Option<String>,
    #[serde(default)]
    proof_of_completion: Option<String>,
    created_time: DateTime<Utc>,
    #[serde(default)]
    claimed_time: Option<DateTime<Utc>>,
    #[serde(default)]
    is_claimed: bool,
}

impl Iou {
    /// An IOU the creator owes to a named receiver, backed by a proof of debt.
    pub fn owed(
        giver: UserId,
        receiver: UserId,
        item: ItemId,
        proof_of_debt: impl Into<String>,
    ) -> Self {
        let mut iou = Self::unsettled(giver, Some(receiver), item);
        iou.proof_of_debt = Some(proof_of_debt.into());
        iou
    }

    /// An IOU the creator owes, whose counterpart may be resolved later.
    pub fn owe(giver: UserId, receiver: Option<UserId>, item: ItemId) -> Self {
        Self::unsettled(giver, receiver, item)
    }

    fn unsettled(giver: UserId, receiver: Option<UserId>, item: ItemId) -> Self {
        Self {
            id: Uuid::new_v4(),
            item,
            giver,
            receiver,
            parent_request: None,
            proof_of_debt: None,
            proof_of_completion: None,
            created_time: Utc::now(),
            claimed_time: None,
            is_claimed: false,
        }
    }

    /// Replace the generated id (useful for testing / determinism).
    pub fn with_id(mut self, id: IouId) -> Self {
        self.id = id;
        self
    }

    pub fn with_parent_request(mut self, request: RequestId) -> Self {
        self.parent_request = Some(request);
        self
    }

    /// Claim now. See [`Iou::claim_at`].
    pub fn claim(&mut self, proof_of_completion: Option<String>) -> Result<(), ClaimError> {
        self.claim_at(Utc::now(), proof_of_completion)
    }

    /// Transition to claimed, setting `is_claimed` and `claimed_time`
    /// together. A claim never reverts, so a second call fails and
    /// leaves the record untouched.
    pub fn claim_at(
        &mut self,
        at: DateTime<Utc>,
        proof_of_completion: Option<String>,
    ) -> Result<(), ClaimError> {
        if self.is_claimed || self.claimed_time.is_some() {
            return Err(ClaimError::AlreadyClaimed(self.id));
        }
        self.is_claimed = true;
        self.claimed_time = Some(at);
        if proof_of_completion.is_some() {
            self.proof_of_completion = proof_of_completion;
        }
        Ok(())
    }

    /// `is_claimed` must hold exactly when `claimed_time` is set.
    pub fn check_claim_state(&self) -> Result<(), ClaimError> {
        if self.is_claimed != self.claimed_time.is_some() {
            return Err(ClaimError::Inconsistent(
                self.id,
                self.is_claimed,
                self.claimed_time.is_some(),
            ));
        }
        Ok(())
    }

    /// The debt edge `(giver, receiver)` this IOU contributes while unsettled.
    ///
    /// `None` when either side is missing.
    pub fn edge(&self) -> Option<(&UserId, &UserId)> {
        if self.giver.is_blank() {
            return None;
        }
        match &self.receiver {
            Some(receiver) if !receiver.is_blank() => Some((&self.giver, receiver)),
            _ => None,
        }
    }

    // --- Accessors ---

    pub fn id(&self) -> IouId {
        self.id
    }

    pub fn item(&self) -> ItemId {
        self.item
    }

    pub fn giver(&self) -> &UserId {
        &self.giver
    }

    pub fn receiver(&self) -> Option<&UserId> {
        self.receiver.as_ref()
    }

    pub fn parent_request(&self) -> Option<RequestId> {
        self.parent_request
    }

    pub fn proof_of_debt(&self) -> Option<&str> {
        self.proof_of_debt.as_deref()
    }

    pub fn proof_of_completion(&self) -> Option<&str> {
        self.proof_of_completion.as_deref()
    }

    pub fn created_time(&self) -> DateTime<Utc> {
        self.created_time
    }

    pub fn claimed_time(&self) -> Option<DateTime<Utc>> {
        self.claimed_time
    }

    pub fn is_claimed(&self) -> bool {
        self.is_claimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_owed() -> Iou {
        Iou::owed(
            UserId::new("alice"),
            UserId::new("bob"),
            Uuid::new_v4(),
            "Qm-debt",
        )
    }

    #[test]
    fn test_owed_creation() {
        let iou = sample_owed();
        assert_eq!(iou.giver().as_str(), "alice");
        assert_eq!(iou.receiver().map(UserId::as_str), Some("bob"));
        assert_eq!(iou.proof_of_debt(), Some("Qm-debt"));
        assert!(!iou.is_claimed());
        assert!(iou.claimed_time().is_none());
        assert!(iou.check_claim_state().is_ok());
    }

    #[test]
    fn test_owe_without_receiver_is_open_offer() {
        let iou = Iou::owe(UserId::new("carol"), None, Uuid::new_v4());
        assert!(iou.receiver().is_none());
        assert!(iou.proof_of_debt().is_none());
        assert!(iou.edge().is_none());
    }

    #[test]
    fn test_claim_sets_time_and_flag_together() {
        let mut iou = sample_owed();
        let at = Utc::now();
        iou.claim_at(at, Some("Qm-done".to_string())).unwrap();
        assert!(iou.is_claimed());
        assert_eq!(iou.claimed_time(), Some(at));
        assert_eq!(iou.proof_of_completion(), Some("Qm-done"));
        assert!(iou.check_claim_state().is_ok());
    }

    #[test]
    fn test_claim_is_exactly_once() {
        let mut iou = sample_owed();
        let first = Utc::now();
        iou.claim_at(first, None).unwrap();

        let err = iou.claim(Some("late".to_string())).unwrap_err();
        assert_eq!(err, ClaimError::AlreadyClaimed(iou.id()));
        assert_eq!(iou.claimed_time(), Some(first));
        assert!(iou.proof_of_completion().is_none());
    }

    #[test]
    fn test_edge_requires_both_users() {
        let iou = sample_owed();
        let (giver, receiver) = iou.edge().unwrap();
        assert_eq!(giver.as_str(), "alice");
        assert_eq!(receiver.as_str(), "bob");

        let blank_receiver = Iou::owe(UserId::new("alice"), Some(UserId::new("")), Uuid::new_v4());
        assert!(blank_receiver.edge().is_none());
    }

    #[test]
    fn test_inconsistent_claim_state_detected() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "item": Uuid::new_v4(),
            "giver": "alice",
            "receiver": "bob",
            "created_time": Utc::now(),
            "is_claimed": true
        });
        let iou: Iou = serde_json::from_value(json).unwrap();
        assert!(matches!(
            iou.check_claim_state(),
            Err(ClaimError::Inconsistent(_, true, false))
        ));
    }

    #[test]
    fn test_missing_giver_deserializes_blank() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "item": Uuid::new_v4(),
            "receiver": "bob",
            "created_time": Utc::now()
        });
        let iou: Iou = serde_json::from_value(json).unwrap();
        assert!(iou.giver().is_blank());
        assert!(iou.edge().is_none());
    }
}
