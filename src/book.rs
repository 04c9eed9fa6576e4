//! IOU lifecycle operations.
//!
//! Creating an IOU persists it and then runs party detection seeded at
//! its giver. Completing an IOU moves it to claimed exactly once, which
//! removes its edge from every later debt graph.

use crate::config::DetectorConfig;
use crate::core::iou::{Iou, IouId, ItemId};
use crate::core::user::UserId;
use crate::detection::{DetectionError, PartyDetector};
use crate::graph::cycle_detection::Party;
use crate::store::{IouFilter, IouStore, StoreError};
use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("an IOU needs a giver")]
    MissingGiver,
    #[error("{0} cannot owe themselves")]
    SelfDebt(UserId),
    #[error("no IOU {id} for user {user}")]
    NotFound { id: IouId, user: UserId },
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The IOU was stored as `id` but detection could not run. The record
    /// stays; retry detection through [`IouBook::detector`] rather than
    /// creating it again.
    #[error("IOU {id} was recorded but party detection failed: {source}")]
    DetectionAfterCreate {
        id: IouId,
        #[source]
        source: DetectionError,
    },
}

/// Outcome of recording a new IOU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub id: IouId,
    /// The party the new IOU closed, if any.
    pub party: Option<Party>,
}

/// Records and settles IOUs against an [`IouStore`].
pub struct IouBook<S> {
    detector: PartyDetector<S>,
}

impl<S: IouStore> IouBook<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, DetectorConfig::default())
    }

    pub fn with_config(store: S, config: DetectorConfig) -> Self {
        Self {
            detector: PartyDetector::with_config(store, config),
        }
    }

    pub fn store(&self) -> &S {
        self.detector.store()
    }

    pub fn detector(&self) -> &PartyDetector<S> {
        &self.detector
    }

    /// Record that `giver` owes `receiver`, with proof of the debt.
    pub fn create_owed(
        &self,
        giver: UserId,
        receiver: UserId,
        item: ItemId,
        proof_of_debt: impl Into<String>,
    ) -> Result<Created, BookError> {
        check_parties(&giver, Some(&receiver))?;
        self.record(Iou::owed(giver, receiver, item, proof_of_debt))
    }

    /// Record that `giver` owes a favor; the receiver may be unknown yet.
    pub fn create_owe(
        &self,
        giver: UserId,
        receiver: Option<UserId>,
        item: ItemId,
    ) -> Result<Created, BookError> {
        check_parties(&giver, receiver.as_ref())?;
        self.record(Iou::owe(giver, receiver, item))
    }

    fn record(&self, iou: Iou) -> Result<Created, BookError> {
        let id = self.store().insert(iou.clone())?;
        debug!("recorded IOU {} ({} -> {:?})", id, iou.giver(), iou.receiver());
        let party = self
            .detector
            .detect(&iou)
            .map_err(|source| BookError::DetectionAfterCreate { id, source })?;
        Ok(Created { id, party })
    }

    /// The receiver redeems an owed IOU.
    pub fn complete_owed(&self, id: IouId, receiver: &UserId) -> Result<Iou, BookError> {
        let filter = IouFilter::by_id(id).with_receiver(receiver.clone());
        self.store()
            .claim_one(&filter, None)?
            .ok_or_else(|| BookError::NotFound {
                id,
                user: receiver.clone(),
            })
    }

    /// The giver proves an owe IOU was fulfilled.
    pub fn complete_owe(
        &self,
        id: IouId,
        giver: &UserId,
        proof_of_completion: impl Into<String>,
    ) -> Result<Iou, BookError> {
        let filter = IouFilter::by_id(id).with_giver(giver.clone());
        self.store()
            .claim_one(&filter, Some(proof_of_completion.into()))?
            .ok_or_else(|| BookError::NotFound {
                id,
                user: giver.clone(),
            })
    }

    pub fn get(&self, id: IouId) -> Result<Option<Iou>, BookError> {
        Ok(self.store().find_one(&IouFilter::by_id(id))?)
    }

    pub fn list(&self, filter: &IouFilter) -> Result<Vec<Iou>, BookError> {
        Ok(self.store().query(filter)?)
    }
}

fn check_parties(giver: &UserId, receiver: Option<&UserId>) -> Result<(), BookError> {
    if giver.is_blank() {
        return Err(BookError::MissingGiver);
    }
    if receiver == Some(giver) {
        return Err(BookError::SelfDebt(giver.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::iou::ClaimError;
    use crate::store::memory::InMemoryIouStore;
    use uuid::Uuid;

    /// Accepts writes but fails every read.
    struct WriteOnlyStore {
        inner: InMemoryIouStore,
    }

    impl IouStore for WriteOnlyStore {
        fn query(&self, _: &IouFilter) -> Result<Vec<Iou>, StoreError> {
            Err(StoreError::Unavailable("read replica down".to_string()))
        }
        fn insert(&self, iou: Iou) -> Result<IouId, StoreError> {
            self.inner.insert(iou)
        }
        fn find_one(&self, filter: &IouFilter) -> Result<Option<Iou>, StoreError> {
            self.inner.find_one(filter)
        }
        fn update(&self, iou: &Iou) -> Result<(), StoreError> {
            self.inner.update(iou)
        }
    }

    fn user(name: &str) -> UserId {
        UserId::new(name)
    }

    fn book() -> IouBook<InMemoryIouStore> {
        IouBook::new(InMemoryIouStore::new())
    }

    #[test]
    fn test_create_owed_records_proof() {
        let book = book();
        let created = book
            .create_owed(user("alice"), user("bob"), Uuid::new_v4(), "Qm-debt")
            .unwrap();
        assert!(created.party.is_none());

        let iou = book.get(created.id).unwrap().unwrap();
        assert_eq!(iou.proof_of_debt(), Some("Qm-debt"));
        assert!(!iou.is_claimed());
    }

    #[test]
    fn test_third_debt_closes_party() {
        let book = book();
        book.create_owe(user("alice"), Some(user("bob")), Uuid::new_v4())
            .unwrap();
        book.create_owe(user("bob"), Some(user("carol")), Uuid::new_v4())
            .unwrap();
        let created = book
            .create_owed(user("carol"), user("alice"), Uuid::new_v4(), "proof")
            .unwrap();

        let party = created.party.unwrap();
        let members: Vec<_> = party.members().iter().map(UserId::as_str).collect();
        assert_eq!(members, vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn test_detection_failure_keeps_recorded_id() {
        let book = IouBook::new(WriteOnlyStore {
            inner: InMemoryIouStore::new(),
        });

        let err = book
            .create_owe(user("alice"), Some(user("bob")), Uuid::new_v4())
            .unwrap_err();
        let (id, source) = match err {
            BookError::DetectionAfterCreate { id, source } => (id, source),
            other => panic!("expected DetectionAfterCreate, got {other:?}"),
        };
        assert!(matches!(
            source,
            DetectionError::StoreRead(StoreError::Unavailable(_))
        ));

        // the record is reachable by the returned id and can still be settled
        assert_eq!(book.store().inner.len().unwrap(), 1);
        let stored = book.get(id).unwrap().unwrap();
        assert_eq!(stored.giver().as_str(), "alice");
        let claimed = book.complete_owe(id, &user("alice"), "done").unwrap();
        assert!(claimed.is_claimed());
    }

    #[test]
    fn test_self_debt_rejected() {
        let err = book()
            .create_owed(user("alice"), user("alice"), Uuid::new_v4(), "p")
            .unwrap_err();
        assert!(matches!(err, BookError::SelfDebt(_)));
    }

    #[test]
    fn test_blank_giver_rejected() {
        let err = book()
            .create_owe(user(""), Some(user("bob")), Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, BookError::MissingGiver));
    }

    #[test]
    fn test_open_offer_has_no_party() {
        let book = book();
        let created = book.create_owe(user("alice"), None, Uuid::new_v4()).unwrap();
        assert!(created.party.is_none());
    }

    #[test]
    fn test_complete_owed_only_by_receiver() {
        let book = book();
        let id = book
            .create_owed(user("alice"), user("bob"), Uuid::new_v4(), "p")
            .unwrap()
            .id;

        assert!(matches!(
            book.complete_owed(id, &user("alice")),
            Err(BookError::NotFound { .. })
        ));

        let claimed = book.complete_owed(id, &user("bob")).unwrap();
        assert!(claimed.is_claimed());
        assert!(claimed.claimed_time().is_some());
        assert!(claimed.proof_of_completion().is_none());
    }

    #[test]
    fn test_complete_owe_records_proof() {
        let book = book();
        let id = book
            .create_owe(user("alice"), Some(user("bob")), Uuid::new_v4())
            .unwrap()
            .id;

        assert!(matches!(
            book.complete_owe(id, &user("bob"), "Qm-done"),
            Err(BookError::NotFound { .. })
        ));

        let claimed = book.complete_owe(id, &user("alice"), "Qm-done").unwrap();
        assert_eq!(claimed.proof_of_completion(), Some("Qm-done"));
        assert!(book
            .list(&IouFilter::unsettled())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_second_completion_fails() {
        let book = book();
        let id = book
            .create_owed(user("alice"), user("bob"), Uuid::new_v4(), "p")
            .unwrap()
            .id;
        book.complete_owed(id, &user("bob")).unwrap();

        let err = book.complete_owed(id, &user("bob")).unwrap_err();
        assert!(matches!(
            err,
            BookError::Store(StoreError::Claim(ClaimError::AlreadyClaimed(_)))
        ));
    }

    #[test]
    fn test_settled_debt_no_longer_closes_party() {
        let book = book();
        book.create_owe(user("alice"), Some(user("bob")), Uuid::new_v4())
            .unwrap();
        let bc = book
            .create_owe(user("bob"), Some(user("carol")), Uuid::new_v4())
            .unwrap()
            .id;
        book.complete_owe(bc, &user("bob"), "done").unwrap();

        let created = book
            .create_owe(user("carol"), Some(user("alice")), Uuid::new_v4())
            .unwrap();
        assert!(created.party.is_none());
    }
}
