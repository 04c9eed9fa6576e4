use crate::core::iou::{Iou, IouId};
use crate::store::{IouFilter, IouStore, StoreError};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-process IOU store.
///
/// Records are kept in insertion order, so queries return them in the
/// order they were created. Claims happen under the write lock, which
/// makes [`IouStore::claim_one`] atomic.
#[derive(Debug, Default)]
pub struct InMemoryIouStore {
    records: RwLock<Vec<Iou>>,
}

impl InMemoryIouStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing records, keeping their order.
    ///
    /// Each record goes through [`IouStore::insert`], so an inconsistent
    /// claim state or a repeated id fails the whole seed.
    pub fn from_ious(ious: impl IntoIterator<Item = Iou>) -> Result<Self, StoreError> {
        let store = Self::new();
        for iou in ious {
            store.insert(iou)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Iou>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Iou>>, StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

impl IouStore for InMemoryIouStore {
    fn query(&self, filter: &IouFilter) -> Result<Vec<Iou>, StoreError> {
        Ok(self
            .read()?
            .iter()
            .filter(|iou| filter.matches(iou))
            .cloned()
            .collect())
    }

    fn insert(&self, iou: Iou) -> Result<IouId, StoreError> {
        iou.check_claim_state()?;
        let mut records = self.write()?;
        let id = iou.id();
        if records.iter().any(|existing| existing.id() == id) {
            return Err(StoreError::Duplicate(id));
        }
        records.push(iou);
        Ok(id)
    }

    fn find_one(&self, filter: &IouFilter) -> Result<Option<Iou>, StoreError> {
        Ok(self.read()?.iter().find(|iou| filter.matches(iou)).cloned())
    }

    fn update(&self, iou: &Iou) -> Result<(), StoreError> {
        iou.check_claim_state()?;
        let mut records = self.write()?;
        let slot = records
            .iter_mut()
            .find(|existing| existing.id() == iou.id())
            .ok_or(StoreError::NotFound(iou.id()))?;
        *slot = iou.clone();
        Ok(())
    }

    fn claim_one(
        &self,
        filter: &IouFilter,
        proof_of_completion: Option<String>,
    ) -> Result<Option<Iou>, StoreError> {
        let mut records = self.write()?;
        let Some(iou) = records.iter_mut().find(|iou| filter.matches(iou)) else {
            return Ok(None);
        };
        iou.claim(proof_of_completion)?;
        Ok(Some(iou.clone()))
    }
}
