//! In-memory record set keyed by identity.
//!
//! One `IndexMap` is both the keyed lookup and the iteration view, so the two
//! can never disagree. Merges only reach a record's metrics, never its key.

use indexmap::IndexMap;

use crate::core::record::{IdentityKey, Metrics, MovieRecord, View};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError
{
    #[error("record {0} already exists")]
    DuplicateKey(IdentityKey),

    #[error("no record for {0}")]
    NotFound(IdentityKey),
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore
{
    records: IndexMap<IdentityKey, MovieRecord>,
}

impl RecordStore
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Bulk build; the first duplicate key aborts the build.
    pub fn from_records<I>(records: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = MovieRecord>,
    {
        let mut store = Self::new();
        for record in records
        {
            store.insert(record)?;
        }
        Ok(store)
    }

    pub fn lookup_exact(
        &self,
        title: &str,
        year: i32,
    ) -> Option<&MovieRecord>
    {
        self.get(&IdentityKey::new(title, year))
    }

    pub fn get(
        &self,
        key: &IdentityKey,
    ) -> Option<&MovieRecord>
    {
        self.records.get(key)
    }

    pub fn contains(
        &self,
        key: &IdentityKey,
    ) -> bool
    {
        self.records.contains_key(key)
    }

    /// Add a new entity. Callers probe first; a clash is a contract violation.
    pub fn insert(
        &mut self,
        record: MovieRecord,
    ) -> Result<(), StoreError>
    {
        let key = record.key();
        if self.records.contains_key(&key)
        {
            return Err(StoreError::DuplicateKey(key));
        }
        self.records.insert(key, record);
        Ok(())
    }

    /// Run `updater` on the metrics of the record at `key`.
    pub fn merge<R>(
        &mut self,
        key: &IdentityKey,
        updater: impl FnOnce(&mut Metrics) -> R,
    ) -> Result<R, StoreError>
    {
        let record = self
            .records
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        Ok(updater(record.metrics_mut()))
    }

    /// All records in insertion order. The borrow keeps the store frozen
    /// while the view is alive.
    pub fn all_records(&self) -> impl Iterator<Item = &MovieRecord>
    {
        self.records.values()
    }

    pub fn view(
        &self,
        view: View,
    ) -> impl Iterator<Item = &MovieRecord>
    {
        self.all_records()
            .filter(move |r| view.admits(r))
    }

    pub fn len(&self) -> usize
    {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.records.is_empty()
    }
}
