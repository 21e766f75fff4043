//! Reconciliation driver: turns incoming observations from either source into
//! inserts or in-place merges on the record store, and persists after every
//! change so an interrupted run loses at most the record in flight.
//!
//! Year skew between sources is absorbed by probing `year`, then `year + 1`,
//! then `year - 1` for an existing entity before creating a new one. The `+1`
//! probe wins when both neighbours exist. A neighbour outside the `i32`
//! range is not probed.

use std::{io, path::PathBuf};

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    core::{
        cache,
        matcher,
        record::{IdentityKey, MovieRecord, PartialMetrics, View},
        store::{RecordStore, StoreError},
        title,
    },
    infra::dictionary::WordCheck,
};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError
{
    #[error("title {raw:?} is empty after normalization")]
    EmptyTitle
    {
        raw: String,
    },

    /// Store contract violated; fatal for the run.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to persist record set")]
    Persist(#[from] io::Error),
}

/// Where the full record set goes after each change.
pub trait RecordSink
{
    fn save(
        &mut self,
        store: &RecordStore,
    ) -> io::Result<()>;
}

/// Rewrites the cache file atomically.
#[derive(Debug, Clone)]
pub struct CacheSink
{
    path: PathBuf,
}

impl CacheSink
{
    pub fn new(path: impl Into<PathBuf>) -> Self
    {
        Self { path: path.into() }
    }
}

impl RecordSink for CacheSink
{
    fn save(
        &mut self,
        store: &RecordStore,
    ) -> io::Result<()>
    {
        cache::save(&self.path, store.all_records())
    }
}

/// Discards saves (dry runs).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RecordSink for NullSink
{
    fn save(
        &mut self,
        _store: &RecordStore,
    ) -> io::Result<()>
    {
        Ok(())
    }
}

/// What a reconcile call did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome
{
    Inserted,
    Merged,
    Unchanged,
}

#[derive(Debug)]
pub struct Reconciled<'a>
{
    pub record: &'a MovieRecord,
    pub outcome: Outcome,
}

/// A candidate a search returned while looking up a known record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit
{
    pub title: String,
    pub year: i32,
    pub metrics: PartialMetrics,
}

/// Result of applying search hits to a known record.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution
{
    /// The candidate at this index matched and was merged.
    Resolved
    {
        candidate: usize,
        changed: bool,
    },
    NoMatch,
    /// The first matching hit reports a source the target already has.
    AlreadyKnown
    {
        candidate: usize,
    },
    /// The target is not in the store (stale hit list).
    UnknownTarget,
}

pub struct Reconciler
{
    store: RecordStore,
    words: Box<dyn WordCheck>,
    sink: Box<dyn RecordSink>,
    saves: usize,
}

impl Reconciler
{
    pub fn new(
        store: RecordStore,
        words: Box<dyn WordCheck>,
        sink: Box<dyn RecordSink>,
    ) -> Self
    {
        Self { store, words, sink, saves: 0 }
    }

    pub fn normalize(
        &self,
        raw: &str,
    ) -> String
    {
        title::normalize(raw, self.words.as_ref())
    }

    /// Existing identity for `title` near `year`, trying `year`, `year + 1`, `year - 1`.
    pub fn probe(
        &self,
        title: &str,
        year: i32,
    ) -> Option<IdentityKey>
    {
        [Some(year), year.checked_add(1), year.checked_sub(1)]
            .into_iter()
            .flatten()
            .map(|y| IdentityKey::new(title, y))
            .find(|key| self.store.contains(key))
    }

    /// Reconcile one scraped observation, inserting or merging as needed.
    #[instrument(level = "debug", skip(self, metrics), fields(source = %metrics.source()))]
    pub fn reconcile_incoming(
        &mut self,
        raw_title: &str,
        raw_year: i32,
        metrics: &PartialMetrics,
    ) -> Result<Reconciled<'_>, ReconcileError>
    {
        let title = self.normalize(raw_title);
        if title.is_empty()
        {
            return Err(ReconcileError::EmptyTitle { raw: raw_title.to_string() });
        }

        let (key, inserted) = match self.probe(&title, raw_year)
        {
            Some(key) =>
            {
                if key.year != raw_year
                {
                    debug!(%key, raw_year, "absorbed year skew");
                }
                (key, false)
            }
            None =>
            {
                let key = IdentityKey::new(title, raw_year);
                debug!(%key, "new record");
                self.store
                    .insert(MovieRecord::new(key.title.clone(), key.year))?;
                (key, true)
            }
        };

        let merged = self
            .store
            .merge(&key, |m| m.apply(metrics))?;

        let outcome = match (inserted, merged)
        {
            (true, _) => Outcome::Inserted,
            (false, true) => Outcome::Merged,
            (false, false) => Outcome::Unchanged,
        };

        if outcome != Outcome::Unchanged
        {
            self.persist()?;
        }

        let record = self
            .store
            .get(&key)
            .ok_or(StoreError::NotFound(key))?;
        Ok(Reconciled { record, outcome })
    }

    /// Apply the first search hit that fuzzily matches `target`.
    ///
    /// Hits are normalized like incoming titles; hits without a usable rating
    /// are passed over. Resolution only fills a missing source: when the first
    /// matching hit reports a source the target already has, nothing is merged.
    #[instrument(level = "debug", skip(self, target, hits), fields(%target, hits = hits.len()))]
    pub fn resolve(
        &mut self,
        target: &IdentityKey,
        hits: &[SearchHit],
    ) -> Result<Resolution, ReconcileError>
    {
        if !self.store.contains(target)
        {
            return Ok(Resolution::UnknownTarget);
        }

        let found = hits
            .iter()
            .enumerate()
            .filter(|(_, hit)| hit.metrics.has_rating())
            .find(|(_, hit)| {
                let candidate = self.normalize(&hit.title);
                matcher::matches(&target.title, &candidate, target.year, hit.year)
            });

        let Some((candidate, hit)) = found
        else
        {
            return Ok(Resolution::NoMatch);
        };

        let known = self
            .store
            .get(target)
            .is_some_and(|r| {
                r.metrics()
                    .has_source(hit.metrics.source())
            });
        if known
        {
            debug!(candidate, source = %hit.metrics.source(), "target already has this source");
            return Ok(Resolution::AlreadyKnown { candidate });
        }

        let changed = self
            .store
            .merge(target, |m| m.apply(&hit.metrics))?;
        if changed
        {
            self.persist()?;
        }

        Ok(Resolution::Resolved { candidate, changed })
    }

    /// Save unconditionally.
    pub fn flush(&mut self) -> Result<(), ReconcileError>
    {
        self.persist()
    }

    fn persist(&mut self) -> Result<(), ReconcileError>
    {
        self.sink
            .save(&self.store)?;
        self.saves += 1;
        Ok(())
    }

    /// Number of saves issued so far.
    pub fn saves(&self) -> usize
    {
        self.saves
    }

    pub fn store(&self) -> &RecordStore
    {
        &self.store
    }

    pub fn into_store(self) -> RecordStore
    {
        self.store
    }

    pub fn all_records(&self) -> impl Iterator<Item = &MovieRecord>
    {
        self.store.all_records()
    }

    pub fn primary_only(&self) -> impl Iterator<Item = &MovieRecord>
    {
        self.store.view(View::PrimaryOnly)
    }

    pub fn secondary_only(&self) -> impl Iterator<Item = &MovieRecord>
    {
        self.store.view(View::SecondaryOnly)
    }

    pub fn both_sources(&self) -> impl Iterator<Item = &MovieRecord>
    {
        self.store.view(View::Both)
    }

    /// Records still waiting on a primary-source lookup.
    pub fn missing_primary(&self) -> impl Iterator<Item = &MovieRecord>
    {
        self.all_records()
            .filter(|r| !r.metrics().has_primary())
    }

    /// Records still waiting on a secondary-source lookup.
    pub fn missing_secondary(&self) -> impl Iterator<Item = &MovieRecord>
    {
        self.all_records()
            .filter(|r| !r.metrics().has_secondary())
    }

    /// Records lacking data from at least one source.
    pub fn unresolved_count(&self) -> usize
    {
        self.all_records()
            .filter(|r| !View::Both.admits(r))
            .count()
    }
}
