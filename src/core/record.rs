//! Movie records, their identity keys and the partial metrics each source reports.

use std::{collections::BTreeSet, fmt};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Most genres taken from a single genre-bearing update.
pub const GENRE_CAP: usize = 3;

/// `(normalized title, year)`: the only thing that decides record identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey
{
    pub title: String,
    pub year: i32,
}

impl IdentityKey
{
    pub fn new(
        title: impl Into<String>,
        year: i32,
    ) -> Self
    {
        Self { title: title.into(), year }
    }
}

impl fmt::Display for IdentityKey
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        write!(f, "{} ({})", self.title, self.year)
    }
}

/// One of the two independent ratings providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source
{
    Primary,
    Secondary,
}

impl fmt::Display for Source
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        match self
        {
            Source::Primary => write!(f, "primary"),
            Source::Secondary => write!(f, "secondary"),
        }
    }
}

/// Metrics one source reports for a movie in a single observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PartialMetrics
{
    Primary
    {
        rating: f64,
        #[serde(default)]
        votes: u64,
        #[serde(default)]
        genres: Vec<String>,
    },
    Secondary
    {
        rating: u32,
        #[serde(default)]
        reviews: u64,
    },
}

impl PartialMetrics
{
    pub fn source(&self) -> Source
    {
        match self
        {
            PartialMetrics::Primary { .. } => Source::Primary,
            PartialMetrics::Secondary { .. } => Source::Secondary,
        }
    }

    /// Whether the observation carries a usable (non-zero) rating.
    pub fn has_rating(&self) -> bool
    {
        match self
        {
            PartialMetrics::Primary { rating, .. } => known_rating(*rating).is_some(),
            PartialMetrics::Secondary { rating, .. } => *rating != 0,
        }
    }
}

/// Mutable, non-identity part of a record.
///
/// Zero means "not yet known" everywhere in this system, so a zero (or
/// non-finite) value is never stored as `Some`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics
{
    primary_rating: Option<f64>,
    primary_vote_count: Option<u64>,
    secondary_rating: Option<u32>,
    secondary_review_count: Option<u64>,
    genres: BTreeSet<String>,
}

impl Metrics
{
    /// Build from cache-style values where zero denotes unknown.
    pub fn from_raw(
        primary_rating: f64,
        primary_vote_count: u64,
        secondary_rating: u32,
        secondary_review_count: u64,
        genres: impl IntoIterator<Item = String>,
    ) -> Self
    {
        Self {
            primary_rating: known_rating(primary_rating),
            primary_vote_count: known(primary_vote_count),
            secondary_rating: known(secondary_rating),
            secondary_review_count: known(secondary_review_count),
            genres: genres
                .into_iter()
                .filter(|g| !g.trim().is_empty())
                .collect(),
        }
    }

    pub fn primary_rating(&self) -> Option<f64>
    {
        self.primary_rating
    }

    pub fn primary_vote_count(&self) -> Option<u64>
    {
        self.primary_vote_count
    }

    pub fn secondary_rating(&self) -> Option<u32>
    {
        self.secondary_rating
    }

    pub fn secondary_review_count(&self) -> Option<u64>
    {
        self.secondary_review_count
    }

    pub fn genres(&self) -> &BTreeSet<String>
    {
        &self.genres
    }

    pub fn has_primary(&self) -> bool
    {
        self.primary_rating.is_some()
    }

    pub fn has_secondary(&self) -> bool
    {
        self.secondary_rating.is_some()
    }

    pub fn has_source(
        &self,
        source: Source,
    ) -> bool
    {
        match source
        {
            Source::Primary => self.has_primary(),
            Source::Secondary => self.has_secondary(),
        }
    }

    /// Merge one observation; returns whether anything changed.
    ///
    /// Known incoming values overwrite the same source's fields, unknown
    /// (zero) incoming values leave them alone, and the other source's
    /// fields are never touched. Genres only grow.
    pub fn apply(
        &mut self,
        incoming: &PartialMetrics,
    ) -> bool
    {
        match incoming
        {
            PartialMetrics::Primary { rating, votes, genres } =>
            {
                let mut changed = overwrite(&mut self.primary_rating, known_rating(*rating));
                changed |= overwrite(&mut self.primary_vote_count, known(*votes));
                changed |= self.add_genres(genres);
                changed
            }
            PartialMetrics::Secondary { rating, reviews } =>
            {
                let mut changed = overwrite(&mut self.secondary_rating, known(*rating));
                changed |= overwrite(&mut self.secondary_review_count, known(*reviews));
                changed
            }
        }
    }

    /// Add at most `GENRE_CAP` distinct candidates, in the order given.
    fn add_genres(
        &mut self,
        candidates: &[String],
    ) -> bool
    {
        let mut changed = false;
        for genre in candidates
            .iter()
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
            .unique()
            .take(GENRE_CAP)
        {
            changed |= self
                .genres
                .insert(genre.to_string());
        }
        changed
    }
}

/// A movie as one deduplicated entity across both sources.
///
/// `title` and `year` are fixed at creation; only `metrics` ever changes.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord
{
    title: String,
    year: i32,
    metrics: Metrics,
}

impl MovieRecord
{
    pub fn new(
        title: impl Into<String>,
        year: i32,
    ) -> Self
    {
        Self::with_metrics(title, year, Metrics::default())
    }

    pub fn with_metrics(
        title: impl Into<String>,
        year: i32,
        metrics: Metrics,
    ) -> Self
    {
        Self { title: title.into(), year, metrics }
    }

    pub fn title(&self) -> &str
    {
        &self.title
    }

    pub fn year(&self) -> i32
    {
        self.year
    }

    pub fn key(&self) -> IdentityKey
    {
        IdentityKey::new(self.title.clone(), self.year)
    }

    pub fn metrics(&self) -> &Metrics
    {
        &self.metrics
    }

    /// Store-only access; callers outside the store go through `RecordStore::merge`.
    pub(crate) fn metrics_mut(&mut self) -> &mut Metrics
    {
        &mut self.metrics
    }
}

/// Filtered views over a record set, by which sources have reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View
{
    All,
    PrimaryOnly,
    SecondaryOnly,
    Both,
}

impl View
{
    pub fn admits(
        self,
        record: &MovieRecord,
    ) -> bool
    {
        let m = record.metrics();
        match self
        {
            View::All => true,
            View::PrimaryOnly => m.has_primary() && !m.has_secondary(),
            View::SecondaryOnly => !m.has_primary() && m.has_secondary(),
            View::Both => m.has_primary() && m.has_secondary(),
        }
    }
}

fn known<T: Default + PartialEq>(value: T) -> Option<T>
{
    (value != T::default()).then_some(value)
}

fn known_rating(value: f64) -> Option<f64>
{
    (value.is_finite() && value != 0.0).then_some(value)
}

fn overwrite<T: PartialEq>(
    slot: &mut Option<T>,
    incoming: Option<T>,
) -> bool
{
    match incoming
    {
        Some(value) if slot.as_ref() != Some(&value) =>
        {
            *slot = Some(value);
            true
        }
        _ => false,
    }
}
