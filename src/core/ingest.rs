//! Feed ingestion: the seam where a scraper hands raw observations to the
//! reconciler. Each feed line is one record tagged with its source.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::{
    cli::{AppContext, IngestArgs},
    core::{
        reconcile::{Outcome, ReconcileError, Reconciler},
        record::PartialMetrics,
        session::Settings,
    },
    infra::io::CacheLock,
};

/// One scraped observation as written by a scraper: the identity fields plus
/// the `source`-tagged metrics, flattened onto the same line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedRecord
{
    pub title: String,
    pub year: i32,
    #[serde(flatten)]
    pub metrics: PartialMetrics,
}

/// Tallies for one ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary
{
    pub inserted: usize,
    pub merged: usize,
    pub unchanged: usize,
    /// Older than the configured cutoff year
    pub filtered: usize,
    /// Undecodable feed lines or titles that normalize to nothing
    pub skipped: usize,
}

impl IngestSummary
{
    fn record(
        &mut self,
        outcome: Outcome,
    )
    {
        match outcome
        {
            Outcome::Inserted => self.inserted += 1,
            Outcome::Merged => self.merged += 1,
            Outcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Reconcile every line of `text` into `reconciler`.
pub fn ingest_text(
    reconciler: &mut Reconciler,
    text: &str,
    min_year: i32,
    progress: &ProgressBar,
) -> Result<IngestSummary>
{
    let mut summary = IngestSummary::default();

    for (idx, line) in text
        .lines()
        .enumerate()
    {
        let line_no = idx + 1;
        if line
            .trim()
            .is_empty()
        {
            continue;
        }
        progress.inc(1);

        let record: FeedRecord = match serde_json::from_str(line)
        {
            Ok(r) => r,
            Err(e) =>
            {
                warn!(line = line_no, error = %e, "skipping feed line");
                summary.skipped += 1;
                continue;
            }
        };

        if min_year > 0 && record.year < min_year
        {
            summary.filtered += 1;
            continue;
        }

        match reconciler.reconcile_incoming(&record.title, record.year, &record.metrics)
        {
            Ok(done) => summary.record(done.outcome),
            Err(ReconcileError::EmptyTitle { raw }) =>
            {
                warn!(line = line_no, title = %raw, "skipping feed line with empty title");
                summary.skipped += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("reconcile feed line {line_no}")),
        }
    }

    Ok(summary)
}

#[instrument(skip_all, fields(feeds = args.feeds.len()))]
pub fn run(
    args: IngestArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let settings = Settings::resolve(ctx)?;
    let policy = args
        .on_malformed
        .unwrap_or(settings.config.on_malformed);
    let min_year = args
        .min_year
        .unwrap_or(settings.config.min_year);

    let mut lock = settings.cache_lock(ctx)?;
    let _guard = lock
        .as_mut()
        .map(CacheLock::try_acquire)
        .transpose()
        .context("another reel process is using this cache")?;

    let (mut reconciler, _) = settings.open_reconciler(ctx, policy)?;

    let mut total = IngestSummary::default();
    for feed in &args.feeds
    {
        let summary = ingest_file(&mut reconciler, feed, min_year, ctx)?;
        total.inserted += summary.inserted;
        total.merged += summary.merged;
        total.unchanged += summary.unchanged;
        total.filtered += summary.filtered;
        total.skipped += summary.skipped;
    }

    info!(
        inserted = total.inserted,
        merged = total.merged,
        unchanged = total.unchanged,
        filtered = total.filtered,
        skipped = total.skipped,
        records = reconciler.store().len(),
        saves = reconciler.saves(),
        "ingest finished"
    );

    if !ctx.quiet
    {
        let prefix = if ctx.dry_run { "DRY RUN: " } else { "" };
        let line = format!(
            "{prefix}{} inserted, {} merged, {} unchanged, {} filtered, {} skipped; {} records",
            total.inserted,
            total.merged,
            total.unchanged,
            total.filtered,
            total.skipped,
            reconciler.store().len()
        );
        if ctx.no_color
        {
            println!("{line}");
        }
        else
        {
            println!("{}", line.green());
        }
    }

    Ok(())
}

fn ingest_file(
    reconciler: &mut Reconciler,
    feed: &Path,
    min_year: i32,
    ctx: &AppContext,
) -> Result<IngestSummary>
{
    let text =
        fs::read_to_string(feed).with_context(|| format!("read feed: {}", feed.display()))?;

    let progress = if ctx.quiet
    {
        ProgressBar::hidden()
    }
    else
    {
        let lines = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .count();
        let pb = ProgressBar::new(lines as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .context("progress template")?
                .progress_chars("#>-"),
        );
        pb.set_message(feed.display().to_string());
        pb
    };

    let summary = ingest_text(reconciler, &text, min_year, &progress)
        .with_context(|| format!("ingest {}", feed.display()))?;
    progress.finish_and_clear();
    Ok(summary)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::{
        core::{reconcile::NullSink, store::RecordStore},
        infra::dictionary::Dictionary,
    };

    fn reconciler() -> Reconciler
    {
        Reconciler::new(
            RecordStore::new(),
            Box::new(Dictionary::builtin().unwrap()),
            Box::new(NullSink),
        )
    }

    #[test]
    fn feed_lines_parse_with_defaults()
    {
        let r: FeedRecord =
            serde_json::from_str(r#"{"source":"secondary","title":"Alien","year":1979,"rating":98}"#)
                .unwrap();
        assert_eq!(r.metrics, PartialMetrics::Secondary { rating: 98, reviews: 0 });

        let r: FeedRecord = serde_json::from_str(
            r#"{"source":"primary","title":"Alien","year":1979,"rating":8,"genres":["horror"]}"#,
        )
        .unwrap();
        assert_eq!((r.title.as_str(), r.year), ("Alien", 1979));
        assert!(matches!(r.metrics, PartialMetrics::Primary { votes: 0, .. }));
    }

    #[test]
    fn feed_line_without_source_is_rejected()
    {
        let r = serde_json::from_str::<FeedRecord>(r#"{"title":"Alien","year":1979,"rating":98}"#);
        assert!(r.is_err());
    }

    #[test]
    fn ingest_counts_every_kind_of_line()
    {
        let text = r#"
{"source":"primary","title":"Inception","year":2010,"rating":8.8,"votes":2100000,"genres":["action","sci-fi"]}
{"source":"secondary","title":"Inception","year":2011,"rating":87,"reviews":360}
{"source":"secondary","title":"Inception","year":2011,"rating":87,"reviews":360}
{"source":"primary","title":"Metropolis","year":1927,"rating":8.3}
{"source":"tertiary","title":"Nope","year":2000}
{"source":"primary","title":"?!","year":2000,"rating":5.0}
"#;
        let mut r = reconciler();
        let summary = ingest_text(&mut r, text, 1950, &ProgressBar::hidden()).unwrap();

        assert_eq!(
            summary,
            IngestSummary { inserted: 1, merged: 1, unchanged: 1, filtered: 1, skipped: 2 }
        );
        assert_eq!(r.store().len(), 1);
        assert_eq!(r.both_sources().count(), 1);
    }

    #[test]
    fn zero_min_year_keeps_everything()
    {
        let text = r#"{"source":"primary","title":"Metropolis","year":1927,"rating":8.3}"#;
        let mut r = reconciler();
        let summary = ingest_text(&mut r, text, 0, &ProgressBar::hidden()).unwrap();
        assert_eq!(summary.inserted, 1);
    }
}
