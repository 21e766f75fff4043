//! Whole-file cache load and save.
//!
//! A cache file is a sequence of codec lines, one record each, rewritten in
//! full on every save through an atomic replace.

use std::{fs, io, path::Path};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    core::{
        codec,
        record::MovieRecord,
        store::{RecordStore, StoreError},
    },
    infra::io::write_atomic,
};

/// What to do with a cache line that cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy
{
    /// Log the line and keep loading
    #[default]
    Skip,
    /// Fail the whole load
    Abort,
}

/// A line dropped during load, with its 1-based number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine
{
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadReport
{
    pub store: RecordStore,
    pub skipped: Vec<SkippedLine>,
}

/// Load the cache at `path`; a missing file is an empty store.
pub fn load(
    path: &Path,
    policy: MalformedPolicy,
) -> Result<LoadReport>
{
    let text = match fs::read_to_string(path)
    {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound =>
        {
            debug!(path = %path.display(), "no cache yet; starting empty");
            return Ok(LoadReport::default());
        }
        Err(e) => return Err(e).with_context(|| format!("read cache: {}", path.display())),
    };

    parse(&text, policy).with_context(|| format!("load cache: {}", path.display()))
}

/// Parse cache text; blank lines are ignored.
pub fn parse(
    text: &str,
    policy: MalformedPolicy,
) -> Result<LoadReport>
{
    let mut report = LoadReport::default();

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

        let reason = match codec::decode(line)
        {
            Ok(record) => match report
                .store
                .insert(record)
            {
                Ok(()) => continue,
                Err(e @ StoreError::DuplicateKey(_)) => e.to_string(),
                Err(e) => return Err(e.into()),
            },
            Err(e) => e.to_string(),
        };

        if policy == MalformedPolicy::Abort
        {
            bail!("line {line_no}: {reason}");
        }

        warn!(line = line_no, %reason, "skipping cache line");
        report
            .skipped
            .push(SkippedLine { line: line_no, reason });
    }

    Ok(report)
}

/// Render records as cache text, one line each.
pub fn render<'a>(records: impl IntoIterator<Item = &'a MovieRecord>) -> String
{
    let mut out = String::new();
    for record in records
    {
        out.push_str(&codec::encode(record));
        out.push('\n');
    }
    out
}

/// Atomically replace the file at `path` with `records`.
pub fn save<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a MovieRecord>,
) -> io::Result<()>
{
    write_atomic(path, render(records).as_bytes())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::record::{IdentityKey, PartialMetrics};
    use tempfile::TempDir;

    const GOOD: &str = r#"{"title":"Heat","year":1995,"primaryRating":8.3,"primaryVoteCount":7,"secondaryRating":88,"secondaryReviewCount":9,"genres":["crime"]}"#;
    const NO_GENRES: &str = r#"{"title":"Alien","year":1979,"primaryRating":8.5,"primaryVoteCount":7,"secondaryRating":0,"secondaryReviewCount":0}"#;

    #[test]
    fn missing_file_is_empty()
    {
        let tmp = TempDir::new().unwrap();
        let report = load(&tmp.path().join("absent.jsonl"), MalformedPolicy::Abort).unwrap();
        assert!(report.store.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn skip_policy_reports_bad_lines()
    {
        let text = format!("{GOOD}\n\n{NO_GENRES}\n{{oops\n{GOOD}\n");
        let report = parse(&text, MalformedPolicy::Skip).unwrap();

        assert_eq!(report.store.len(), 1);
        let lines: Vec<_> = report
            .skipped
            .iter()
            .map(|s| s.line)
            .collect();
        assert_eq!(lines, [3, 4, 5]);
        assert!(report.skipped[0].reason.contains("genres"));
        assert!(report.skipped[2].reason.contains("already exists"));
    }

    #[test]
    fn abort_policy_names_the_line()
    {
        let text = format!("{GOOD}\n{NO_GENRES}\n");
        let err = parse(&text, MalformedPolicy::Abort).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn save_then_load_restores_the_same_store()
    {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache/cache.jsonl");

        let mut store = RecordStore::new();
        store
            .insert(MovieRecord::new("Memento", 2000))
            .unwrap();
        store
            .insert(MovieRecord::new("Zodiac", 2007))
            .unwrap();
        store
            .merge(&IdentityKey::new("Zodiac", 2007), |m| {
                m.apply(&PartialMetrics::Secondary { rating: 90, reviews: 250 })
            })
            .unwrap();

        save(&path, store.all_records()).unwrap();
        let report = load(&path, MalformedPolicy::Abort).unwrap();

        let before: Vec<_> = store
            .all_records()
            .cloned()
            .collect();
        let after: Vec<_> = report
            .store
            .all_records()
            .cloned()
            .collect();
        assert_eq!(before, after);
    }
}
