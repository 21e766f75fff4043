//! Read-side commands over the finalized record set: coverage report,
//! per-source partial exports and the title normalizer.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing::{info, instrument};

use crate::{
    cli::{AppContext, ExportArgs, NormalizeArgs, ReportArgs},
    core::{
        cache,
        record::{MovieRecord, View},
        session::Settings,
        store::RecordStore,
        title,
    },
};

pub const PRIMARY_ONLY_FILE: &str = "primary_only.jsonl";
pub const SECONDARY_ONLY_FILE: &str = "secondary_only.jsonl";

/// Source coverage of a record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts
{
    pub total: usize,
    pub both: usize,
    pub primary_only: usize,
    pub secondary_only: usize,
    /// Records still missing at least one source
    pub unresolved: usize,
    pub skipped_lines: usize,
}

impl ReportCounts
{
    pub fn from_store(
        store: &RecordStore,
        skipped_lines: usize,
    ) -> Self
    {
        let both = store
            .view(View::Both)
            .count();
        Self {
            total: store.len(),
            both,
            primary_only: store
                .view(View::PrimaryOnly)
                .count(),
            secondary_only: store
                .view(View::SecondaryOnly)
                .count(),
            unresolved: store.len() - both,
            skipped_lines,
        }
    }
}

#[derive(Tabled)]
struct RecordRow
{
    title: String,
    year: i32,
    #[tabled(rename = "primary")]
    primary_rating: String,
    votes: String,
    #[tabled(rename = "secondary")]
    secondary_rating: String,
    reviews: String,
    genres: String,
}

fn or_dash<T: ToString>(value: Option<T>) -> String
{
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl From<&MovieRecord> for RecordRow
{
    fn from(record: &MovieRecord) -> Self
    {
        let m = record.metrics();
        Self {
            title: record
                .title()
                .to_string(),
            year: record.year(),
            primary_rating: or_dash(m.primary_rating()),
            votes: or_dash(m.primary_vote_count()),
            secondary_rating: or_dash(m.secondary_rating()),
            reviews: or_dash(m.secondary_review_count()),
            genres: m
                .genres()
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[instrument(skip_all)]
pub fn run(
    args: ReportArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let settings = Settings::resolve(ctx)?;
    let loaded = settings.load_cache(settings.config.on_malformed)?;
    let counts = ReportCounts::from_store(&loaded.store, loaded.skipped.len());
    let view = args
        .list
        .map(View::from);

    if args.json
    {
        let mut out = serde_json::json!({ "counts": counts });
        if let Some(view) = view
        {
            let records: Vec<_> = loaded
                .store
                .view(view)
                .map(|r| serde_json::json!({ "title": r.title(), "year": r.year() }))
                .collect();
            out["records"] = serde_json::Value::Array(records);
        }
        println!("{}", serde_json::to_string(&out)?);
        return Ok(());
    }

    print_counts(&counts, ctx);

    if let Some(view) = view
    {
        let rows: Vec<RecordRow> = loaded
            .store
            .view(view)
            .map(RecordRow::from)
            .collect();
        if rows.is_empty()
        {
            println!("No records in this view.");
        }
        else
        {
            println!("{}", Table::new(rows));
        }
    }

    Ok(())
}

fn print_counts(
    counts: &ReportCounts,
    ctx: &AppContext,
)
{
    let lines = [
        ("Records", counts.total),
        ("Both sources", counts.both),
        ("Primary only", counts.primary_only),
        ("Secondary only", counts.secondary_only),
        ("Unresolved", counts.unresolved),
        ("Skipped cache lines", counts.skipped_lines),
    ];
    for (label, n) in lines
    {
        if ctx.no_color
        {
            println!("{label:>20}: {n}");
        }
        else
        {
            println!("{:>20}: {}", label.bold(), n.cyan());
        }
    }
}

/// Write the records one source is missing, each set as its own cache file.
pub fn export_partials(
    store: &RecordStore,
    out_dir: &Path,
) -> Result<(usize, usize)>
{
    let primary: Vec<_> = store
        .view(View::PrimaryOnly)
        .collect();
    let secondary: Vec<_> = store
        .view(View::SecondaryOnly)
        .collect();

    let primary_path = out_dir.join(PRIMARY_ONLY_FILE);
    cache::save(&primary_path, primary.iter().copied())
        .with_context(|| format!("write {}", primary_path.display()))?;
    let secondary_path = out_dir.join(SECONDARY_ONLY_FILE);
    cache::save(&secondary_path, secondary.iter().copied())
        .with_context(|| format!("write {}", secondary_path.display()))?;

    Ok((primary.len(), secondary.len()))
}

#[instrument(skip_all)]
pub fn export(
    args: ExportArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let settings = Settings::resolve(ctx)?;
    let out_dir = args
        .out_dir
        .unwrap_or_else(|| {
            settings
                .config
                .export_dir
                .clone()
        });
    let loaded = settings.load_cache(settings.config.on_malformed)?;

    if ctx.dry_run
    {
        let counts = ReportCounts::from_store(&loaded.store, loaded.skipped.len());
        println!("{}", "DRY RUN: Would export:".yellow());
        println!("  {} ({} records)", out_dir.join(PRIMARY_ONLY_FILE).display(), counts.primary_only);
        println!(
            "  {} ({} records)",
            out_dir
                .join(SECONDARY_ONLY_FILE)
                .display(),
            counts.secondary_only
        );
        return Ok(());
    }

    let (primary, secondary) = export_partials(&loaded.store, &out_dir)?;
    info!(primary, secondary, dir = %out_dir.display(), "exported partial caches");

    if !ctx.quiet
    {
        println!(
            "{} Exported {primary} primary-only and {secondary} secondary-only records to {}",
            "✓".green(),
            out_dir.display()
        );
    }
    Ok(())
}

pub fn normalize(
    args: NormalizeArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let settings = Settings::resolve(ctx)?;
    let words = settings
        .dictionary()
        .context("load dictionary")?;

    for raw in &args.titles
    {
        println!("{}", title::normalize(raw, &words));
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::record::{IdentityKey, Metrics};
    use tempfile::TempDir;

    fn sample_store() -> RecordStore
    {
        let rec = |title: &str, year, primary: f64, secondary: u32| {
            MovieRecord::with_metrics(
                title,
                year,
                Metrics::from_raw(primary, 10, secondary, 5, ["drama".to_string()]),
            )
        };
        RecordStore::from_records([
            rec("heat", 1995, 8.3, 88),
            rec("ronin", 1998, 7.2, 0),
            rec("alien", 1979, 0.0, 98),
            rec("zodiac", 2007, 7.7, 0),
        ])
        .unwrap()
    }

    #[test]
    fn counts_snapshot()
    {
        let counts = ReportCounts::from_store(&sample_store(), 2);
        insta::assert_json_snapshot!(counts, @r#"
        {
          "total": 4,
          "both": 1,
          "primary_only": 2,
          "secondary_only": 1,
          "unresolved": 3,
          "skipped_lines": 2
        }
        "#);
    }

    #[test]
    fn export_writes_one_file_per_missing_source()
    {
        let tmp = TempDir::new().unwrap();
        let (p, s) = export_partials(&sample_store(), tmp.path()).unwrap();
        assert_eq!((p, s), (2, 1));

        let primary = cache::load(&tmp.path().join(PRIMARY_ONLY_FILE), cache::MalformedPolicy::Abort)
            .unwrap();
        assert!(
            primary
                .store
                .contains(&IdentityKey::new("ronin", 1998))
        );
        assert_eq!(primary.store.len(), 2);

        let secondary =
            cache::load(&tmp.path().join(SECONDARY_ONLY_FILE), cache::MalformedPolicy::Abort)
                .unwrap();
        assert_eq!(
            secondary
                .store
                .all_records()
                .map(MovieRecord::title)
                .collect::<Vec<_>>(),
            vec!["alien"]
        );
    }

    #[test]
    fn rows_show_unknowns_as_dashes()
    {
        let store = sample_store();
        let alien = store
            .get(&IdentityKey::new("alien", 1979))
            .unwrap();
        let row = RecordRow::from(alien);
        assert_eq!(row.primary_rating, "-");
        assert_eq!(row.secondary_rating, "98");
    }
}
