//! Search-hit resolution: fills the missing source for records that only one
//! source has reported, using candidates a lookup collaborator searched for.

use std::fs;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::{
    cli::{AppContext, ResolveArgs},
    core::{
        reconcile::{Reconciler, Resolution, SearchHit},
        record::IdentityKey,
        session::Settings,
    },
    infra::io::CacheLock,
};

/// A known record and the candidates its search returned, in result order.
#[derive(Debug, Clone, Deserialize)]
pub struct HitLine
{
    pub target: IdentityKey,
    #[serde(default)]
    pub candidates: Vec<SearchHit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveSummary
{
    pub resolved: usize,
    pub unmatched: usize,
    /// Targets whose matching hit reported a source they already had
    pub already_known: usize,
    pub unknown_targets: usize,
    pub skipped_lines: usize,
}

/// Apply every hit line in `text`; reports the unmatched targets by name.
pub fn resolve_text(
    reconciler: &mut Reconciler,
    text: &str,
) -> Result<ResolveSummary>
{
    let mut summary = ResolveSummary::default();

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

        let hit: HitLine = match serde_json::from_str(line)
        {
            Ok(h) => h,
            Err(e) =>
            {
                warn!(line = line_no, error = %e, "skipping hit line");
                summary.skipped_lines += 1;
                continue;
            }
        };

        let resolution = reconciler
            .resolve(&hit.target, &hit.candidates)
            .with_context(|| format!("resolve hit line {line_no}"))?;

        match resolution
        {
            Resolution::Resolved { candidate, .. } =>
            {
                debug!(target = %hit.target, candidate, "resolved");
                summary.resolved += 1;
            }
            Resolution::NoMatch =>
            {
                warn!(target = %hit.target, "search failure: no matching candidate");
                summary.unmatched += 1;
            }
            Resolution::AlreadyKnown { candidate } =>
            {
                debug!(target = %hit.target, candidate, "source already present; left as is");
                summary.already_known += 1;
            }
            Resolution::UnknownTarget =>
            {
                warn!(target = %hit.target, "hit line targets a record not in the cache");
                summary.unknown_targets += 1;
            }
        }
    }

    Ok(summary)
}

#[instrument(skip_all, fields(hits = %args.hits.display()))]
pub fn run(
    args: ResolveArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let settings = Settings::resolve(ctx)?;

    let mut lock = settings.cache_lock(ctx)?;
    let _guard = lock
        .as_mut()
        .map(CacheLock::try_acquire)
        .transpose()
        .context("another reel process is using this cache")?;

    let (mut reconciler, _) = settings.open_reconciler(ctx, settings.config.on_malformed)?;

    let text = fs::read_to_string(&args.hits)
        .with_context(|| format!("read hits: {}", args.hits.display()))?;
    let summary = resolve_text(&mut reconciler, &text)?;

    info!(
        resolved = summary.resolved,
        unmatched = summary.unmatched,
        already_known = summary.already_known,
        unknown_targets = summary.unknown_targets,
        unresolved = reconciler.unresolved_count(),
        "resolve finished"
    );

    if args.json
    {
        let out = json!({
            "summary": summary,
            "unresolved": reconciler.unresolved_count(),
        });
        println!("{out}");
    }
    else if !ctx.quiet
    {
        println!(
            "{} resolved, {} unmatched, {} already known, {} unknown targets, {} skipped lines; {} records still lack a source",
            summary.resolved,
            summary.unmatched,
            summary.already_known,
            summary.unknown_targets,
            summary.skipped_lines,
            reconciler.unresolved_count()
        );
    }

    Ok(())
}
