//! Per-run setup shared by the commands: resolved settings, dictionary and
//! the reconciler loaded from the cache.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{
    cli::AppContext,
    core::{
        cache::{self, LoadReport, MalformedPolicy, SkippedLine},
        reconcile::{CacheSink, NullSink, RecordSink, Reconciler},
    },
    infra::{
        config::{Config, expand, load_config},
        dictionary::Dictionary,
        io::CacheLock,
    },
};

/// Config after applying global CLI overrides.
#[derive(Debug, Clone)]
pub struct Settings
{
    pub config: Config,
    pub cache_path: PathBuf,
}

impl Settings
{
    pub fn resolve(ctx: &AppContext) -> Result<Self>
    {
        Self::from_config(load_config()?, ctx)
    }

    pub fn from_config(
        config: Config,
        ctx: &AppContext,
    ) -> Result<Self>
    {
        let cache_path = match &ctx.cache
        {
            Some(p) => expand(p)?,
            None => config
                .cache_path
                .clone(),
        };
        Ok(Self { config, cache_path })
    }

    pub fn dictionary(&self) -> Result<Dictionary>
    {
        Dictionary::load(
            self.config
                .dictionary_path
                .as_deref(),
            &self.config.extra_words,
        )
    }

    /// Load the cache, logging every dropped line.
    pub fn load_cache(
        &self,
        policy: MalformedPolicy,
    ) -> Result<LoadReport>
    {
        let report = cache::load(&self.cache_path, policy)?;
        info!(
            path = %self.cache_path.display(),
            records = report.store.len(),
            skipped = report.skipped.len(),
            "loaded cache"
        );
        if !report
            .skipped
            .is_empty()
        {
            warn!(
                "{} cache line(s) could not be decoded and were dropped",
                report.skipped.len()
            );
        }
        Ok(report)
    }

    /// Lock file for the cache; dry runs never write, so they get none.
    pub fn cache_lock(
        &self,
        ctx: &AppContext,
    ) -> Result<Option<CacheLock>>
    {
        if ctx.dry_run
        {
            return Ok(None);
        }
        let lock = CacheLock::open(&self.cache_path)
            .with_context(|| format!("open cache lock for {}", self.cache_path.display()))?;
        Ok(Some(lock))
    }

    /// Reconciler over the loaded cache, saving back to it unless dry-running.
    pub fn open_reconciler(
        &self,
        ctx: &AppContext,
        policy: MalformedPolicy,
    ) -> Result<(Reconciler, Vec<SkippedLine>)>
    {
        let words = self
            .dictionary()
            .context("load dictionary")?;
        let LoadReport { store, skipped } = self.load_cache(policy)?;

        let sink: Box<dyn RecordSink> = if ctx.dry_run
        {
            Box::new(NullSink)
        }
        else
        {
            Box::new(CacheSink::new(&self.cache_path))
        };

        Ok((Reconciler::new(store, Box::new(words), sink), skipped))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::record::PartialMetrics;
    use tempfile::TempDir;

    fn settings_in(dir: &TempDir) -> Settings
    {
        let ctx = AppContext { cache: Some(dir.path().join("c.jsonl")), ..Default::default() };
        Settings::from_config(Config::default(), &ctx).unwrap()
    }

    #[test]
    fn cli_cache_overrides_config()
    {
        let tmp = TempDir::new().unwrap();
        let s = settings_in(&tmp);
        assert_eq!(s.cache_path, tmp.path().join("c.jsonl"));
    }

    #[test]
    fn dry_run_never_writes_the_cache()
    {
        let tmp = TempDir::new().unwrap();
        let s = settings_in(&tmp);
        let ctx = AppContext { dry_run: true, ..Default::default() };

        let (mut r, _) = s
            .open_reconciler(&ctx, MalformedPolicy::Skip)
            .unwrap();
        r.reconcile_incoming("Heat", 1995, &PartialMetrics::Secondary { rating: 88, reviews: 1 })
            .unwrap();

        assert_eq!(r.saves(), 1);
        assert!(!s.cache_path.exists());
    }

    #[test]
    fn live_run_persists_each_change()
    {
        let tmp = TempDir::new().unwrap();
        let s = settings_in(&tmp);

        let (mut r, _) = s
            .open_reconciler(&AppContext::default(), MalformedPolicy::Skip)
            .unwrap();
        r.reconcile_incoming("Heat", 1995, &PartialMetrics::Secondary { rating: 88, reviews: 1 })
            .unwrap();

        let reloaded = s
            .load_cache(MalformedPolicy::Abort)
            .unwrap();
        assert_eq!(reloaded.store.len(), 1);
    }
}
