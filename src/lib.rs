//! **reelmerge** - Reconcile movie ratings scraped from two independent sources
//!
//! Scraped observations arrive keyed by loosely formatted titles and off-by-one years;
//! they are normalized, fuzzily matched and merged into one record per movie, and the
//! record set is persisted as a line-oriented cache after every change.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Reconciliation pipeline - normalization, matching, storage and commands
pub mod core {
    /// Title normalization with translated-title stripping
    pub mod title;
    pub use title::normalize;

    /// Fuzzy title/year equivalence
    pub mod matcher;

    /// Movie records, partial observations and source views
    pub mod record;
    pub use record::{IdentityKey, Metrics, MovieRecord, PartialMetrics, Source, View};

    /// Identity-keyed record store
    pub mod store;
    pub use store::{RecordStore, StoreError};

    /// One-record-per-line cache encoding
    pub mod codec;

    /// Whole-file cache load and atomic save
    pub mod cache;

    /// Insert-or-merge reconciliation and search-hit resolution
    pub mod reconcile;
    pub use reconcile::{ReconcileError, Reconciler};

    /// Per-run settings shared by the commands
    pub mod session;

    /// Feed ingestion command
    pub mod ingest;
    pub use ingest::run as ingest_run;

    /// Search-hit resolution command
    pub mod resolve;
    pub use resolve::run as resolve_run;

    /// Coverage report, partial exports and the normalize debugging aid
    pub mod report;
    pub use report::{export as export_run, normalize as normalize_run, run as report_run};
}

/// Infrastructure - Configuration, word dictionary and durable file I/O
pub mod infra {
    /// Layered configuration (file + environment)
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// English word dictionary backed by an fst set
    pub mod dictionary;
    pub use dictionary::{Dictionary, WordCheck};

    /// Atomic replace and cache locking
    pub mod io;
    pub use io::{CacheLock, write_atomic};
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use core::{export_run, ingest_run, normalize_run, report_run, resolve_run};
pub use infra::{Config, Dictionary, load_config};

// Core types for external consumers
pub use core::{IdentityKey, MovieRecord, RecordStore, Reconciler};
