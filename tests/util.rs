//! Shared test utilities for integration tests
//!
//! Feed fixtures and a preconfigured `reel` command rooted in a temp dir.

#![allow(dead_code)]

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use std::process::Command;

pub const PRIMARY_FEED: &str = r#"{"source":"primary","title":"Inception","year":2010,"rating":8.8,"votes":2100000,"genres":["Action","Sci-Fi"]}
{"source":"primary","title":"Heat","year":1995,"rating":8.3,"votes":700000,"genres":["Crime","Drama"]}
{"source":"primary","title":"Ronin","year":1998,"rating":7.2,"votes":200000}
"#;

pub const SECONDARY_FEED: &str = r#"{"source":"secondary","title":"Inception","year":2011,"rating":87,"reviews":360}
{"source":"secondary","title":"Heat","year":1995,"rating":88,"reviews":90}
{"source":"secondary","title":"Alien","year":1979,"rating":98,"reviews":120}
"#;

/// Temp dir holding `primary.jsonl` and `secondary.jsonl` feeds.
///
/// Reconciled together they give two records with both sources,
/// one primary-only (Ronin) and one secondary-only (Alien).
pub fn make_feed_fixture() -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    tmp.child("primary.jsonl")
        .write_str(PRIMARY_FEED)
        .expect("write primary feed");
    tmp.child("secondary.jsonl")
        .write_str(SECONDARY_FEED)
        .expect("write secondary feed");

    tmp
}

/// `reel` run inside `dir`, quiet, against `dir/cache.jsonl`.
pub fn reel(dir: &assert_fs::TempDir) -> Command
{
    let mut cmd = Command::cargo_bin("reel").expect("binary built");
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .arg("--quiet")
        .arg("--cache")
        .arg(dir.path().join("cache.jsonl"));
    cmd
}

/// Parse the single JSON document `reel` printed on stdout.
pub fn stdout_json(output: &std::process::Output) -> serde_json::Value
{
    let text = String::from_utf8(output.stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(text.trim()).expect("stdout is JSON")
}
