//! End-to-end reconciliation against a real cache file: every change is on
//! disk before the next observation, so a restart resumes where it stopped.

use reelmerge::{
    core::{
        cache::{self, MalformedPolicy},
        reconcile::{CacheSink, Outcome, Reconciler},
        record::{IdentityKey, PartialMetrics},
        store::RecordStore,
    },
    infra::dictionary::Dictionary,
};
use tempfile::TempDir;

fn open(path: &std::path::Path) -> Reconciler
{
    let store = cache::load(path, MalformedPolicy::Abort)
        .expect("load cache")
        .store;
    let words = Dictionary::from_words(["amélie", "the", "heat", "alien"]).expect("dictionary");
    Reconciler::new(store, Box::new(words), Box::new(CacheSink::new(path)))
}

fn primary(
    rating: f64,
    genres: &[&str],
) -> PartialMetrics
{
    PartialMetrics::Primary {
        rating,
        votes: 1_000,
        genres: genres
            .iter()
            .map(|g| g.to_string())
            .collect(),
    }
}

fn secondary(rating: u32) -> PartialMetrics
{
    PartialMetrics::Secondary { rating, reviews: 50 }
}

#[test]
fn restart_resumes_from_the_last_change()
{
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cache.jsonl");

    {
        let mut r = open(&path);
        r.reconcile_incoming("Inception", 2010, &primary(8.8, &["Action"]))
            .unwrap();
        r.reconcile_incoming("Heat", 1995, &secondary(88))
            .unwrap();
        // Process "dies" here without any explicit flush.
    }

    let mut r = open(&path);
    assert_eq!(r.store().len(), 2);

    let out = r
        .reconcile_incoming("Inception", 2011, &secondary(87))
        .unwrap();
    assert_eq!(out.outcome, Outcome::Merged);
    assert_eq!(out.record.key(), IdentityKey::new("Inception", 2010));

    let reloaded = cache::load(&path, MalformedPolicy::Abort).unwrap();
    let inception = reloaded
        .store
        .get(&IdentityKey::new("Inception", 2010))
        .unwrap();
    assert_eq!(inception.metrics().primary_rating(), Some(8.8));
    assert_eq!(inception.metrics().secondary_rating(), Some(87));
}

#[test]
fn translated_title_and_shifted_year_merge_into_one_record()
{
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cache.jsonl");
    let mut r = open(&path);

    r.reconcile_incoming("Amélie (Le Fabuleux Destin d'Amélie Poulain)", 2001, &primary(8.3, &[]))
        .unwrap();
    let out = r
        .reconcile_incoming("Amélie", 2002, &secondary(89))
        .unwrap();

    assert_eq!(out.outcome, Outcome::Merged);
    assert_eq!(out.record.title(), "Amélie");
    assert_eq!(out.record.year(), 2001);
    assert_eq!(r.both_sources().count(), 1);
}

#[test]
fn genres_are_capped_at_three()
{
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cache.jsonl");
    let mut r = open(&path);

    let out = r
        .reconcile_incoming(
            "Alien",
            1979,
            &primary(8.5, &["Horror", "Sci-Fi", "Thriller", "Drama", "Mystery"]),
        )
        .unwrap();
    assert_eq!(
        out.record
            .metrics()
            .genres()
            .len(),
        3
    );
}

#[test]
fn save_fully_replaces_previous_content()
{
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cache.jsonl");
    std::fs::write(&path, "stale garbage that is not a record\n").unwrap();

    let store = RecordStore::new();
    cache::save(&path, store.all_records()).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

    let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name() != "cache.jsonl")
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn malformed_lines_follow_the_policy()
{
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cache.jsonl");
    std::fs::write(
        &path,
        concat!(
            r#"{"title":"Heat","year":1995,"primaryRating":8.3,"primaryVoteCount":7,"secondaryRating":88,"secondaryReviewCount":9,"genres":[]}"#,
            "\n{not json\n"
        ),
    )
    .unwrap();

    let report = cache::load(&path, MalformedPolicy::Skip).unwrap();
    assert_eq!(report.store.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].line, 2);

    assert!(cache::load(&path, MalformedPolicy::Abort).is_err());
}
