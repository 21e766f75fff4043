//! Fuzzy identity matching between (title, year) pairs reported by different sources.

/// Letters-only lowercase form of a title used for comparison.
pub fn reduce_title(title: &str) -> String
{
    title
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphabetic())
        .collect()
}

/// Titles match when their reduced forms are equal or one contains the other.
///
/// A title with no letters at all (e.g. "1917") only matches another such
/// title; it is not treated as a substring of everything.
pub fn titles_match(
    a: &str,
    b: &str,
) -> bool
{
    let a = reduce_title(a);
    let b = reduce_title(b);

    if a.is_empty() || b.is_empty()
    {
        return a.is_empty() && b.is_empty();
    }

    a == b || a.contains(&b) || b.contains(&a)
}

/// Years match when either lies within `[other - 1, other + 2]`.
///
/// The window is computed in `i64`, so years at the ends of `i32` compare
/// without wrapping.
pub fn years_match(
    year_a: i32,
    year_b: i32,
) -> bool
{
    let within = |y: i32, anchor: i32| {
        let anchor = i64::from(anchor);
        (anchor - 1..=anchor + 2).contains(&i64::from(y))
    };
    within(year_a, year_b) || within(year_b, year_a)
}

/// Same movie: both the title and the year match.
pub fn matches(
    title_a: &str,
    title_b: &str,
    year_a: i32,
    year_b: i32,
) -> bool
{
    years_match(year_a, year_b) && titles_match(title_a, title_b)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn year_window_boundaries()
    {
        assert!(matches("X", "X", 2000, 2002));
        assert!(matches("X", "X", 2002, 2000));
        assert!(!matches("X", "X", 2000, 2003));
        assert!(!matches("X", "X", 2003, 2000));
        assert!(matches("X", "X", 2000, 1999));
        assert!(matches("X", "X", 1999, 2000));
    }

    #[test]
    fn year_window_at_integer_extremes()
    {
        assert!(matches("X", "X", i32::MAX, i32::MAX - 2));
        assert!(matches("X", "X", i32::MAX - 1, i32::MAX));
        assert!(!matches("X", "X", i32::MAX, 0));
        assert!(!matches("X", "X", i32::MAX, i32::MAX - 3));

        assert!(matches("X", "X", i32::MIN, i32::MIN + 2));
        assert!(matches("X", "X", i32::MIN + 1, i32::MIN));
        assert!(!matches("X", "X", i32::MIN, 0));
        assert!(!matches("X", "X", i32::MIN, i32::MAX));
    }

    #[test]
    fn titles_ignore_case_digits_and_punctuation()
    {
        assert!(titles_match("Ocean's Eleven", "oceans  eleven!"));
        assert!(titles_match("Se7en", "Seen"));
        assert!(!titles_match("Heat", "Heart"));
    }

    #[test]
    fn subtitle_truncation_matches_both_ways()
    {
        let full = "Mad Max: Fury Road";
        let short = "Mad Max";
        assert!(matches(full, short, 2015, 2015));
        assert!(matches(short, full, 2015, 2015));
    }

    #[test]
    fn title_comparison_is_symmetric()
    {
        let pairs = [("Alien", "Aliens"), ("Up", "Upgrade"), ("Heat", "Heart"), ("1917", "Dunkirk")];
        for (a, b) in pairs
        {
            assert_eq!(matches(a, b, 2000, 2000), matches(b, a, 2000, 2000));
        }
    }

    #[test]
    fn letterless_titles_only_match_each_other()
    {
        assert!(titles_match("1917", "1917"));
        assert!(titles_match("1917", "2046"));
        assert!(!titles_match("1917", "Dunkirk"));
    }

    #[test]
    fn accented_letters_count_as_letters()
    {
        assert_eq!(reduce_title("Amélie!"), "amélie");
        assert!(titles_match("AMÉLIE", "amélie"));
    }
}
