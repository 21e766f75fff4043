//! Title normalization for scraped movie titles.
//!
//! A single pass trims, decodes HTML entities, drops a foreign-language
//! alternate title held in a trailing parenthetical, spells out ` & ` and
//! strips edge punctuation. `normalize` repeats the pass until the title is
//! stable, which makes it idempotent.

use std::sync::LazyLock;

use regex::Regex;

use crate::infra::dictionary::WordCheck;

/// Leftmost parenthetical group running to the end of the title.
static TRAILING_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)$").expect("trailing group pattern is valid"));

/// Punctuation stripped from both ends of a title.
const EDGE_PUNCTUATION: &[char] = &['?', '!', '"', '\'', ',', '.'];

/// Canonicalize a raw title into its comparable, stable form.
pub fn normalize(
    raw: &str,
    words: &dyn WordCheck,
) -> String
{
    // Each changing pass shrinks the title or removes an '&', so this ends.
    let mut current = normalize_once(raw, words);
    loop
    {
        let next = normalize_once(&current, words);
        if next == current
        {
            return current;
        }
        current = next;
    }
}

fn normalize_once(
    raw: &str,
    words: &dyn WordCheck,
) -> String
{
    let title = raw.trim();
    let title = html_escape::decode_html_entities(title);
    let title = remove_translation(&title, words);
    let title = title.replace(" & ", " and ");
    let title = title.trim_matches(EDGE_PUNCTUATION);
    title.trim().to_string()
}

/// Which half of a `left (right)` title survives translation removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationSplit
{
    KeepLeft,
    KeepRight,
    Ambiguous,
}

/// Decide which side of a trailing parenthetical is the foreign alternate.
pub fn classify_translation(
    left: &str,
    right: &str,
    words: &dyn WordCheck,
) -> TranslationSplit
{
    let left_unknown = unrecognized_tokens(left, words);
    let right_unknown = unrecognized_tokens(right, words);

    match (left_unknown, right_unknown)
    {
        (0, r) if r >= 1 => TranslationSplit::KeepLeft,
        (l, 0) if l >= 1 => TranslationSplit::KeepRight,
        _ => TranslationSplit::Ambiguous,
    }
}

/// Drop the translated half of `Title (Alternate Title)` when it is clear
/// which half is not English; ambiguous titles come back unchanged.
pub fn remove_translation<'a>(
    title: &'a str,
    words: &dyn WordCheck,
) -> std::borrow::Cow<'a, str>
{
    let Some(group) = TRAILING_GROUP.find(title)
    else
    {
        return title.into();
    };

    let left = &title[..group.start()];
    let right = group
        .as_str()
        .trim_matches(|c: char| c == '(' || c == ')');

    match classify_translation(left, right, words)
    {
        TranslationSplit::KeepLeft => left.trim().into(),
        TranslationSplit::KeepRight => right.trim().into(),
        TranslationSplit::Ambiguous => title.into(),
    }
}

fn unrecognized_tokens(
    text: &str,
    words: &dyn WordCheck,
) -> usize
{
    text.split_whitespace()
        .filter(|token| !is_recognized(token, words))
        .count()
}

/// Tokens without letters (years, `&`, dashes) always pass.
fn is_recognized(
    token: &str,
    words: &dyn WordCheck,
) -> bool
{
    let core = token.trim_matches(|c: char| !c.is_alphanumeric());
    if !core
        .chars()
        .any(char::is_alphabetic)
    {
        return true;
    }

    let lower = core.to_lowercase();
    if words.is_word(&lower)
    {
        return true;
    }

    // Possessives: "ocean's" is recognized when "ocean" is.
    ["'s", "\u{2019}s"]
        .iter()
        .filter_map(|suffix| lower.strip_suffix(suffix))
        .any(|stem| words.is_word(stem))
}
