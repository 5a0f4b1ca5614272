//! Deterministic string similarity on canonical forms.
//!
//! All scores are on a 0-100 scale. Empty inputs score 0 so that identifiers with no
//! alphanumeric content never look alike.

use std::collections::BTreeSet;

use rapidfuzz::distance::indel;

use crate::normalize::Normalizer;

/// Outcome of [`fuzzy_eq`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatch {
    pub is_match: bool,
    /// Best of the three metrics, 0-100.
    pub score: f64,
}

/// Indel similarity of two strings, 0-100.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    indel::normalized_similarity(a.chars(), b.chars()) * 100.0
}

/// Best [`ratio`] of the shorter string against every equally long window of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long): (Vec<char>, Vec<char>) = if a.chars().count() <= b.chars().count() {
        (a.chars().collect(), b.chars().collect())
    } else {
        (b.chars().collect(), a.chars().collect())
    };
    if short.is_empty() {
        return 0.0;
    }
    let width = short.len();
    let mut best = 0.0_f64;
    for start in 0..=(long.len() - width) {
        let window = &long[start..start + width];
        let score = indel::normalized_similarity(short.iter().copied(), window.iter().copied());
        best = best.max(score);
        if best >= 1.0 {
            break;
        }
    }
    best * 100.0
}

/// Word-set similarity, insensitive to token order and duplicates.
///
/// Scores 100 when the word sets intersect and one is a subset of the other.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let shared = join(set_a.intersection(&set_b).copied());
    let only_a = join(set_a.difference(&set_b).copied());
    let only_b = join(set_b.difference(&set_a).copied());
    if !shared.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }
    let combined_a = combine(&shared, &only_a);
    let combined_b = combine(&shared, &only_b);
    let mut best = ratio(&combined_a, &combined_b);
    if !shared.is_empty() {
        best = best
            .max(ratio(&shared, &combined_a))
            .max(ratio(&shared, &combined_b));
    }
    best
}

/// Maximum of token-set, partial and space-stripped full ratio of two canonical strings.
pub fn best_score(canonical_a: &str, canonical_b: &str) -> f64 {
    let stripped_a = canonical_a.replace(' ', "");
    let stripped_b = canonical_b.replace(' ', "");
    token_set_ratio(canonical_a, canonical_b)
        .max(partial_ratio(canonical_a, canonical_b))
        .max(ratio(&stripped_a, &stripped_b))
}

/// Compares two raw identifiers through their canonical forms.
pub fn fuzzy_eq(normalizer: &Normalizer, a: &str, b: &str, threshold: f64) -> FuzzyMatch {
    let score = best_score(&normalizer.canonical(a), &normalizer.canonical(b));
    FuzzyMatch {
        is_match: score >= threshold,
        score,
    }
}

/// Abbreviation-aware name score, 0-100.
///
/// Equal compact forms score 100, one side spelling the other's initials scores 95,
/// equal initials of at least two words score 90; anything else falls back to
/// [`best_score`].
pub fn token_score(normalizer: &Normalizer, a: &str, b: &str) -> f64 {
    let canonical_a = normalizer.canonical(a);
    let canonical_b = normalizer.canonical(b);
    let compact_a = canonical_a.replace(' ', "");
    let compact_b = canonical_b.replace(' ', "");
    if compact_a.is_empty() || compact_b.is_empty() {
        return 0.0;
    }
    if compact_a == compact_b {
        return 100.0;
    }
    let initials_a = initials(&canonical_a);
    let initials_b = initials(&canonical_b);
    if (initials_a.len() >= 2 && initials_a == compact_b)
        || (initials_b.len() >= 2 && initials_b == compact_a)
    {
        return 95.0;
    }
    if initials_a.len() >= 2 && initials_a == initials_b {
        return 90.0;
    }
    best_score(&canonical_a, &canonical_b)
}

/// First letter of each word.
pub fn initials(canonical: &str) -> String {
    canonical
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect()
}

fn join<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words.collect::<Vec<_>>().join(" ")
}

fn combine(shared: &str, rest: &str) -> String {
    match (shared.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => shared.to_string(),
        (false, false) => format!("{shared} {rest}"),
    }
}
