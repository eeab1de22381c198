//! "Did you mean" suggestions for unknown type and member names

use itertools::Itertools;

use crate::constants::{MAX_SUGGESTION_DISTANCE, MAX_SUGGESTIONS};

/// Up to [`MAX_SUGGESTIONS`] candidates closest to `needle`, nearest first
///
/// Comparison is case-insensitive. Candidates containing the needle (or contained by it)
/// count as distance 1 so that `"Rigid"` still suggests `"Rigidbody"`.
pub fn closest<'a>(needle: &str, candidates: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let needle_chars: Vec<char> = needle.chars().collect();

    candidates
        .into_iter()
        .unique()
        .filter_map(|candidate| {
            let lowered = candidate.to_lowercase();
            let distance = if lowered == needle {
                0
            } else if lowered.contains(&needle) || needle.contains(&lowered) {
                1
            } else {
                bounded_distance(&lowered, &needle_chars, MAX_SUGGESTION_DISTANCE)
            };
            (distance <= MAX_SUGGESTION_DISTANCE).then_some((distance, candidate))
        })
        .sorted_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
        .take(MAX_SUGGESTIONS)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

/// Levenshtein distance with an early exit once every cell in a row exceeds `max_dist`
///
/// Returns `max_dist + 1` when the bound is exceeded.
fn bounded_distance(value: &str, needle_chars: &[char], max_dist: usize) -> usize {
    let n = needle_chars.len();
    if n == 0 {
        return value.chars().count();
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for (i, c) in value.chars().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for j in 1..=n {
            let cost = usize::from(c != needle_chars[j - 1]);
            let d = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            curr[j] = d;
            row_min = row_min.min(d);
        }

        if row_min > max_dist {
            return max_dist + 1;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
