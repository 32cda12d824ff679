use std::cmp::Ordering;
use std::collections::HashMap;

/// Picks the `limit` most popular words.
///
/// Ordered by count descending, then by word length descending, then
/// alphabetically, so equal inputs always produce the same output.
pub fn rank(counts: &HashMap<String, u64>, limit: usize) -> Vec<(String, u64)> {
    if limit == 0 {
        return Vec::new();
    }
    let mut entries: Vec<(&String, &u64)> = counts.iter().collect();
    entries.sort_unstable_by(|a, b| compare(a, b));
    entries
        .into_iter()
        .take(limit)
        .map(|(word, count)| (word.clone(), *count))
        .collect()
}

fn compare(a: &(&String, &u64), b: &(&String, &u64)) -> Ordering {
    b.1.cmp(a.1)
        .then_with(|| b.0.len().cmp(&a.0.len()))
        .then_with(|| a.0.cmp(b.0))
}
