use dashmap::{DashMap, DashSet};
use std::collections::HashMap;

/// Visited URLs and running word totals shared by every task of one crawl call.
///
/// Both maps are sharded, so callers never take a lock themselves and no lock
/// outlives a single insert.
#[derive(Debug, Default)]
pub struct SharedCrawlState {
    visited: DashSet<String>,
    counts: DashMap<String, u64>,
}

impl SharedCrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true only for the first caller with a given URL.
    pub fn try_visit(&self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn add_counts<'a, I>(&self, words: I)
    where
        I: IntoIterator<Item = (&'a String, &'a u64)>,
    {
        for (word, count) in words {
            *self.counts.entry(word.clone()).or_insert(0) += *count;
        }
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_try_visit_only_once() {
        let state = SharedCrawlState::new();
        assert!(state.try_visit("https://example.com/"));
        assert!(!state.try_visit("https://example.com/"));
        assert!(state.try_visit("https://example.com/other"));
        assert_eq!(state.visited_count(), 2);
    }

    #[test]
    fn test_add_counts_merges() {
        let state = SharedCrawlState::new();
        let first: HashMap<String, u64> = [("x".to_string(), 1), ("y".to_string(), 2)].into();
        let second: HashMap<String, u64> = [("x".to_string(), 3)].into();
        state.add_counts(&first);
        state.add_counts(&second);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.get("x"), Some(&4));
        assert_eq!(snapshot.get("y"), Some(&2));
    }

    #[test]
    fn test_concurrent_visits_have_single_winner() {
        let state = Arc::new(SharedCrawlState::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                thread::spawn(move || (0..100).filter(|i| state.try_visit(&format!("url-{}", i))).count())
            })
            .collect();
        let wins: usize = handles.into_iter().map(|handle| handle.join().unwrap()).sum();

        assert_eq!(wins, 100);
        assert_eq!(state.visited_count(), 100);
    }

    #[test]
    fn test_concurrent_counts_are_not_lost() {
        let state = Arc::new(SharedCrawlState::new());
        let page: HashMap<String, u64> = [("word".to_string(), 1), ("other".to_string(), 2)].into();
        let page = Arc::new(page);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                let page = Arc::clone(&page);
                thread::spawn(move || {
                    for _ in 0..250 {
                        state.add_counts(page.iter());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = state.snapshot();
        assert_eq!(snapshot.get("word"), Some(&2000));
        assert_eq!(snapshot.get("other"), Some(&4000));
    }
}
