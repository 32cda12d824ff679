use crate::error::FetchError;
use crate::page::{PageContent, PageSource};

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;

/// A fixed link graph held in memory. URLs without a page fail to fetch.
///
/// Every fetch is recorded, which makes it handy for checking what a crawl touched.
#[derive(Debug, Default)]
pub struct MemoryPageSource {
    pages: HashMap<String, PageContent>,
    latency: Duration,
    fetches: DashMap<String, usize>,
}

impl MemoryPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, words: &[(&str, u64)], links: &[&str]) -> Self {
        let word_counts = words
            .iter()
            .map(|(word, count)| (word.to_string(), *count))
            .collect();
        let links = links.iter().map(|link| link.to_string()).collect();
        self.pages
            .insert(url.to_string(), PageContent::new(word_counts, links));
        self
    }

    /// Delay applied to every fetch, hit or miss.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.get(url).map_or(0, |count| *count)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.iter().map(|entry| *entry.value()).sum()
    }
}

#[async_trait]
impl PageSource for MemoryPageSource {
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        *self.fetches.entry(url.to_string()).or_insert(0) += 1;
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Unavailable {
                url: url.to_string(),
                reason: "no such page".to_string(),
            })
    }
}
