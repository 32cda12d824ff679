pub mod http;
pub mod memory;

use crate::error::FetchError;

use async_trait::async_trait;
use std::collections::HashMap;

pub use self::http::HttpPageSource;
pub use self::memory::MemoryPageSource;

/// Words and outbound links found on one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    pub word_counts: HashMap<String, u64>,
    pub links: Vec<String>,
}

impl PageContent {
    pub fn new(word_counts: HashMap<String, u64>, links: Vec<String>) -> Self {
        Self { word_counts, links }
    }
}

/// Turns a URL into the page's words and links.
///
/// Implementations must not block forever; a per-fetch timeout is expected.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError>;
}
