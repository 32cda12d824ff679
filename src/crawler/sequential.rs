use crate::config::{CrawlJobSpec, CrawlResult};
use crate::crawler::rank::rank;
use crate::crawler::task::deadline_passed;
use crate::crawler::{ensure_outside_runtime, WebCrawler};
use crate::error::{CrawlError, EngineError};
use crate::page::PageSource;

use futures::future::{FutureExt, LocalBoxFuture};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Builder;

/// Single-threaded depth-first crawler. Same stop rules as [`super::Crawler`],
/// one page at a time.
pub struct SequentialCrawler {
    source: Arc<dyn PageSource>,
}

impl SequentialCrawler {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self { source }
    }
}

impl WebCrawler for SequentialCrawler {
    fn crawl(&self, job: &CrawlJobSpec) -> Result<CrawlResult, CrawlError> {
        ensure_outside_runtime()?;
        let start_time = Instant::now();
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(EngineError::PoolStart)?;

        let mut traversal = Traversal {
            job,
            deadline: start_time.checked_add(job.timeout),
            source: self.source.as_ref(),
            counts: HashMap::new(),
            visited: HashSet::new(),
        };
        runtime.block_on(async {
            for url in &job.seeds {
                traversal.visit(url.clone(), job.max_depth).await;
            }
        });

        info!(
            "Sequential crawl finished in {:.2}s: {} URLs visited",
            start_time.elapsed().as_secs_f64(),
            traversal.visited.len()
        );
        let urls_visited = traversal.visited.len();
        if traversal.counts.is_empty() {
            return Ok(CrawlResult {
                word_counts: Vec::new(),
                urls_visited,
            });
        }
        Ok(CrawlResult {
            word_counts: rank(&traversal.counts, job.popular_word_count),
            urls_visited,
        })
    }

    fn max_parallelism(&self) -> usize {
        1
    }
}

struct Traversal<'a> {
    job: &'a CrawlJobSpec,
    deadline: Option<Instant>,
    source: &'a dyn PageSource,
    counts: HashMap<String, u64>,
    visited: HashSet<String>,
}

impl Traversal<'_> {
    fn visit(&mut self, url: String, depth: usize) -> LocalBoxFuture<'_, ()> {
        async move {
            if depth == 0 || deadline_passed(self.deadline) {
                return;
            }
            if self.job.is_ignored(&url) || !self.visited.insert(url.clone()) {
                return;
            }
            let page = match self.source.fetch(&url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Error crawling {}: {}", url, e);
                    return;
                }
            };
            debug!("Crawled {} (depth left: {})", url, depth);
            for (word, count) in page.word_counts {
                *self.counts.entry(word).or_insert(0) += count;
            }
            for link in page.links {
                self.visit(link, depth - 1).await;
            }
        }
        .boxed_local()
    }
}
