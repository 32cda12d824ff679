use crate::config::CrawlJobSpec;
use crate::crawler::state::SharedCrawlState;
use crate::page::PageSource;

use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Everything the tasks of one crawl call share.
pub(crate) struct CrawlContext {
    pub job: CrawlJobSpec,
    /// `None` when the timeout is too large to represent; the crawl then never expires.
    pub deadline: Option<Instant>,
    pub state: SharedCrawlState,
    pub source: Arc<dyn PageSource>,
    pub fetch_permits: Semaphore,
}

impl CrawlContext {
    /// `fetch_limit` is the pool size; at most that many fetches are in flight.
    pub fn new(
        job: &CrawlJobSpec,
        source: Arc<dyn PageSource>,
        started_at: Instant,
        fetch_limit: usize,
    ) -> Self {
        Self {
            job: job.clone(),
            deadline: started_at.checked_add(job.timeout),
            state: SharedCrawlState::new(),
            source,
            fetch_permits: Semaphore::new(fetch_limit.max(1)),
        }
    }
}

pub(crate) fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.map_or(false, |deadline| Instant::now() >= deadline)
}

/// One URL to visit with the depth budget it has left.
pub(crate) struct CrawlTask {
    url: String,
    depth: usize,
    context: Arc<CrawlContext>,
}

impl CrawlTask {
    pub fn new(url: String, depth: usize, context: Arc<CrawlContext>) -> Self {
        Self { url, depth, context }
    }

    /// Visits the URL, then runs one child task per outbound link and waits for all of them.
    ///
    /// Fetch failures end this task quietly. A panicking child is re-raised so the
    /// engine sees the whole tree as failed.
    pub fn execute(self) -> BoxFuture<'static, ()> {
        async move {
            let CrawlTask { url, depth, context } = self;

            if depth == 0 || deadline_passed(context.deadline) {
                return;
            }
            if context.job.is_ignored(&url) {
                debug!("Skipping {}: matches an ignored pattern", url);
                return;
            }
            if !context.state.try_visit(&url) {
                return;
            }

            let fetched = match context.fetch_permits.acquire().await {
                Ok(_permit) => context.source.fetch(&url).await,
                Err(_) => return,
            };
            let page = match fetched {
                Ok(page) => page,
                Err(e) => {
                    warn!("Error crawling {}: {}", url, e);
                    return;
                }
            };
            debug!("Crawled {} (depth left: {}, links: {})", url, depth, page.links.len());
            context.state.add_counts(&page.word_counts);

            let mut children = JoinSet::new();
            for link in page.links {
                let child = CrawlTask::new(link, depth - 1, Arc::clone(&context));
                children.spawn(child.execute());
            }
            while let Some(joined) = children.join_next().await {
                if let Err(e) = joined {
                    if e.is_panic() {
                        std::panic::resume_unwind(e.into_panic());
                    }
                }
            }
        }
        .boxed()
    }
}
