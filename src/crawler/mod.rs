pub mod rank;
pub mod sequential;
pub mod state;
mod task;

use crate::config::{available_parallelism, CrawlJobSpec, CrawlResult};
use crate::error::{CrawlError, EngineError};
use crate::page::PageSource;

use log::{debug, info};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::{Builder, Handle};
use tokio::task::JoinError;

pub use sequential::SequentialCrawler;
pub use state::SharedCrawlState;
use task::{CrawlContext, CrawlTask};

/// A crawler with a single `crawl` entry point, so it can be wrapped by decorators
/// such as the profiler without knowing about them.
pub trait WebCrawler {
    fn crawl(&self, job: &CrawlJobSpec) -> Result<CrawlResult, CrawlError>;

    fn max_parallelism(&self) -> usize {
        available_parallelism()
    }
}

impl<C: WebCrawler + ?Sized> WebCrawler for Box<C> {
    fn crawl(&self, job: &CrawlJobSpec) -> Result<CrawlResult, CrawlError> {
        (**self).crawl(job)
    }

    fn max_parallelism(&self) -> usize {
        (**self).max_parallelism()
    }
}

/// Crawls on a work-stealing pool: every page is its own task and a parent waits
/// for its children without holding a worker thread.
pub struct Crawler {
    source: Arc<dyn PageSource>,
}

impl Crawler {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self { source }
    }
}

impl WebCrawler for Crawler {
    /// Blocks until every seed's task tree has finished.
    ///
    /// Builds its own runtime; called from inside a tokio runtime it returns
    /// [`EngineError::NestedRuntime`] instead.
    fn crawl(&self, job: &CrawlJobSpec) -> Result<CrawlResult, CrawlError> {
        ensure_outside_runtime()?;
        let start_time = Instant::now();
        let workers = job.parallelism.min(self.max_parallelism()).max(1);
        let context = Arc::new(CrawlContext::new(
            job,
            Arc::clone(&self.source),
            start_time,
            workers,
        ));

        let runtime = Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name("crawl-worker")
            .enable_all()
            .build()
            .map_err(EngineError::PoolStart)?;
        debug!("Started crawl pool with {} workers for {} seeds", workers, job.seeds.len());

        runtime.block_on(async {
            let handles: Vec<_> = job
                .seeds
                .iter()
                .map(|url| {
                    let task = CrawlTask::new(url.clone(), job.max_depth, Arc::clone(&context));
                    (url.clone(), tokio::spawn(task.execute()))
                })
                .collect();
            for (url, handle) in handles {
                handle.await.map_err(|e| EngineError::TaskFailed {
                    url,
                    reason: describe_join_error(e),
                })?;
            }
            Ok::<(), EngineError>(())
        })?;

        let counts = context.state.snapshot();
        let urls_visited = context.state.visited_count();
        info!(
            "Crawl finished in {:.2}s: {} URLs visited, {} distinct words",
            start_time.elapsed().as_secs_f64(),
            urls_visited,
            counts.len()
        );
        if counts.is_empty() {
            return Ok(CrawlResult {
                word_counts: Vec::new(),
                urls_visited,
            });
        }
        Ok(CrawlResult {
            word_counts: rank::rank(&counts, job.popular_word_count),
            urls_visited,
        })
    }
}

/// `block_on` panics when the calling thread already drives a runtime.
pub(crate) fn ensure_outside_runtime() -> Result<(), EngineError> {
    if Handle::try_current().is_ok() {
        return Err(EngineError::NestedRuntime);
    }
    Ok(())
}

fn describe_join_error(e: JoinError) -> String {
    if e.is_panic() {
        panic_message(e.into_panic())
    } else {
        e.to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::MemoryPageSource;

    #[test]
    fn test_panic_message_from_payload() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new("kaboom".to_string())), "kaboom");
        assert_eq!(panic_message(Box::new(42)), "task panicked");
    }

    #[test]
    fn test_single_page_crawl() {
        let source = MemoryPageSource::new().with_page("a", &[("hello", 2), ("world", 1)], &[]);
        let crawler = Crawler::new(Arc::new(source));
        let job = CrawlJobSpec::new(vec!["a".to_string()]).with_max_depth(1);

        let result = crawler.crawl(&job).unwrap();
        assert_eq!(result.urls_visited, 1);
        assert_eq!(
            result.word_counts,
            vec![("hello".to_string(), 2), ("world".to_string(), 1)]
        );
    }

    #[test]
    fn test_popular_word_count_limits_result() {
        let source = MemoryPageSource::new().with_page("a", &[("one", 3), ("two", 2), ("three", 1)], &[]);
        let crawler = Crawler::new(Arc::new(source));
        let job = CrawlJobSpec::new(vec!["a".to_string()]).with_popular_word_count(2);

        let result = crawler.crawl(&job).unwrap();
        assert_eq!(result.word_counts.len(), 2);
        assert_eq!(result.word_counts[0], ("one".to_string(), 3));
    }

    #[tokio::test]
    async fn test_crawl_inside_runtime_is_an_engine_error() {
        let source = MemoryPageSource::new().with_page("a", &[("hello", 1)], &[]);
        let crawler = Crawler::new(Arc::new(source));
        let job = CrawlJobSpec::new(vec!["a".to_string()]);

        let err = crawler.crawl(&job).unwrap_err();
        assert!(matches!(err, CrawlError::Engine(EngineError::NestedRuntime)));
    }
}
