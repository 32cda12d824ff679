mod state;

use crate::config::{CrawlJobSpec, CrawlResult};
use crate::crawler::WebCrawler;
use crate::error::CrawlError;

use chrono::{DateTime, Utc};
use state::ProfilingState;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Collects wall-clock timings of wrapped crawlers.
pub struct Profiler {
    state: Arc<ProfilingState>,
    started_at: DateTime<Utc>,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Profiler {
    pub fn new() -> Self {
        Self {
            state: Arc::new(ProfilingState::default()),
            started_at: Utc::now(),
        }
    }

    /// Wraps `inner`, naming the call site after its type.
    ///
    /// Boxed trait objects all share one name; use [`Profiler::wrap_named`] for those.
    pub fn wrap<C: WebCrawler>(&self, inner: C) -> Profiled<C> {
        self.wrap_named(&short_type_name::<C>(), inner)
    }

    pub fn wrap_named<C: WebCrawler>(&self, name: &str, inner: C) -> Profiled<C> {
        Profiled {
            inner,
            call_site: format!("{}#crawl", name),
            state: Arc::clone(&self.state),
        }
    }

    /// Appends the report to `path`, creating the file if needed.
    pub fn write_data(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "Run at {}", self.started_at.to_rfc2822())?;
        self.state.write(writer)?;
        writeln!(writer)
    }
}

/// Last path segment of the outermost type, generic arguments dropped:
/// `Profiled<a::Crawler>` is `Profiled`, `Box<dyn a::WebCrawler>` is `Box`.
fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let outer = full.split('<').next().unwrap_or(full);
    outer.rsplit("::").next().unwrap_or(outer).to_string()
}

/// A crawler whose every `crawl` call is timed, whether it succeeds or not.
pub struct Profiled<C> {
    inner: C,
    call_site: String,
    state: Arc<ProfilingState>,
}

impl<C> Profiled<C> {
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: WebCrawler> WebCrawler for Profiled<C> {
    fn crawl(&self, job: &CrawlJobSpec) -> Result<CrawlResult, CrawlError> {
        let start = Instant::now();
        let result = self.inner.crawl(job);
        let thread_id = format!("{:?}", thread::current().id());
        self.state.record(&self.call_site, &thread_id, start.elapsed());
        result
    }

    fn max_parallelism(&self) -> usize {
        self.inner.max_parallelism()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::time::Duration;

    struct SlowCrawler {
        delay: Duration,
        fail: bool,
    }

    impl WebCrawler for SlowCrawler {
        fn crawl(&self, _job: &CrawlJobSpec) -> Result<CrawlResult, CrawlError> {
            thread::sleep(self.delay);
            if self.fail {
                return Err(ConfigError::ZeroParallelism.into());
            }
            Ok(CrawlResult::default())
        }

        fn max_parallelism(&self) -> usize {
            3
        }
    }

    fn report(profiler: &Profiler) -> String {
        let mut out = Vec::new();
        profiler.write_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_wrapped_crawler_is_timed() {
        let profiler = Profiler::new();
        let crawler = profiler.wrap(SlowCrawler {
            delay: Duration::from_millis(20),
            fail: false,
        });
        let job = CrawlJobSpec::new(vec![]);

        crawler.crawl(&job).unwrap();
        crawler.crawl(&job).unwrap();

        let text = report(&profiler);
        assert!(text.starts_with("Run at "));
        assert!(text.contains("SlowCrawler#crawl on thread ThreadId("));
        assert!(text.contains("SlowCrawler#crawl was invoked 2 times"));
        assert!(text.ends_with("\n\n"));
        assert_eq!(crawler.max_parallelism(), 3);
    }

    #[test]
    fn test_generic_crawler_names_drop_type_arguments() {
        assert_eq!(short_type_name::<SlowCrawler>(), "SlowCrawler");
        assert_eq!(short_type_name::<Profiled<SlowCrawler>>(), "Profiled");
        assert_eq!(short_type_name::<Box<dyn WebCrawler>>(), "Box");

        let profiler = Profiler::new();
        let crawler = profiler.wrap(profiler.wrap(SlowCrawler {
            delay: Duration::ZERO,
            fail: false,
        }));
        crawler.crawl(&CrawlJobSpec::new(vec![])).unwrap();

        let text = report(&profiler);
        assert!(text.contains("Profiled#crawl was invoked 1 times"));
        assert!(text.contains("SlowCrawler#crawl was invoked 1 times"));
        assert!(!text.contains(">#crawl"));
    }

    #[test]
    fn test_failed_calls_are_still_recorded() {
        let profiler = Profiler::new();
        let crawler = profiler.wrap_named("Flaky", SlowCrawler {
            delay: Duration::ZERO,
            fail: true,
        });

        assert!(crawler.crawl(&CrawlJobSpec::new(vec![])).is_err());
        assert!(report(&profiler).contains("Flaky#crawl was invoked 1 times"));
    }

    #[test]
    fn test_calls_from_other_threads_are_keyed_separately() {
        let profiler = Profiler::new();
        let crawler = Arc::new(profiler.wrap_named("Shared", SlowCrawler {
            delay: Duration::ZERO,
            fail: false,
        }));
        let job = CrawlJobSpec::new(vec![]);
        crawler.crawl(&job).unwrap();
        {
            let crawler = Arc::clone(&crawler);
            let job = job.clone();
            thread::spawn(move || crawler.crawl(&job).unwrap()).join().unwrap();
        }

        let text = report(&profiler);
        assert_eq!(text.matches(" took ").count(), 2);
        assert!(text.contains("Shared#crawl was invoked 2 times"));
    }

    #[test]
    fn test_write_data_appends() {
        let path = std::env::temp_dir().join(format!("word-crawler-profile-{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let profiler = Profiler::new();

        profiler.write_data(&path).unwrap();
        profiler.write_data(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("Run at ").count(), 2);
        std::fs::remove_file(&path).unwrap();
    }
}
