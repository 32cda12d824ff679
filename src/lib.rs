pub mod config;
pub mod crawler;
pub mod error;
pub mod page;
pub mod profiler;
pub mod report;
pub mod utils;

pub use config::{ConfigurationLoader, CrawlJobSpec, CrawlResult, CrawlerConfig, Implementation};
pub use crawler::{Crawler, SequentialCrawler, SharedCrawlState, WebCrawler};
pub use error::{ConfigError, CrawlError, EngineError, FetchError};
pub use page::{HttpPageSource, MemoryPageSource, PageContent, PageSource};
pub use profiler::{Profiled, Profiler};
pub use report::CrawlResultWriter;
