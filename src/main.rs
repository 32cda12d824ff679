use clap::Parser;
use log::{info, LevelFilter};
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use word_crawler::config::{ConfigurationLoader, Implementation};
use word_crawler::crawler::{Crawler, SequentialCrawler, WebCrawler};
use word_crawler::page::http::{HttpPageSource, DEFAULT_USER_AGENT};
use word_crawler::profiler::Profiler;
use word_crawler::report::CrawlResultWriter;
use word_crawler::utils::url::normalize_url;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON crawl configuration
    config: PathBuf,
    #[arg(short = 'd', long)]
    max_depth: Option<usize>,
    #[arg(short, long)]
    timeout_seconds: Option<u64>,
    #[arg(short, long)]
    parallelism: Option<usize>,
    /// Per-request HTTP timeout
    #[arg(long, default_value_t = 10)]
    fetch_timeout_seconds: u64,
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::builder().filter_level(level).parse_default_env().init();

    let mut config = ConfigurationLoader::load(&args.config)?;
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(timeout_seconds) = args.timeout_seconds {
        config.timeout_seconds = timeout_seconds;
    }
    if args.parallelism.is_some() {
        config.parallelism = args.parallelism;
    }
    let mut job = config.job_spec()?;
    job.seeds = job
        .seeds
        .iter()
        .map(|seed| normalize_url(seed).unwrap_or_else(|| seed.clone()))
        .collect();

    let source = Arc::new(HttpPageSource::new(
        DEFAULT_USER_AGENT,
        Duration::from_secs(args.fetch_timeout_seconds),
        config.ignored_word_patterns()?,
    )?);
    let profiler = Profiler::new();
    let crawler = match config.implementation() {
        Implementation::Parallel => {
            let inner: Box<dyn WebCrawler> = Box::new(Crawler::new(source));
            profiler.wrap_named("ParallelWebCrawler", inner)
        }
        Implementation::Sequential => {
            let inner: Box<dyn WebCrawler> = Box::new(SequentialCrawler::new(source));
            profiler.wrap_named("SequentialWebCrawler", inner)
        }
    };
    info!(
        "Crawling {} seed(s) to depth {} with parallelism {}",
        job.seeds.len(),
        job.max_depth,
        job.parallelism.min(crawler.max_parallelism())
    );

    let result = crawler.crawl(&job)?;
    info!("Crawled {} unique URLs.", result.urls_visited);

    let writer = CrawlResultWriter::new(&result);
    if config.result_path.is_empty() {
        writer.write_to(&mut io::stdout().lock())?;
    } else {
        writer.write(&config.result_path)?;
        info!("Wrote crawl results to {}", config.result_path);
    }

    if config.profile_output_path.is_empty() {
        profiler.write_to(&mut io::stdout().lock())?;
    } else {
        profiler.write_data(&config.profile_output_path)?;
        info!("Wrote profile data to {}", config.profile_output_path);
    }

    Ok(())
}
