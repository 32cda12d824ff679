use crate::error::ConfigError;

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

/// Crawler settings as they appear in the JSON configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrawlerConfig {
    pub start_pages: Vec<String>,
    pub ignored_urls: Vec<String>,
    pub ignored_words: Vec<String>,
    /// Falls back to the available hardware parallelism when unset.
    pub parallelism: Option<usize>,
    pub implementation_override: Option<Implementation>,
    pub max_depth: usize,
    pub timeout_seconds: u64,
    pub popular_word_count: usize,
    pub profile_output_path: String,
    pub result_path: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Implementation {
    #[default]
    Parallel,
    Sequential,
}

impl CrawlerConfig {
    /// Validates the settings and compiles them into an immutable job spec.
    pub fn job_spec(&self) -> Result<CrawlJobSpec, ConfigError> {
        let parallelism = match self.parallelism {
            Some(0) => return Err(ConfigError::ZeroParallelism),
            Some(n) => n,
            None => available_parallelism(),
        };
        Ok(CrawlJobSpec {
            seeds: self.start_pages.clone(),
            max_depth: self.max_depth,
            timeout: Duration::from_secs(self.timeout_seconds),
            ignored_urls: compile_patterns(&self.ignored_urls)?,
            popular_word_count: self.popular_word_count,
            parallelism,
        })
    }

    pub fn ignored_word_patterns(&self) -> Result<Vec<Regex>, ConfigError> {
        compile_patterns(&self.ignored_words)
    }

    pub fn implementation(&self) -> Implementation {
        self.implementation_override.unwrap_or_default()
    }
}

pub struct ConfigurationLoader;

impl ConfigurationLoader {
    pub fn load(path: impl AsRef<Path>) -> Result<CrawlerConfig, ConfigError> {
        let file = File::open(path.as_ref())?;
        Self::read(BufReader::new(file))
    }

    pub fn read<R: Read>(reader: R) -> Result<CrawlerConfig, ConfigError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Everything one crawl call needs. Built once, then shared read-only by every task.
#[derive(Debug, Clone)]
pub struct CrawlJobSpec {
    pub seeds: Vec<String>,
    pub max_depth: usize,
    pub timeout: Duration,
    pub ignored_urls: Vec<Regex>,
    pub popular_word_count: usize,
    pub parallelism: usize,
}

impl CrawlJobSpec {
    pub fn new(seeds: Vec<String>) -> Self {
        Self {
            seeds,
            max_depth: 10,
            timeout: Duration::from_secs(10),
            ignored_urls: Vec::new(),
            popular_word_count: 10,
            parallelism: available_parallelism(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_popular_word_count(mut self, count: usize) -> Self {
        self.popular_word_count = count;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Result<Self, ConfigError> {
        if parallelism == 0 {
            return Err(ConfigError::ZeroParallelism);
        }
        self.parallelism = parallelism;
        Ok(self)
    }

    pub fn with_ignored_urls<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self, ConfigError> {
        self.ignored_urls = compile_patterns(patterns)?;
        Ok(self)
    }

    pub fn is_ignored(&self, url: &str) -> bool {
        self.ignored_urls.iter().any(|pattern| pattern.is_match(url))
    }
}

/// Outcome of a crawl, ready to hand to a report writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    /// Ranked highest count first.
    #[serde(serialize_with = "serialize_ranked")]
    pub word_counts: Vec<(String, u64)>,
    pub urls_visited: usize,
}

fn serialize_ranked<S: Serializer>(counts: &[(String, u64)], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(counts.iter().map(|(word, count)| (word, count)))
}

pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Anchors every pattern so a match must cover the whole input.
pub(crate) fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
        })
        .collect()
}
