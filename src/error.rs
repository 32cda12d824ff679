use thiserror::Error;

/// Fatal errors surfaced by a crawl call. Per-URL fetch failures never show up here.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Parallelism must be greater than 0")]
    ZeroParallelism,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to start worker pool: {0}")]
    PoolStart(#[source] std::io::Error),

    #[error("Cannot start a crawl pool from inside a running tokio runtime")]
    NestedRuntime,

    #[error("Crawl task for {url} failed: {reason}")]
    TaskFailed { url: String, reason: String },
}

/// Failure to fetch or parse a single page.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch page {url}: {status}")]
    Status { url: String, status: u16 },

    #[error("Not an HTML page: {url}")]
    NotHtml { url: String },

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Page {url} is unavailable: {reason}")]
    Unavailable { url: String, reason: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Http { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::NotHtml { url }
            | FetchError::InvalidUrl { url, .. }
            | FetchError::Unavailable { url, .. } => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_carries_url() {
        let err = FetchError::Status {
            url: "https://example.com/missing".to_string(),
            status: 404,
        };
        assert_eq!(err.url(), "https://example.com/missing");
        assert_eq!(
            err.to_string(),
            "Failed to fetch page https://example.com/missing: 404"
        );
    }

    #[test]
    fn test_config_error_wraps_into_crawl_error() {
        let err: CrawlError = ConfigError::ZeroParallelism.into();
        assert!(matches!(err, CrawlError::Config(ConfigError::ZeroParallelism)));
        assert_eq!(
            err.to_string(),
            "Configuration error: Parallelism must be greater than 0"
        );
    }
}
