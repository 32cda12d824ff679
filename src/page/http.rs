use crate::error::FetchError;
use crate::page::{PageContent, PageSource};
use crate::utils::url::resolve_link;

use async_trait::async_trait;
use log::debug;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "RustWordCrawler/1.0 (https://example.com/bot)";

/// Fetches pages over HTTP and extracts words and links from their HTML.
pub struct HttpPageSource {
    client: Client,
    ignored_words: Vec<Regex>,
}

impl HttpPageSource {
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        ignored_words: Vec<Regex>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(user_agent).timeout(timeout).build()?;
        Ok(Self { client, ignored_words })
    }

    pub fn with_ignored_words(ignored_words: Vec<Regex>) -> Result<Self, reqwest::Error> {
        Self::new(DEFAULT_USER_AGENT, Duration::from_secs(10), ignored_words)
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        let base_url = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let http_error = |source: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(http_error)?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        if !content_type.contains("text/html") {
            return Err(FetchError::NotHtml { url: url.to_string() });
        }
        let html_content = response.text().await.map_err(http_error)?;
        let page = parse_page(&html_content, &base_url, &self.ignored_words);
        debug!(
            "Parsed {}: {} distinct words, {} links",
            url,
            page.word_counts.len(),
            page.links.len()
        );
        Ok(page)
    }
}

/// Counts the visible words of `<body>` and collects its absolute http(s) links.
pub fn parse_page(html: &str, base_url: &Url, ignored_words: &[Regex]) -> PageContent {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").unwrap();
    let link_selector = Selector::parse("a[href]").unwrap();

    let mut word_counts = HashMap::new();
    let mut links = Vec::new();
    if let Some(body) = document.select(&body_selector).next() {
        for node in body.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element().map(|element| element.name()))
                .map_or(false, |name| matches!(name, "script" | "style" | "noscript"));
            if hidden {
                continue;
            }
            for word in text.split(|c: char| !c.is_alphanumeric()) {
                if word.is_empty() {
                    continue;
                }
                let word = word.to_lowercase();
                if ignored_words.iter().any(|pattern| pattern.is_match(&word)) {
                    continue;
                }
                *word_counts.entry(word).or_insert(0) += 1;
            }
        }
        links = body
            .select(&link_selector)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve_link(base_url, href))
            .collect();
    }
    PageContent { word_counts, links }
}
