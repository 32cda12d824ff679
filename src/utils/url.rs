use url::Url;

/// Parses `url` and drops its fragment, so `page#a` and `page#b` count as one page.
pub fn normalize_url(url: &str) -> Option<String> {
    match Url::parse(url) {
        Ok(mut parsed_url) => {
            parsed_url.set_fragment(None);
            Some(parsed_url.to_string())
        }
        Err(_) => None,
    }
}

/// Resolves `href` against `base`, keeping only http and https targets.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let mut absolute_url = base.join(href.trim()).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}
