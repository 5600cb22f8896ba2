//! URL normalization.
//!
//! Absolute and protocol-relative URLs resolve to a fully qualified `href`.
//! Relative URLs resolve against a dummy origin and keep only `path + query`,
//! so the dummy origin never leaks into a normalized URL.

use url::{ParseError, Url};

const DUMMY_ORIGIN: &str = "http://dummy";

/// Prefixes selecting a non-literal URL matching dialect.
pub const URL_DIALECTS: [&str; 5] = ["begin:", "end:", "glob:", "express:", "path:"];

/// Whether the string carries one of the URL matching dialect prefixes.
pub fn has_dialect(url: &str) -> bool {
    URL_DIALECTS.iter().any(|prefix| url.starts_with(prefix))
}

/// Whether the string is an absolute URL (`scheme://...` or `data:...`).
pub fn is_absolute(url: &str) -> bool {
    if url.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:")) {
        return true;
    }
    match url.find("://") {
        Some(idx) if idx > 0 => url[..idx].chars().all(|c| c.is_ascii_alphabetic()),
        _ => false,
    }
}

fn dummy_origin() -> Result<Url, ParseError> {
    Url::parse(DUMMY_ORIGIN)
}

fn resolve(url: &str) -> Result<Url, ParseError> {
    if is_absolute(url) {
        Url::parse(url)
    } else {
        dummy_origin()?.join(url)
    }
}

fn path_and_query(url: &Url) -> String {
    let mut out = url.path().to_string();
    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        out.push('?');
        out.push_str(query);
    }
    out
}

/// Canonicalize a URL into the form used for matching and history.
///
/// Dialect-prefixed strings are returned unchanged. `.` and `..` path
/// segments collapse. The result is stable under repeated normalization.
pub fn normalize_url(url: &str) -> Result<String, ParseError> {
    if has_dialect(url) {
        return Ok(url.to_string());
    }
    if is_absolute(url) {
        return Ok(Url::parse(url)?.to_string());
    }
    let resolved = dummy_origin()?.join(url)?;
    if url.starts_with("//") {
        Ok(resolved.to_string())
    } else {
        Ok(path_and_query(&resolved))
    }
}

/// Path component of a URL, without query or fragment.
pub fn get_path(url: &str) -> String {
    match resolve(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Query component of a URL without the leading `?`.
pub fn get_query(url: &str) -> String {
    match resolve(url) {
        Ok(parsed) => parsed.query().unwrap_or_default().to_string(),
        Err(_) => url
            .split_once('?')
            .map(|(_, q)| q.split('#').next().unwrap_or_default().to_string())
            .unwrap_or_default(),
    }
}

/// Decode a query string into its key/value pairs, preserving order and
/// duplicate keys.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
