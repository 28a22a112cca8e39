//! Site host resolution.

use url::Url;

use crate::util::{AdSkipError, AdSkipResult};

/// Extracts the hostname templates are scoped to from a page URL.
///
/// The `url` crate lowercases and IDNA-normalizes domain hosts, so
/// `https://WWW.Example.com/watch` resolves to `www.example.com`. Ports,
/// paths, and credentials are dropped; subdomains are kept.
pub fn host_from_url(url: &str) -> AdSkipResult<String> {
    let parsed = Url::parse(url).map_err(|_| AdSkipError::InvalidInput("unparseable url"))?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(host.to_owned()),
        _ => Err(AdSkipError::InvalidInput("url has no host")),
    }
}
