//! HTTP fetching against remote servers.
//!
//! Thin wrapper around the shared `reqwest::Client` that captures everything
//! later stages need from a response: status, headers, the effective URL
//! after redirects, and a size-capped body. No retries happen here; retry
//! policy belongs to the caller.

use std::sync::Arc;

use log::debug;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};

use crate::config::MAX_RESPONSE_BODY_SIZE;
use crate::error_handling::LinkbackError;

/// Outcome of a single HTTP request/response cycle. Immutable once returned.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// HTTP status code.
    pub status: u16,
    /// Response headers (case-insensitive, multi-valued).
    pub headers: HeaderMap,
    /// Final URL after following redirects. Dedupe and endpoint resolution
    /// run against this, not the original link.
    pub effective_url: String,
    /// Response body, truncated at `MAX_RESPONSE_BODY_SIZE`.
    pub body: String,
}

impl FetchResult {
    /// Whether the response status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First value of a header, trimmed. `None` if absent or not valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// All values of a header, for multi-valued headers like `Link`.
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// Returns `self` if the status is 2xx, else `LinkbackError::Http`.
    pub fn require_success(self) -> Result<Self, LinkbackError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(LinkbackError::Http {
                url: self.effective_url,
                status: self.status,
            })
        }
    }
}

/// HTTP fetcher shared by the detector, the outbound senders and the
/// ingestion pipeline.
#[derive(Clone)]
pub struct Fetcher {
    client: Arc<reqwest::Client>,
}

impl Fetcher {
    pub fn new(client: Arc<reqwest::Client>) -> Self {
        Self { client }
    }

    /// Issues a GET request, advertising a preference for HTML.
    pub async fn get(&self, url: &str) -> Result<FetchResult, LinkbackError> {
        let request = self
            .client
            .get(url)
            .header(ACCEPT, "text/html,application/xhtml+xml");
        self.run(request, url).await
    }

    /// Issues a HEAD request. Used by the target resolver, where only the
    /// effective URL and headers matter.
    pub async fn head(&self, url: &str) -> Result<FetchResult, LinkbackError> {
        self.run(self.client.head(url), url).await
    }

    /// POSTs a form-encoded body (Webmention and Trackback wire format).
    pub async fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<FetchResult, LinkbackError> {
        self.run(self.client.post(url).form(params), url).await
    }

    /// POSTs an XML body as `text/xml` (Pingback wire format).
    pub async fn post_xml(&self, url: &str, body: String) -> Result<FetchResult, LinkbackError> {
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/xml")
            .body(body);
        self.run(request, url).await
    }

    async fn run(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<FetchResult, LinkbackError> {
        let response = request.send().await.map_err(|e| LinkbackError::Network {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status().as_u16();
        let effective_url = response.url().to_string();
        let headers = response.headers().clone();

        let body = match response.bytes().await {
            Ok(bytes) => {
                let capped = &bytes[..bytes.len().min(MAX_RESPONSE_BODY_SIZE)];
                if capped.len() < bytes.len() {
                    debug!(
                        "Truncated response body for {effective_url}: {} bytes",
                        bytes.len()
                    );
                }
                String::from_utf8_lossy(capped).into_owned()
            }
            Err(e) => {
                return Err(LinkbackError::Network {
                    url: url.to_string(),
                    source: e,
                })
            }
        };

        debug!("Fetched {url} -> {effective_url} ({status}, {} bytes)", body.len());

        Ok(FetchResult {
            status,
            headers,
            effective_url,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn result_with_headers(headers: HeaderMap) -> FetchResult {
        FetchResult {
            status: 200,
            headers,
            effective_url: "https://example.com/".to_string(),
            body: String::new(),
        }
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Pingback", HeaderValue::from_static("https://example.com/xmlrpc"));
        let result = result_with_headers(headers);
        assert_eq!(
            result.header("x-pingback"),
            Some("https://example.com/xmlrpc")
        );
    }

    #[test]
    fn test_header_trims_and_rejects_empty() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Pingback", HeaderValue::from_static("  "));
        let result = result_with_headers(headers);
        assert_eq!(result.header("X-Pingback"), None);
    }

    #[test]
    fn test_header_all_collects_multiple_values() {
        let mut headers = HeaderMap::new();
        headers.append("Link", HeaderValue::from_static("<https://a.example/wm>; rel=\"webmention\""));
        headers.append("Link", HeaderValue::from_static("<https://a.example/next>; rel=\"next\""));
        let result = result_with_headers(headers);
        assert_eq!(result.header_all("link").len(), 2);
    }

    #[test]
    fn test_require_success() {
        let ok = FetchResult {
            status: 202,
            headers: HeaderMap::new(),
            effective_url: "https://example.com/".to_string(),
            body: String::new(),
        };
        assert!(ok.require_success().is_ok());

        let not_found = FetchResult {
            status: 404,
            headers: HeaderMap::new(),
            effective_url: "https://example.com/missing".to_string(),
            body: String::new(),
        };
        match not_found.require_success() {
            Err(LinkbackError::Http { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected Http error, got {other:?}"),
        }
    }
}
