//! Outbound notification trigger.
//!
//! Invoked once per newly published local post: extracts the URLs the post
//! references, probes each for an advertised backlink endpoint, and delivers
//! a notification using whichever protocol won. Runs as one spawned task per
//! post so a slow remote server never blocks the publishing path; within the
//! task, targets are processed strictly sequentially.

use std::sync::Arc;
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use tokio::task::JoinHandle;

use crate::config::MAX_URL_LENGTH;
use crate::detect;
use crate::error_handling::ProcessingStats;
use crate::fetch::Fetcher;
use crate::notify::{self, LocalPost};

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"']+"#).expect("URL pattern is valid")
});

/// Extracts the HTTP(S) URLs referenced by a post's text, in order of first
/// appearance, deduplicated. Trailing sentence punctuation is not part of
/// the URL.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in URL_PATTERN.find_iter(text) {
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', ')']);
        if url.len() > MAX_URL_LENGTH {
            continue;
        }
        if !seen.iter().any(|s| s == url) {
            seen.push(url.to_string());
        }
    }
    seen
}

/// Notifies every URL referenced by `text` on behalf of `post`. Returns the
/// number of notifications actually delivered. Never fails: every per-target
/// problem is logged and skipped.
pub async fn notify_post(
    fetcher: &Fetcher,
    post: &LocalPost,
    text: &str,
    stats: &ProcessingStats,
) -> usize {
    let mut delivered = 0;
    for url in extract_urls(text) {
        let fetch = match fetcher.get(&url).await {
            Ok(fetch) => fetch,
            Err(e) => {
                warn!("Skipping backlink probe of {url}: {e}");
                continue;
            }
        };
        let Some(endpoint) = detect::detect(&fetch) else {
            debug!("No backlink endpoint at {url}");
            continue;
        };
        if notify::notify(fetcher, &endpoint, post, &url, stats).await {
            delivered += 1;
        }
    }
    delivered
}

/// Spawns `notify_post` as a background task, detached from the caller's
/// write path.
pub fn spawn_notify_post(
    fetcher: Fetcher,
    post: LocalPost,
    text: String,
    stats: Arc<ProcessingStats>,
) -> JoinHandle<usize> {
    tokio::spawn(async move { notify_post(&fetcher, &post, &text, &stats).await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialization::init_client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_extract_urls_basic() {
        let urls = extract_urls("see https://a.example/one and http://b.example/two.");
        assert_eq!(
            urls,
            vec![
                "https://a.example/one".to_string(),
                "http://b.example/two".to_string()
            ]
        );
    }

    #[test]
    fn test_extract_urls_dedupes() {
        let urls = extract_urls("https://a.example/x then https://a.example/x again");
        assert_eq!(urls.len(), 1);
    }

    #[test]
    fn test_extract_urls_strips_trailing_punctuation() {
        let urls = extract_urls("(see https://a.example/x), right?");
        assert_eq!(urls, vec!["https://a.example/x".to_string()]);
    }

    #[test]
    fn test_extract_urls_ignores_non_http() {
        let urls = extract_urls("ftp://a.example/x mailto:x@a.example nothing");
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_notify_post_end_to_end() {
        let server = MockServer::start().await;
        // Remote page advertises a pingback endpoint...
        Mock::given(method("GET"))
            .and(path("/post"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Pingback", format!("{}/xmlrpc", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        // ...which accepts the ping.
        Mock::given(method("POST"))
            .and(path("/xmlrpc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                crate::notify::xmlrpc::string_response("registered"),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(init_client(&crate::config::Config::default()).unwrap());
        let stats = ProcessingStats::new();
        let post = LocalPost {
            url: "https://local.example/notice/1".to_string(),
            title: "hi".to_string(),
            excerpt: "hi there".to_string(),
            blog_name: "local.example".to_string(),
        };
        let text = format!("interesting: {}/post", server.uri());
        let delivered = notify_post(&fetcher, &post, &text, &stats).await;
        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn test_notify_post_skips_unreachable_urls() {
        let fetcher = Fetcher::new(init_client(&crate::config::Config::default()).unwrap());
        let stats = ProcessingStats::new();
        let post = LocalPost {
            url: "https://local.example/notice/1".to_string(),
            title: "hi".to_string(),
            excerpt: "hi".to_string(),
            blog_name: "local.example".to_string(),
        };
        let delivered = notify_post(&fetcher, &post, "see http://127.0.0.1:1/x", &stats).await;
        assert_eq!(delivered, 0);
    }
}
