//! Webmention delivery: form-encoded `source`/`target` POST.

use crate::fetch::Fetcher;

use super::SendFailure;

pub(super) async fn send(
    fetcher: &Fetcher,
    source: &str,
    target: &str,
    endpoint: &str,
) -> Result<(), SendFailure> {
    let result = fetcher
        .post_form(endpoint, &[("source", source), ("target", target)])
        .await
        .map_err(SendFailure::Transport)?;

    // 200 (processed synchronously) and 202 (queued) both count as delivered.
    match result.status {
        200 | 202 => Ok(()),
        status => Err(SendFailure::Rejected(format!("HTTP {status}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialization::init_client;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        Fetcher::new(init_client(&crate::config::Config::default()).unwrap())
    }

    #[tokio::test]
    async fn test_send_posts_source_and_target() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wm"))
            .and(body_string_contains("source=https%3A%2F%2Fa.example%2Fp"))
            .and(body_string_contains("target=https%3A%2F%2Fb.example%2Fq"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = format!("{}/wm", server.uri());
        let sent = send(
            &fetcher(),
            "https://a.example/p",
            "https://b.example/q",
            &endpoint,
        )
        .await;
        assert!(sent.is_ok());
    }

    #[tokio::test]
    async fn test_send_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let endpoint = format!("{}/wm", server.uri());
        let sent = send(
            &fetcher(),
            "https://a.example/p",
            "https://b.example/q",
            &endpoint,
        )
        .await;
        assert!(matches!(sent, Err(SendFailure::Rejected(_))));
    }
}
