//! Outbound backlink notification.
//!
//! One sender per protocol, selected by the detected endpoint's tag. All
//! three share the same failure policy: delivery problems are logged with
//! the target and endpoint and swallowed, because sending a backlink must
//! never abort the save of the content that triggered it.

mod pingback;
mod trackback;
mod webmention;
pub mod xmlrpc;

use log::{info, warn};
use thiserror::Error;

use crate::detect::{BacklinkEndpoint, BacklinkProtocol};
use crate::error_handling::{ErrorType, LinkbackError, ProcessingStats};
use crate::fetch::Fetcher;

/// Metadata about the local post a notification is sent on behalf of.
/// Trackback sends all of it; Webmention and Pingback only need `url`.
#[derive(Debug, Clone)]
pub struct LocalPost {
    /// Canonical URL of the local post (the `source` of the notification).
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub blog_name: String,
}

/// Why a delivery attempt failed. Internal to the senders; `notify` turns
/// every variant into a log line.
#[derive(Debug, Error)]
pub(crate) enum SendFailure {
    #[error(transparent)]
    Transport(LinkbackError),
    #[error("endpoint rejected notification: {0}")]
    Rejected(String),
    #[error("remote fault {code}: {message}")]
    Fault {
        code: i64,
        message: String,
    },
}

/// Delivers one notification to a detected endpoint. Returns whether the
/// notification was accepted; failures are logged, never raised.
pub async fn notify(
    fetcher: &Fetcher,
    endpoint: &BacklinkEndpoint,
    post: &LocalPost,
    target_url: &str,
    stats: &ProcessingStats,
) -> bool {
    let outcome = match endpoint.protocol {
        BacklinkProtocol::Webmention => {
            webmention::send(fetcher, &post.url, target_url, &endpoint.endpoint).await
        }
        BacklinkProtocol::Pingback => {
            pingback::send(fetcher, &post.url, target_url, &endpoint.endpoint).await
        }
        BacklinkProtocol::Trackback => trackback::send(fetcher, post, &endpoint.endpoint).await,
    };

    match outcome {
        Ok(()) => {
            info!(
                "Delivered {} notification for {} to {}",
                endpoint.protocol, target_url, endpoint.endpoint
            );
            true
        }
        Err(failure) => {
            if matches!(failure, SendFailure::Fault { .. }) {
                stats.increment_error(ErrorType::XmlRpcFault);
            }
            stats.increment_error(ErrorType::OutboundDeliveryFailure);
            warn!(
                "Failed to deliver {} notification for {} to {}: {}",
                endpoint.protocol, target_url, endpoint.endpoint, failure
            );
            false
        }
    }
}
