//! Pingback delivery: XML-RPC `pingback.ping` over POST.

use log::debug;

use crate::fetch::Fetcher;

use super::xmlrpc::{self, XmlRpcResponse};
use super::SendFailure;

pub(super) async fn send(
    fetcher: &Fetcher,
    source: &str,
    target: &str,
    endpoint: &str,
) -> Result<(), SendFailure> {
    let call = xmlrpc::build_ping_call(source, target);
    let result = fetcher
        .post_xml(endpoint, call)
        .await
        .map_err(SendFailure::Transport)?;

    if !result.is_success() {
        return Err(SendFailure::Rejected(format!("HTTP {}", result.status)));
    }

    match xmlrpc::parse_response(&result.body) {
        XmlRpcResponse::Success(message) => {
            debug!("Pingback accepted by {endpoint}: {message}");
            Ok(())
        }
        XmlRpcResponse::Fault { code, message } => Err(SendFailure::Fault { code, message }),
    }
}
