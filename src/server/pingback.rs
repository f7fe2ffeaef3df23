//! Pingback receiving endpoint (XML-RPC).
//!
//! Always answers 200 with a `methodResponse`; problems are reported as
//! XML-RPC faults using the Pingback fault codes:
//! 16 (0x10) source does not exist, 17 (0x11) source does not link to
//! target, 33 (0x21) target not valid, 48 (0x30) already registered,
//! 49 (0x31) access denied, 0 generic.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{info, warn};

use crate::error_handling::LinkbackError;
use crate::notify::xmlrpc;

use super::AppState;

const FAULT_SOURCE_MISSING: i64 = 0x0010;
const FAULT_NO_LINK: i64 = 0x0011;
const FAULT_TARGET_INVALID: i64 = 0x0021;
const FAULT_ALREADY_REGISTERED: i64 = 0x0030;
const FAULT_ACCESS_DENIED: i64 = 0x0031;

/// Handles `POST /xmlrpc` carrying a `pingback.ping(source, target)` call.
pub async fn receive_pingback(State(state): State<AppState>, body: String) -> Response {
    let Some((method, params)) = xmlrpc::parse_method_call(&body) else {
        return xml_response(xmlrpc::fault_response(-32700, "parse error"));
    };
    if method != "pingback.ping" {
        return xml_response(xmlrpc::fault_response(
            -32601,
            &format!("unknown method {method}"),
        ));
    }
    let [source, target] = params.as_slice() else {
        return xml_response(xmlrpc::fault_response(
            -32602,
            "pingback.ping takes exactly two parameters",
        ));
    };

    let target_ref = match state.pipeline.resolve_target(target).await {
        Ok(target_ref) => target_ref,
        Err(e) => {
            warn!("Pingback target rejected ({target}): {e}");
            return xml_response(xmlrpc::fault_response(
                FAULT_TARGET_INVALID,
                "target is not a valid post on this site",
            ));
        }
    };

    match state.pipeline.ingest(source, &target_ref).await {
        Ok(report) if report.created => {
            info!("Pingback from {source} to {target} -> {}", report.record.uri);
            xml_response(xmlrpc::string_response(&format!(
                "Pingback from {source} to {target} registered"
            )))
        }
        Ok(_) => xml_response(xmlrpc::fault_response(
            FAULT_ALREADY_REGISTERED,
            "pingback already registered",
        )),
        Err(e) => {
            warn!("Pingback from {source} to {target} rejected: {e}");
            let (code, message) = match e {
                LinkbackError::Network { .. } | LinkbackError::Http { .. } => {
                    (FAULT_SOURCE_MISSING, "source could not be fetched")
                }
                LinkbackError::UnconfirmedBacklink(_) => {
                    (FAULT_NO_LINK, "source does not link to target")
                }
                LinkbackError::UnresolvableTarget(_) => {
                    (FAULT_TARGET_INVALID, "target is not a valid post on this site")
                }
                LinkbackError::LocalActorConflict(_) => (FAULT_ACCESS_DENIED, "access denied"),
                LinkbackError::Persistence { .. } => (0, "unable to record pingback"),
            };
            xml_response(xmlrpc::fault_response(code, message))
        }
    }
}

fn xml_response(body: String) -> Response {
    (StatusCode::OK, [("content-type", "text/xml")], body).into_response()
}
