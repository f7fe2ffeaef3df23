//! Minimal XML-RPC encoding and decoding for the Pingback wire format.
//!
//! Pingback only ever exchanges `pingback.ping(string, string)` and a
//! string-or-fault response, so this sticks to exactly that subset. Responses
//! from remote blog engines are frequently sloppy XML; decoding is
//! regex-based and tolerant rather than a strict parse.

use std::sync::LazyLock;

use regex::Regex;

/// Decoded XML-RPC response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlRpcResponse {
    /// Successful call; carries the returned string (often a human-readable
    /// acknowledgement).
    Success(String),
    /// Remote fault.
    Fault { code: i64, message: String },
}

pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Builds the `pingback.ping(source, target)` method call.
pub fn build_ping_call(source: &str, target: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n\
         <methodCall>\n\
         <methodName>pingback.ping</methodName>\n\
         <params>\n\
         <param><value><string>{}</string></value></param>\n\
         <param><value><string>{}</string></value></param>\n\
         </params>\n\
         </methodCall>\n",
        escape_xml(source),
        escape_xml(target)
    )
}

/// Builds a successful string response.
pub fn string_response(value: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n\
         <methodResponse>\n\
         <params>\n\
         <param><value><string>{}</string></value></param>\n\
         </params>\n\
         </methodResponse>\n",
        escape_xml(value)
    )
}

/// Builds a fault response.
pub fn fault_response(code: i64, message: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n\
         <methodResponse>\n\
         <fault>\n\
         <value><struct>\n\
         <member><name>faultCode</name><value><int>{}</int></value></member>\n\
         <member><name>faultString</name><value><string>{}</string></value></member>\n\
         </struct></value>\n\
         </fault>\n\
         </methodResponse>\n",
        code,
        escape_xml(message)
    )
}

static FAULT_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<name>\s*faultCode\s*</name>\s*<value>\s*(?:<(?:int|i4)>)?\s*(-?\d+)")
        .expect("faultCode regex is valid")
});
static FAULT_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<name>\s*faultString\s*</name>\s*<value>\s*(?:<string>)?([^<]*)")
        .expect("faultString regex is valid")
});
static RESPONSE_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<value>\s*(?:<string>)?([^<]*)").expect("response value regex is valid")
});

/// Decodes an XML-RPC response body.
pub fn parse_response(body: &str) -> XmlRpcResponse {
    if body.contains("<fault>") {
        let code = FAULT_CODE
            .captures(body)
            .and_then(|c| c[1].parse::<i64>().ok())
            .unwrap_or(0);
        let message = FAULT_STRING
            .captures(body)
            .map(|c| unescape_xml(c[1].trim()))
            .unwrap_or_default();
        return XmlRpcResponse::Fault { code, message };
    }
    let value = RESPONSE_VALUE
        .captures(body)
        .map(|c| unescape_xml(c[1].trim()))
        .unwrap_or_default();
    XmlRpcResponse::Success(value)
}

static METHOD_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<methodName>\s*([^<]+?)\s*</methodName>").expect("method regex is valid")
});
static PARAM_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<param>\s*<value>(.*?)</value>\s*</param>").expect("param regex is valid")
});

/// Decodes an inbound method call into (method name, string params).
pub fn parse_method_call(body: &str) -> Option<(String, Vec<String>)> {
    let method = METHOD_NAME.captures(body)?[1].to_string();
    let params = PARAM_VALUE
        .captures_iter(body)
        .map(|c| {
            let inner = c[1].trim();
            let inner = inner
                .strip_prefix("<string>")
                .and_then(|s| s.strip_suffix("</string>"))
                .unwrap_or(inner);
            unescape_xml(inner.trim())
        })
        .collect();
    Some((method, params))
}
