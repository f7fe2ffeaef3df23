//! Configuration constants.
//!
//! Timeouts, size limits and protocol constants used throughout the crate.

// Network operation limits
/// Per-request HTTP timeout in seconds.
pub const FETCH_TIMEOUT_SECS: u64 = 10;
/// Maximum redirect hops the HTTP client will follow.
pub const MAX_REDIRECT_HOPS: usize = 10;
/// Maximum response body size in bytes (2MB). Remote pages larger than this
/// are truncated before parsing to bound memory use on hostile input.
pub const MAX_RESPONSE_BODY_SIZE: usize = 2 * 1024 * 1024;
/// Maximum URL length accepted anywhere in the pipeline.
pub const MAX_URL_LENGTH: usize = 2048;

/// Default User-Agent for outbound requests. Overridable via `--user-agent`.
pub const DEFAULT_USER_AGENT: &str =
    concat!("linkback/", env!("CARGO_PKG_VERSION"), " (backlink notifier)");

// Mention content limits
/// Maximum plain-text length of a persisted mention. Longer remote content is
/// truncated with an attribution link back to the source appended.
pub const MAX_MENTION_LENGTH: usize = 1000;
/// Excerpt length sent in outbound Trackback pings.
pub const TRACKBACK_EXCERPT_LENGTH: usize = 255;

// Inbound server defaults
/// Default port for the inbound notification endpoints.
pub const DEFAULT_LISTEN_PORT: u16 = 8370;
/// Default SQLite database path.
pub const DB_PATH: &str = "./linkback.db";

// Rel values recognized by the Webmention endpoint discovery. The legacy
// rel URL predates the standardized token and is still advertised by old
// deployments.
pub const WEBMENTION_REL: &str = "webmention";
pub const WEBMENTION_REL_LEGACY: &str = "http://webmention.org/";
