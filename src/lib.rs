//! linkback: cross-protocol backlink notifications.
//!
//! This library implements both directions of the three legacy backlink
//! protocols (Webmention, Pingback and Trackback):
//!
//! - **Outbound**: scan a newly published post for referenced URLs, probe
//!   each for an advertised endpoint (Webmention preferred, then Pingback,
//!   then Trackback) and deliver a notification in the matching wire format,
//!   best-effort.
//! - **Inbound**: accept a notification, verify the source really references
//!   the target, parse its microformats2 markup, classify the mention
//!   (reply/repost/like/tag/mention), resolve the remote author, and persist
//!   the result exactly once.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use linkback::config::Config;
//! use linkback::error_handling::ProcessingStats;
//! use linkback::fetch::Fetcher;
//! use linkback::ingest::Pipeline;
//! use linkback::initialization::init_client;
//! use linkback::store::sqlite::SqliteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let store = Arc::new(SqliteStore::open(&config.db_path).await?);
//! let fetcher = Fetcher::new(init_client(&config)?);
//! let pipeline = Pipeline::new(
//!     fetcher,
//!     store.clone(),
//!     store,
//!     Arc::new(ProcessingStats::new()),
//! );
//!
//! let target = pipeline
//!     .resolve_target("https://social.example/notice/42")
//!     .await?;
//! let report = pipeline
//!     .ingest("https://remote.example/their-post", &target)
//!     .await?;
//! println!("saved mention {}", report.record.uri);
//! # Ok(())
//! # }
//! ```

pub mod author;
pub mod config;
pub mod detect;
pub mod entry;
pub mod error_handling;
pub mod fetch;
pub mod ingest;
pub mod initialization;
pub mod mf2;
pub mod notify;
pub mod outbound;
pub mod server;
pub mod store;
pub mod target;
mod utils;

// Re-export the types most embedders need.
pub use config::Config;
pub use detect::{detect, BacklinkEndpoint, BacklinkProtocol};
pub use entry::{EntryType, RsvpValue};
pub use error_handling::LinkbackError;
pub use fetch::{FetchResult, Fetcher};
pub use ingest::{IngestReport, Pipeline};
pub use notify::LocalPost;
