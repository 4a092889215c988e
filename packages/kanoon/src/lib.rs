//! Kanoon client - resilient access to the Indian Kanoon legal search API.
//!
//! Every request goes through [`KanoonClient::call`], which retries
//! transport failures, empty bodies and edge-proxy error pages with a
//! linear backoff and, once the attempts are spent, returns a sentinel
//! `{"errmsg": ...}` payload instead of an error.
//!
//! # Example
//!
//! ```
//! use kanoon_client::config;
//!
//! assert_eq!(
//!     config::search_path("right to privacy", 0, 1),
//!     "/search/?formInput=right+to+privacy&pagenum=0&maxpages=1"
//! );
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, runtime configuration and request path builders
//! - [`error`]: Error types and Result alias
//! - [`http`]: Transport trait and the HTTPS implementation
//! - [`client`]: The retrying client
//! - [`types`]: Search queries and result views

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use client::{is_error_page, sentinel_payload, KanoonClient, RetryPolicy};
pub use config::KanoonConfig;
pub use error::{KanoonError, Result};
pub use http::{HttpsTransport, Transport};
pub use types::{SearchHit, SearchQuery, SearchResults};
