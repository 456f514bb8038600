//! Git-hosting REST client for Project Sync
//!
//! Everything that talks to the hosting API lives here:
//!
//! - [`RateLimiter`]: sliding-window admission control, one instance per
//!   remote collaborator
//! - [`Transport`]: the HTTP seam, with a `reqwest` implementation
//! - [`RemoteObjectClient`]: authenticated calls for repository metadata,
//!   branches, blobs, trees, commits, refs and the identity endpoints
//! - [`encoding`]: base64 <-> UTF-8 conversion for blob content

pub mod api;
pub mod client;
pub mod encoding;
pub mod error;
pub mod rate_limit;
pub mod transport;

pub use client::{ClientConfig, Credential, RemoteObjectClient};
pub use encoding::{DECODE_ERROR_PLACEHOLDER, decode_base64_utf8, encode_base64_utf8};
pub use error::{Error, Result};
pub use rate_limit::{Clock, RateLimitConfig, RateLimiter, SystemClock};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
