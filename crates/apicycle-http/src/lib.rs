//! HTTP layer for apicycle
//!
//! Provides the pieces the lifecycle runner needs to talk to an API under
//! test:
//! - Owned request/response types decoupled from any particular client
//! - A [`Transport`] trait so tests can substitute a scripted backend
//! - A reqwest-backed transport for real runs
//! - [`send_with_retry`], a bounded exponential-backoff wrapper that only
//!   retries server-class (5xx) failures

#![warn(unreachable_pub)]

pub mod retry;
pub mod transport;
pub mod types;

pub use retry::{send_with_retry, RetryPolicy};
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use types::{ApiRequest, ApiResponse, Method};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
