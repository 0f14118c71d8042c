//! OpenBD API v1 access.
//!
//! This module provides the raw client, the backoff state used when
//! retrying it, and tolerant types over the records it returns.

pub mod backoff;
pub mod client;
pub mod types;

pub use backoff::{Backoff, BackoffPolicy};
pub use client::{ApiError, OpenBdClient};
pub use types::{is_present, OpenBdRecord, Record};
