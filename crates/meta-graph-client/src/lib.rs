//! Meta Graph / Threads API client
//!
//! Covers the three contracts Postflow needs from the platform side:
//! building authorize URLs, exchanging OAuth codes for long-lived tokens,
//! and publishing image posts. Profile lookups are memoized with a moka
//! async cache. The platform is treated as a black box: every failure
//! surfaces the downstream message.

mod client;
mod error;
mod types;

pub use client::{MetaGraphClient, OAuthApp};
pub use error::{MetaGraphError, Result};
pub use types::{LinkedToken, Profile, Provider};
