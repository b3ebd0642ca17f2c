//! SigV4 presigned-URL generation for S3-compatible object storage
//!
//! Issues time-limited PUT URLs so browsers upload directly to the bucket
//! (Cloudflare R2 or any S3-compatible endpoint) instead of proxying bytes
//! through the application server. Signing is deterministic given a signing
//! time, which the tests pin.

mod signer;

pub use signer::{Presigner, PresignerConfig};
