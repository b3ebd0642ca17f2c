//! In-memory tracker for long-running mock operations
//!
//! Holds one record per started operation, keyed by a generated id. Clients
//! poll by id; a [`CompletionPolicy`] decides when a pending operation counts
//! as finished, and the completing poll removes the record so later polls see
//! not-found. Process-local, not durable, lost on restart.

mod policy;
mod store;

pub use policy::{CompletionPolicy, ElapsedThreshold};
pub use store::{JobStatus, OpRecord, OpStore};
