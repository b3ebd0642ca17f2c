use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::policy::CompletionPolicy;

/// A tracked in-flight operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpRecord {
    pub id: String,
    pub prompt: String,
    pub started_at: DateTime<Utc>,
}

/// Result of polling an operation by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Done { video_url: String },
    NotFound,
}

/// Keyed ephemeral store for operation records.
///
/// The lock guards plain map operations only; nothing awaits while holding
/// it. Concurrent inserts under the same id are last-write-wins.
pub struct OpStore {
    inner: Mutex<HashMap<String, OpRecord>>,
}

impl OpStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Insert or overwrite a record unconditionally.
    pub fn insert(&self, record: OpRecord) {
        let mut map = self.inner.lock().expect("op store lock poisoned");
        debug!(id = %record.id, "Tracking operation");
        map.insert(record.id.clone(), record);
    }

    /// Look up a record without mutating the store.
    pub fn get(&self, id: &str) -> Option<OpRecord> {
        let map = self.inner.lock().expect("op store lock poisoned");
        map.get(id).cloned()
    }

    /// Remove a record. Removing an absent id is a no-op.
    pub fn remove(&self, id: &str) {
        let mut map = self.inner.lock().expect("op store lock poisoned");
        map.remove(id);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("op store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Poll an operation: apply `policy` to the stored record and remove the
    /// record once completion is observed, so the next poll for the same id
    /// yields [`JobStatus::NotFound`].
    pub fn poll(
        &self,
        id: &str,
        policy: &dyn CompletionPolicy,
        now: DateTime<Utc>,
    ) -> JobStatus {
        let mut map = self.inner.lock().expect("op store lock poisoned");
        let Some(record) = map.get(id) else {
            return JobStatus::NotFound;
        };
        match policy.completed(record, now) {
            Some(video_url) => {
                map.remove(id);
                debug!(id = %id, "Operation complete, untracked");
                JobStatus::Done { video_url }
            }
            None => JobStatus::Pending,
        }
    }
}

impl Default for OpStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ElapsedThreshold;
    use chrono::Duration;

    fn record(id: &str, started_at: DateTime<Utc>) -> OpRecord {
        OpRecord {
            id: id.to_string(),
            prompt: "a test prompt".to_string(),
            started_at,
        }
    }

    #[test]
    fn test_get_unknown_id_is_none() {
        let store = OpStore::new();
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_insert_then_get_returns_record() {
        let store = OpStore::new();
        let started = Utc::now();
        store.insert(record("op1", started));

        let found = store.get("op1").unwrap();
        assert_eq!(found.id, "op1");
        assert_eq!(found.prompt, "a test prompt");
        assert_eq!(found.started_at, started);
    }

    #[test]
    fn test_insert_overwrites() {
        let store = OpStore::new();
        let first = Utc::now() - Duration::seconds(10);
        let second = Utc::now();
        store.insert(record("op1", first));
        store.insert(record("op1", second));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("op1").unwrap().started_at, second);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = OpStore::new();
        store.insert(record("op1", Utc::now()));

        store.remove("op1");
        assert!(store.get("op1").is_none());

        // Removing again must not panic or error
        store.remove("op1");
        assert!(store.get("op1").is_none());
    }

    #[test]
    fn test_poll_unknown_id_is_not_found() {
        let store = OpStore::new();
        let policy = ElapsedThreshold::new(Duration::seconds(35), "https://cdn.test/video.mp4");
        assert_eq!(store.poll("nope", &policy, Utc::now()), JobStatus::NotFound);
    }

    #[test]
    fn test_poll_before_threshold_is_pending() {
        let store = OpStore::new();
        let policy = ElapsedThreshold::new(Duration::seconds(35), "https://cdn.test/video.mp4");
        let started = Utc::now();
        store.insert(record("op1", started));

        let status = store.poll("op1", &policy, started + Duration::seconds(5));
        assert_eq!(status, JobStatus::Pending);
        // A pending poll must not consume the record
        assert!(store.get("op1").is_some());
    }

    #[test]
    fn test_completing_poll_removes_record() {
        let store = OpStore::new();
        let policy = ElapsedThreshold::new(Duration::seconds(35), "https://cdn.test/video.mp4");
        let started = Utc::now();
        store.insert(record("op1", started));

        let status = store.poll("op1", &policy, started + Duration::seconds(36));
        assert_eq!(
            status,
            JobStatus::Done {
                video_url: "https://cdn.test/video.mp4".to_string()
            }
        );

        // The completing poll deleted the entry; later polls see not-found
        assert_eq!(
            store.poll("op1", &policy, started + Duration::seconds(40)),
            JobStatus::NotFound
        );
        assert!(store.get("op1").is_none());
    }

    #[test]
    fn test_record_serialization() {
        let rec = record("op1", Utc::now());
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("op1"));
        let back: OpRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, rec.id);
        assert_eq!(back.started_at, rec.started_at);
    }
}
