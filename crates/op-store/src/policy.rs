use chrono::{DateTime, Duration, Utc};

use crate::store::OpRecord;

/// Decides whether a tracked operation has finished.
///
/// The polling contract stays the same whatever sits behind it, so a real
/// generation backend can replace [`ElapsedThreshold`] without touching the
/// store or the HTTP layer.
pub trait CompletionPolicy: Send + Sync {
    /// Returns the result URL once the operation counts as complete.
    fn completed(&self, record: &OpRecord, now: DateTime<Utc>) -> Option<String>;
}

/// Synthetic completion: done once a fixed wall-clock interval has elapsed
/// since the operation started, always yielding the same result URL.
pub struct ElapsedThreshold {
    threshold: Duration,
    video_url: String,
}

impl ElapsedThreshold {
    pub fn new(threshold: Duration, video_url: impl Into<String>) -> Self {
        Self {
            threshold,
            video_url: video_url.into(),
        }
    }
}

impl CompletionPolicy for ElapsedThreshold {
    fn completed(&self, record: &OpRecord, now: DateTime<Utc>) -> Option<String> {
        if now - record.started_at >= self.threshold {
            Some(self.video_url.clone())
        } else {
            None
        }
    }
}
