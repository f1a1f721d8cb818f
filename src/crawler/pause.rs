//! Blocking waits used by the crawler
//!
//! Backoff sleeps and politeness delays both go through [`Pause`] so the
//! pipeline can be driven in tests without real waiting.

use async_trait::async_trait;
use std::time::Duration;

/// Capability to wait for a given duration
#[async_trait]
pub trait Pause: Send + Sync {
    /// Waits for `duration`
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested waits without sleeping
///
/// Used by tests to observe the backoff schedule.
#[derive(Debug, Default)]
pub struct RecordingPause {
    waits: std::sync::Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every wait requested so far, in order
    pub fn waits(&self) -> Vec<Duration> {
        self.waits
            .lock()
            .map(|waits| waits.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(duration);
        }
    }
}
