//! Advisory "backend may be waking up" notification.
//!
//! The notice is fired when the cache issues its first extraction of the
//! session, and again after an optional idle period. It never blocks or
//! alters the extraction itself.

use log::info;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::broadcast;

use crate::model::VideoId;

const CHANNEL_CAPACITY: usize = 16;

/// Payload delivered to cold-start subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColdStartNotice {
    /// The request that triggered the notice
    pub video_id: VideoId,
    pub issued_at: SystemTime,
}

pub struct ColdStartSignal {
    sender: broadcast::Sender<ColdStartNotice>,
    idle_threshold: Option<Duration>,
    last_extraction: Mutex<Option<Instant>>,
}

impl ColdStartSignal {
    /// `idle_threshold` of `None` fires only on the first extraction.
    pub fn new(idle_threshold: Option<Duration>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            idle_threshold,
            last_extraction: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ColdStartNotice> {
        self.sender.subscribe()
    }

    /// Record that an extraction call is about to be issued.
    ///
    /// Returns whether a notice was emitted.
    pub fn on_extraction(&self, video_id: &VideoId) -> bool {
        let now = Instant::now();
        let mut last = self
            .last_extraction
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let should_fire = match (*last, self.idle_threshold) {
            (None, _) => true,
            (Some(prev), Some(idle)) => now.duration_since(prev) >= idle,
            (Some(_), None) => false,
        };
        *last = Some(now);
        drop(last);

        if should_fire {
            info!("Backend may be waking up (triggered by '{}')", video_id);
            // No subscribers is fine; the notice is advisory
            let _ = self.sender.send(ColdStartNotice {
                video_id: video_id.clone(),
                issued_at: SystemTime::now(),
            });
        }
        should_fire
    }
}

impl Default for ColdStartSignal {
    fn default() -> Self {
        Self::new(None)
    }
}
