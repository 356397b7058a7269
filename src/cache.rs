//! Recipe cache keyed by [`VideoId`].
//!
//! Every id maps to at most one entry. A miss spawns exactly one extraction
//! task and parks a shared handle to it in the map; later requests for the
//! same id attach to that handle instead of issuing new work. The task
//! settles the entry itself before any waiter is woken, so the state seen
//! through [`RecipeCache::peek`] never lags behind a resolved caller.

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use crate::cold_start::ColdStartSignal;
use crate::error::RecipeError;
use crate::extractors::RecipeExtractor;
use crate::model::{Recipe, VideoId};

pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(60);

type Outcome = Result<Recipe, RecipeError>;
type PendingHandle = Shared<BoxFuture<'static, Outcome>>;

/// Read-only view of a cache entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    /// An extraction is in flight
    Pending,
    Ready(Recipe),
    /// Last extraction failed; a new request retries
    Failed(RecipeError),
}

impl CacheEntry {
    pub fn is_pending(&self) -> bool {
        matches!(self, CacheEntry::Pending)
    }

    pub fn recipe(&self) -> Option<&Recipe> {
        match self {
            CacheEntry::Ready(recipe) => Some(recipe),
            _ => None,
        }
    }
}

enum Slot {
    Pending {
        generation: u64,
        handle: PendingHandle,
    },
    Ready(Recipe),
    Failed(RecipeError),
}

impl Slot {
    fn view(&self) -> CacheEntry {
        match self {
            Slot::Pending { .. } => CacheEntry::Pending,
            Slot::Ready(recipe) => CacheEntry::Ready(recipe.clone()),
            Slot::Failed(err) => CacheEntry::Failed(err.clone()),
        }
    }
}

struct Inner {
    slots: Mutex<HashMap<VideoId, Slot>>,
    generation: AtomicU64,
    extractor: Arc<dyn RecipeExtractor>,
    cold_start: Arc<ColdStartSignal>,
    timeout: Duration,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HashMap<VideoId, Slot>> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Move a pending entry to its terminal state.
    ///
    /// Only the extraction that created the entry may settle it.
    fn settle(&self, video_id: &VideoId, generation: u64, outcome: &Outcome) {
        let mut slots = self.lock();
        match slots.get(video_id) {
            Some(Slot::Pending { generation: g, .. }) if *g == generation => {}
            _ => {
                debug!("Dropping stale extraction result for '{}'", video_id);
                return;
            }
        }

        let slot = match outcome {
            Ok(recipe) => {
                info!("Extracted recipe '{}' for '{}'", recipe.title, video_id);
                Slot::Ready(recipe.clone())
            }
            Err(err) => {
                warn!("Extraction failed for '{}': {}", video_id, err);
                Slot::Failed(err.clone())
            }
        };
        slots.insert(video_id.clone(), slot);
    }
}

/// Session-scoped recipe cache with request deduplication.
///
/// Cloning is cheap and every clone shares the same entries.
#[derive(Clone)]
pub struct RecipeCache {
    inner: Arc<Inner>,
}

impl RecipeCache {
    pub fn new(extractor: Arc<dyn RecipeExtractor>) -> Self {
        Self::with_options(
            extractor,
            Arc::new(ColdStartSignal::default()),
            DEFAULT_EXTRACTION_TIMEOUT,
        )
    }

    pub fn with_options(
        extractor: Arc<dyn RecipeExtractor>,
        cold_start: Arc<ColdStartSignal>,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
                extractor,
                cold_start,
                timeout,
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Return the recipe for `video_id`, extracting it if needed.
    ///
    /// A ready entry is returned without new work, a pending one is joined,
    /// and an absent or failed one starts exactly one extraction.
    ///
    /// Must be called from within a Tokio runtime; the extraction runs as a
    /// spawned task so it completes even if every caller stops waiting.
    pub async fn get_or_fetch(&self, video_id: &VideoId) -> Outcome {
        self.fetch(video_id, false, self.inner.timeout).await
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch), bounding a newly started
    /// extraction by `timeout` instead of the cache default. Joining an
    /// in-flight request keeps that request's bound.
    pub async fn get_or_fetch_with_timeout(&self, video_id: &VideoId, timeout: Duration) -> Outcome {
        self.fetch(video_id, false, timeout).await
    }

    /// Re-extract even if a ready entry exists. Joins an in-flight request.
    pub async fn refresh(&self, video_id: &VideoId) -> Outcome {
        self.fetch(video_id, true, self.inner.timeout).await
    }

    async fn fetch(&self, video_id: &VideoId, force: bool, timeout: Duration) -> Outcome {
        let (handle, started) = {
            let mut slots = self.inner.lock();
            match slots.get(video_id) {
                Some(Slot::Ready(recipe)) if !force => {
                    debug!("Cache hit for '{}'", video_id);
                    return Ok(recipe.clone());
                }
                Some(Slot::Pending { handle, .. }) => {
                    debug!("Joining in-flight extraction for '{}'", video_id);
                    (handle.clone(), false)
                }
                _ => {
                    debug!("Cache miss for '{}', starting extraction", video_id);
                    let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
                    let handle = self.spawn_extraction(video_id.clone(), generation, timeout);
                    slots.insert(
                        video_id.clone(),
                        Slot::Pending {
                            generation,
                            handle: handle.clone(),
                        },
                    );
                    (handle, true)
                }
            }
        };

        if started {
            self.inner.cold_start.on_extraction(video_id);
        }

        handle.await
    }

    fn spawn_extraction(&self, video_id: VideoId, generation: u64, timeout: Duration) -> PendingHandle {
        let inner = Arc::clone(&self.inner);
        let waiter_inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let waiter_id = video_id.clone();
        let task = tokio::spawn(async move {
            let extraction = AssertUnwindSafe(inner.extractor.extract(&video_id)).catch_unwind();
            let outcome = match tokio::time::timeout(timeout, extraction).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(RecipeError::ExtractionFailed(format!(
                    "extractor '{}' panicked",
                    inner.extractor.extractor_name()
                ))),
                Err(_) => Err(RecipeError::Timeout(timeout)),
            };
            inner.settle(&video_id, generation, &outcome);
            outcome
        });

        // A task cancelled with its runtime never reaches `settle`, so the
        // waiter does it instead.
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let outcome = Err(RecipeError::ExtractionFailed(format!(
                        "extraction task aborted: {}",
                        e
                    )));
                    if let Some(inner) = waiter_inner.upgrade() {
                        inner.settle(&waiter_id, generation, &outcome);
                    }
                    outcome
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Current entry for `video_id` without starting any work.
    pub fn peek(&self, video_id: &VideoId) -> Option<CacheEntry> {
        self.inner.lock().get(video_id).map(Slot::view)
    }

    /// Discard a settled entry so the next request re-extracts.
    ///
    /// In-flight extractions are left alone. Returns whether an entry was
    /// removed.
    pub fn invalidate(&self, video_id: &VideoId) -> bool {
        let mut slots = self.inner.lock();
        match slots.get(video_id) {
            Some(Slot::Pending { .. }) | None => false,
            Some(_) => {
                debug!("Invalidated '{}'", video_id);
                slots.remove(video_id);
                true
            }
        }
    }

    /// Discard every settled entry, leaving in-flight extractions in place.
    pub fn clear(&self) {
        let mut slots = self.inner.lock();
        let before = slots.len();
        slots.retain(|_, slot| matches!(slot, Slot::Pending { .. }));
        debug!("Cleared {} cache entries", before - slots.len());
    }

    /// Ids with a ready recipe, sorted.
    pub fn cached_ids(&self) -> Vec<VideoId> {
        let mut ids: Vec<VideoId> = self
            .inner
            .lock()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
