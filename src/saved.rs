//! Ordered set of video ids the user has saved.
//!
//! Independent of the recipe cache: saving never fetches, and a saved id may
//! point at a recipe that is not cached. When a [`SavedStore`] is attached
//! the list is rehydrated from it at startup and written back after every
//! change; storage failures only cost durability.

use log::{debug, warn};
use std::sync::{Mutex, MutexGuard};

use crate::model::VideoId;
use crate::storage::SavedStore;

pub struct SavedRegistry {
    ids: Mutex<Vec<VideoId>>,
    store: Option<Box<dyn SavedStore>>,
}

impl SavedRegistry {
    /// Empty, memory-only registry.
    pub fn new() -> Self {
        Self {
            ids: Mutex::new(Vec::new()),
            store: None,
        }
    }

    /// Registry backed by `store`, rehydrated from its current contents.
    ///
    /// Unreadable or corrupt data starts the session empty.
    pub fn with_store(store: Box<dyn SavedStore>) -> Self {
        let ids = match store.load() {
            Ok(loaded) => dedup_in_order(loaded),
            Err(e) => {
                warn!("Starting with an empty saved list: {}", e);
                Vec::new()
            }
        };
        debug!("Rehydrated {} saved recipes", ids.len());

        Self {
            ids: Mutex::new(ids),
            store: Some(store),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<VideoId>> {
        self.ids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append `video_id` unless it is already saved.
    pub fn save(&self, video_id: &VideoId) {
        let mut ids = self.lock();
        if ids.contains(video_id) {
            return;
        }
        ids.push(video_id.clone());
        self.persist(&ids);
    }

    /// Remove `video_id` if present.
    pub fn unsave(&self, video_id: &VideoId) {
        let mut ids = self.lock();
        let Some(pos) = ids.iter().position(|id| id == video_id) else {
            return;
        };
        ids.remove(pos);
        self.persist(&ids);
    }

    /// Save if absent, unsave if present. Returns the new membership.
    pub fn toggle(&self, video_id: &VideoId) -> bool {
        let mut ids = self.lock();
        let saved = match ids.iter().position(|id| id == video_id) {
            Some(pos) => {
                ids.remove(pos);
                false
            }
            None => {
                ids.push(video_id.clone());
                true
            }
        };
        self.persist(&ids);
        saved
    }

    pub fn is_saved(&self, video_id: &VideoId) -> bool {
        self.lock().contains(video_id)
    }

    /// Snapshot of saved ids, oldest first.
    pub fn list(&self) -> Vec<VideoId> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Called with the list lock held so writes reach the store in mutation order
    fn persist(&self, ids: &[VideoId]) {
        if let Some(store) = &self.store {
            if let Err(e) = store.store(ids) {
                warn!("Saved list kept in memory only: {}", e);
            }
        }
    }
}

impl Default for SavedRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn dedup_in_order(ids: Vec<VideoId>) -> Vec<VideoId> {
    let mut out: Vec<VideoId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
