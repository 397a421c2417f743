//! Process-wide cache of loaded model resources.
//!
//! Loading pretrained weights dominates call cost, so loaded model/codec
//! pairs are shared keyed by model id. At most one load per id is in flight
//! at a time: late arrivals block on the slot until the first loader
//! finishes, then reuse its handles. Loads for distinct ids proceed
//! concurrently.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Instant,
};

use tracing::{debug, info};

use crate::{
    models::{GenerativeModel, ModelError},
    registry::StrategyEntry,
    tokenizer::TokenCodec,
    types::ModelId,
};

/// A resolved strategy with its expensive resources loaded.
pub struct LoadedStrategy {
    pub model: Arc<dyn GenerativeModel>,
    pub codec: Arc<dyn TokenCodec>,
    pub prompt_prefix: Option<String>,
}

#[derive(Default)]
struct Slot {
    state: Mutex<Option<Arc<LoadedStrategy>>>,
}

#[derive(Default)]
pub struct ModelCache {
    slots: Mutex<HashMap<ModelId, Arc<Slot>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached handles for `model_id`, running the entry's
    /// loaders if this is the first request for it. A failed load leaves the
    /// slot empty so a later call can retry.
    pub fn get_or_load(
        &self,
        model_id: &str,
        entry: &StrategyEntry,
    ) -> Result<Arc<LoadedStrategy>, ModelError> {
        let slot = {
            let mut slots = self.slots.lock().expect("cache slot map poisoned");
            slots.entry(model_id.to_string()).or_default().clone()
        };

        // Holding the slot lock across the load is what serializes
        // concurrent callers for the same id.
        let mut state = slot.state.lock().expect("cache slot poisoned");
        if let Some(loaded) = state.as_ref() {
            debug!(%model_id, "reusing cached model resources");
            return Ok(loaded.clone());
        }

        info!(%model_id, "loading model resources");
        let start = Instant::now();
        let loaded = Arc::new(LoadedStrategy {
            model: entry.load_model()?,
            codec: entry.load_codec()?,
            prompt_prefix: entry.prompt_prefix().map(str::to_string),
        });
        info!(%model_id, "loaded model resources in {:?}", start.elapsed());

        *state = Some(loaded.clone());
        Ok(loaded)
    }

    /// Drops the cached handles for `model_id`. Returns whether anything
    /// was evicted.
    pub fn evict(&self, model_id: &str) -> bool {
        let mut slots = self.slots.lock().expect("cache slot map poisoned");
        slots.remove(model_id).is_some()
    }

    pub fn clear(&self) {
        let mut slots = self.slots.lock().expect("cache slot map poisoned");
        slots.clear();
    }

    /// Number of ids with completed loads.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().expect("cache slot map poisoned");
        slots
            .values()
            .filter(|slot| {
                slot.state
                    .lock()
                    .expect("cache slot poisoned")
                    .is_some()
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::stubs::{echo_entry, slow_echo_entry};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_second_load_reuses_cached_handles() {
        let counter = Arc::new(AtomicUsize::new(0));
        let cache = ModelCache::new();
        let entry = echo_entry("echo", counter.clone());

        let first = cache.get_or_load("echo", &entry).unwrap();
        let second = cache.get_or_load("echo", &entry).unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_at_most_one_load_in_flight_per_id() {
        let counter = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(ModelCache::new());
        let entry = slow_echo_entry("echo", counter.clone());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                let entry = entry.clone();
                std::thread::spawn(move || cache.get_or_load("echo", &entry).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_distinct_ids_load_separately() {
        let counter = Arc::new(AtomicUsize::new(0));
        let cache = ModelCache::new();

        cache
            .get_or_load("first", &echo_entry("first", counter.clone()))
            .unwrap();
        cache
            .get_or_load("second", &echo_entry("second", counter.clone()))
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_evict_allows_reload() {
        let counter = Arc::new(AtomicUsize::new(0));
        let cache = ModelCache::new();
        let entry = echo_entry("echo", counter.clone());

        cache.get_or_load("echo", &entry).unwrap();
        assert!(cache.evict("echo"));
        assert!(!cache.evict("echo"));
        cache.get_or_load("echo", &entry).unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
