//! Intermediate data store: capacity-bounded artifacts keyed by identifier
//!
//! Later tool calls reference data by identifier instead of carrying whole
//! tables. The store evicts the least-recently-accessed artifact once its
//! capacity is exceeded and remembers the most recently evicted identifiers
//! (a few per slot), so a lookup of an evicted artifact fails with
//! [`Error::StaleReference`] rather than [`Error::NotFound`]. Identifiers
//! evicted longer ago than that fall back to [`Error::NotFound`].
//!
//! All mutations are serialized behind one async mutex; access recency is a
//! monotonic counter, so eviction order depends only on the call sequence.

use crate::artifact::{StoredArtifact, identifier_for};
use cached::{Cached, SizedCache};
use finagent_core::{Error, Result};
use finagent_indicators::IndicatorSet;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

struct Entry {
    artifact: StoredArtifact,
    last_access: u64,
}

/// Evicted identifiers remembered per unit of capacity
const TOMBSTONES_PER_SLOT: usize = 4;

struct StoreState {
    entries: HashMap<String, Entry>,
    evicted: SizedCache<String, ()>,
    tick: u64,
}

impl StoreState {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            evicted: SizedCache::with_size(capacity.saturating_mul(TOMBSTONES_PER_SLOT).max(1)),
            tick: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn lookup(&mut self, identifier: &str) -> Result<StoredArtifact> {
        let tick = self.next_tick();
        match self.entries.get_mut(identifier) {
            Some(entry) => {
                entry.last_access = tick;
                Ok(entry.artifact.clone())
            }
            None if self.evicted.cache_get(identifier).is_some() => {
                Err(Error::StaleReference(identifier.to_string()))
            }
            None => Err(Error::NotFound(format!("no artifact with identifier '{identifier}'"))),
        }
    }

    fn insert(&mut self, artifact: StoredArtifact) {
        let tick = self.next_tick();
        let _ = self.evicted.cache_remove(&artifact.identifier);
        self.entries.insert(
            artifact.identifier.clone(),
            Entry {
                artifact,
                last_access: tick,
            },
        );
    }

    fn evict_over(&mut self, capacity: usize) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.entries.len() > capacity {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            self.entries.remove(&oldest);
            let _ = self.evicted.cache_set(oldest.clone(), ());
            evicted.push(oldest);
        }
        evicted
    }
}

/// Outcome of [`ArtifactStore::put`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutcome {
    pub identifier: String,
    /// True when an artifact with this identifier already existed
    pub existing: bool,
}

/// Capacity-bounded artifact store
pub struct ArtifactStore {
    capacity: usize,
    state: Mutex<StoreState>,
}

impl ArtifactStore {
    /// Create a store holding at most `capacity` artifacts (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(StoreState::new(capacity.max(1))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Store `artifact` under its deterministic identifier
    ///
    /// If the identifier already exists the stored artifact is kept as is
    /// and only its access recency is refreshed.
    pub async fn put(&self, mut artifact: StoredArtifact) -> PutOutcome {
        artifact.identifier = identifier_for(&artifact.summary.symbol, artifact.summary.requested, artifact.kind);
        let identifier = artifact.identifier.clone();

        let mut state = self.state.lock().await;
        if state.lookup(&identifier).is_ok() {
            debug!(identifier = %identifier, "Artifact already stored");
            return PutOutcome {
                identifier,
                existing: true,
            };
        }

        state.insert(artifact);
        self.log_evictions(state.evict_over(self.capacity));
        debug!(identifier = %identifier, size = state.entries.len(), "Stored artifact");

        PutOutcome {
            identifier,
            existing: false,
        }
    }

    /// Fetch an artifact, refreshing its access recency
    pub async fn get(&self, identifier: &str) -> Result<StoredArtifact> {
        self.state.lock().await.lookup(identifier)
    }

    /// Attach `indicators` to the artifact behind `identifier`
    ///
    /// Produces (or replaces) the enriched view and returns its identifier.
    /// The source artifact stays accessible and its series is not modified.
    /// Enriching an enriched identifier targets the same enriched view.
    pub async fn attach_indicators(&self, identifier: &str, indicators: IndicatorSet) -> Result<String> {
        let mut state = self.state.lock().await;
        let source = state.lookup(identifier)?;

        if indicators.len() != source.series.len() {
            return Err(Error::Validation(format!(
                "indicator set covers {} bars but '{identifier}' has {}",
                indicators.len(),
                source.series.len()
            )));
        }

        let enriched = source.enriched(indicators);
        let enriched_id = enriched.identifier.clone();
        state.insert(enriched);
        self.log_evictions(state.evict_over(self.capacity));
        debug!(source = %identifier, identifier = %enriched_id, "Attached indicators");

        Ok(enriched_id)
    }

    /// Whether `identifier` is currently stored (does not refresh recency)
    pub async fn contains(&self, identifier: &str) -> bool {
        self.state.lock().await.entries.contains_key(identifier)
    }

    /// Number of stored artifacts
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Stored identifiers, least recently accessed first
    pub async fn identifiers(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut entries: Vec<(&String, u64)> = state
            .entries
            .iter()
            .map(|(id, entry)| (id, entry.last_access))
            .collect();
        entries.sort_by_key(|(_, tick)| *tick);
        entries.into_iter().map(|(id, _)| id.clone()).collect()
    }

    fn log_evictions(&self, evicted: Vec<String>) {
        for identifier in evicted {
            warn!(identifier = %identifier, capacity = self.capacity, "Evicted artifact");
        }
    }
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactKind, ArtifactSummary, DateRange};
    use chrono::NaiveDate;
    use finagent_indicators::{Bar, PriceSeries, add_all_indicators};
    use std::sync::Arc;

    fn artifact(symbol: &str, start_day: u32) -> StoredArtifact {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let series = PriceSeries::new(vec![
            Bar::new(d(start_day), 10.0, 11.0, 9.0, 10.5, 100.0),
            Bar::new(d(start_day + 1), 10.5, 11.5, 10.0, 11.0, 120.0),
        ])
        .unwrap();
        let range = DateRange::new(d(start_day), d(start_day + 5));
        StoredArtifact::raw(ArtifactSummary::new(symbol, symbol, range, &series), series)
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let store = ArtifactStore::new(4);
        let first = store.put(artifact("600519", 1)).await;
        let second = store.put(artifact("600519", 1)).await;

        assert_eq!(first.identifier, "600519:20240101:20240106");
        assert_eq!(first.identifier, second.identifier);
        assert!(!first.existing);
        assert!(second.existing);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let store = ArtifactStore::new(4);
        assert!(matches!(store.get("nope").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_eviction_is_least_recently_accessed() {
        let store = ArtifactStore::new(2);
        let a = store.put(artifact("600519", 1)).await.identifier;
        let b = store.put(artifact("000001", 1)).await.identifier;

        // touch `a` so `b` becomes the eviction candidate
        store.get(&a).await.unwrap();
        let c = store.put(artifact("510300", 1)).await.identifier;

        assert_eq!(store.len().await, 2);
        assert!(store.get(&a).await.is_ok());
        assert!(store.get(&c).await.is_ok());
        assert_eq!(store.get(&b).await, Err(Error::StaleReference(b.clone())));
    }

    #[tokio::test]
    async fn test_refetch_clears_stale_marker() {
        let store = ArtifactStore::new(1);
        let a = store.put(artifact("600519", 1)).await.identifier;
        store.put(artifact("000001", 1)).await;
        assert!(matches!(store.get(&a).await, Err(Error::StaleReference(_))));

        store.put(artifact("600519", 1)).await;
        assert!(store.get(&a).await.is_ok());
    }

    #[tokio::test]
    async fn test_attach_indicators() {
        let store = ArtifactStore::new(4);
        let raw_id = store.put(artifact("600519", 1)).await.identifier;
        let raw = store.get(&raw_id).await.unwrap();

        let enriched_id = store
            .attach_indicators(&raw_id, add_all_indicators(&raw.series))
            .await
            .unwrap();
        assert_eq!(enriched_id, format!("{raw_id}:e"));

        let enriched = store.get(&enriched_id).await.unwrap();
        assert_eq!(enriched.kind, ArtifactKind::Enriched);
        assert!(enriched.indicators.as_ref().unwrap().contains("rsi_14"));
        assert!(Arc::ptr_eq(&enriched.series, &raw.series));

        let raw_again = store.get(&raw_id).await.unwrap();
        assert!(raw_again.indicators.is_none());

        let again = store
            .attach_indicators(&enriched_id, add_all_indicators(&raw.series))
            .await
            .unwrap();
        assert_eq!(again, enriched_id);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_attach_indicators_at_capacity() {
        let store = ArtifactStore::new(1);
        let raw_id = store.put(artifact("600519", 1)).await.identifier;
        let raw = store.get(&raw_id).await.unwrap();

        let enriched_id = store
            .attach_indicators(&raw_id, add_all_indicators(&raw.series))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&raw_id).await, Err(Error::StaleReference(raw_id.clone())));
        let enriched = store.get(&enriched_id).await.unwrap();
        assert_eq!(enriched.kind, ArtifactKind::Enriched);
    }

    #[tokio::test]
    async fn test_stale_markers_are_bounded() {
        let store = ArtifactStore::new(1);
        let mut ids = Vec::new();
        for i in 0..6 {
            ids.push(store.put(artifact(&format!("60000{i}"), 1)).await.identifier);
        }

        // five evictions against a memory of four
        assert!(matches!(store.get(&ids[0]).await, Err(Error::NotFound(_))));
        for id in &ids[1..5] {
            assert_eq!(store.get(id).await, Err(Error::StaleReference(id.clone())));
        }
        assert!(store.get(&ids[5]).await.is_ok());
    }

    #[tokio::test]
    async fn test_attach_rejects_misaligned_set() {
        let store = ArtifactStore::new(4);
        let raw_id = store.put(artifact("600519", 1)).await.identifier;
        let err = store.attach_indicators(&raw_id, IndicatorSet::new(5)).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_identifiers_in_access_order() {
        let store = ArtifactStore::new(4);
        let a = store.put(artifact("600519", 1)).await.identifier;
        let b = store.put(artifact("000001", 1)).await.identifier;
        store.get(&a).await.unwrap();
        assert_eq!(store.identifiers().await, vec![b, a]);
    }
}
