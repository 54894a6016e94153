/* src/history/store.rs */

use super::backend::KvBackend;
use super::record::SavedFit;
use crate::error::{HistoryError, Result};

/// Storage keys used by a [`HistoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryKeys {
    pub history: String,
    /// Where pre-migration clients kept fits with data-URL images.
    pub legacy: String,
    pub migrated_flag: String,
}

impl Default for HistoryKeys {
    fn default() -> Self {
        Self {
            history: "fitcheck-history".to_string(),
            legacy: "fitCheckHistory".to_string(),
            migrated_flag: "fitcheck_idb_migrated".to_string(),
        }
    }
}

/// Append-only log of saved fits that evicts the oldest entries when the
/// backend runs out of room.
///
/// The whole sequence is rewritten on every change. Writes take `&mut self`,
/// so a single store never interleaves two read-modify-write cycles.
pub struct HistoryStore<B: KvBackend> {
    pub(super) backend: B,
    pub(super) keys: HistoryKeys,
}

impl<B: KvBackend> HistoryStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_keys(backend, HistoryKeys::default())
    }

    pub fn with_keys(backend: B, keys: HistoryKeys) -> Self {
        Self { backend, keys }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Appends `fit` and returns how many older fits were evicted to make room.
    ///
    /// Fails with [`HistoryError::StorageExhausted`] when the new fit alone
    /// does not fit; other backend failures are returned as they come.
    pub fn append(&mut self, fit: SavedFit) -> Result<usize> {
        let mut history = self.read_history()?;
        history.push(fit);

        // one attempt per record: each failed attempt evicts one until only the new fit is left
        let attempts = history.len();
        let mut evicted = 0;
        for _ in 0..attempts {
            let encoded = serde_json::to_vec(&history)?;
            match self.backend.put(&self.keys.history, &encoded) {
                Ok(()) => return Ok(evicted),
                Err(e) if e.is_quota_exceeded() => {
                    if history.len() <= 1 {
                        break;
                    }
                    let oldest = history.remove(0);
                    evicted += 1;
                    tracing::warn!(id = %oldest.id, "storage quota exceeded, removing oldest fit");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(HistoryError::StorageExhausted)
    }

    /// Fits in the order they were saved.
    pub fn list(&self) -> Result<Vec<SavedFit>> {
        self.read_history()
    }

    pub fn list_newest_first(&self) -> Result<Vec<SavedFit>> {
        let mut history = self.read_history()?;
        history.reverse();
        Ok(history)
    }

    pub fn get(&self, id: &str) -> Result<Option<SavedFit>> {
        Ok(self.read_history()?.into_iter().find(|fit| fit.id == id))
    }

    /// Returns `false` when no fit had that id.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let mut history = self.read_history()?;
        let before = history.len();
        history.retain(|fit| fit.id != id);
        if history.len() == before {
            return Ok(false);
        }
        self.write_history(&history)?;
        Ok(true)
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.read_history()?.len())
    }

    /// Drops every saved fit.
    pub fn clear(&mut self) -> Result<()> {
        self.backend.delete(&self.keys.history)?;
        Ok(())
    }

    /// Missing or unparsable history reads as empty.
    pub(super) fn read_history(&self) -> Result<Vec<SavedFit>> {
        let Some(raw) = self.backend.get(&self.keys.history)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_slice(&raw) {
            Ok(history) => Ok(history),
            Err(e) => {
                tracing::warn!(error = %e, "stored fit history is unreadable, treating it as empty");
                Ok(Vec::new())
            }
        }
    }

    pub(super) fn write_history(&mut self, history: &[SavedFit]) -> Result<()> {
        let encoded = serde_json::to_vec(history)?;
        self.backend.put(&self.keys.history, &encoded)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::history::backend::MemoryBackend;
    use std::collections::BTreeMap;

    fn fit(id: &str) -> SavedFit {
        SavedFit {
            id: id.to_string(),
            image: vec![0xAB; 32],
            score: 75,
            message: "Main character energy".to_string(),
            date: "2024-06-01T12:00:00.000Z".to_string(),
        }
    }

    /// A backend whose quota is exactly `n` records of the shape `fit` builds.
    fn capped_at(n: usize) -> MemoryBackend {
        let sample: Vec<SavedFit> = (0..n).map(|i| fit(&i.to_string())).collect();
        MemoryBackend::with_quota(serde_json::to_vec(&sample).unwrap().len())
    }

    fn ids<B: KvBackend>(store: &HistoryStore<B>) -> Vec<String> {
        store.list().unwrap().into_iter().map(|f| f.id).collect()
    }

    /// Fails every write with the configured error.
    struct Failing(fn() -> BackendError);

    impl KvBackend for Failing {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, BackendError> {
            Ok(None)
        }
        fn put(&mut self, _key: &str, _value: &[u8]) -> Result<(), BackendError> {
            Err((self.0)())
        }
        fn delete(&mut self, _key: &str) -> Result<(), BackendError> {
            Ok(())
        }
        fn keys(&self) -> Result<Vec<String>, BackendError> {
            Ok(Vec::new())
        }
    }

    /// Counts put attempts and refuses any value larger than `max_len` bytes.
    struct Counting {
        inner: BTreeMap<String, Vec<u8>>,
        max_len: usize,
        puts: usize,
    }

    impl KvBackend for Counting {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
            Ok(self.inner.get(key).cloned())
        }
        fn put(&mut self, key: &str, value: &[u8]) -> Result<(), BackendError> {
            self.puts += 1;
            if value.len() > self.max_len {
                return Err(BackendError::QuotaExceeded);
            }
            self.inner.insert(key.to_string(), value.to_vec());
            Ok(())
        }
        fn delete(&mut self, key: &str) -> Result<(), BackendError> {
            self.inner.remove(key);
            Ok(())
        }
        fn keys(&self) -> Result<Vec<String>, BackendError> {
            Ok(self.inner.keys().cloned().collect())
        }
    }

    #[test]
    fn append_then_list_preserves_every_field() {
        let mut store = HistoryStore::new(MemoryBackend::new());
        let mut saved = fit("1717243200000");
        saved.image = (0..=255).collect();
        saved.score = 100;
        saved.message = "Runway ready ✨".to_string();

        assert_eq!(store.append(fit("1")).unwrap(), 0);
        assert_eq!(store.append(saved.clone()).unwrap(), 0);

        let listed = store.list().unwrap();
        assert_eq!(listed.last(), Some(&saved));
        assert_eq!(store.list_newest_first().unwrap().first(), Some(&saved));
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.get("1717243200000").unwrap(), Some(saved));
    }

    #[test]
    fn full_medium_evicts_the_single_oldest() {
        let mut store = HistoryStore::new(capped_at(3));
        for id in ["1", "2", "3"] {
            assert_eq!(store.append(fit(id)).unwrap(), 0);
        }

        assert_eq!(store.append(fit("4")).unwrap(), 1);
        assert_eq!(ids(&store), vec!["2", "3", "4"]);
    }

    #[test]
    fn repeated_failures_evict_one_at_a_time() {
        let mut store = HistoryStore::new(Counting {
            inner: BTreeMap::new(),
            max_len: usize::MAX,
            puts: 0,
        });
        for id in ["1", "2", "3", "4", "5"] {
            store.append(fit(id)).unwrap();
        }

        store.backend.max_len = serde_json::to_vec(&vec![fit("4"), fit("6")]).unwrap().len();
        store.backend.puts = 0;

        assert_eq!(store.append(fit("6")).unwrap(), 4);
        assert_eq!(ids(&store), vec!["5", "6"]);
        assert_eq!(store.backend().puts, 5);
    }

    #[test]
    fn exhausted_when_the_new_fit_alone_does_not_fit() {
        let mut store = HistoryStore::new(Counting {
            inner: BTreeMap::new(),
            max_len: 8,
            puts: 0,
        });

        let err = store.append(fit("1")).unwrap_err();
        assert!(matches!(err, HistoryError::StorageExhausted));
        assert_eq!(store.backend().puts, 1);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn exhaustion_keeps_previous_history() {
        let mut store = HistoryStore::new(capped_at(2));
        store.append(fit("1")).unwrap();
        store.append(fit("2")).unwrap();

        let mut huge = fit("3");
        huge.image = vec![0; 4096];
        assert!(matches!(
            store.append(huge),
            Err(HistoryError::StorageExhausted)
        ));
        assert_eq!(ids(&store), vec!["1", "2"]);
    }

    #[test]
    fn other_failures_propagate_without_eviction() {
        let mut store = HistoryStore::new(Failing(|| {
            BackendError::Unavailable("access denied".to_string())
        }));
        let err = store.append(fit("1")).unwrap_err();
        assert!(matches!(
            err,
            HistoryError::Backend(BackendError::Unavailable(_))
        ));
    }

    #[test]
    fn unreadable_history_reads_as_empty() {
        let mut backend = MemoryBackend::new();
        backend.put("fitcheck-history", b"{not json").unwrap();
        let mut store = HistoryStore::new(backend);

        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 0);
        store.append(fit("1")).unwrap();
        assert_eq!(ids(&store), vec!["1"]);
    }

    #[test]
    fn remove_and_clear() {
        let mut store = HistoryStore::new(MemoryBackend::new());
        for id in ["1", "2", "3"] {
            store.append(fit(id)).unwrap();
        }

        assert!(store.remove("2").unwrap());
        assert!(!store.remove("2").unwrap());
        assert_eq!(ids(&store), vec!["1", "3"]);

        store.clear().unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}
