// Snapshot ledger: append-only, chronological, bounded by a retention limit.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::model::{MarketSnapshot, StorageError};
use std::collections::VecDeque;

/// Snapshots kept by default: 30 days of hourly captures.
pub const DEFAULT_RETENTION_LIMIT: usize = 720;

pub trait SnapshotStore {
    /// Adds a snapshot at the tail of the ledger, then evicts the oldest
    /// entries beyond the retention limit.
    fn append(&mut self, snapshot: MarketSnapshot) -> Result<(), StorageError>;

    /// The last `min(n, len)` snapshots, oldest first. Unreadable entries are
    /// logged and skipped.
    fn recent(&self, n: usize) -> Vec<MarketSnapshot>;

    /// Evicts the oldest snapshots until at most `keep_last` remain; returns
    /// the number evicted.
    fn prune(&mut self, keep_last: usize) -> Result<usize, StorageError>;

    fn len(&self) -> usize;

    fn retention_limit(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn latest(&self) -> Option<MarketSnapshot> {
        self.recent(1).pop()
    }
}

/// In-process ledger, used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: VecDeque<MarketSnapshot>,
    retention_limit: usize,
}

impl MemoryStore {
    pub fn new(retention_limit: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            retention_limit,
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn append(&mut self, snapshot: MarketSnapshot) -> Result<(), StorageError> {
        self.snapshots.push_back(snapshot);
        self.prune(self.retention_limit)?;
        Ok(())
    }

    fn recent(&self, n: usize) -> Vec<MarketSnapshot> {
        let skip = self.snapshots.len().saturating_sub(n);
        self.snapshots.iter().skip(skip).cloned().collect()
    }

    fn prune(&mut self, keep_last: usize) -> Result<usize, StorageError> {
        let excess = self.snapshots.len().saturating_sub(keep_last);
        self.snapshots.drain(..excess);
        Ok(excess)
    }

    fn len(&self) -> usize {
        self.snapshots.len()
    }

    fn retention_limit(&self) -> usize {
        self.retention_limit
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{quote, snapshot};
    use super::*;

    #[test]
    fn recent_on_empty_store_is_empty() {
        let store = MemoryStore::new(DEFAULT_RETENTION_LIMIT);
        assert!(store.recent(5).is_empty());
        assert!(store.latest().is_none());
    }

    #[test]
    fn recent_returns_tail_oldest_first() {
        let mut store = MemoryStore::new(DEFAULT_RETENTION_LIMIT);
        for i in 0..5 {
            store.append(snapshot(i, vec![quote("A", i as f64, 0.0, 1.0)])).unwrap();
        }
        let got = store.recent(3);
        let closes: Vec<f64> = got.iter().map(|s| s.quotes[0].close).collect();
        assert_eq!(closes, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn append_evicts_beyond_retention_limit() {
        let mut store = MemoryStore::new(DEFAULT_RETENTION_LIMIT);
        for i in 0..730 {
            store.append(snapshot(i, vec![quote("A", i as f64, 0.0, 1.0)])).unwrap();
        }
        let got = store.recent(1000);
        assert_eq!(got.len(), 720);
        assert_eq!(got.first().unwrap().quotes[0].close, 10.0);
        assert_eq!(got.last().unwrap().quotes[0].close, 729.0);
        assert!(got.windows(2).all(|w| w[0].captured_at < w[1].captured_at));
    }

    #[test]
    fn empty_snapshot_is_still_stored() {
        let mut store = MemoryStore::new(3);
        store.append(snapshot(0, vec![])).unwrap();
        assert_eq!(store.len(), 1);
    }
}
