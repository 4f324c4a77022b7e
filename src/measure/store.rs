use std::collections::BTreeMap;
use std::time::Duration;

use parking_lot::Mutex;

use super::Target;
use crate::error::{BenchError, Result};

/// Thread-safe mapping from target to its recorded durations (ns).
///
/// Keys are registered once by discovery; after that probes may only append.
/// Every access goes through one coarse lock so an append never races a
/// snapshot or a read.
pub struct MeasurementStore<K: Target> {
    inner: Mutex<BTreeMap<K, Vec<u64>>>,
}

impl<K: Target> MeasurementStore<K> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }

    /// Seed an empty sample collection for every target. Already known
    /// targets keep their samples.
    pub fn register<I>(&self, targets: I)
    where
        I: IntoIterator<Item = K>,
    {
        let mut inner = self.inner.lock();
        for target in targets {
            inner.entry(target).or_default();
        }
    }

    /// Append one sample. Never inserts a key.
    pub fn record(&self, target: &K, elapsed: Duration) -> Result<()> {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        match self.inner.lock().get_mut(target) {
            Some(samples) => {
                samples.push(nanos);
                Ok(())
            }
            None => Err(BenchError::UnknownTarget(target.label())),
        }
    }

    /// Copy of the current key set, in key order.
    pub fn targets(&self) -> Vec<K> {
        self.inner.lock().keys().cloned().collect()
    }

    /// Copy of one target's samples, in insertion order.
    pub fn samples(&self, target: &K) -> Option<Vec<u64>> {
        self.inner.lock().get(target).cloned()
    }

    /// Copy of the whole store, in key order.
    pub fn snapshot(&self) -> BTreeMap<K, Vec<u64>> {
        self.inner.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl<K: Target> Default for MeasurementStore<K> {
    fn default() -> Self {
        Self::new()
    }
}
