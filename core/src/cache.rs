//! Process-lifetime result cache.
//!
//! Aggregates are computed once per process and never invalidated: not
//! by time, not by later ingestion. Stale-until-restart is the stated
//! consistency contract and is pinned by tests. Concurrent first requests
//! for the same name may compute twice; last writer wins the slot, and
//! both computations agree because the table does not change while
//! serving.

use crate::error::AnalyticsResult;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Named-aggregate memoization, keyed by query name.
#[derive(Default)]
pub struct ResultCache {
    slots: Mutex<HashMap<String, Value>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `name`, or compute, store and return it.
    ///
    /// The lock is not held across `compute`, so a miss race computes
    /// twice rather than serializing every reader behind one query. A
    /// failed computation caches nothing.
    pub fn get_or_compute<F>(&self, name: &str, compute: F) -> AnalyticsResult<Value>
    where
        F: FnOnce() -> AnalyticsResult<Value>,
    {
        if let Some(hit) = self.lock().get(name) {
            return Ok(hit.clone());
        }
        let value = compute()?;
        self.lock().insert(name.to_string(), value.clone());
        Ok(value)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        // A poisoned slot map is still usable: every write is a
        // last-writer-wins insert of a value that any racing computation
        // would reproduce.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
