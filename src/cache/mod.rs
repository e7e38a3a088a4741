// Copyright 2025 StrataDB Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fingerprint-keyed caches
//!
//! Two cache fabrics with different contention profiles: the plan cache
//! sits behind a single reader-writer lock (plans are looked up once per
//! query), while the cardinality cache is sharded because plan enumeration
//! hammers it with thousands of lookups per optimization.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use lru::LruCache;
use parking_lot::RwLock;
use tracing::trace;

use crate::optimizer::LogicalPlanRef;

/// Default capacity of the plan cache
pub const DEFAULT_PLAN_CACHE_CAPACITY: usize = 128;

/// Bounded LRU cache of optimized plans, keyed by query fingerprint
pub struct PlanCache {
    entries: RwLock<LruCache<String, LogicalPlanRef>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_PLAN_CACHE_CAPACITY)
    }
}

impl PlanCache {
    /// Create a cache bounded to `capacity` plans
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("non-zero capacity");
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up an optimized plan
    pub fn get(&self, fingerprint: &str) -> Option<LogicalPlanRef> {
        let result = self.entries.write().get(fingerprint).cloned();
        match &result {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(fingerprint, "plan cache hit");
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    /// Store an optimized plan
    pub fn insert(&self, fingerprint: String, plan: LogicalPlanRef) {
        self.entries.write().put(fingerprint, plan);
    }

    /// (hits, misses) counters
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    /// Number of cached plans
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sharded cardinality cache keyed by subproblem fingerprint
#[derive(Debug, Default)]
pub struct CardinalityCache {
    entries: DashMap<String, f64, ahash::RandomState>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CardinalityCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached cardinality
    pub fn get(&self, fingerprint: &str) -> Option<f64> {
        let result = self.entries.get(fingerprint).map(|entry| *entry);
        match result {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    /// Store a cardinality
    pub fn insert(&self, fingerprint: String, cardinality: f64) {
        self.entries.insert(fingerprint, cardinality);
    }

    /// (hits, misses) counters
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
