// Copyright 2025 eraflo
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

//! Process-wide handle telemetry.
//!
//! This module defines a set of global atomic counters tracking count-block
//! lifecycles. The block updates them as it allocates, destroys, and frees;
//! any part of the engine can read them in a thread-safe manner to watch for
//! handle leaks (a steadily growing live-block count) without instrumenting
//! call sites.

use std::sync::atomic::{AtomicU64, Ordering};

// --- Global Handle Counters ---

/// Tracks the total number of count blocks ever allocated.
pub static TOTAL_BLOCKS_ALLOCATED: AtomicU64 = AtomicU64::new(0);

/// Tracks the total number of count blocks freed.
pub static TOTAL_BLOCKS_FREED: AtomicU64 = AtomicU64::new(0);

/// Tracks the total number of managed objects destroyed.
pub static TOTAL_OBJECTS_DESTROYED: AtomicU64 = AtomicU64::new(0);

// --- Data Structures for Reporting ---

/// A snapshot of the handle lifecycle counters, including derived metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandleStats {
    /// The total number of count blocks ever allocated.
    pub blocks_allocated: u64,
    /// The total number of count blocks freed.
    pub blocks_freed: u64,
    /// The total number of managed objects destroyed.
    pub objects_destroyed: u64,
    /// The number of blocks currently allocated
    /// (`blocks_allocated` - `blocks_freed`).
    pub live_blocks: i64,
    /// The number of objects currently alive
    /// (`blocks_allocated` - `objects_destroyed`).
    pub live_objects: i64,
}

// --- Public API for Reading Stats ---

/// Takes a snapshot of the global handle counters.
///
/// All counters are read atomically (using `Ordering::Relaxed`), so a
/// snapshot taken while other threads churn handles is internally
/// approximate but each counter is individually exact-at-some-instant.
pub fn snapshot() -> HandleStats {
    let blocks_allocated = TOTAL_BLOCKS_ALLOCATED.load(Ordering::Relaxed);
    let blocks_freed = TOTAL_BLOCKS_FREED.load(Ordering::Relaxed);
    let objects_destroyed = TOTAL_OBJECTS_DESTROYED.load(Ordering::Relaxed);

    HandleStats {
        blocks_allocated,
        blocks_freed,
        objects_destroyed,
        live_blocks: blocks_allocated as i64 - blocks_freed as i64,
        live_objects: blocks_allocated as i64 - objects_destroyed as i64,
    }
}

pub(crate) fn record_block_allocated() {
    TOTAL_BLOCKS_ALLOCATED.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_block_freed() {
    TOTAL_BLOCKS_FREED.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_object_destroyed() {
    TOTAL_OBJECTS_DESTROYED.fetch_add(1, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::Exclusive;
    use crate::shareable::Shareable;
    use crate::SharedRef;

    struct Payload;
    impl Shareable<Exclusive> for Payload {}

    #[test]
    fn counters_follow_a_block_lifecycle() {
        // Other tests run in parallel and churn the globals, so assert on
        // deltas, not absolutes.
        let before = snapshot();

        let shared = SharedRef::<Payload, Exclusive>::new(Payload);
        let mid = snapshot();
        assert!(mid.blocks_allocated >= before.blocks_allocated + 1);

        drop(shared);
        let after = snapshot();
        assert!(after.objects_destroyed >= before.objects_destroyed + 1);
        assert!(after.blocks_freed >= before.blocks_freed + 1);
    }
}
