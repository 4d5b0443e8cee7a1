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

//! Counter policies for the count block.
//!
//! A handle type fixes its policy through the [`RefCountMode`] parameter;
//! it is part of the type and never changes at runtime. [`Exclusive`] uses
//! plain integers and relies on the compiler confining all handles to one
//! thread; [`Atomic`] uses atomic counters and is safe under concurrent
//! copy, destroy, and pin from any number of threads.

use std::cell::Cell;
use std::sync::atomic::{fence, AtomicU32, Ordering};

/// Counter values above this threshold indicate a runaway handle leak;
/// crossing it aborts the process before the counter can wrap.
const MAX_REF_COUNT: u32 = i32::MAX as u32;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Atomic {}
    impl Sealed for super::Exclusive {}
}

/// Fixes how the two counters of a count block are stored and updated.
///
/// This trait is sealed; [`Atomic`] and [`Exclusive`] are the only
/// implementations. All methods are building blocks for the count block and
/// the handle types, not meant to be called directly.
pub trait RefCountMode: sealed::Sealed + Sized + 'static {
    /// Storage for a single counter.
    type Count;

    /// Creates a counter holding `initial`.
    fn new_count(initial: u32) -> Self::Count;

    /// Reads the current value. Under [`Atomic`] this is a relaxed snapshot
    /// suitable for debugging and advisory checks only.
    fn get(count: &Self::Count) -> u32;

    /// Increments the counter. The caller must already hold a reference
    /// accounted for in it, so the value cannot concurrently be zero.
    /// Aborts the process instead of overflowing.
    fn increment(count: &Self::Count);

    /// Decrements the counter and returns the value it held before.
    fn decrement(count: &Self::Count) -> u32;

    /// Increments only if the current value is non-zero and reports whether
    /// the increment happened. Never succeeds once the counter has reached
    /// zero, regardless of interleaving.
    fn try_increment(count: &Self::Count) -> bool;

    /// Orders the destroy/free work that follows a [`decrement`] returning 1
    /// after every operation performed behind the other releases.
    ///
    /// [`decrement`]: RefCountMode::decrement
    fn fence_before_reclaim();
}

/// Plain-integer counters for externally serialized use.
///
/// Handles in this mode contain non-`Send` internals, so the compiler keeps
/// every handle to a block on a single thread; the serialization the policy
/// requires is enforced rather than assumed.
pub enum Exclusive {}

/// Atomic counters, safe under concurrent copy, destroy, and pin from any
/// number of threads.
pub enum Atomic {}

impl RefCountMode for Exclusive {
    type Count = Cell<u32>;

    fn new_count(initial: u32) -> Self::Count {
        Cell::new(initial)
    }

    fn get(count: &Self::Count) -> u32 {
        count.get()
    }

    fn increment(count: &Self::Count) {
        let value = count.get();
        if value >= MAX_REF_COUNT {
            std::process::abort();
        }
        count.set(value + 1);
    }

    fn decrement(count: &Self::Count) -> u32 {
        let value = count.get();
        debug_assert!(value > 0, "reference count underflow");
        count.set(value - 1);
        value
    }

    fn try_increment(count: &Self::Count) -> bool {
        let value = count.get();
        if value == 0 {
            return false;
        }
        if value >= MAX_REF_COUNT {
            std::process::abort();
        }
        count.set(value + 1);
        true
    }

    fn fence_before_reclaim() {}
}

impl RefCountMode for Atomic {
    type Count = AtomicU32;

    fn new_count(initial: u32) -> Self::Count {
        AtomicU32::new(initial)
    }

    fn get(count: &Self::Count) -> u32 {
        count.load(Ordering::Relaxed)
    }

    fn increment(count: &Self::Count) {
        // Relaxed is enough here: the caller already holds a counted
        // reference, so the counter cannot concurrently reach zero and no
        // other memory depends on the increment being ordered.
        if count.fetch_add(1, Ordering::Relaxed) >= MAX_REF_COUNT {
            std::process::abort();
        }
    }

    fn decrement(count: &Self::Count) -> u32 {
        count.fetch_sub(1, Ordering::Release)
    }

    fn try_increment(count: &Self::Count) -> bool {
        let mut current = count.load(Ordering::Relaxed);
        loop {
            if current == 0 {
                return false;
            }
            if current >= MAX_REF_COUNT {
                std::process::abort();
            }
            // Acquire on success: the pinned object must be fully visible to
            // the thread that won the increment.
            match count.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    fn fence_before_reclaim() {
        // Pairs with the Release decrements: everything the other handles
        // did before releasing happens-before the destroy/free that follows.
        fence(Ordering::Acquire);
    }
}
