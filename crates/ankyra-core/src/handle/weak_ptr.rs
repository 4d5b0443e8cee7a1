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

//! The non-owning observer handle.

use std::fmt;
use std::ptr::NonNull;

use crate::count::{Atomic, RefCountBlock, RefCountMode};
use crate::handle::shared_ptr::SharedPtr;
use crate::handle::shared_ref::SharedRef;

/// The remembered target of a non-empty observer handle.
///
/// `object` may refer to an already-destroyed object; it is never
/// dereferenced except through a successful pin.
struct WeakTarget<T: ?Sized, M: RefCountMode> {
    object: NonNull<T>,
    block: NonNull<RefCountBlock<M>>,
}

/// A non-owning observer handle to a reference-counted object.
///
/// A `WeakPtr` never keeps the object alive; it keeps only the count block
/// alive, which lets it answer (race-free in [`Atomic`](crate::Atomic)
/// mode) whether the object still exists. Use [`pin`](WeakPtr::pin) to
/// promote it into a temporary owning handle; once the object has been
/// destroyed, every subsequent pin returns empty, permanently.
///
/// Weak handles break ownership cycles: two objects that refer to each
/// other through owning handles would never be destroyed.
pub struct WeakPtr<T: ?Sized, M: RefCountMode = Atomic> {
    target: Option<WeakTarget<T, M>>,
}

// Same reasoning as on `SharedRef`: an `Atomic`-mode observer can be pinned
// into an owning handle from any thread it reaches.
unsafe impl<T: ?Sized + Send + Sync> Send for WeakPtr<T, Atomic> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for WeakPtr<T, Atomic> {}

impl<T: ?Sized, M: RefCountMode> WeakPtr<T, M> {
    /// Creates an empty observer referring to nothing.
    pub fn null() -> Self {
        Self { target: None }
    }

    /// Attempts to promote this observer into an owning handle.
    ///
    /// On success the returned handle carries its own strong reference and
    /// keeps the object alive as usual. On failure (the observer is empty,
    /// or the object has already been destroyed) the result is an empty
    /// [`SharedPtr`]; a handle to a half-destroyed object can never be
    /// produced.
    pub fn pin(&self) -> SharedPtr<T, M> {
        let Some(target) = &self.target else {
            return SharedPtr::null();
        };
        if unsafe { RefCountBlock::try_add_strong(target.block) } {
            // The increment above is the new handle's owning reference.
            let shared = unsafe { SharedRef::from_raw_parts(target.object, target.block) };
            SharedPtr::from_inner(Some(shared))
        } else {
            SharedPtr::null()
        }
    }

    /// True if a [`pin`](WeakPtr::pin) performed now would succeed. Cheaper
    /// than pinning: the strong count is read, never touched.
    ///
    /// In [`Atomic`](crate::Atomic) mode the answer can be stale by the time
    /// it is used; pin and check the result when the object is actually
    /// needed.
    pub fn is_valid(&self) -> bool {
        self.target
            .as_ref()
            .is_some_and(|target| unsafe { RefCountBlock::is_object_alive(target.block) })
    }

    /// Releases the observer reference, if any, and becomes empty.
    pub fn reset(&mut self) {
        if let Some(target) = self.target.take() {
            unsafe { RefCountBlock::release_weak(target.block) };
        }
    }

    /// True if both observers remember the same object address; two empty
    /// observers compare equal.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.target, &other.target) {
            (Some(a), Some(b)) => a.object.cast::<()>() == b.object.cast::<()>(),
            (None, None) => true,
            _ => false,
        }
    }

    /// True if this observer still resolves (the object is alive) and its
    /// remembered address equals `object`.
    pub fn has_same_object(&self, object: *const T) -> bool {
        self.is_valid()
            && self
                .target
                .as_ref()
                .is_some_and(|target| std::ptr::eq(target.object.as_ptr(), object))
    }
}

impl<T: ?Sized, M: RefCountMode> From<&SharedRef<T, M>> for WeakPtr<T, M> {
    fn from(owner: &SharedRef<T, M>) -> Self {
        unsafe { RefCountBlock::add_weak(owner.block()) };
        Self {
            target: Some(WeakTarget {
                object: owner.object(),
                block: owner.block(),
            }),
        }
    }
}

impl<T: ?Sized, M: RefCountMode> From<&SharedPtr<T, M>> for WeakPtr<T, M> {
    /// An empty owning handle yields an empty observer.
    fn from(owner: &SharedPtr<T, M>) -> Self {
        match owner.inner() {
            Some(shared) => Self::from(shared),
            None => Self::null(),
        }
    }
}

impl<T: ?Sized, M: RefCountMode> Clone for WeakPtr<T, M> {
    /// Shares the count block directly: one more observer reference, no
    /// temporary owning handle involved.
    fn clone(&self) -> Self {
        let target = self.target.as_ref().map(|target| {
            unsafe { RefCountBlock::add_weak(target.block) };
            WeakTarget {
                object: target.object,
                block: target.block,
            }
        });
        Self { target }
    }
}

impl<T: ?Sized, M: RefCountMode> Drop for WeakPtr<T, M> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: ?Sized, M: RefCountMode> Default for WeakPtr<T, M> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized, M: RefCountMode> fmt::Debug for WeakPtr<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => f
                .debug_struct("WeakPtr")
                .field("object", &target.object)
                .field("alive", &self.is_valid())
                .finish(),
            None => f.write_str("WeakPtr(null)"),
        }
    }
}

/// Removes every dead observer from `handles`, keeping the relative order of
/// the remaining ones.
pub fn prune_expired<T: ?Sized, M: RefCountMode>(handles: &mut Vec<WeakPtr<T, M>>) {
    handles.retain(|handle| handle.is_valid());
}
