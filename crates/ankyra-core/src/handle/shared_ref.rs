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

//! The non-nullable owning handle.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;

use crate::count::{Atomic, RefCountBlock, RefCountMode};
use crate::handle::weak_ptr::WeakPtr;
use crate::shareable::Shareable;

/// A non-nullable owning handle to a reference-counted object.
///
/// A `SharedRef` always refers to a live object and can always be
/// dereferenced; prefer it over [`SharedPtr`](crate::SharedPtr) wherever the
/// value is known to exist. Cloning is cheap (one shared strong-count
/// increment), and the object is destroyed exactly when the last owning
/// handle (of either kind) is dropped.
///
/// The non-null invariant is carried by the type system: moves relocate the
/// handle and statically forbid use of the source, so no empty `SharedRef`
/// can ever be observed, and exchanging two handles in place is
/// `std::mem::swap`. Equality and hashing use the resolved object address,
/// never the count block.
pub struct SharedRef<T: ?Sized, M: RefCountMode = Atomic> {
    /// The managed object. May have been re-pointed by a cast; reclamation
    /// goes through the block's own concrete pointer, not this one.
    object: NonNull<T>,
    /// The count block shared by every handle to this object.
    block: NonNull<RefCountBlock<M>>,
    /// This handle co-owns the object.
    _owns: PhantomData<T>,
}

// An `Atomic`-mode handle hands `&T` to every thread holding a clone and
// drops `T` on whichever thread releases last, so both bounds are required.
unsafe impl<T: ?Sized + Send + Sync> Send for SharedRef<T, Atomic> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for SharedRef<T, Atomic> {}

impl<T: Shareable<M>, M: RefCountMode> SharedRef<T, M> {
    /// Allocates `object` on the heap and wraps it in a fresh handle with a
    /// strong count of one.
    ///
    /// This is the point where the count block is created and its destroy
    /// operation is bound to `T`; it also fires the one-shot
    /// [`Shareable::on_first_owner`] hook.
    pub fn new(object: T) -> Self {
        Self::from_box(Box::new(object))
    }

    /// Wraps an already-boxed object without copying it.
    pub fn from_box(object: Box<T>) -> Self {
        let object = NonNull::from(Box::leak(object));
        let block = RefCountBlock::<M>::allocate(object);
        let shared = Self {
            object,
            block,
            _owns: PhantomData,
        };
        shared.get().on_first_owner(&shared);
        shared
    }
}

impl<T: ?Sized, M: RefCountMode> SharedRef<T, M> {
    /// Assembles a handle from a pointer/block pair whose strong count
    /// already accounts for it.
    ///
    /// # Safety
    ///
    /// `block` must come from [`RefCountBlock::allocate`], `object` must be
    /// live for as long as the block's strong count stays positive, and one
    /// strong reference in the count must belong to the handle being built.
    pub(crate) unsafe fn from_raw_parts(
        object: NonNull<T>,
        block: NonNull<RefCountBlock<M>>,
    ) -> Self {
        Self {
            object,
            block,
            _owns: PhantomData,
        }
    }

    /// Returns a reference to the managed object.
    pub fn get(&self) -> &T {
        // The strong count this handle contributes keeps the object alive.
        unsafe { self.object.as_ref() }
    }

    /// Number of live owning handles sharing this object, including this
    /// one. A debugging aid: under [`Atomic`](crate::Atomic) the value may
    /// be stale by the time it is read.
    pub fn strong_count(&self) -> u32 {
        unsafe { RefCountBlock::strong_count(self.block) }
    }

    /// True if this is the only owning handle. Observer handles may remain.
    pub fn is_unique(&self) -> bool {
        self.strong_count() == 1
    }

    /// Creates an observer handle that does not keep the object alive.
    pub fn downgrade(&self) -> WeakPtr<T, M> {
        WeakPtr::from(self)
    }

    /// True if both handles resolve to the same object address.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.object.cast::<()>() == other.object.cast::<()>()
    }

    /// The resolved object address, for identity checks and logging only.
    /// The pointer must not be dereferenced beyond the scope in which an
    /// owning handle provably keeps the object alive.
    pub fn as_object_ptr(&self) -> *const T {
        self.object.as_ptr()
    }

    pub(crate) fn object(&self) -> NonNull<T> {
        self.object
    }

    pub(crate) fn block(&self) -> NonNull<RefCountBlock<M>> {
        self.block
    }
}

impl<T: ?Sized, M: RefCountMode> Clone for SharedRef<T, M> {
    /// A clone is a new first-class owning handle: it contributes its own
    /// strong reference and may outlive the source.
    fn clone(&self) -> Self {
        unsafe { RefCountBlock::add_strong(self.block) };
        Self {
            object: self.object,
            block: self.block,
            _owns: PhantomData,
        }
    }
}

impl<T: ?Sized, M: RefCountMode> Drop for SharedRef<T, M> {
    fn drop(&mut self) {
        // Consumes this handle's owning reference; the last release destroys
        // the object.
        unsafe { RefCountBlock::release_strong(self.block) };
    }
}

impl<T: ?Sized, M: RefCountMode> Deref for SharedRef<T, M> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.get()
    }
}

impl<T: Shareable<M>, M: RefCountMode> From<T> for SharedRef<T, M> {
    fn from(object: T) -> Self {
        Self::new(object)
    }
}

impl<T: Shareable<M>, M: RefCountMode> From<Box<T>> for SharedRef<T, M> {
    fn from(object: Box<T>) -> Self {
        Self::from_box(object)
    }
}

impl<T: ?Sized, M: RefCountMode> PartialEq for SharedRef<T, M> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: ?Sized, M: RefCountMode> Eq for SharedRef<T, M> {}

impl<T: ?Sized, M: RefCountMode> Hash for SharedRef<T, M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.object.cast::<()>().as_ptr() as usize).hash(state);
    }
}

impl<T: ?Sized, M: RefCountMode> fmt::Debug for SharedRef<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRef")
            .field("object", &self.object)
            .field("strong", &self.strong_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::Exclusive;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts destructor runs for lifetime assertions.
    struct Probe {
        hits: Rc<Cell<u32>>,
        value: u32,
    }

    impl Drop for Probe {
        fn drop(&mut self) {
            self.hits.set(self.hits.get() + 1);
        }
    }

    impl Shareable<Exclusive> for Probe {}
    impl Shareable for Probe {}

    /// A plain payload without destructor side effects.
    struct Value(u32);

    impl Shareable<Exclusive> for Value {}

    #[test]
    fn clone_tracks_the_owning_handle_count() {
        let first = SharedRef::<Value, Exclusive>::new(Value(7));
        assert_eq!(first.strong_count(), 1);
        assert!(first.is_unique());

        let second = first.clone();
        assert_eq!(first.strong_count(), 2);
        assert!(!second.is_unique());

        drop(second);
        assert_eq!(first.strong_count(), 1);
    }

    #[test]
    fn object_is_destroyed_with_the_last_owner() {
        let hits = Rc::new(Cell::new(0));
        let first = SharedRef::<Probe, Exclusive>::new(Probe {
            hits: hits.clone(),
            value: 11,
        });
        let second = first.clone();
        assert_eq!(second.value, 11);

        drop(first);
        assert_eq!(hits.get(), 0, "a live clone must keep the object alive");
        drop(second);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn deref_and_get_agree() {
        let shared = SharedRef::<Value, Exclusive>::new(Value(42));
        assert_eq!(shared.0, 42);
        assert_eq!(shared.get().0, 42);
    }

    #[test]
    fn equality_is_object_identity() {
        let first = SharedRef::<Value, Exclusive>::new(Value(1));
        let alias = first.clone();
        let other = SharedRef::<Value, Exclusive>::new(Value(1));

        assert_eq!(first, alias);
        assert!(first.ptr_eq(&alias));
        // Equal values, distinct objects.
        assert_ne!(first, other);
    }

    #[test]
    fn swap_exchanges_two_handles_in_place() {
        let mut first = SharedRef::<Value, Exclusive>::new(Value(1));
        let mut second = SharedRef::<Value, Exclusive>::new(Value(2));
        std::mem::swap(&mut first, &mut second);

        // Both handles stay fully valid, just exchanged.
        assert_eq!(first.0, 2);
        assert_eq!(second.0, 1);
        assert_eq!(first.strong_count(), 1);
        assert_eq!(second.strong_count(), 1);
    }

    #[test]
    fn from_value_and_from_box_wrap_without_copying_counts() {
        let from_value: SharedRef<Value, Exclusive> = Value(5).into();
        assert_eq!(from_value.0, 5);

        let from_box: SharedRef<Value, Exclusive> = Box::new(Value(6)).into();
        assert_eq!(from_box.0, 6);
        assert_eq!(from_box.strong_count(), 1);
    }
}
