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

//! The heap-allocated control structure shared by every handle to one
//! managed object.
//!
//! The weak counter is biased by one: all owning handles collectively hold
//! a single weak reference, released when the last owning handle goes away.
//! This serializes the two reclamation steps: the object is always
//! destroyed strictly before the block can be freed, in every interleaving.

use std::ptr::NonNull;

use super::RefCountMode;
use crate::stats;

/// Drops and deallocates the managed object as its concrete type `T`.
///
/// # Safety
///
/// `object` must be the pointer a `T` block was allocated for, and the
/// object must not have been destroyed yet.
unsafe fn destroy_boxed<T>(object: NonNull<()>) {
    drop(Box::from_raw(object.cast::<T>().as_ptr()));
}

/// Control object holding the strong/weak counts and the type-erased destroy
/// operation for one managed object.
pub(crate) struct RefCountBlock<M: RefCountMode> {
    /// Number of live owning handles.
    strong: M::Count,
    /// Number of live observer handles, plus the collective reference the
    /// strong side holds while the object is alive.
    weak: M::Count,
    /// Pointer to the start of the concrete allocation. Kept separately from
    /// the handles' own pointers, which may have been cast to other types.
    object: NonNull<()>,
    /// Drop shim monomorphized for the concrete pointee type at allocation
    /// time; never re-resolved through a handle's static type.
    destroy: unsafe fn(NonNull<()>),
}

impl<M: RefCountMode> RefCountBlock<M> {
    /// Allocates a fresh block for `object` with one owning reference and
    /// the weak bias in place.
    ///
    /// The destroy operation is bound to `T` here, once. A handle that is
    /// later cast to a different static type still destroys the object
    /// correctly, because reclamation goes through this binding and the
    /// stored `object` pointer rather than through the handle.
    pub(crate) fn allocate<T>(object: NonNull<T>) -> NonNull<Self> {
        let block = Box::new(Self {
            strong: M::new_count(1),
            weak: M::new_count(1),
            object: object.cast(),
            destroy: destroy_boxed::<T>,
        });
        let block = NonNull::from(Box::leak(block));
        stats::record_block_allocated();
        log::trace!("count block allocated at {:p}", block.as_ptr());
        block
    }

    /// Adds an owning reference.
    ///
    /// # Safety
    ///
    /// `this` must come from [`RefCountBlock::allocate`], and the caller must
    /// already hold a live owning reference to the same block; this is a
    /// copy, never a resurrection.
    pub(crate) unsafe fn add_strong(this: NonNull<Self>) {
        M::increment(&this.as_ref().strong);
    }

    /// Releases an owning reference.
    ///
    /// At the 1 -> 0 transition the managed object is destroyed, exactly
    /// once, and the collective weak reference is released, which frees the
    /// block if no observers remain.
    ///
    /// # Safety
    ///
    /// `this` must come from [`RefCountBlock::allocate`], and the caller must
    /// hold a live owning reference, which this call consumes. The block
    /// must not be accessed through that reference afterwards.
    pub(crate) unsafe fn release_strong(this: NonNull<Self>) {
        if M::decrement(&this.as_ref().strong) == 1 {
            M::fence_before_reclaim();
            let block = this.as_ref();
            log::trace!("destroying managed object at {:p}", block.object.as_ptr());
            (block.destroy)(block.object);
            stats::record_object_destroyed();
            Self::release_weak(this);
        }
    }

    /// Adds an observer reference.
    ///
    /// # Safety
    ///
    /// `this` must come from [`RefCountBlock::allocate`], and the caller must
    /// hold a live owning or observer reference to the same block.
    pub(crate) unsafe fn add_weak(this: NonNull<Self>) {
        M::increment(&this.as_ref().weak);
    }

    /// Releases an observer reference (or the strong side's collective one);
    /// the last release frees the block itself.
    ///
    /// # Safety
    ///
    /// `this` must come from [`RefCountBlock::allocate`], and the caller must
    /// hold a live weak reference, which this call consumes. The block must
    /// not be accessed through that reference afterwards.
    pub(crate) unsafe fn release_weak(this: NonNull<Self>) {
        if M::decrement(&this.as_ref().weak) == 1 {
            M::fence_before_reclaim();
            log::trace!("count block freed at {:p}", this.as_ptr());
            drop(Box::from_raw(this.as_ptr()));
            stats::record_block_freed();
        }
    }

    /// Attempts to add an owning reference without already holding one.
    ///
    /// Succeeds only while the object is alive; once the strong count has
    /// reached zero this fails permanently, so a destroyed object can never
    /// be resurrected.
    ///
    /// # Safety
    ///
    /// `this` must come from [`RefCountBlock::allocate`], and the caller must
    /// hold a live weak reference keeping the block itself alive.
    pub(crate) unsafe fn try_add_strong(this: NonNull<Self>) -> bool {
        M::try_increment(&this.as_ref().strong)
    }

    /// Current owning-handle count. Exact under [`Exclusive`], an advisory
    /// snapshot under [`Atomic`].
    ///
    /// # Safety
    ///
    /// `this` must come from [`RefCountBlock::allocate`] and still be alive
    /// (the caller holds a strong or weak reference).
    ///
    /// [`Exclusive`]: crate::Exclusive
    /// [`Atomic`]: crate::Atomic
    pub(crate) unsafe fn strong_count(this: NonNull<Self>) -> u32 {
        M::get(&this.as_ref().strong)
    }

    /// True while the managed object has not been destroyed.
    ///
    /// # Safety
    ///
    /// Same contract as [`RefCountBlock::strong_count`].
    pub(crate) unsafe fn is_object_alive(this: NonNull<Self>) -> bool {
        M::get(&this.as_ref().strong) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::Exclusive;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts how many times its destructor ran.
    struct Tally(Rc<Cell<u32>>);

    impl Drop for Tally {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn leak_tally(hits: &Rc<Cell<u32>>) -> NonNull<Tally> {
        NonNull::from(Box::leak(Box::new(Tally(hits.clone()))))
    }

    #[test]
    fn destroy_runs_once_at_last_strong_release() {
        let hits = Rc::new(Cell::new(0));
        let block = RefCountBlock::<Exclusive>::allocate(leak_tally(&hits));
        unsafe {
            RefCountBlock::add_strong(block);
            RefCountBlock::release_strong(block);
            assert_eq!(hits.get(), 0, "object must outlive the first release");
            RefCountBlock::release_strong(block);
        }
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn weak_reference_keeps_block_alive_after_destroy() {
        let hits = Rc::new(Cell::new(0));
        let block = RefCountBlock::<Exclusive>::allocate(leak_tally(&hits));
        unsafe {
            RefCountBlock::add_weak(block);
            RefCountBlock::release_strong(block);
            assert_eq!(hits.get(), 1);

            // The block is still allocated for the observer; pinning must
            // fail now and forever.
            assert!(!RefCountBlock::try_add_strong(block));
            assert!(!RefCountBlock::is_object_alive(block));
            RefCountBlock::release_weak(block);
        }
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn try_add_strong_succeeds_while_alive() {
        let hits = Rc::new(Cell::new(0));
        let block = RefCountBlock::<Exclusive>::allocate(leak_tally(&hits));
        unsafe {
            RefCountBlock::add_weak(block);
            assert!(RefCountBlock::try_add_strong(block));
            assert_eq!(RefCountBlock::strong_count(block), 2);
            RefCountBlock::release_strong(block);
            RefCountBlock::release_strong(block);
            RefCountBlock::release_weak(block);
        }
        assert_eq!(hits.get(), 1);
    }
}
