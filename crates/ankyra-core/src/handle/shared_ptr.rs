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

//! The nullable owning handle.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::count::{Atomic, RefCountMode};
use crate::handle::shared_ref::SharedRef;
use crate::handle::weak_ptr::WeakPtr;
use crate::shareable::Shareable;

/// A nullable owning handle to a reference-counted object.
///
/// A `SharedPtr` is "maybe a [`SharedRef`]": while it holds an object it has
/// exactly the same count mechanics, and when empty it holds nothing at all.
/// Absence is ordinary data ([`get`](SharedPtr::get) returns `Option<&T>`
/// and callers check it), while narrowing to the non-null type via
/// [`to_shared_ref`](SharedPtr::to_shared_ref) treats emptiness as a
/// contract violation and panics.
///
/// Widening from [`SharedRef`] is always safe and goes through `From`.
pub struct SharedPtr<T: ?Sized, M: RefCountMode = Atomic> {
    inner: Option<SharedRef<T, M>>,
}

impl<T: Shareable<M>, M: RefCountMode> SharedPtr<T, M> {
    /// Allocates `object` on the heap and wraps it, exactly like
    /// [`SharedRef::new`].
    pub fn new(object: T) -> Self {
        Self {
            inner: Some(SharedRef::new(object)),
        }
    }
}

impl<T: ?Sized, M: RefCountMode> SharedPtr<T, M> {
    /// Creates an empty handle holding no object and no count block.
    pub fn null() -> Self {
        Self { inner: None }
    }

    pub(crate) fn from_inner(inner: Option<SharedRef<T, M>>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> Option<&SharedRef<T, M>> {
        self.inner.as_ref()
    }

    pub(crate) fn into_inner(self) -> Option<SharedRef<T, M>> {
        self.inner
    }

    /// True if this handle currently owns an object.
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// Returns the managed object, or `None` if the handle is empty.
    pub fn get(&self) -> Option<&T> {
        self.inner.as_ref().map(SharedRef::get)
    }

    /// Releases the owning reference, if any, and becomes empty. If this was
    /// the last owning handle the object is destroyed.
    pub fn reset(&mut self) {
        self.inner = None;
    }

    /// Narrows this handle into a [`SharedRef`].
    ///
    /// # Panics
    ///
    /// Panics if the handle is empty: a non-null handle must never come
    /// into existence without an object.
    pub fn to_shared_ref(&self) -> SharedRef<T, M> {
        match &self.inner {
            Some(shared) => shared.clone(),
            None => panic!("attempted to narrow an empty SharedPtr into a SharedRef"),
        }
    }

    /// Number of live owning handles sharing this object, including this
    /// one; zero when empty. Debugging aid, as on
    /// [`SharedRef::strong_count`].
    pub fn strong_count(&self) -> u32 {
        self.inner.as_ref().map_or(0, SharedRef::strong_count)
    }

    /// True if this handle owns an object and is the only owning handle.
    pub fn is_unique(&self) -> bool {
        self.inner.as_ref().is_some_and(SharedRef::is_unique)
    }

    /// Creates an observer handle; empty if this handle is empty.
    pub fn downgrade(&self) -> WeakPtr<T, M> {
        WeakPtr::from(self)
    }

    /// True if both handles resolve to the same object address; two empty
    /// handles compare equal.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: ?Sized, M: RefCountMode> Default for SharedPtr<T, M> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized, M: RefCountMode> Clone for SharedPtr<T, M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: ?Sized, M: RefCountMode> From<SharedRef<T, M>> for SharedPtr<T, M> {
    /// Widening is always safe: a non-null handle is a valid nullable one.
    fn from(shared: SharedRef<T, M>) -> Self {
        Self {
            inner: Some(shared),
        }
    }
}

impl<T: Shareable<M>, M: RefCountMode> From<T> for SharedPtr<T, M> {
    fn from(object: T) -> Self {
        Self::new(object)
    }
}

impl<T: Shareable<M>, M: RefCountMode> From<Box<T>> for SharedPtr<T, M> {
    fn from(object: Box<T>) -> Self {
        Self {
            inner: Some(SharedRef::from_box(object)),
        }
    }
}

impl<T: Shareable<M>, M: RefCountMode> From<Option<Box<T>>> for SharedPtr<T, M> {
    /// Wraps an optional allocation; `None` yields an empty handle.
    fn from(object: Option<Box<T>>) -> Self {
        Self {
            inner: object.map(SharedRef::from_box),
        }
    }
}

impl<T: ?Sized, M: RefCountMode> PartialEq for SharedPtr<T, M> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: ?Sized, M: RefCountMode> Eq for SharedPtr<T, M> {}

impl<T: ?Sized, M: RefCountMode> PartialEq<SharedRef<T, M>> for SharedPtr<T, M> {
    fn eq(&self, other: &SharedRef<T, M>) -> bool {
        self.inner.as_ref().is_some_and(|shared| shared.ptr_eq(other))
    }
}

impl<T: ?Sized, M: RefCountMode> PartialEq<SharedPtr<T, M>> for SharedRef<T, M> {
    fn eq(&self, other: &SharedPtr<T, M>) -> bool {
        other == self
    }
}

impl<T: ?Sized, M: RefCountMode> Hash for SharedPtr<T, M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.inner {
            Some(shared) => shared.hash(state),
            None => 0usize.hash(state),
        }
    }
}

impl<T: ?Sized, M: RefCountMode> fmt::Debug for SharedPtr<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(shared) => f.debug_tuple("SharedPtr").field(shared).finish(),
            None => f.write_str("SharedPtr(null)"),
        }
    }
}
