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

//! Casts that re-point a handle at a different static type while sharing the
//! same count block.
//!
//! Every cast mints a first-class handle: it contributes its own strong
//! reference and may outlive the source. Reclamation is unaffected, because
//! the block destroys the object through the concrete type captured when it
//! was allocated, no matter what static types the surviving handles carry.

use std::ptr::NonNull;

use crate::count::{RefCountBlock, RefCountMode};
use crate::handle::shared_ptr::SharedPtr;
use crate::handle::shared_ref::SharedRef;

/// Re-points a non-null handle through a reference coercion.
///
/// The closure receives a borrow of the managed object and returns a
/// reference derived from it: typically an unsizing coercion such as
/// `|object| object as &dyn Renderable`, or a borrow of a field the caller
/// wants a handle to.
pub fn map_shared_ref<T, U, M, F>(this: &SharedRef<T, M>, coerce: F) -> SharedRef<U, M>
where
    T: ?Sized,
    U: ?Sized,
    M: RefCountMode,
    F: for<'a> FnOnce(&'a T) -> &'a U,
{
    let object = NonNull::from(coerce(this.get()));
    unsafe {
        RefCountBlock::add_strong(this.block());
        SharedRef::from_raw_parts(object, this.block())
    }
}

/// Re-points a nullable handle through a reference coercion; an empty handle
/// stays empty. See [`map_shared_ref`].
pub fn map_shared_ptr<T, U, M, F>(this: &SharedPtr<T, M>, coerce: F) -> SharedPtr<U, M>
where
    T: ?Sized,
    U: ?Sized,
    M: RefCountMode,
    F: for<'a> FnOnce(&'a T) -> &'a U,
{
    match this.inner() {
        Some(shared) => SharedPtr::from_inner(Some(map_shared_ref(shared, coerce))),
        None => SharedPtr::null(),
    }
}

/// Reinterprets the object address of a non-null handle as a `U`.
///
/// This is the raw downcast path: for example, from the `dyn` handle a
/// [`map_shared_ref`] call produced back to the concrete type it started
/// from.
///
/// # Safety
///
/// The managed object must actually be a valid `U` at the stored address;
/// the cast is exactly as unchecked as a raw pointer `cast`.
pub unsafe fn static_cast_shared_ref<U, T, M>(this: &SharedRef<T, M>) -> SharedRef<U, M>
where
    T: ?Sized,
    M: RefCountMode,
{
    let object = this.object().cast::<U>();
    RefCountBlock::add_strong(this.block());
    SharedRef::from_raw_parts(object, this.block())
}

/// Reinterprets the object address of a nullable handle as a `U`; an empty
/// handle stays empty.
///
/// # Safety
///
/// Same contract as [`static_cast_shared_ref`].
pub unsafe fn static_cast_shared_ptr<U, T, M>(this: &SharedPtr<T, M>) -> SharedPtr<U, M>
where
    T: ?Sized,
    M: RefCountMode,
{
    match this.inner() {
        Some(shared) => SharedPtr::from_inner(Some(static_cast_shared_ref(shared))),
        None => SharedPtr::null(),
    }
}
