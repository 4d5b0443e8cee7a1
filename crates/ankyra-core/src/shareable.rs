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

//! The opt-in gate deciding which types the owning handles may manage.

use crate::count::{Atomic, RefCountMode};
use crate::handle::shared_ref::SharedRef;

/// Marks a type as manageable by the owning handles of this crate, under the
/// counter mode `M`.
///
/// Every wrap point ([`SharedRef::new`], [`SharedPtr::new`], the `From`
/// conversions) requires this bound. A type whose instances are owned by
/// some other, separately governed system simply does not implement
/// `Shareable`, and any attempt to wrap it fails to compile rather than at
/// runtime.
///
/// The single method is the construction hook for the self-reference
/// capability. It defaults to a no-op; a type that embeds a
/// [`SelfRef`](crate::SelfRef) cell overrides it (usually via
/// `#[derive(ShareFromSelf)]`) to bind the cell to the first owning handle.
///
/// [`SharedPtr::new`]: crate::SharedPtr::new
pub trait Shareable<M: RefCountMode = Atomic> {
    /// One-shot hook invoked with the first owning handle built around a
    /// freshly wrapped object, before that handle is returned to the caller.
    fn on_first_owner(&self, _owner: &SharedRef<Self, M>)
    where
        Self: Sized,
    {
    }
}
