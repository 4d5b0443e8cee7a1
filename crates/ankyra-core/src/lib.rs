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

//! # Ankyra Core
//!
//! Reference-counted ownership handles for engine subsystems that need
//! explicit, non-intrusive shared ownership:
//!
//! - [`SharedRef`]: non-nullable owning handle; always dereferenceable.
//! - [`SharedPtr`]: nullable owning handle; "maybe a [`SharedRef`]".
//! - [`WeakPtr`]: non-owning observer; promote with [`WeakPtr::pin`].
//! - [`SelfRef`] / [`ShareFromSelf`]: lets an object mint an owning handle
//!   to itself from its own methods.
//!
//! Every handle type takes a [`RefCountMode`] parameter fixing its counter
//! policy: [`Atomic`] (safe under concurrent copy/destroy/pin) or
//! [`Exclusive`] (plain counters, confined to one thread by the compiler).
//!
//! The handles protect counts and lifetime only; they never synchronize
//! access to the managed object's own fields. Shared mutation needs the
//! object's own interior synchronization.

#![warn(missing_docs)]

pub mod count;
pub mod handle;
pub mod shareable;
pub mod stats;

pub use count::{Atomic, Exclusive, RefCountMode};
pub use handle::cast;
pub use handle::self_ref::{SelfRef, ShareFromSelf};
pub use handle::shared_ptr::SharedPtr;
pub use handle::shared_ref::SharedRef;
pub use handle::weak_ptr::{prune_expired, WeakPtr};
pub use shareable::Shareable;

pub use ankyra_macros::ShareFromSelf;
