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

//! The self-reference capability: lets an object mint owning handles to
//! itself from its own methods.

use std::fmt;
use std::sync::OnceLock;

use crate::count::{Atomic, RefCountMode};
use crate::handle::shared_ref::SharedRef;
use crate::handle::weak_ptr::WeakPtr;
use crate::shareable::Shareable;

/// A one-shot cell a pointee embeds to mint owning handles to itself.
///
/// The cell starts unset. When the first owning handle wraps the object, the
/// [`Shareable::on_first_owner`] hook binds the cell to that handle's count
/// block; from then on [`ShareFromSelf::as_shared`] can produce owning
/// handles from plain `&self`. The cell never transitions again; a second
/// bind is a contract violation.
///
/// Cloning the containing object must not clone its identity, so `Clone`
/// for the cell yields a fresh unset cell.
pub struct SelfRef<T: ?Sized, M: RefCountMode = Atomic> {
    /// Unset until the first owning handle binds it; read-only afterwards.
    cell: OnceLock<WeakPtr<T, M>>,
}

impl<T: ?Sized, M: RefCountMode> SelfRef<T, M> {
    /// Creates an unset cell.
    pub fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// True once an owning handle has bound this cell.
    pub fn is_bound(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Binds the cell to the count block owning `owner`. Called from
    /// [`Shareable::on_first_owner`]; an object is wrapped exactly once, so
    /// the cell is bound at most once.
    ///
    /// # Panics
    ///
    /// Panics if the cell is already bound.
    pub fn bind(&self, owner: &SharedRef<T, M>) {
        if self.cell.set(owner.downgrade()).is_err() {
            panic!("self-reference cell is already bound to an owning handle");
        }
    }

    /// Mints a new owning handle from the cell.
    ///
    /// # Panics
    ///
    /// Panics if no owning handle has ever been created for the object
    /// (constructor-time misuse) or if the object is already being destroyed
    /// (destructor-time misuse).
    pub fn shared(&self) -> SharedRef<T, M> {
        let weak = self
            .cell
            .get()
            .expect("self-reference used before any owning handle was created for this object");
        weak.pin()
            .into_inner()
            .expect("self-reference used while the object is being destroyed")
    }
}

impl<T: ?Sized, M: RefCountMode> Default for SelfRef<T, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized, M: RefCountMode> Clone for SelfRef<T, M> {
    /// A copied pointee is a new object with its own identity: the clone is
    /// unset until an owning handle wraps the copy.
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: ?Sized, M: RefCountMode> fmt::Debug for SelfRef<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelfRef")
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Gives an opted-in pointee the ability to mint owning handles to itself.
///
/// A type opts in by embedding a [`SelfRef`] field, exposing it through
/// [`self_ref`](ShareFromSelf::self_ref), and binding it in its
/// [`Shareable::on_first_owner`] hook, or by deriving `ShareFromSelf`,
/// which generates both impls from the embedded field.
pub trait ShareFromSelf<M: RefCountMode = Atomic>: Shareable<M> {
    /// The embedded self-reference cell.
    fn self_ref(&self) -> &SelfRef<Self, M>
    where
        Self: Sized;

    /// Mints a new owning handle to this object.
    ///
    /// # Panics
    ///
    /// Panics if called before any owning handle exists for this object
    /// (e.g. from its constructor) or while the object is being destroyed
    /// (e.g. from its destructor).
    fn as_shared(&self) -> SharedRef<Self, M>
    where
        Self: Sized,
    {
        let shared = self.self_ref().shared();
        assert!(
            std::ptr::eq(shared.get(), self),
            "self-reference cell is bound to a different object"
        );
        shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::Exclusive;
    use crate::SharedPtr;

    /// An opted-in pointee, wired up by hand the way the derive macro does.
    struct Node {
        self_ref: SelfRef<Node, Exclusive>,
        value: u32,
    }

    impl Node {
        fn new(value: u32) -> Self {
            Self {
                self_ref: SelfRef::new(),
                value,
            }
        }
    }

    impl Shareable<Exclusive> for Node {
        fn on_first_owner(&self, owner: &SharedRef<Self, Exclusive>) {
            self.self_ref.bind(owner);
        }
    }

    impl ShareFromSelf<Exclusive> for Node {
        fn self_ref(&self) -> &SelfRef<Self, Exclusive> {
            &self.self_ref
        }
    }

    #[test]
    fn as_shared_resolves_to_the_same_object() {
        let owner = SharedRef::<Node, Exclusive>::new(Node::new(21));
        let minted = owner.get().as_shared();

        assert_eq!(minted.value, 21);
        assert!(minted.ptr_eq(&owner));
        assert_eq!(owner.strong_count(), 2);

        drop(minted);
        assert_eq!(owner.strong_count(), 1);
    }

    #[test]
    fn each_call_contributes_one_owning_reference() {
        let owner = SharedPtr::<Node, Exclusive>::new(Node::new(0));
        let node = owner.get().unwrap();

        let first = node.as_shared();
        let second = node.as_shared();
        assert!(first.ptr_eq(&second));
        assert_eq!(owner.strong_count(), 3);
    }

    #[test]
    fn the_first_wrap_binds_the_cell() {
        let raw = Node::new(1);
        assert!(!raw.self_ref.is_bound());

        let owner = SharedRef::<Node, Exclusive>::new(raw);
        assert!(owner.get().self_ref.is_bound());
    }

    #[test]
    #[should_panic(expected = "before any owning handle")]
    fn as_shared_before_any_owner_is_a_contract_violation() {
        let raw = Node::new(2);
        let _ = raw.as_shared();
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn rebinding_the_cell_is_a_contract_violation() {
        let owner = SharedRef::<Node, Exclusive>::new(Node::new(3));
        let other = SharedRef::<Node, Exclusive>::new(Node::new(4));
        owner.get().self_ref.bind(&other);
    }

    #[test]
    fn cloning_the_pointee_yields_an_unset_cell() {
        let owner = SharedRef::<Node, Exclusive>::new(Node::new(5));
        let copy = Node {
            self_ref: owner.get().self_ref.clone(),
            value: owner.get().value,
        };
        assert!(!copy.self_ref.is_bound());

        // Wrapping the copy binds it to its own block.
        let copy_owner = SharedRef::<Node, Exclusive>::new(copy);
        assert!(!copy_owner.ptr_eq(&owner));
        assert_eq!(copy_owner.get().as_shared().value, 5);
    }
}
