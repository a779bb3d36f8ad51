// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pointer kinds for trie nodes.
//!
//! Trie nodes are reference counted through [`archery`]'s shared pointers,
//! so the pointer kind is a type parameter of every collection. The default
//! is atomically counted, which makes collections `Send` and `Sync` when
//! their contents are. [`RcK`] gives single-threaded collections.
//!
//! [`archery`]: https://docs.rs/archery/latest/

pub use archery::{ArcK, RcK, SharedPointerKind};

#[cfg(feature = "triomphe")]
pub use archery::ArcTK;

/// The pointer kind used by [`Set`][crate::Set], [`Map`][crate::Map] and
/// [`Relation`][crate::Relation]: [`ArcK`], or `ArcTK` with the `triomphe`
/// feature.
#[cfg(not(feature = "triomphe"))]
pub type DefaultSharedPtr = ArcK;

/// The pointer kind used by [`Set`][crate::Set], [`Map`][crate::Map] and
/// [`Relation`][crate::Relation]: [`ArcK`], or [`ArcTK`] with the
/// `triomphe` feature.
#[cfg(feature = "triomphe")]
pub type DefaultSharedPtr = ArcTK;
