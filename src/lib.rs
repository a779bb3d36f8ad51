// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! # Persistent hash sets and maps with relational algebra
//!
//! This crate provides immutable hash [`Set`]s and [`Map`]s built on a
//! hash array mapped trie, together with the set algebra and relational
//! operators (natural [`join`], [`nest`], [`unnest`]) you'd expect from a
//! small in-memory relational engine.
//!
//! ## Immutability and sharing
//!
//! Every operation that changes a collection returns a new one, leaving the
//! original intact. The two share all the trie nodes the operation didn't
//! touch, so "copying" a collection is O(1) and an update copies only the
//! path from the root to the changed entry. The in-place methods taking
//! `&mut self`, like [`Set::insert`], copy nodes only when they're shared
//! with another collection.
//!
//! Nodes are reference counted through [`archery`]'s pointer kinds. The
//! default is an atomic count, so collections are `Send` and `Sync` whenever
//! their contents are. Use the `Generic*` types with
//! [`RcK`][shared_ptr::RcK] for a single-threaded variant.
//!
//! ## Hashing
//!
//! Hashing is deterministic: the same value hashes the same way in every
//! process, and every collection caches a combined hash of its contents.
//! That makes sets and maps cheap to hash themselves, so sets of sets and
//! relations whose tuples are maps work without any extra effort.
//!
//! A [`Map`] requires its values to be hashable as well as its keys, since
//! the values are part of the map's own hash.
//!
//! ## Relations
//!
//! A [relation](relation) is a set of maps sharing a key set. The
//! [`relation`][relation::relation] helper builds one from a header and rows,
//! and [`Value`] gives you a dynamically typed value that can hold a nested
//! relation.
//!
//! ```
//! # #[macro_use] extern crate frozen;
//! # use frozen::{join, Set};
//! let people = set![map!{"name" => 1, "city" => 10}, map!{"name" => 2, "city" => 20}];
//! let cities = set![map!{"city" => 10, "zip" => 100}];
//! let joined = join(&people, &cities);
//! assert_eq!(set![map!{"name" => 1, "city" => 10, "zip" => 100}], joined);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! | ------- | ----------- |
//! | [`proptest`](https://crates.io/crates/proptest) | Strategies for all these collection types under [`frozen::proptest`](proptest) |
//! | [`serde`](https://crates.io/crates/serde) | [`Serialize`](https://docs.rs/serde/latest/serde/trait.Serialize.html) and [`Deserialize`](https://docs.rs/serde/latest/serde/trait.Deserialize.html) implementations |
//! | [`arbitrary`](https://crates.io/crates/arbitrary/) | [`Arbitrary`](https://docs.rs/arbitrary/latest/arbitrary/trait.Arbitrary.html) implementations |
//! | `triomphe` | Use [`triomphe`](https://crates.io/crates/triomphe)'s `Arc` as the default pointer |
//! | `small-chunks` | Use a fan-out of 4 instead of 32, which makes tries much deeper |

#![forbid(rust_2018_idioms)]
#![deny(nonstandard_style)]
#![warn(unreachable_pub)]
#![allow(clippy::suspicious_op_assign_impl)]
#![allow(clippy::suspicious_arithmetic_impl)]

#[macro_use]
mod util;

#[macro_use]
mod hash;

mod composer;
mod config;
mod nodes;

pub mod builder;
pub mod error;
pub mod hasher;
pub mod relation;
pub mod shared_ptr;
pub mod value;

pub use crate::hash::map as hashmap;
pub use crate::hash::set as hashset;

#[cfg(any(test, feature = "serde"))]
#[doc(hidden)]
pub mod ser;

#[cfg(feature = "arbitrary")]
#[doc(hidden)]
pub mod arbitrary;

#[cfg(any(test, feature = "proptest"))]
pub mod proptest;

pub use crate::builder::{MapBuilder, SetBuilder};
pub use crate::error::{Error, Result};
pub use crate::hashmap::{GenericMap, Map};
pub use crate::hashset::{GenericSet, Set};
pub use crate::relation::{join, nest, unnest, GenericRelation, NestedRelation, Relation};
pub use crate::value::{Float, Value};

#[cfg(test)]
mod test;

