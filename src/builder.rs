// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Builders for constructing a collection through a run of edits.
//!
//! A builder owns a private collection handle and edits it in place, so a
//! long sequence of additions and removals doesn't allocate a new root for
//! every step. Seeding a builder from an existing collection is cheap and
//! never touches the seed: the first edit copies only the path it changes.
//!
//! The collection a builder finishes with depends only on what is in it,
//! never on the order of the edits that got it there.
//!
//! # Examples
//!
//! ```
//! # #[macro_use] extern crate frozen;
//! # use frozen::builder::SetBuilder;
//! let seed = set![1, 2, 3];
//! let mut builder = SetBuilder::from(seed.clone());
//! builder.add(4).remove(&1);
//! assert_eq!(set![2, 3, 4], builder.finish());
//! assert_eq!(set![1, 2, 3], seed);
//! ```

use std::borrow::Borrow;
use std::fmt::{Debug, Error, Formatter};
use std::hash::Hash;

use archery::SharedPointerKind;

use crate::hashmap::GenericMap;
use crate::hashset::GenericSet;
use crate::shared_ptr::DefaultSharedPtr;

/// A builder for a [`GenericSet`].
pub struct SetBuilder<A, P: SharedPointerKind = DefaultSharedPtr> {
    set: GenericSet<A, P>,
}

impl<A, P: SharedPointerKind> SetBuilder<A, P> {
    /// Start building an empty set.
    #[must_use]
    pub fn new() -> Self {
        SetBuilder {
            set: GenericSet::new(),
        }
    }

    /// The number of entries so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Test whether nothing has been added, or everything was removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Finish building, returning the collection.
    #[must_use]
    pub fn finish(self) -> GenericSet<A, P> {
        self.set
    }
}

impl<A, P> SetBuilder<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    /// Add a value, replacing an equal member if there is one.
    pub fn add(&mut self, a: A) -> &mut Self {
        self.set.insert(a);
        self
    }

    /// Remove a value. Removing a value that isn't there does nothing.
    pub fn remove<BA>(&mut self, a: &BA) -> &mut Self
    where
        BA: Hash + Eq + ?Sized,
        A: Borrow<BA>,
    {
        self.set.remove(a);
        self
    }

    /// Test whether the value is in the set so far.
    #[must_use]
    pub fn contains<BA>(&self, a: &BA) -> bool
    where
        BA: Hash + Eq + ?Sized,
        A: Borrow<BA>,
    {
        self.set.contains(a)
    }
}

impl<A, P: SharedPointerKind> Default for SetBuilder<A, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, P: SharedPointerKind> From<GenericSet<A, P>> for SetBuilder<A, P> {
    fn from(set: GenericSet<A, P>) -> Self {
        SetBuilder { set }
    }
}

impl<A, P> Extend<A> for SetBuilder<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    fn extend<I: IntoIterator<Item = A>>(&mut self, iter: I) {
        self.set.extend(iter)
    }
}

impl<A, P> Debug for SetBuilder<A, P>
where
    A: Hash + Eq + Debug,
    P: SharedPointerKind,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        f.debug_tuple("SetBuilder").field(&self.set).finish()
    }
}

/// A builder for a [`GenericMap`].
pub struct MapBuilder<K, V, P: SharedPointerKind = DefaultSharedPtr> {
    map: GenericMap<K, V, P>,
}

impl<K, V, P: SharedPointerKind> MapBuilder<K, V, P> {
    /// Start building an empty map.
    #[must_use]
    pub fn new() -> Self {
        MapBuilder {
            map: GenericMap::new(),
        }
    }

    /// The number of entries so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Test whether nothing has been added, or everything was removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Finish building, returning the collection.
    #[must_use]
    pub fn finish(self) -> GenericMap<K, V, P> {
        self.map
    }
}

impl<K, V, P> MapBuilder<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Clone,
    P: SharedPointerKind,
{
    /// Map `k` to `v`, overwriting any earlier mapping for `k`.
    pub fn put(&mut self, k: K, v: V) -> &mut Self {
        self.map.insert(k, v);
        self
    }

    /// Remove the mapping for `k`, if there is one.
    pub fn remove<BK>(&mut self, k: &BK) -> &mut Self
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        self.map.remove(k);
        self
    }

    /// The value `k` maps to so far.
    #[must_use]
    pub fn get<BK>(&self, k: &BK) -> Option<&V>
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        self.map.get(k)
    }
}

impl<K, V, P: SharedPointerKind> Default for MapBuilder<K, V, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, P: SharedPointerKind> From<GenericMap<K, V, P>> for MapBuilder<K, V, P> {
    fn from(map: GenericMap<K, V, P>) -> Self {
        MapBuilder { map }
    }
}

impl<K, V, P> Extend<(K, V)> for MapBuilder<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Clone,
    P: SharedPointerKind,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.map.extend(iter)
    }
}

impl<K, V, P> Debug for MapBuilder<K, V, P>
where
    K: Hash + Eq + Debug,
    V: Hash + Debug,
    P: SharedPointerKind,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        f.debug_tuple("MapBuilder").field(&self.map).finish()
    }
}
