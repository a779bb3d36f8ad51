// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A persistent unordered map.
//!
//! An immutable hash map using [hash array mapped tries][1].
//!
//! Most operations on this map are O(log<sub>x</sub> n) for a
//! suitably high *x* that it should be nearly O(1) for most maps.
//! Keys need to implement [`Hash`][std::hash::Hash] and
//! [`Eq`][std::cmp::Eq]. Values need [`Hash`][std::hash::Hash] too,
//! because the map keeps a running hash of its entries.
//!
//! Map entries are compared by key for placement in the trie, so a map
//! holds at most one value per key. Two maps are equal when they hold the
//! same keys mapped to equal values.
//!
//! [1]: https://en.wikipedia.org/wiki/Hash_array_mapped_trie
//! [std::cmp::Eq]: https://doc.rust-lang.org/std/cmp/trait.Eq.html
//! [std::hash::Hash]: https://doc.rust-lang.org/std/hash/trait.Hash.html

use std::borrow::Borrow;
use std::collections;
use std::fmt::{Debug, Error, Formatter};
use std::hash::{Hash, Hasher};
use std::iter::{FromIterator, FusedIterator, Sum};
use std::ops::{Add, Index};

use archery::SharedPointerKind;

use crate::composer::Composer;
use crate::error::{self, Error as FrozenError};
use crate::hasher::hash_seeded;
use crate::hashset::GenericSet;
use crate::nodes::hamt::{Drain as NodeDrain, HashValue, Iter as NodeIter, Trie};
use crate::shared_ptr::DefaultSharedPtr;

/// Construct a map from a sequence of key/value pairs.
///
/// # Examples
///
/// ```
/// # #[macro_use] extern crate frozen;
/// # use frozen::Map;
/// # fn main() {
/// assert_eq!(
///   map!{
///     1 => 11,
///     2 => 22,
///     3 => 33
///   },
///   Map::from(vec![(1, 11), (2, 22), (3, 33)])
/// );
/// # }
/// ```
#[macro_export]
macro_rules! map {
    () => { $crate::hashmap::Map::new() };

    ( $( $key:expr => $value:expr ),* ) => {{
        let mut map = $crate::hashmap::Map::new();
        $({
            map.insert($key, $value);
        })*;
        map
    }};

    ( $( $key:expr => $value:expr ,)* ) => {{
        let mut map = $crate::hashmap::Map::new();
        $({
            map.insert($key, $value);
        })*;
        map
    }};
}

/// Type alias for [`GenericMap`] that uses [`DefaultSharedPtr`] as the pointer type.
///
/// [GenericMap]: ./struct.GenericMap.html
/// [DefaultSharedPtr]: ../shared_ptr/type.DefaultSharedPtr.html
pub type Map<K, V> = GenericMap<K, V, DefaultSharedPtr>;

/// A persistent unordered map.
///
/// See the [module documentation][self] for details.
pub struct GenericMap<K, V, P: SharedPointerKind> {
    trie: Trie<(K, V), P>,
}

impl<K, V> HashValue for (K, V)
where
    K: Hash + Eq,
    V: Hash,
{
    type Key = K;

    fn extract_key(&self) -> &Self::Key {
        &self.0
    }

    fn entry_hash(&self, key_hash: u64) -> u64 {
        hash_seeded(key_hash, &self.1)
    }
}

impl<K, V, P> GenericMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Clone,
    P: SharedPointerKind,
{
    /// Construct a map with a single mapping.
    ///
    /// # Examples
    ///
    /// ```
    /// # use frozen::Map;
    /// let map = Map::unit(123, "onetwothree");
    /// assert_eq!(
    ///   map.get(&123),
    ///   Some(&"onetwothree")
    /// );
    /// ```
    #[inline]
    #[must_use]
    pub fn unit(k: K, v: V) -> Self {
        GenericMap::new().with(k, v)
    }
}

impl<K, V, P: SharedPointerKind> GenericMap<K, V, P> {
    /// Construct an empty map.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        GenericMap { trie: Trie::new() }
    }

    /// Test whether a map is empty.
    ///
    /// Time: O(1)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the size of a map.
    ///
    /// Time: O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// assert_eq!(3, map!{
    ///   1 => 11,
    ///   2 => 22,
    ///   3 => 33
    /// }.len());
    /// ```
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    /// Test whether two maps refer to the same content in memory.
    ///
    /// This is true if the two sides are references to the same map,
    /// or if the two maps refer to the same root node.
    ///
    /// Time: O(1)
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.trie.ptr_eq(&other.trie)
    }

    /// Get an iterator over the key/value pairs of a map.
    ///
    /// No ordering guarantee is offered.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        Iter {
            it: self.trie.iter(),
        }
    }

    /// Get an iterator over a map's keys.
    #[inline]
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V, P> {
        Keys {
            it: self.trie.iter(),
        }
    }

    /// Get an iterator over a map's values.
    #[inline]
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V, P> {
        Values {
            it: self.trie.iter(),
        }
    }

    /// Fold every key/value pair of the map into an accumulator.
    ///
    /// The order entries are visited in is unspecified, so `f` should not
    /// depend on it.
    pub fn reduce<B, F>(&self, init: B, mut f: F) -> B
    where
        F: FnMut(B, &K, &V) -> B,
    {
        self.iter().fold(init, |acc, (k, v)| f(acc, k, v))
    }
}

impl<K, V, P> GenericMap<K, V, P>
where
    K: Hash + Eq,
    V: Hash,
    P: SharedPointerKind,
{
    /// Get the value for a key from a map.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let map = map!{123 => "lol"};
    /// assert_eq!(
    ///   map.get(&123),
    ///   Some(&"lol")
    /// );
    /// ```
    #[must_use]
    pub fn get<BK>(&self, key: &BK) -> Option<&V>
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        self.trie.get(key).map(|(_, v)| v)
    }

    /// Get the key/value pair for a key from a map.
    ///
    /// Time: O(log n)
    #[must_use]
    pub fn get_key_value<BK>(&self, key: &BK) -> Option<(&K, &V)>
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        self.trie.get(key).map(|(k, v)| (k, v))
    }

    /// Test for the presence of a key in a map.
    ///
    /// Time: O(log n)
    #[inline]
    #[must_use]
    pub fn contains_key<BK>(&self, k: &BK) -> bool
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        self.get(k).is_some()
    }

    /// Get the value for a key, failing if the key isn't in the map.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// # use frozen::Error;
    /// let map = map!{1 => "one"};
    /// assert_eq!(Ok(&"one"), map.must_get(&1));
    /// assert_eq!(
    ///   Err(Error::KeyNotFound { key: "2".to_string() }),
    ///   map.must_get(&2)
    /// );
    /// ```
    pub fn must_get<BK>(&self, key: &BK) -> error::Result<&V>
    where
        BK: Hash + Eq + Debug + ?Sized,
        K: Borrow<BK>,
    {
        self.get(key).ok_or_else(|| FrozenError::KeyNotFound {
            key: format!("{:?}", key),
        })
    }
}

impl<K, V, P> GenericMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Clone,
    P: SharedPointerKind,
{
    /// Get the value for a key, or `default` if the key isn't in the map.
    #[must_use]
    pub fn get_or<BK>(&self, key: &BK, default: V) -> V
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        self.get(key).cloned().unwrap_or(default)
    }

    /// Get the value for a key, or the result of calling `default` if the
    /// key isn't in the map.
    #[must_use]
    pub fn get_or_else<BK, F>(&self, key: &BK, default: F) -> V
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
        F: FnOnce() -> V,
    {
        self.get(key).cloned().unwrap_or_else(default)
    }

    /// Insert a key/value mapping into a map.
    ///
    /// If the map already has a mapping for the given key, the
    /// previous value is overwritten.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// # use frozen::Map;
    /// let mut map = map!{};
    /// map.insert(123, "123");
    /// map.insert(456, "456");
    /// assert_eq!(
    ///   map,
    ///   map!{123 => "123", 456 => "456"}
    /// );
    /// ```
    #[inline]
    pub fn insert(&mut self, k: K, v: V) -> Option<V> {
        self.trie.insert((k, v)).map(|(_, v)| v)
    }

    /// Remove a key/value pair from a map, if it exists, and return
    /// the removed value.
    ///
    /// Time: O(log n)
    pub fn remove<BK>(&mut self, k: &BK) -> Option<V>
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        self.remove_with_key(k).map(|(_, v)| v)
    }

    /// Remove a key/value pair from a map, if it exists, and return
    /// the removed key and value.
    ///
    /// Time: O(log n)
    pub fn remove_with_key<BK>(&mut self, k: &BK) -> Option<(K, V)>
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        self.trie.remove(k)
    }

    /// Verify the internal structure of the trie, panicking if it's broken.
    #[cfg(any(test, feature = "debug"))]
    pub fn check_sane(&self) {
        self.trie.check_invariants();
    }

    /// Construct a new map by inserting a key/value mapping into a map.
    ///
    /// If the map already has a mapping for the given key, the
    /// previous value is overwritten.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let map = map!{};
    /// assert_eq!(
    ///   map.with(123, "123"),
    ///   map!{123 => "123"}
    /// );
    /// ```
    #[must_use]
    pub fn with(&self, k: K, v: V) -> Self {
        let mut out = self.clone();
        out.insert(k, v);
        out
    }

    /// Construct a new map with every pair from an iterator inserted.
    ///
    /// Later pairs overwrite earlier ones with the same key.
    #[must_use]
    pub fn with_all<I>(&self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut out = self.clone();
        out.extend(pairs);
        out
    }

    /// Construct a new map without the given key.
    ///
    /// If the key isn't there, the result shares its root with `self`.
    ///
    /// Time: O(log n)
    #[must_use]
    pub fn without<BK>(&self, k: &BK) -> Self
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        let mut out = self.clone();
        out.remove(k);
        out
    }

    /// Construct a new map without any of the given keys.
    ///
    /// Keys that aren't in the map are skipped.
    #[must_use]
    pub fn without_all<I>(&self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<K>,
    {
        let mut out = self.clone();
        for key in keys {
            out.remove(key.borrow());
        }
        out
    }

    /// Construct a new map containing only the entries which satisfy a
    /// predicate.
    ///
    /// Time: O(n log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let map = map!{1 => 1, 2 => 20, 3 => 3};
    /// assert_eq!(map!{2 => 20}, map.filter(|k, v| v > k));
    /// ```
    #[must_use]
    pub fn filter<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.reduce(self.clone(), |mut out, k, v| {
            if !f(k, v) {
                out.remove(k);
            }
            out
        })
    }

    /// Construct a new map with the same keys and every value replaced by
    /// the result of a function.
    #[must_use]
    pub fn map_values<W, F>(&self, mut f: F) -> GenericMap<K, W, P>
    where
        W: Hash + Clone,
        F: FnMut(&K, &V) -> W,
    {
        self.reduce(GenericMap::new(), |mut out, k, v| {
            out.insert(k.clone(), f(k, v));
            out
        })
    }

    /// The set of keys of the map.
    #[must_use]
    pub fn key_set(&self) -> GenericSet<K, P> {
        self.reduce(GenericSet::new(), |mut keys, k, _| {
            keys.insert(k.clone());
            keys
        })
    }

    /// Construct a new map restricted to the given keys.
    ///
    /// Time: O(m log n) where m is the smaller of the map and the key set
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let tuple = map!{"a" => 1, "b" => 2, "c" => 3};
    /// assert_eq!(map!{"a" => 1, "c" => 3}, tuple.project(&set!{"a", "c", "d"}));
    /// ```
    #[must_use]
    pub fn project(&self, keys: &GenericSet<K, P>) -> Self {
        if keys.len() < self.len() {
            keys.reduce(GenericMap::new(), |mut out, k| {
                if let Some((k, v)) = self.get_key_value(k) {
                    out.insert(k.clone(), v.clone());
                }
                out
            })
        } else {
            self.filter(|k, _| keys.contains(k))
        }
    }

    /// Construct the union of two maps, keeping the values in the
    /// right hand map when keys exist in both.
    ///
    /// Time: O(m log n) where m is the size of the smaller map
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let map1 = map!{1 => 1, 3 => 3};
    /// let map2 = map!{2 => 2, 3 => 4};
    /// let expected = map!{1 => 1, 2 => 2, 3 => 4};
    /// assert_eq!(expected, map1.union(map2));
    /// ```
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        self.compose(Composer::UNION, &other)
    }

    /// Merge another map into this one. Entries of `other` win when a key
    /// is present in both.
    ///
    /// This is [`union`][GenericMap::union] under the name the relational
    /// operators use for extending a tuple.
    #[must_use]
    pub fn update(self, other: Self) -> Self {
        self.union(other)
    }

    /// Construct the union of a sequence of maps, later maps winning on
    /// shared keys.
    #[must_use]
    pub fn unions<I>(i: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        i.into_iter().fold(Self::default(), Self::union)
    }

    /// Construct the intersection of two maps, keeping the values
    /// from the right hand map.
    ///
    /// Time: O(m log n) where m is the size of the smaller map
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let map1 = map!{1 => 1, 2 => 2};
    /// let map2 = map!{2 => 3, 3 => 4};
    /// let expected = map!{2 => 3};
    /// assert_eq!(expected, map1.intersection(map2));
    /// ```
    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        self.compose(Composer::INTERSECTION, &other)
    }

    /// Construct the map of entries whose keys are in `self` but not in
    /// `other`.
    ///
    /// Time: O(m log n) where m is the size of the smaller map
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let map1 = map!{1 => 1, 3 => 4};
    /// let map2 = map!{2 => 2, 3 => 5};
    /// let expected = map!{1 => 1};
    /// assert_eq!(expected, map1.difference(map2));
    /// ```
    #[must_use]
    pub fn difference(self, other: Self) -> Self {
        self.compose(Composer::DIFFERENCE, &other)
    }

    /// Construct the map of entries whose keys are in exactly one of the
    /// two maps.
    ///
    /// Time: O(m log n) where m is the size of the smaller map
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let map1 = map!{1 => 1, 3 => 4};
    /// let map2 = map!{2 => 2, 3 => 5};
    /// let expected = map!{1 => 1, 2 => 2};
    /// assert_eq!(expected, map1.symmetric_difference(map2));
    /// ```
    #[must_use]
    pub fn symmetric_difference(self, other: Self) -> Self {
        self.compose(Composer::SYMMETRIC_DIFFERENCE, &other)
    }

    fn compose(&self, composer: Composer, other: &Self) -> Self {
        GenericMap {
            trie: composer.compose(&self.trie, &other.trie),
        }
    }
}

// Core traits

impl<K, V, P> Clone for GenericMap<K, V, P>
where
    P: SharedPointerKind,
{
    /// Clone a map.
    ///
    /// Time: O(1)
    #[inline]
    fn clone(&self) -> Self {
        GenericMap {
            trie: self.trie.clone(),
        }
    }
}

impl<K, V, P> PartialEq for GenericMap<K, V, P>
where
    K: Hash + Eq,
    V: Hash + PartialEq,
    P: SharedPointerKind,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() || self.trie.hash() != other.trie.hash() {
            return false;
        }
        self.ptr_eq(other)
            || self.trie.iter().all(|((k, v), hash)| {
                matches!(other.trie.get_hashed(hash, k), Some((_, ov)) if v == ov)
            })
    }
}

impl<K, V, P> Eq for GenericMap<K, V, P>
where
    K: Hash + Eq,
    V: Hash + Eq,
    P: SharedPointerKind,
{
}

impl<K, V, P> Hash for GenericMap<K, V, P>
where
    K: Hash + Eq,
    V: Hash,
    P: SharedPointerKind,
{
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        state.write_usize(self.len());
        state.write_u64(self.trie.hash());
    }
}

impl<K, V, P> Default for GenericMap<K, V, P>
where
    P: SharedPointerKind,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, P> Add for GenericMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Clone,
    P: SharedPointerKind,
{
    type Output = GenericMap<K, V, P>;

    fn add(self, other: Self) -> Self::Output {
        self.union(other)
    }
}

impl<K, V, P> Add for &GenericMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Clone,
    P: SharedPointerKind,
{
    type Output = GenericMap<K, V, P>;

    fn add(self, other: Self) -> Self::Output {
        self.compose(Composer::UNION, other)
    }
}

impl<K, V, P> Sum for GenericMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Clone,
    P: SharedPointerKind,
{
    fn sum<I>(it: I) -> Self
    where
        I: Iterator<Item = Self>,
    {
        it.fold(Self::default(), |a, b| a + b)
    }
}

impl<K, V, RK, RV, P> Extend<(RK, RV)> for GenericMap<K, V, P>
where
    K: Hash + Eq + Clone + From<RK>,
    V: Hash + Clone + From<RV>,
    P: SharedPointerKind,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (RK, RV)>,
    {
        for (key, value) in iter {
            self.insert(From::from(key), From::from(value));
        }
    }
}

impl<BK, K, V, P> Index<&BK> for GenericMap<K, V, P>
where
    BK: Hash + Eq + ?Sized,
    K: Hash + Eq + Borrow<BK>,
    V: Hash,
    P: SharedPointerKind,
{
    type Output = V;

    fn index(&self, key: &BK) -> &Self::Output {
        match self.get(key) {
            None => panic!("Map::index: invalid key"),
            Some(value) => value,
        }
    }
}

impl<K, V, P> Debug for GenericMap<K, V, P>
where
    K: Debug,
    V: Debug,
    P: SharedPointerKind,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        f.debug_map().entries(self.iter()).finish()
    }
}

// Iterators

/// An iterator over the elements of a map.
pub struct Iter<'a, K, V, P: SharedPointerKind> {
    it: NodeIter<'a, (K, V), P>,
}

// We impl Clone instead of deriving it, because we want Clone even if K and V aren't.
impl<'a, K, V, P: SharedPointerKind> Clone for Iter<'a, K, V, P> {
    fn clone(&self) -> Self {
        Iter {
            it: self.it.clone(),
        }
    }
}

impl<'a, K, V, P: SharedPointerKind> Iterator for Iter<'a, K, V, P> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|((k, v), _)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Iter<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Iter<'a, K, V, P> {}

/// A consuming iterator over the elements of a map.
pub struct ConsumingIter<K, V, P: SharedPointerKind> {
    it: NodeDrain<(K, V), P>,
}

impl<K, V, P> Iterator for ConsumingIter<K, V, P>
where
    K: Clone,
    V: Clone,
    P: SharedPointerKind,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(p, _)| p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V, P> ExactSizeIterator for ConsumingIter<K, V, P>
where
    K: Clone,
    V: Clone,
    P: SharedPointerKind,
{
}

impl<K, V, P> FusedIterator for ConsumingIter<K, V, P>
where
    K: Clone,
    V: Clone,
    P: SharedPointerKind,
{
}

/// An iterator over the keys of a map.
pub struct Keys<'a, K, V, P: SharedPointerKind> {
    it: NodeIter<'a, (K, V), P>,
}

impl<'a, K, V, P: SharedPointerKind> Iterator for Keys<'a, K, V, P> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|((k, _), _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Keys<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Keys<'a, K, V, P> {}

/// An iterator over the values of a map.
pub struct Values<'a, K, V, P: SharedPointerKind> {
    it: NodeIter<'a, (K, V), P>,
}

impl<'a, K, V, P: SharedPointerKind> Iterator for Values<'a, K, V, P> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|((_, v), _)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Values<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Values<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> IntoIterator for &'a GenericMap<K, V, P> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, P>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, P> IntoIterator for GenericMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    P: SharedPointerKind,
{
    type Item = (K, V);
    type IntoIter = ConsumingIter<K, V, P>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        ConsumingIter {
            it: self.trie.drain(),
        }
    }
}

// Conversions

impl<K, V, P> FromIterator<(K, V)> for GenericMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Clone,
    P: SharedPointerKind,
{
    fn from_iter<T>(i: T) -> Self
    where
        T: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::default();
        for (k, v) in i {
            map.insert(k, v);
        }
        map
    }
}

impl<K, V, const N: usize, P> From<[(K, V); N]> for GenericMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Clone,
    P: SharedPointerKind,
{
    fn from(arr: [(K, V); N]) -> Self {
        IntoIterator::into_iter(arr).collect()
    }
}

impl<'a, K, V, P> From<&'a [(K, V)]> for GenericMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Clone,
    P: SharedPointerKind,
{
    fn from(m: &'a [(K, V)]) -> Self {
        m.iter().cloned().collect()
    }
}

impl<K, V, P> From<Vec<(K, V)>> for GenericMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Clone,
    P: SharedPointerKind,
{
    fn from(m: Vec<(K, V)>) -> Self {
        m.into_iter().collect()
    }
}

impl<K, V, S, P> From<collections::HashMap<K, V, S>> for GenericMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Clone,
    P: SharedPointerKind,
{
    fn from(m: collections::HashMap<K, V, S>) -> Self {
        m.into_iter().collect()
    }
}

impl<'a, K, V, S, P> From<&'a collections::HashMap<K, V, S>> for GenericMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Clone,
    P: SharedPointerKind,
{
    fn from(m: &'a collections::HashMap<K, V, S>) -> Self {
        m.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

// Tests

#[cfg(test)]
mod test {
    use super::*;
    use crate::hasher::hash_value;
    use crate::proptest::map;
    use ::proptest::arbitrary::any;
    use ::proptest::collection::{hash_map, vec};
    use ::proptest::proptest;
    use pretty_assertions::assert_eq;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    assert_impl_all!(Map<i32, i32>: Send, Sync);
    assert_not_impl_any!(Map<i32, *const i32>: Send, Sync);
    assert_not_impl_any!(Map<*const i32, i32>: Send, Sync);
    assert_covariant!(Map<T, i32> in T);
    assert_covariant!(Map<i32, T> in T);

    #[test]
    fn safe_mutation() {
        let v1: Map<usize, usize> = Map::from_iter((0..131_072).map(|i| (i, i)));
        let mut v2 = v1.clone();
        v2.insert(131_000, 23);
        assert_eq!(Some(&23), v2.get(&131_000));
        assert_eq!(Some(&131_000), v1.get(&131_000));
    }

    #[test]
    fn index_operator() {
        let map: Map<usize, usize> = map![1 => 2, 3 => 4, 5 => 6];
        assert_eq!(4, map[&3]);
    }

    #[test]
    #[should_panic(expected = "invalid key")]
    fn index_missing_key_panics() {
        let map: Map<usize, usize> = map![1 => 2];
        let _value: usize = map[&3];
    }

    #[test]
    fn proper_formatting() {
        let map: Map<usize, usize> = map![1 => 2];
        assert_eq!("{1: 2}", format!("{:?}", map));

        assert_eq!("{}", format!("{:?}", Map::<(), ()>::new()));
    }

    #[test]
    fn match_string_keys_with_string_slices() {
        let mut map: Map<String, i32> =
            Map::from(vec![("foo".to_string(), 1), ("bar".to_string(), 2), ("baz".to_string(), 3)]);
        assert_eq!(Some(&1), map.get("foo"));
        map = map.without("foo");
        assert_eq!(Some(3), map.remove("baz"));
        assert_eq!(2, map["bar"]);
    }

    #[test]
    fn macro_allows_trailing_comma() {
        let map1: Map<&str, i32> = map! {"x" => 1, "y" => 2};
        let map2: Map<&str, i32> = map! {
            "x" => 1,
            "y" => 2,
        };
        assert_eq!(map1, map2);
    }

    #[test]
    fn lookups_with_defaults() {
        let map = map! {"one" => 1, "two" => 2};
        assert_eq!(1, map.get_or("one", 0));
        assert_eq!(0, map.get_or("three", 0));
        assert_eq!(3, map.get_or_else("three", || 3));
        assert_eq!(Ok(&2), map.must_get("two"));
        assert_eq!(
            Err(FrozenError::KeyNotFound {
                key: "\"three\"".to_string()
            }),
            map.must_get("three")
        );
    }

    #[test]
    fn values_take_part_in_equality_and_hash() {
        let a = map! {1 => "a", 2 => "b"};
        let b = map! {2 => "b", 1 => "a"};
        let c = map! {1 => "a", 2 => "c"};
        assert_eq!(a, b);
        assert_eq!(hash_value(&a), hash_value(&b));
        assert_ne!(a, c);
        assert_ne!(hash_value(&a), hash_value(&c));
        // Replacing a value keeps the running hash in step.
        assert_eq!(a, c.with(2, "b"));
        assert_eq!(hash_value(&a), hash_value(&c.with(2, "b")));
    }

    #[test]
    fn without_missing_shares_the_root() {
        let map: Map<i32, i32> = (0..50).map(|i| (i, i * 2)).collect();
        assert!(map.without(&99).ptr_eq(&map));
        assert!(map.without_all(vec![100, 101]).ptr_eq(&map));
        assert_eq!(48, map.without_all(vec![1, 2, 100]).len());
    }

    #[test]
    fn right_biased_algebra() {
        let left = map! {1 => "l", 2 => "l", 3 => "l"};
        let right = map! {3 => "r", 4 => "r"};
        assert_eq!(
            map! {1 => "l", 2 => "l", 3 => "r", 4 => "r"},
            left.clone().update(right.clone())
        );
        assert_eq!(map! {3 => "r"}, left.clone().intersection(right.clone()));
        // The operand sizes are swapped here, which takes the flipped path.
        assert_eq!(map! {3 => "l"}, right.clone().intersection(left.clone()));
        assert_eq!(
            map! {1 => "l", 2 => "l", 3 => "l", 4 => "r"},
            right.clone().union(left.clone())
        );
        assert_eq!(map! {1 => "l", 2 => "l"}, left.clone().difference(right.clone()));
        assert_eq!(map! {4 => "r"}, right.clone().difference(left.clone()));
        assert_eq!(
            map! {1 => "l", 2 => "l", 4 => "r"},
            left.symmetric_difference(right)
        );
    }

    #[test]
    fn derived_operations() {
        let tuple = map! {"a" => 1, "b" => 2, "c" => 3};
        assert_eq!(crate::set!["a", "b", "c"], tuple.key_set());
        assert_eq!(map! {"b" => 2}, tuple.project(&crate::set!["b"]));
        assert_eq!(
            map! {"a" => 1, "b" => 2},
            tuple.project(&crate::set!["a", "b", "x", "y", "z"])
        );
        assert_eq!(map! {"a" => 2, "b" => 4, "c" => 6}, tuple.map_values(|_, v| v * 2));
        assert_eq!(6, tuple.reduce(0, |sum, _, v| sum + v));
        let mut values: Vec<i32> = tuple.values().cloned().collect();
        values.sort_unstable();
        assert_eq!(vec![1, 2, 3], values);
        assert_eq!(3, tuple.keys().count());
    }

    proptest! {
        #[test]
        fn proptest_a_map(ref m in map(".*", ".*", 10..100)) {
            assert!(m.len() < 100);
            assert!(m.len() >= 10);
        }

        #[test]
        fn get_after_with(ref pairs in vec((0u16..300, 0u16..300), 0..300), key in 0u16..300, value in any::<u16>()) {
            let mut map: Map<u16, u16> = Map::new().with(key, value);
            for (k, v) in pairs {
                if *k != key {
                    map = map.with(*k, *v);
                    if k % 3 == 0 {
                        map = map.without(k);
                    }
                }
            }
            assert_eq!(Some(&value), map.get(&key));
        }

        #[test]
        fn agrees_with_std(ref m in hash_map(0i32..1000, 0i32..1000, 0..300)) {
            let map: Map<i32, i32> = Map::from(m);
            assert_eq!(m.len(), map.len());
            assert_eq!(m.len(), map.iter().count());
            for (k, v) in m {
                assert_eq!(Some(v), map.get(k));
            }
            let rebuilt: Map<i32, i32> = map.clone().into_iter().collect();
            assert_eq!(map, rebuilt);
        }
    }
}
