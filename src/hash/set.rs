// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A persistent unordered set.
//!
//! An immutable hash set using [hash array mapped tries] [1].
//!
//! Most operations on this set are O(log<sub>x</sub> n) for a
//! suitably high *x* that it should be nearly O(1) for most sets.
//! Values need to implement [`Hash`][std::hash::Hash] and
//! [`Eq`][std::cmp::Eq].
//!
//! A set keeps a running hash of its members, so comparing two sets which
//! differ is usually O(1), and sets can themselves be members of sets or
//! keys of maps.
//!
//! Iteration order follows the shape of the trie. It is not insertion order
//! and it isn't guaranteed to match between two equal sets built in a
//! different order.
//!
//! [1]: https://en.wikipedia.org/wiki/Hash_array_mapped_trie
//! [std::cmp::Eq]: https://doc.rust-lang.org/std/cmp/trait.Eq.html
//! [std::hash::Hash]: https://doc.rust-lang.org/std/hash/trait.Hash.html

use std::borrow::Borrow;
use std::collections;
use std::fmt::{Debug, Error, Formatter};
use std::hash::{Hash, Hasher};
use std::iter::{FromIterator, FusedIterator, Sum};
use std::ops::{Add, Mul, Sub};

use archery::SharedPointerKind;

use crate::composer::Composer;
use crate::hashmap::GenericMap;
use crate::nodes::hamt::{Drain as NodeDrain, HashValue, Iter as NodeIter, Trie};
use crate::shared_ptr::DefaultSharedPtr;

/// Construct a set from a sequence of values.
///
/// # Examples
///
/// ```
/// # #[macro_use] extern crate frozen;
/// # use frozen::Set;
/// # fn main() {
/// assert_eq!(
///   set![1, 2, 3],
///   Set::from(vec![1, 2, 3])
/// );
/// # }
/// ```
#[macro_export]
macro_rules! set {
    () => { $crate::hashset::Set::new() };

    ( $($x:expr),* ) => {{
        let mut l = $crate::hashset::Set::new();
        $(
            l.insert($x);
        )*
            l
    }};

    ( $($x:expr ,)* ) => {{
        let mut l = $crate::hashset::Set::new();
        $(
            l.insert($x);
        )*
            l
    }};
}

/// Type alias for [`GenericSet`] that uses [`DefaultSharedPtr`] as the pointer type.
///
/// [GenericSet]: ./struct.GenericSet.html
/// [DefaultSharedPtr]: ../shared_ptr/type.DefaultSharedPtr.html
pub type Set<A> = GenericSet<A, DefaultSharedPtr>;

/// A persistent unordered set.
///
/// See the [module documentation][self] for details.
pub struct GenericSet<A, P: SharedPointerKind> {
    trie: Trie<Member<A>, P>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Member<A>(A);

impl<A> HashValue for Member<A>
where
    A: Hash + Eq,
{
    type Key = A;

    fn extract_key(&self) -> &Self::Key {
        &self.0
    }

    fn entry_hash(&self, key_hash: u64) -> u64 {
        key_hash
    }
}

impl<A, P> GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    /// Construct a set with a single value.
    ///
    /// # Examples
    ///
    /// ```
    /// # use frozen::Set;
    /// let set = Set::unit(123);
    /// assert!(set.contains(&123));
    /// ```
    #[inline]
    #[must_use]
    pub fn unit(a: A) -> Self {
        GenericSet::new().with(a)
    }
}

impl<A, P: SharedPointerKind> GenericSet<A, P> {
    /// Construct an empty set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        GenericSet { trie: Trie::new() }
    }

    /// Test whether a set is empty.
    ///
    /// Time: O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// # use frozen::Set;
    /// assert!(
    ///   !set![1, 2, 3].is_empty()
    /// );
    /// assert!(
    ///   Set::<i32>::new().is_empty()
    /// );
    /// ```
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the size of a set.
    ///
    /// Time: O(1)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    /// Test whether two sets refer to the same content in memory.
    ///
    /// This is true if the two sides are references to the same set,
    /// or if the two sets refer to the same root node.
    ///
    /// Time: O(1)
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.trie.ptr_eq(&other.trie)
    }

    /// Get an iterator over the values in a set.
    ///
    /// No ordering guarantee is offered.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, A, P> {
        Iter {
            it: self.trie.iter(),
        }
    }

    /// Get an arbitrary member of the set, or `None` if it's empty.
    ///
    /// Time: O(log n)
    #[must_use]
    pub fn any(&self) -> Option<&A> {
        self.iter().next()
    }

    /// Fold every member of the set into an accumulator.
    ///
    /// The order members are visited in is unspecified, so `f` should not
    /// depend on it.
    pub fn reduce<B, F>(&self, init: B, f: F) -> B
    where
        F: FnMut(B, &A) -> B,
    {
        self.iter().fold(init, f)
    }
}

impl<A, P> GenericSet<A, P>
where
    A: Hash + Eq,
    P: SharedPointerKind,
{
    /// Test if a value is part of a set.
    ///
    /// Time: O(log n)
    #[must_use]
    pub fn contains<BA>(&self, a: &BA) -> bool
    where
        BA: Hash + Eq + ?Sized,
        A: Borrow<BA>,
    {
        self.get(a).is_some()
    }

    /// Get the member of the set equal to `a`.
    ///
    /// Time: O(log n)
    #[must_use]
    pub fn get<BA>(&self, a: &BA) -> Option<&A>
    where
        BA: Hash + Eq + ?Sized,
        A: Borrow<BA>,
    {
        self.trie.get(a).map(|member| &member.0)
    }

    /// Test whether a set is a subset of another set, meaning that
    /// all values in our set must also be in the other set.
    ///
    /// Time: O(n log n)
    #[must_use]
    pub fn is_subset<RS>(&self, other: RS) -> bool
    where
        RS: Borrow<Self>,
    {
        let o = other.borrow();
        self.len() <= o.len()
            && self
                .trie
                .iter()
                .all(|(member, hash)| o.trie.get_hashed(hash, &member.0).is_some())
    }

    /// Test whether a set is a proper subset of another set, meaning
    /// that all values in our set must also be in the other set. A
    /// proper subset must also be smaller than the other set.
    ///
    /// Time: O(n log n)
    #[must_use]
    pub fn is_proper_subset<RS>(&self, other: RS) -> bool
    where
        RS: Borrow<Self>,
    {
        self.len() != other.borrow().len() && self.is_subset(other)
    }
}

impl<A, P> GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    /// Insert a value into a set, returning the member it replaced.
    ///
    /// Time: O(log n)
    #[inline]
    pub fn insert(&mut self, a: A) -> Option<A> {
        self.trie.insert(Member(a)).map(|member| member.0)
    }

    /// Remove a value from a set if it exists.
    ///
    /// Time: O(log n)
    pub fn remove<BA>(&mut self, a: &BA) -> Option<A>
    where
        BA: Hash + Eq + ?Sized,
        A: Borrow<BA>,
    {
        self.trie.remove(a).map(|member| member.0)
    }

    /// Verify the internal structure of the trie, panicking if it's broken.
    #[cfg(any(test, feature = "debug"))]
    pub fn check_sane(&self) {
        self.trie.check_invariants();
    }

    /// Construct a new set from the current set with the given value
    /// added.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let set = set![123];
    /// assert_eq!(
    ///   set.with(456),
    ///   set![123, 456]
    /// );
    /// ```
    #[must_use]
    pub fn with(&self, a: A) -> Self {
        let mut out = self.clone();
        out.insert(a);
        out
    }

    /// Construct a new set with every value from an iterator added.
    #[must_use]
    pub fn with_all<I>(&self, values: I) -> Self
    where
        I: IntoIterator<Item = A>,
    {
        let mut out = self.clone();
        out.extend(values);
        out
    }

    /// Construct a new set with the given value removed if it's in
    /// the set.
    ///
    /// If it isn't, the result shares its root with `self`.
    ///
    /// Time: O(log n)
    #[must_use]
    pub fn without<BA>(&self, a: &BA) -> Self
    where
        BA: Hash + Eq + ?Sized,
        A: Borrow<BA>,
    {
        let mut out = self.clone();
        out.remove(a);
        out
    }

    /// Construct a new set with every value from an iterator removed.
    ///
    /// Values that aren't in the set are skipped.
    #[must_use]
    pub fn without_all<I>(&self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<A>,
    {
        let mut out = self.clone();
        for value in values {
            out.remove(value.borrow());
        }
        out
    }

    /// Construct a new set containing only the values which satisfy a
    /// predicate.
    ///
    /// Time: O(n log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let set = set![1, 2, 3];
    /// assert_eq!(set![2, 3], set.filter(|v| *v > 1));
    /// ```
    #[must_use]
    pub fn filter<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&A) -> bool,
    {
        self.reduce(self.clone(), |mut out, a| {
            if !f(a) {
                out.remove(a);
            }
            out
        })
    }

    /// Construct a new set by applying a function to every value.
    ///
    /// Values which map to the same result are merged.
    #[must_use]
    pub fn map<B, F>(&self, mut f: F) -> GenericSet<B, P>
    where
        B: Hash + Eq + Clone,
        F: FnMut(&A) -> B,
    {
        self.reduce(GenericSet::new(), |mut out, a| {
            out.insert(f(a));
            out
        })
    }

    /// Partition the set into a map from each distinct result of `f` to the
    /// set of values producing it.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let groups = set![1, 2, 3, 4, 5].group_by(|v| v % 2);
    /// assert_eq!(set![2, 4], groups[&0]);
    /// assert_eq!(set![1, 3, 5], groups[&1]);
    /// ```
    #[must_use]
    pub fn group_by<K, F>(&self, mut f: F) -> GenericMap<K, Self, P>
    where
        K: Hash + Eq + Clone,
        F: FnMut(&A) -> K,
    {
        self.reduce(GenericMap::new(), |mut groups, a| {
            let key = f(a);
            let group = groups.get(&key).cloned().unwrap_or_default().with(a.clone());
            groups.insert(key, group);
            groups
        })
    }

    /// Construct the set of all subsets of this set.
    ///
    /// Time: O(2<sup>n</sup>)
    #[must_use]
    pub fn powerset(&self) -> GenericSet<Self, P> {
        self.reduce(GenericSet::unit(GenericSet::new()), |subsets, a| {
            let grown: Vec<Self> = subsets.iter().map(|s| s.with(a.clone())).collect();
            subsets.with_all(grown)
        })
    }

    /// Construct the union of two sets.
    ///
    /// Time: O(m log n) where m is the size of the smaller set
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let set1 = set!{1, 2};
    /// let set2 = set!{2, 3};
    /// let expected = set!{1, 2, 3};
    /// assert_eq!(expected, set1.union(set2));
    /// ```
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        self.compose(Composer::UNION, &other)
    }

    /// Construct the union of multiple sets.
    ///
    /// Time: O(n log n)
    #[must_use]
    pub fn unions<I>(i: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        i.into_iter().fold(Self::default(), Self::union)
    }

    /// Construct the intersection of two sets.
    ///
    /// Time: O(m log n) where m is the size of the smaller set
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let set1 = set!{1, 2};
    /// let set2 = set!{2, 3};
    /// let expected = set!{2};
    /// assert_eq!(expected, set1.intersection(set2));
    /// ```
    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        self.compose(Composer::INTERSECTION, &other)
    }

    /// Construct the relative complement between two sets, that is the set
    /// of values in `self` that do not occur in `other`.
    ///
    /// Time: O(m log n) where m is the size of the smaller set
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let set1 = set!{1, 2};
    /// let set2 = set!{2, 3};
    /// let expected = set!{1};
    /// assert_eq!(expected, set1.difference(set2));
    /// ```
    #[must_use]
    pub fn difference(self, other: Self) -> Self {
        self.compose(Composer::DIFFERENCE, &other)
    }

    /// Construct the symmetric difference between two sets.
    ///
    /// Time: O(m log n) where m is the size of the smaller set
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate frozen;
    /// let set1 = set!{1, 2};
    /// let set2 = set!{2, 3};
    /// let expected = set!{1, 3};
    /// assert_eq!(expected, set1.symmetric_difference(set2));
    /// ```
    #[must_use]
    pub fn symmetric_difference(self, other: Self) -> Self {
        self.compose(Composer::SYMMETRIC_DIFFERENCE, &other)
    }

    fn compose(&self, composer: Composer, other: &Self) -> Self {
        GenericSet {
            trie: composer.compose(&self.trie, &other.trie),
        }
    }
}

// Core traits

impl<A, P: SharedPointerKind> Clone for GenericSet<A, P> {
    /// Clone a set.
    ///
    /// Time: O(1)
    #[inline]
    fn clone(&self) -> Self {
        GenericSet {
            trie: self.trie.clone(),
        }
    }
}

impl<A, P> PartialEq for GenericSet<A, P>
where
    A: Hash + Eq,
    P: SharedPointerKind,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() || self.trie.hash() != other.trie.hash() {
            return false;
        }
        self.ptr_eq(other)
            || self
                .trie
                .iter()
                .all(|(member, hash)| other.trie.get_hashed(hash, &member.0).is_some())
    }
}

impl<A, P> Eq for GenericSet<A, P>
where
    A: Hash + Eq,
    P: SharedPointerKind,
{
}

impl<A, P> Hash for GenericSet<A, P>
where
    A: Hash + Eq,
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

impl<A, P: SharedPointerKind> Default for GenericSet<A, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, P> Add for GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    type Output = GenericSet<A, P>;

    fn add(self, other: Self) -> Self::Output {
        self.union(other)
    }
}

impl<A, P> Mul for GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    type Output = GenericSet<A, P>;

    fn mul(self, other: Self) -> Self::Output {
        self.intersection(other)
    }
}

impl<A, P> Sub for GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    type Output = GenericSet<A, P>;

    fn sub(self, other: Self) -> Self::Output {
        self.difference(other)
    }
}

impl<A, P> Add for &GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    type Output = GenericSet<A, P>;

    fn add(self, other: Self) -> Self::Output {
        self.compose(Composer::UNION, other)
    }
}

impl<A, P> Mul for &GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    type Output = GenericSet<A, P>;

    fn mul(self, other: Self) -> Self::Output {
        self.compose(Composer::INTERSECTION, other)
    }
}

impl<A, P> Sub for &GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    type Output = GenericSet<A, P>;

    fn sub(self, other: Self) -> Self::Output {
        self.compose(Composer::DIFFERENCE, other)
    }
}

impl<A, P> Sum for GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    fn sum<I>(it: I) -> Self
    where
        I: Iterator<Item = Self>,
    {
        it.fold(Self::default(), |a, b| a + b)
    }
}

impl<A, R, P> Extend<R> for GenericSet<A, P>
where
    A: Hash + Eq + Clone + From<R>,
    P: SharedPointerKind,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = R>,
    {
        for value in iter {
            self.insert(From::from(value));
        }
    }
}

impl<A, P> Debug for GenericSet<A, P>
where
    A: Debug,
    P: SharedPointerKind,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        f.debug_set().entries(self.iter()).finish()
    }
}

// Iterators

/// An iterator over the elements of a set.
pub struct Iter<'a, A, P: SharedPointerKind> {
    it: NodeIter<'a, Member<A>, P>,
}

// We impl Clone instead of deriving it, because we want Clone even if A isn't.
impl<'a, A, P: SharedPointerKind> Clone for Iter<'a, A, P> {
    fn clone(&self) -> Self {
        Iter {
            it: self.it.clone(),
        }
    }
}

impl<'a, A, P> Iterator for Iter<'a, A, P>
where
    A: 'a,
    P: SharedPointerKind,
{
    type Item = &'a A;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(v, _)| &v.0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, A, P: SharedPointerKind> ExactSizeIterator for Iter<'a, A, P> {}

impl<'a, A, P: SharedPointerKind> FusedIterator for Iter<'a, A, P> {}

/// A consuming iterator over the elements of a set.
pub struct ConsumingIter<A, P>
where
    A: Clone,
    P: SharedPointerKind,
{
    it: NodeDrain<Member<A>, P>,
}

impl<A, P> Iterator for ConsumingIter<A, P>
where
    A: Clone,
    P: SharedPointerKind,
{
    type Item = A;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(v, _)| v.0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<A, P> ExactSizeIterator for ConsumingIter<A, P>
where
    A: Clone,
    P: SharedPointerKind,
{
}

impl<A, P> FusedIterator for ConsumingIter<A, P>
where
    A: Clone,
    P: SharedPointerKind,
{
}

// Iterator conversions

impl<A, RA, P> FromIterator<RA> for GenericSet<A, P>
where
    A: Hash + Eq + Clone + From<RA>,
    P: SharedPointerKind,
{
    fn from_iter<T>(i: T) -> Self
    where
        T: IntoIterator<Item = RA>,
    {
        let mut set = Self::default();
        set.extend(i);
        set
    }
}

impl<'a, A, P> IntoIterator for &'a GenericSet<A, P>
where
    A: Hash + Eq,
    P: SharedPointerKind,
{
    type Item = &'a A;
    type IntoIter = Iter<'a, A, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<A, P> IntoIterator for GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    type Item = A;
    type IntoIter = ConsumingIter<Self::Item, P>;

    fn into_iter(self) -> Self::IntoIter {
        ConsumingIter {
            it: self.trie.drain(),
        }
    }
}

// Conversions

impl<A, const N: usize, P> From<[A; N]> for GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    fn from(arr: [A; N]) -> Self {
        IntoIterator::into_iter(arr).collect()
    }
}

impl<'a, A, P> From<&'a [A]> for GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    fn from(slice: &'a [A]) -> Self {
        slice.iter().cloned().collect()
    }
}

impl<A, P> From<Vec<A>> for GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    fn from(vec: Vec<A>) -> Self {
        vec.into_iter().collect()
    }
}

impl<A, P> From<&Vec<A>> for GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    fn from(vec: &Vec<A>) -> Self {
        vec.iter().cloned().collect()
    }
}

impl<A, S, P> From<collections::HashSet<A, S>> for GenericSet<A, P>
where
    A: Eq + Hash + Clone,
    P: SharedPointerKind,
{
    fn from(hash_set: collections::HashSet<A, S>) -> Self {
        hash_set.into_iter().collect()
    }
}

impl<A, S, P> From<&collections::HashSet<A, S>> for GenericSet<A, P>
where
    A: Eq + Hash + Clone,
    P: SharedPointerKind,
{
    fn from(hash_set: &collections::HashSet<A, S>) -> Self {
        hash_set.iter().cloned().collect()
    }
}
