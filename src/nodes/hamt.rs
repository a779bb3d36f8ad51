// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::iter::FusedIterator;
use std::mem;
use std::slice::{self, Iter as SliceIter};

use archery::{SharedPointer, SharedPointerKind};
use bitmaps::{Bitmap, Bits, BitsImpl};
use tracing::trace;

pub(crate) use crate::config::HASH_LEVEL_SIZE as HASH_SHIFT;
use crate::config::MAX_DEPTH;
use crate::hasher::{hash_value, IndexStream};
use crate::util::clone_ref;

pub(crate) const HASH_WIDTH: usize = 2_usize.pow(HASH_SHIFT as u32);
pub(crate) type HashBits = <BitsImpl<HASH_WIDTH> as Bits>::Store; // a uint of HASH_WIDTH bits

/// An entry stored in a trie leaf.
pub(crate) trait HashValue {
    type Key: Hash + Eq;

    fn extract_key(&self) -> &Self::Key;

    /// This entry's contribution to the combined hash of its collection,
    /// given the hash of its key.
    fn entry_hash(&self, key_hash: u64) -> u64;
}

pub(crate) enum Node<A, P: SharedPointerKind> {
    Empty,
    Leaf(A, u64),
    Collision(SharedPointer<CollisionNode<A>, P>),
    Branch(SharedPointer<Branch<A, P>, P>),
}

/// A bitmap of populated slots, with the populated children packed in slot
/// order.
pub(crate) struct Branch<A, P: SharedPointerKind> {
    bitmap: Bitmap<HASH_WIDTH>,
    children: Vec<Node<A, P>>,
}

#[derive(Clone)]
pub(crate) struct CollisionNode<A> {
    data: Vec<(A, u64)>,
}

impl<A: Clone, P: SharedPointerKind> Clone for Node<A, P> {
    fn clone(&self) -> Self {
        match self {
            Node::Empty => Node::Empty,
            Node::Leaf(value, hash) => Node::Leaf(value.clone(), *hash),
            Node::Collision(coll) => Node::Collision(coll.clone()),
            Node::Branch(branch) => Node::Branch(branch.clone()),
        }
    }
}

impl<A: Clone, P: SharedPointerKind> Clone for Branch<A, P> {
    fn clone(&self) -> Self {
        Branch {
            bitmap: self.bitmap,
            children: self.children.clone(),
        }
    }
}

impl<A, P: SharedPointerKind> Default for Node<A, P> {
    fn default() -> Self {
        Node::Empty
    }
}

impl<A, P: SharedPointerKind> Node<A, P> {
    fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(..))
    }
}

impl<A, P: SharedPointerKind> Branch<A, P> {
    fn unit(index: usize, child: Node<A, P>) -> Self {
        let mut bitmap = Bitmap::new();
        bitmap.set(index, true);
        Branch {
            bitmap,
            children: vec![child],
        }
    }

    /// Where the child for `index` lives (or would live) in `children`.
    #[inline]
    fn position(&self, index: usize) -> usize {
        let below: HashBits = ((1 as HashBits) << index).wrapping_sub(1);
        (self.bitmap.into_value() & below).count_ones() as usize
    }

    #[inline]
    fn child(&self, index: usize) -> Option<&Node<A, P>> {
        if self.bitmap.get(index) {
            Some(&self.children[self.position(index)])
        } else {
            None
        }
    }

    #[inline]
    fn child_mut(&mut self, index: usize) -> Option<&mut Node<A, P>> {
        if self.bitmap.get(index) {
            let pos = self.position(index);
            Some(&mut self.children[pos])
        } else {
            None
        }
    }

    /// The child for `index`, populating the slot with `Empty` if needed.
    fn child_entry(&mut self, index: usize) -> &mut Node<A, P> {
        let pos = self.position(index);
        if !self.bitmap.set(index, true) {
            self.children.insert(pos, Node::Empty);
        }
        &mut self.children[pos]
    }

    fn remove_child(&mut self, index: usize) {
        let pos = self.position(index);
        self.bitmap.set(index, false);
        self.children.remove(pos);
    }
}

impl<A: HashValue, P: SharedPointerKind> Node<A, P> {
    pub(crate) fn get<BK>(&self, hash: u64, key: &BK) -> Option<&A>
    where
        BK: Hash + Eq + ?Sized,
        A::Key: Borrow<BK>,
    {
        let mut stream = IndexStream::new(hash);
        let mut node = self;
        loop {
            match node {
                Node::Empty => return None,
                Node::Leaf(value, value_hash) => {
                    return if *value_hash == hash && key == value.extract_key().borrow() {
                        Some(value)
                    } else {
                        None
                    };
                }
                Node::Collision(coll) => return coll.get(key),
                Node::Branch(branch) => node = branch.child(stream.next(key))?,
            }
        }
    }

    pub(crate) fn insert(&mut self, hash: u64, value: A) -> Option<A>
    where
        A: Clone,
    {
        self.insert_at(IndexStream::new(hash), 0, hash, value)
    }

    fn insert_at(&mut self, mut stream: IndexStream, depth: usize, hash: u64, value: A) -> Option<A>
    where
        A: Clone,
    {
        match self {
            Node::Empty => {
                *self = Node::Leaf(value, hash);
                None
            }
            Node::Leaf(current, current_hash)
                if *current_hash == hash && current.extract_key() == value.extract_key() =>
            {
                Some(mem::replace(current, value))
            }
            Node::Leaf(..) => {
                let Node::Leaf(old, old_hash) = mem::take(self) else {
                    unreachable!()
                };
                if depth >= MAX_DEPTH {
                    trace!(depth, "keys share a full trie path, chaining them");
                    *self = Node::Collision(SharedPointer::new(CollisionNode::pair(
                        (old, old_hash),
                        (value, hash),
                    )));
                    return None;
                }
                // Split the leaf: it moves into a new branch at this depth,
                // then the new value goes in beneath that branch, which may
                // split again further down.
                let old_index =
                    IndexStream::at_depth(old.extract_key(), old_hash, depth).next(old.extract_key());
                *self = Node::Branch(SharedPointer::new(Branch::unit(
                    old_index,
                    Node::Leaf(old, old_hash),
                )));
                self.insert_at(stream, depth, hash, value)
            }
            Node::Collision(coll) => SharedPointer::make_mut(coll).insert(value, hash),
            Node::Branch(branch) => {
                let index = stream.next(value.extract_key());
                SharedPointer::make_mut(branch)
                    .child_entry(index)
                    .insert_at(stream, depth + 1, hash, value)
            }
        }
    }

    /// Remove the entry for `key`.
    ///
    /// Callers must check that the key is present first, or shared nodes on
    /// the path will be copied for nothing.
    pub(crate) fn remove<BK>(&mut self, hash: u64, key: &BK) -> Option<A>
    where
        A: Clone,
        BK: Hash + Eq + ?Sized,
        A::Key: Borrow<BK>,
    {
        self.remove_at(IndexStream::new(hash), hash, key)
    }

    fn remove_at<BK>(&mut self, mut stream: IndexStream, hash: u64, key: &BK) -> Option<A>
    where
        A: Clone,
        BK: Hash + Eq + ?Sized,
        A::Key: Borrow<BK>,
    {
        match self {
            Node::Empty => None,
            Node::Leaf(value, value_hash) => {
                if *value_hash != hash || key != value.extract_key().borrow() {
                    return None;
                }
                let Node::Leaf(value, _) = mem::take(self) else {
                    unreachable!()
                };
                Some(value)
            }
            Node::Collision(coll) => {
                let coll = SharedPointer::make_mut(coll);
                let removed = coll.remove(key);
                if coll.data.len() == 1 {
                    if let Some((last, last_hash)) = coll.data.pop() {
                        *self = Node::Leaf(last, last_hash);
                    }
                }
                removed
            }
            Node::Branch(branch) => {
                let index = stream.next(key);
                let branch = SharedPointer::make_mut(branch);
                let child = branch.child_mut(index)?;
                let removed = child.remove_at(stream, hash, key)?;
                if let Node::Empty = child {
                    branch.remove_child(index);
                }
                // A branch left empty, or holding a single leaf, is replaced
                // by its contents. The parent makes the same check when we
                // return to it.
                match branch.children.len() {
                    0 => *self = Node::Empty,
                    1 if branch.children[0].is_leaf() => {
                        if let Some(only) = branch.children.pop() {
                            *self = only;
                        }
                    }
                    _ => {}
                }
                Some(removed)
            }
        }
    }
}

impl<A: HashValue> CollisionNode<A> {
    fn pair(entry1: (A, u64), entry2: (A, u64)) -> Self {
        CollisionNode {
            data: vec![entry1, entry2],
        }
    }

    fn get<BK>(&self, key: &BK) -> Option<&A>
    where
        BK: Eq + ?Sized,
        A::Key: Borrow<BK>,
    {
        self.data
            .iter()
            .map(|(entry, _)| entry)
            .find(|entry| key == entry.extract_key().borrow())
    }

    fn insert(&mut self, value: A, hash: u64) -> Option<A> {
        for (item, _) in &mut self.data {
            if value.extract_key() == item.extract_key() {
                return Some(mem::replace(item, value));
            }
        }
        self.data.push((value, hash));
        None
    }

    fn remove<BK>(&mut self, key: &BK) -> Option<A>
    where
        BK: Eq + ?Sized,
        A::Key: Borrow<BK>,
    {
        let index = self
            .data
            .iter()
            .position(|(item, _)| key == item.extract_key().borrow())?;
        Some(self.data.swap_remove(index).0)
    }
}

/// The root of a trie along with its entry count and the combined hash of
/// its entries, both kept up to date on every insert and remove.
///
/// The root sits behind a pointer so that a trie can hold entries which in
/// turn contain tries.
pub(crate) struct Trie<A, P: SharedPointerKind> {
    root: Option<SharedPointer<Node<A, P>, P>>,
    size: usize,
    hash: u64,
}

impl<A, P: SharedPointerKind> Clone for Trie<A, P> {
    fn clone(&self) -> Self {
        Trie {
            root: self.root.clone(),
            size: self.size,
            hash: self.hash,
        }
    }
}

impl<A, P: SharedPointerKind> Default for Trie<A, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, P: SharedPointerKind> Trie<A, P> {
    #[inline]
    pub(crate) fn new() -> Self {
        Trie {
            root: None,
            size: 0,
            hash: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub(crate) fn hash(&self) -> u64 {
        self.hash
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => SharedPointer::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    pub(crate) fn iter(&self) -> Iter<'_, A, P> {
        Iter::new(self.root.as_deref(), self.size)
    }

    pub(crate) fn drain(self) -> Drain<A, P>
    where
        A: Clone,
    {
        Drain::new(self.root.map(clone_ref), self.size)
    }
}

impl<A: HashValue, P: SharedPointerKind> Trie<A, P> {
    #[inline]
    pub(crate) fn get<BK>(&self, key: &BK) -> Option<&A>
    where
        BK: Hash + Eq + ?Sized,
        A::Key: Borrow<BK>,
    {
        self.get_hashed(hash_value(key), key)
    }

    #[inline]
    pub(crate) fn get_hashed<BK>(&self, hash: u64, key: &BK) -> Option<&A>
    where
        BK: Hash + Eq + ?Sized,
        A::Key: Borrow<BK>,
    {
        self.root.as_deref()?.get(hash, key)
    }
}

impl<A: HashValue + Clone, P: SharedPointerKind> Trie<A, P> {
    /// Insert an entry, returning the one it replaced.
    #[inline]
    pub(crate) fn insert(&mut self, value: A) -> Option<A> {
        let hash = hash_value(value.extract_key());
        self.insert_hashed(hash, value)
    }

    pub(crate) fn insert_hashed(&mut self, hash: u64, value: A) -> Option<A> {
        let contribution = value.entry_hash(hash);
        let root = SharedPointer::make_mut(self.root.get_or_insert_with(Default::default));
        let previous = root.insert(hash, value);
        match &previous {
            None => self.size += 1,
            Some(old) => self.hash ^= old.entry_hash(hash),
        }
        self.hash ^= contribution;
        previous
    }

    #[inline]
    pub(crate) fn remove<BK>(&mut self, key: &BK) -> Option<A>
    where
        BK: Hash + Eq + ?Sized,
        A::Key: Borrow<BK>,
    {
        self.remove_hashed(hash_value(key), key)
    }

    pub(crate) fn remove_hashed<BK>(&mut self, hash: u64, key: &BK) -> Option<A>
    where
        BK: Hash + Eq + ?Sized,
        A::Key: Borrow<BK>,
    {
        self.get_hashed(hash, key)?;
        let root = SharedPointer::make_mut(self.root.as_mut()?);
        let removed = root.remove(hash, key)?;
        let emptied = matches!(root, Node::Empty);
        if emptied {
            self.root = None;
        }
        self.size -= 1;
        self.hash ^= removed.entry_hash(hash);
        Some(removed)
    }

    /// Walk the whole tree, checking the structural invariants, and return
    /// the number of entries found.
    #[cfg(any(test, feature = "debug"))]
    pub(crate) fn check_invariants(&self) -> usize {
        fn walk<A: HashValue, P: SharedPointerKind>(node: &Node<A, P>, depth: usize) -> usize {
            match node {
                Node::Empty => 0,
                Node::Leaf(value, hash) => {
                    assert_eq!(*hash, hash_value(value.extract_key()));
                    1
                }
                Node::Collision(coll) => {
                    assert!(depth >= MAX_DEPTH);
                    assert!(coll.data.len() >= 2);
                    coll.data.len()
                }
                Node::Branch(branch) => {
                    assert_eq!(branch.bitmap.len(), branch.children.len());
                    assert!(!branch.children.is_empty(), "empty branch at depth {depth}");
                    if branch.children.len() == 1 {
                        assert!(
                            !branch.children[0].is_leaf(),
                            "branch at depth {depth} holds a lone leaf"
                        );
                    }
                    branch
                        .children
                        .iter()
                        .map(|child| {
                            assert!(!matches!(child, Node::Empty));
                            walk(child, depth + 1)
                        })
                        .sum()
                }
            }
        }
        let count = match self.root.as_deref() {
            None => 0,
            Some(root) => {
                assert!(!matches!(root, Node::Empty), "empty root left behind");
                walk(root, 0)
            }
        };
        assert_eq!(self.size, count);
        count
    }
}

// Ref iterator

pub(crate) struct Iter<'a, A, P: SharedPointerKind> {
    count: usize,
    stack: Vec<SliceIter<'a, Node<A, P>>>,
    collision: Option<SliceIter<'a, (A, u64)>>,
}

// We impl Clone instead of deriving it, because we want Clone even if A isn't.
impl<'a, A, P: SharedPointerKind> Clone for Iter<'a, A, P> {
    fn clone(&self) -> Self {
        Self {
            count: self.count,
            stack: self.stack.clone(),
            collision: self.collision.clone(),
        }
    }
}

impl<'a, A, P: SharedPointerKind> Iter<'a, A, P> {
    pub(crate) fn new(root: Option<&'a Node<A, P>>, size: usize) -> Self {
        let mut stack = Vec::with_capacity((u64::BITS as usize / HASH_SHIFT) + 1);
        if let Some(root) = root {
            stack.push(slice::from_ref(root).iter());
        }
        Iter {
            count: size,
            stack,
            collision: None,
        }
    }
}

impl<'a, A, P: SharedPointerKind> Iterator for Iter<'a, A, P> {
    type Item = (&'a A, u64);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(coll) = &mut self.collision {
                match coll.next() {
                    Some((value, hash)) => {
                        self.count -= 1;
                        return Some((value, *hash));
                    }
                    None => self.collision = None,
                }
            }
            let current = self.stack.last_mut()?;
            match current.next() {
                Some(Node::Empty) => {}
                Some(Node::Leaf(value, hash)) => {
                    self.count -= 1;
                    return Some((value, *hash));
                }
                Some(Node::Collision(coll)) => self.collision = Some(coll.data.iter()),
                Some(Node::Branch(branch)) => self.stack.push(branch.children.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.count, Some(self.count))
    }
}

impl<'a, A, P: SharedPointerKind> ExactSizeIterator for Iter<'a, A, P> {}

impl<'a, A, P: SharedPointerKind> FusedIterator for Iter<'a, A, P> {}

// Consuming iterator

pub(crate) struct Drain<A, P: SharedPointerKind> {
    count: usize,
    stack: Vec<Node<A, P>>,
    collision: Vec<(A, u64)>,
}

impl<A, P: SharedPointerKind> Drain<A, P> {
    pub(crate) fn new(root: Option<Node<A, P>>, size: usize) -> Self {
        Drain {
            count: size,
            stack: root.into_iter().collect(),
            collision: Vec::new(),
        }
    }
}

impl<A: Clone, P: SharedPointerKind> Iterator for Drain<A, P> {
    type Item = (A, u64);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.collision.pop() {
                self.count -= 1;
                return Some(entry);
            }
            match self.stack.pop()? {
                Node::Empty => {}
                Node::Leaf(value, hash) => {
                    self.count -= 1;
                    return Some((value, hash));
                }
                Node::Collision(coll) => self.collision = clone_ref(coll).data,
                Node::Branch(branch) => self.stack.extend(clone_ref(branch).children),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.count, Some(self.count))
    }
}

impl<A: Clone, P: SharedPointerKind> ExactSizeIterator for Drain<A, P> {}

impl<A: Clone, P: SharedPointerKind> FusedIterator for Drain<A, P> {}

impl<A: fmt::Debug, P: SharedPointerKind> fmt::Debug for Node<A, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Node::Empty => write!(f, "Empty"),
            Node::Leaf(v, h) => write!(f, "{:?} :: {}", v, h),
            Node::Collision(c) => {
                write!(f, "Coll[ ")?;
                for (v, h) in &c.data {
                    write!(f, "{:?} :: {}, ", v, h)?;
                }
                write!(f, "]")
            }
            Node::Branch(b) => {
                write!(f, "Node[ ")?;
                for (i, child) in b.bitmap.into_iter().zip(&b.children) {
                    write!(f, "{}: {:?}, ", i, child)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared_ptr::DefaultSharedPtr;
    use crate::test::Colliding;
    use std::collections::HashSet as StdHashSet;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Entry<K>(K);

    impl<K: Hash + Eq> HashValue for Entry<K> {
        type Key = K;

        fn extract_key(&self) -> &K {
            &self.0
        }

        fn entry_hash(&self, key_hash: u64) -> u64 {
            key_hash
        }
    }

    type TestTrie<K> = Trie<Entry<K>, DefaultSharedPtr>;

    fn trie_of<K: Hash + Eq + Clone>(keys: impl IntoIterator<Item = K>) -> TestTrie<K> {
        let mut trie = Trie::new();
        for key in keys {
            trie.insert(Entry(key));
        }
        trie
    }

    #[test]
    fn insert_then_get() {
        let trie = trie_of(0..1000u32);
        assert_eq!(1000, trie.check_invariants());
        for i in 0..1000u32 {
            assert_eq!(Some(&Entry(i)), trie.get(&i));
        }
        assert_eq!(None, trie.get(&1000));
    }

    #[test]
    fn replace_keeps_count() {
        let mut trie = trie_of(0..10u32);
        assert_eq!(Some(Entry(5)), trie.insert(Entry(5)));
        assert_eq!(10, trie.len());
        trie.check_invariants();
    }

    #[test]
    fn delete_ascending_and_descending() {
        let full = trie_of(0..1000u32);
        let mut up = full.clone();
        for i in 0..1000u32 {
            assert!(up.iter().next().is_some());
            assert_eq!(Some(Entry(i)), up.remove(&i));
            assert_eq!(999 - i as usize, up.check_invariants());
        }
        assert!(up.root.is_none());

        let mut down = full.clone();
        for i in (0..1000u32).rev() {
            assert_eq!(1 + i as usize, down.len());
            assert_eq!(Some(Entry(i)), down.remove(&i));
            assert_eq!(i as usize, down.check_invariants());
        }
        assert!(down.root.is_none());
        assert_eq!(0, down.hash());

        // The original is untouched.
        assert_eq!(1000, full.check_invariants());
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut trie = trie_of(0..100u32);
        let before = trie.clone();
        assert_eq!(None, trie.remove(&100));
        assert!(trie.ptr_eq(&before));
        assert_eq!(before.hash(), trie.hash());
    }

    #[test]
    fn iterates_each_entry_once() {
        let trie = trie_of(0..64u32);
        let mut seen = StdHashSet::new();
        for (Entry(key), hash) in trie.iter() {
            assert_eq!(hash_value(key), hash);
            assert!(seen.insert(*key), "{key} visited twice");
        }
        assert_eq!(64, seen.len());
        assert_eq!(64, trie.iter().len());
        // Iteration is restartable.
        assert_eq!(64, trie.iter().count());
    }

    #[test]
    fn drain_yields_everything() {
        let trie = trie_of(0..500u32);
        let shared = trie.clone();
        let mut drained: Vec<u32> = trie.drain().map(|(Entry(k), _)| k).collect();
        drained.sort_unstable();
        assert_eq!((0..500).collect::<Vec<_>>(), drained);
        assert_eq!(500, shared.check_invariants());
    }

    #[test]
    fn copy_on_write_leaves_original_alone() {
        let original = trie_of(0..200u32);
        let mut changed = original.clone();
        changed.insert(Entry(1000));
        changed.remove(&3);
        assert_eq!(Some(&Entry(3)), original.get(&3));
        assert_eq!(None, original.get(&1000));
        assert_eq!(200, original.check_invariants());
        assert_eq!(200, changed.check_invariants());
    }

    fn depth<A, P: SharedPointerKind>(node: &Node<A, P>) -> usize {
        match node {
            Node::Branch(branch) => 1 + branch.children.iter().map(depth).max().unwrap_or(0),
            _ => 0,
        }
    }

    #[test]
    fn full_hash_collisions_deepen() {
        // Distinct keys forced onto one 64 bit hash are told apart once
        // their index streams reseed from the keys themselves.
        const SHARED_HASH: u64 = 0x0123_4567_89ab_cdef;
        let mut root: Node<Entry<u32>, DefaultSharedPtr> = Node::Empty;
        for i in 0..50u32 {
            assert_eq!(None, root.insert(SHARED_HASH, Entry(i)));
        }
        assert!(depth(&root) > 63 / HASH_SHIFT);
        assert!(depth(&root) < MAX_DEPTH);
        for i in 0..50u32 {
            assert_eq!(Some(&Entry(i)), root.get(SHARED_HASH, &i));
        }
        for i in 0..50u32 {
            assert_eq!(Some(Entry(i)), root.remove(SHARED_HASH, &i));
            assert_eq!(None, root.get(SHARED_HASH, &i));
        }
        assert!(matches!(root, Node::Empty));
    }

    #[test]
    fn degenerate_hashes_chain_at_max_depth() {
        let keys: Vec<_> = (0..5u32).map(Colliding).collect();
        let mut trie = trie_of(keys.iter().cloned());
        assert_eq!(5, trie.check_invariants());
        for key in &keys {
            assert_eq!(Some(&Entry(key.clone())), trie.get(key));
        }
        for key in &keys[1..] {
            assert!(trie.remove(key).is_some());
            trie.check_invariants();
        }
        // The last survivor collapsed all the way back up to the root.
        assert!(matches!(trie.root.as_deref(), Some(Node::Leaf(..))));
    }
}
