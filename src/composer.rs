// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The engine behind the binary set operations.
//!
//! A [`Composer`] describes one operation by what survives: entries found
//! only on the left, entries found only on the right, and what to do with a
//! key found on both sides. [`Composer::compose`] walks the smaller operand
//! and probes the larger one, so the cost is proportional to the smaller
//! side. When the left operand is the smaller one, the mirror image of the
//! composer is applied to the swapped operands instead.

use archery::SharedPointerKind;

use crate::nodes::hamt::{HashValue, Trie};

/// What to keep for a key present in both operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Combine {
    /// Drop the key from the result.
    Discard,
    /// Keep the left operand's entry.
    Left,
    /// Keep the right operand's entry.
    Right,
}

impl Combine {
    const fn flip(self) -> Self {
        match self {
            Combine::Discard => Combine::Discard,
            Combine::Left => Combine::Right,
            Combine::Right => Combine::Left,
        }
    }
}

/// The size of a result as a linear function of the operand sizes and of
/// the number of keys the operands share.
///
/// The trie keeps its own count as entries go in and out, so the tally is
/// only a consistency check on that count, made in debug builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Tally {
    left: isize,
    right: isize,
    matches: isize,
}

impl Tally {
    const fn flip(self) -> Self {
        Tally {
            left: self.right,
            right: self.left,
            matches: self.matches,
        }
    }

    fn count(self, left: usize, right: usize, matches: usize) -> usize {
        let total =
            self.left * left as isize + self.right * right as isize + self.matches * matches as isize;
        total as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Composer {
    keep_left: bool,
    keep_right: bool,
    combine: Combine,
    tally: Tally,
}

impl Composer {
    /// Everything from both sides. Shared keys take the right entry.
    pub(crate) const UNION: Composer = Composer {
        keep_left: true,
        keep_right: true,
        combine: Combine::Right,
        tally: Tally {
            left: 1,
            right: 1,
            matches: -1,
        },
    };

    /// Only the shared keys, with the right entry.
    pub(crate) const INTERSECTION: Composer = Composer {
        keep_left: false,
        keep_right: false,
        combine: Combine::Right,
        tally: Tally {
            left: 0,
            right: 0,
            matches: 1,
        },
    };

    /// The left side minus any key found on the right.
    pub(crate) const DIFFERENCE: Composer = Composer {
        keep_left: true,
        keep_right: false,
        combine: Combine::Discard,
        tally: Tally {
            left: 1,
            right: 0,
            matches: -1,
        },
    };

    /// Keys found on exactly one side.
    pub(crate) const SYMMETRIC_DIFFERENCE: Composer = Composer {
        keep_left: true,
        keep_right: true,
        combine: Combine::Discard,
        tally: Tally {
            left: 1,
            right: 1,
            matches: -2,
        },
    };

    /// The composer that gives the same result with the operands swapped.
    pub(crate) const fn flip(self) -> Self {
        Composer {
            keep_left: self.keep_right,
            keep_right: self.keep_left,
            combine: self.combine.flip(),
            tally: self.tally.flip(),
        }
    }

    /// The size of the result for operands of the given sizes sharing
    /// `matches` keys.
    pub(crate) fn count(self, left: usize, right: usize, matches: usize) -> usize {
        self.tally.count(left, right, matches)
    }

    pub(crate) fn compose<A, P>(self, left: &Trie<A, P>, right: &Trie<A, P>) -> Trie<A, P>
    where
        A: HashValue + Clone,
        P: SharedPointerKind,
    {
        if left.len() < right.len() {
            return self.flip().compose(right, left);
        }
        let mut out = if self.keep_left {
            left.clone()
        } else {
            Trie::new()
        };
        let mut matches = 0;
        for (entry, hash) in right.iter() {
            let key = entry.extract_key();
            match left.get_hashed(hash, key) {
                Some(found) => {
                    matches += 1;
                    match self.combine {
                        Combine::Discard if self.keep_left => {
                            out.remove_hashed(hash, key);
                        }
                        Combine::Discard => {}
                        Combine::Left if self.keep_left => {}
                        Combine::Left => {
                            out.insert_hashed(hash, found.clone());
                        }
                        Combine::Right => {
                            out.insert_hashed(hash, entry.clone());
                        }
                    }
                }
                None if self.keep_right => {
                    out.insert_hashed(hash, entry.clone());
                }
                None => {}
            }
        }
        debug_assert_eq!(self.count(left.len(), right.len(), matches), out.len());
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared_ptr::DefaultSharedPtr;
    use ::proptest::collection::hash_set;
    use ::proptest::proptest;
    use std::collections::HashSet as StdHashSet;

    const ALL: [Composer; 4] = [
        Composer::UNION,
        Composer::INTERSECTION,
        Composer::DIFFERENCE,
        Composer::SYMMETRIC_DIFFERENCE,
    ];

    // Keys are compared on the first field only, so we can tell which side
    // a surviving entry came from.
    #[derive(Clone, Debug)]
    struct Tagged(u8, bool);

    impl HashValue for Tagged {
        type Key = u8;

        fn extract_key(&self) -> &u8 {
            &self.0
        }

        fn entry_hash(&self, key_hash: u64) -> u64 {
            key_hash
        }
    }

    fn trie(keys: &StdHashSet<u8>, from_left: bool) -> Trie<Tagged, DefaultSharedPtr> {
        let mut trie = Trie::new();
        for key in keys {
            trie.insert(Tagged(*key, from_left));
        }
        trie
    }

    fn contents(trie: &Trie<Tagged, DefaultSharedPtr>) -> StdHashSet<(u8, bool)> {
        trie.iter().map(|(Tagged(k, side), _)| (*k, *side)).collect()
    }

    #[test]
    fn flip_twice_is_identity() {
        for composer in ALL {
            assert_eq!(composer, composer.flip().flip());
        }
        assert_eq!(Composer::UNION.flip().combine, Combine::Left);
        assert!(Composer::DIFFERENCE.flip().keep_right);
        assert!(!Composer::DIFFERENCE.flip().keep_left);
    }

    #[test]
    fn flipped_tally_swaps_operands() {
        for composer in ALL {
            for (l, r, m) in [(5, 3, 2), (3, 5, 0), (7, 7, 7)] {
                assert_eq!(composer.count(l, r, m), composer.flip().count(r, l, m));
            }
        }
    }

    #[test]
    fn shared_keys_keep_the_right_entry() {
        let left = trie(&StdHashSet::from([1, 2, 3, 4, 5]), true);
        let right = trie(&StdHashSet::from([4, 5, 6]), false);
        let union = contents(&Composer::UNION.compose(&left, &right));
        assert!(union.contains(&(4, false)));
        assert!(union.contains(&(1, true)));
        // Same result when the smaller side is on the left.
        let small = trie(&StdHashSet::from([1]), true);
        let big = trie(&StdHashSet::from([1, 2, 3]), false);
        let intersection = contents(&Composer::INTERSECTION.compose(&small, &big));
        assert_eq!(StdHashSet::from([(1, false)]), intersection);
    }

    proptest! {
        #[test]
        fn agrees_with_std(
            ref a in hash_set(0u8..64, 0..40),
            ref b in hash_set(0u8..64, 0..40),
        ) {
            let left = trie(a, true);
            let right = trie(b, false);
            let keys = |trie: &Trie<Tagged, DefaultSharedPtr>| -> StdHashSet<u8> {
                contents(trie).into_iter().map(|(k, _)| k).collect()
            };
            let expected = [
                a | b,
                a & b,
                a - b,
                a ^ b,
            ];
            for (composer, expected) in ALL.iter().zip(expected) {
                let out = composer.compose(&left, &right);
                let shared = a.intersection(b).count();
                assert_eq!(composer.count(a.len(), b.len(), shared), out.check_invariants());
                assert_eq!(expected, keys(&out));
            }
            // The inputs are never touched.
            assert_eq!(a.len(), left.check_invariants());
            assert_eq!(b.len(), right.check_invariants());
        }
    }
}
