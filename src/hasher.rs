// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Hashing for trie descent.
//!
//! Every collection in this crate hashes with the same fixed function, so
//! hashes are deterministic across instances and processes. That is what
//! lets a set or map cache a combined hash of its members and be used as a
//! member of another set or map.
//!
//! Equality and hashing are the standard [`Eq`] and [`Hash`] capabilities: a
//! type either writes them by hand or derives the structural default. Note
//! that raw pointers hash by address, while `&T`, [`Box`] and
//! [`Arc`][std::sync::Arc] hash their pointee. Two raw pointers to equal
//! values are therefore distinct keys.
//!
//! A key's hash is turned into an unbounded stream of trie indices by
//! [`IndexStream`]: once the 64 bits of the original hash are used up, the
//! stream reseeds by hashing the key again with the leftover bits as seed.
//! Two distinct keys thus always end up on different paths, however deep.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::config::HASH_LEVEL_SIZE;

const SENTINEL: u64 = 1 << 63;
const INDEX_MASK: u64 = (1 << HASH_LEVEL_SIZE) - 1;

/// Hash a value with the crate's fixed hash function.
///
/// Equal values always produce equal hashes.
#[inline]
pub fn hash_value<T: Hash + ?Sized>(value: &T) -> u64 {
    hash_seeded(0, value)
}

/// Hash a value mixed with a seed.
///
/// Used to reseed exhausted index streams and to combine a map key's hash
/// with its value.
pub fn hash_seeded<T: Hash + ?Sized>(seed: u64, value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_u64(seed);
    value.hash(&mut hasher);
    finalize(hasher.finish())
}

// FxHasher leaves the high bits weak, and the trie consumes hashes from the
// low end upwards, so run the result through a full avalanche.
#[inline]
fn finalize(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^ (h >> 33)
}

/// The sequence of trie indices for one key.
///
/// The code holds the unconsumed hash bits below a sentinel bit. Each call
/// to [`next`][IndexStream::next] takes `HASH_LEVEL_SIZE` bits off the bottom.
/// When fewer than that remain above the sentinel, the code is replaced by a
/// fresh hash of `(remaining code, key)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct IndexStream {
    code: u64,
}

impl IndexStream {
    /// Start the stream for a key whose [`hash_value`] is `hash`.
    #[inline]
    pub(crate) fn new(hash: u64) -> Self {
        IndexStream {
            code: hash >> 1 | SENTINEL,
        }
    }

    /// The stream for `key` positioned so that the next index drawn is the
    /// one for `depth`.
    pub(crate) fn at_depth<K: Hash + ?Sized>(key: &K, hash: u64, depth: usize) -> Self {
        let mut stream = Self::new(hash);
        for _ in 0..depth {
            stream.next(key);
        }
        stream
    }

    /// Draw the index for the next level down.
    #[inline]
    pub(crate) fn next<K: Hash + ?Sized>(&mut self, key: &K) -> usize {
        if self.code >> HASH_LEVEL_SIZE == 0 {
            self.code = hash_seeded(self.code, key) >> 1 | SENTINEL;
        }
        let index = (self.code & INDEX_MASK) as usize;
        self.code >>= HASH_LEVEL_SIZE;
        index
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ::proptest::prelude::any;
    use ::proptest::proptest;

    const LEVELS_PER_SEED: usize = 63 / HASH_LEVEL_SIZE;

    fn indices<K: Hash + ?Sized>(key: &K, hash: u64, count: usize) -> Vec<usize> {
        let mut stream = IndexStream::new(hash);
        (0..count).map(|_| stream.next(key)).collect()
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_value("foo"), hash_value(&"foo".to_string()));
        assert_eq!(hash_value(&12345u64), hash_value(&12345u64));
        assert_ne!(hash_value(&1u64), hash_value(&2u64));
        assert_ne!(hash_seeded(1, &7i32), hash_seeded(2, &7i32));
    }

    #[test]
    fn indices_fit_the_fan_out() {
        for key in 0..1000u32 {
            for index in indices(&key, hash_value(&key), 40) {
                assert!(index < 1 << HASH_LEVEL_SIZE);
            }
        }
    }

    #[test]
    fn first_seed_uses_hash_bits() {
        let hash = hash_value(&"abc");
        let expected: Vec<usize> = (0..LEVELS_PER_SEED)
            .map(|level| ((hash >> 1 >> (level * HASH_LEVEL_SIZE)) & INDEX_MASK) as usize)
            .collect();
        assert_eq!(expected, indices("abc", hash, LEVELS_PER_SEED));
    }

    #[test]
    fn keys_with_equal_hashes_diverge_after_reseed() {
        // Pretend two different keys share a full 64 bit hash.
        let hash = 0xdead_beef_u64;
        let a = indices(&1u32, hash, LEVELS_PER_SEED * 4);
        let b = indices(&2u32, hash, LEVELS_PER_SEED * 4);
        assert_eq!(&a[..LEVELS_PER_SEED], &b[..LEVELS_PER_SEED]);
        assert_ne!(&a[LEVELS_PER_SEED..], &b[LEVELS_PER_SEED..]);
    }

    proptest! {
        #[test]
        fn at_depth_resumes_the_stream(key in any::<u64>(), depth in 0usize..80) {
            let hash = hash_value(&key);
            let all = indices(&key, hash, depth + 1);
            let mut resumed = IndexStream::at_depth(&key, hash, depth);
            assert_eq!(all[depth], resumed.next(&key));
        }

        #[test]
        fn same_key_same_stream(key in ".*") {
            let hash = hash_value(&key);
            assert_eq!(indices(&key, hash, 50), indices(key.as_str(), hash_value(key.as_str()), 50));
        }
    }
}
