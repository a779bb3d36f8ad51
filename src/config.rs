// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// The level size of HAMTs, in bits
/// Branching factor is 2 ^ HashLevelSize.
#[cfg(feature = "small-chunks")]
pub(crate) const HASH_LEVEL_SIZE: usize = 2;
#[cfg(not(feature = "small-chunks"))]
pub(crate) const HASH_LEVEL_SIZE: usize = 5;

/// How many levels two distinct keys may share a path before they are
/// chained into a collision node instead of deepening further.
///
/// This is four full reseeds of the index stream, which only a `Hash`
/// impl that ignores its input will ever reach.
pub(crate) const MAX_DEPTH: usize = 4 * (u64::BITS as usize / HASH_LEVEL_SIZE);
