// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::hash::{Hash, Hasher};

/// A key whose `Hash` impl writes nothing, so every instance hashes the same
/// at every depth of the trie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Colliding(pub(crate) u32);

impl Hash for Colliding {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

mod sync {
    use crate::shared_ptr::RcK;
    use crate::{GenericSet, Map, Relation, Set, Value};
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    assert_impl_all!(Set<i32>: Send, Sync);
    assert_impl_all!(Map<i32, i32>: Send, Sync);
    assert_impl_all!(Relation<String, Value>: Send, Sync);
    assert_not_impl_any!(GenericSet<i32, RcK>: Send, Sync);
}
