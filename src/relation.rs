// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Relational algebra over sets of maps.
//!
//! A relation is a [`Set`][crate::Set] of [`Map`][crate::Map]s, called
//! tuples, which all have the same keys, called the header. The header is
//! never stored or checked: keeping it uniform is up to the caller.
//!
//! The operators here are built from the set and map operations only.
//! [`join`] is a grouped hash join, and [`nest`] and [`unnest`] group and
//! flatten tuples through values implementing [`NestedRelation`].
//!
//! # Examples
//!
//! ```
//! # #[macro_use] extern crate frozen;
//! # use frozen::relation::{join, relation, Relation};
//! # fn main() -> frozen::Result<()> {
//! let people: Relation<&str, &str> = relation(
//!     &["name", "city"],
//!     vec![vec!["ann", "oslo"], vec!["bob", "rome"]],
//! )?;
//! let cities: Relation<&str, &str> = relation(
//!     &["city", "country"],
//!     vec![vec!["oslo", "norway"], vec!["rome", "italy"]],
//! )?;
//! let joined = join(&people, &cities);
//! assert!(joined.contains(&map!{"name" => "ann", "city" => "oslo", "country" => "norway"}));
//! assert_eq!(2, joined.len());
//! # Ok(())
//! # }
//! ```

use std::hash::Hash;

use archery::SharedPointerKind;
use tracing::debug;

use crate::error::{Error, Result};
use crate::hashmap::GenericMap;
use crate::hashset::GenericSet;
use crate::shared_ptr::DefaultSharedPtr;

/// A set of tuples sharing a header.
pub type GenericRelation<K, V, P> = GenericSet<GenericMap<K, V, P>, P>;

/// Type alias for [`GenericRelation`] that uses [`DefaultSharedPtr`] as the pointer type.
pub type Relation<K, V> = GenericRelation<K, V, DefaultSharedPtr>;

/// A value type able to hold a whole relation.
///
/// [`nest`] stores each group it builds as a value, and [`unnest`] expands
/// any value that holds a relation.
pub trait NestedRelation<K, P: SharedPointerKind>: Sized {
    /// Wrap a relation up as a value.
    fn from_relation(relation: GenericRelation<K, Self, P>) -> Self;

    /// The relation held by this value, if it holds one.
    fn as_relation(&self) -> Option<&GenericRelation<K, Self, P>>;
}

/// Build a relation from a header and rows of values in header order.
///
/// Fails with [`Error::ShapeMismatch`] on the first row whose length
/// differs from the header's.
pub fn relation<K, V, P, R, I>(header: &[K], rows: I) -> Result<GenericRelation<K, V, P>>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone,
    P: SharedPointerKind,
    R: IntoIterator<Item = V>,
    I: IntoIterator<Item = R>,
{
    let mut out = GenericSet::new();
    for (row, values) in rows.into_iter().enumerate() {
        let values: Vec<V> = values.into_iter().collect();
        if values.len() != header.len() {
            return Err(Error::ShapeMismatch {
                row,
                expected: header.len(),
                found: values.len(),
            });
        }
        out.insert(header.iter().cloned().zip(values).collect());
    }
    Ok(out)
}

/// Restrict every tuple of a relation to the given attributes.
pub fn project<K, V, P>(
    rel: &GenericRelation<K, V, P>,
    attrs: &GenericSet<K, P>,
) -> GenericRelation<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    rel.map(|tuple| tuple.project(attrs))
}

/// The natural join of two relations.
///
/// Tuples are matched on the attributes the two headers have in common, and
/// each matching pair is merged into one tuple. With no attributes in
/// common, the result is the cartesian product.
///
/// The headers are read from one tuple of each side, so an empty operand
/// gives an empty result straight away.
pub fn join<K, V, P>(
    s: &GenericRelation<K, V, P>,
    t: &GenericRelation<K, V, P>,
) -> GenericRelation<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    let (Some(s_tuple), Some(t_tuple)) = (s.any(), t.any()) else {
        return GenericSet::new();
    };
    let s_header = s_tuple.key_set();
    let t_header = t_tuple.key_set();
    let common = s_header.clone().intersection(t_header.clone());
    let s_groups = group(s, &common, &s_header.difference(common.clone()));
    let t_groups = group(t, &common, &t_header.difference(common.clone()));

    // The three parts of a joined tuple have disjoint keys, so they can be
    // merged in any order.
    let (probe, build) = if s_groups.len() <= t_groups.len() {
        (&s_groups, &t_groups)
    } else {
        (&t_groups, &s_groups)
    };
    let mut out = GenericSet::new();
    for (key, ours) in probe {
        let Some(theirs) = build.get(key) else {
            continue;
        };
        for a in ours {
            let partial = key.clone().update(a.clone());
            for b in theirs {
                out.insert(partial.clone().update(b.clone()));
            }
        }
    }
    debug!(
        common = common.len(),
        left_groups = s_groups.len(),
        right_groups = t_groups.len(),
        joined = out.len(),
        "join"
    );
    out
}

/// Map each distinct projection onto `key_attrs` to the set of projections
/// onto `rest_attrs` of the tuples sharing it.
fn group<K, V, P>(
    rel: &GenericRelation<K, V, P>,
    key_attrs: &GenericSet<K, P>,
    rest_attrs: &GenericSet<K, P>,
) -> GenericMap<GenericMap<K, V, P>, GenericRelation<K, V, P>, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    rel.reduce(GenericMap::new(), |mut groups, tuple| {
        let key = tuple.project(key_attrs);
        let group = groups
            .get(&key)
            .cloned()
            .unwrap_or_default()
            .with(tuple.project(rest_attrs));
        groups.insert(key, group);
        groups
    })
}

/// Group the tuples of a relation by everything except `attrs`, gathering
/// the `attrs` part of each group into a nested relation stored under
/// `attr`.
///
/// The result has one tuple per distinct projection onto the remaining
/// attributes.
pub fn nest<K, V, P>(
    rel: &GenericRelation<K, V, P>,
    attr: K,
    attrs: &GenericSet<K, P>,
) -> GenericRelation<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone + NestedRelation<K, P>,
    P: SharedPointerKind,
{
    let init = GenericMap::<GenericMap<K, V, P>, GenericRelation<K, V, P>, P>::new();
    let groups = rel.reduce(init, |mut groups, tuple| {
        let outer = tuple.without_all(attrs);
        let group: GenericRelation<K, V, P> = groups
            .get(&outer)
            .cloned()
            .unwrap_or_default()
            .with(tuple.project(attrs));
        groups.insert(outer, group);
        groups
    });
    debug!(tuples = rel.len(), groups = groups.len(), "nest");
    groups.reduce(GenericSet::new(), |mut out, outer, inner| {
        out.insert(outer.with(attr.clone(), V::from_relation(inner.clone())));
        out
    })
}

/// Flatten nested relations back into their enclosing tuples.
///
/// For each attribute in `attrs`, a tuple whose value under it holds a
/// relation is replaced by one tuple per nested tuple, each combining the
/// outer tuple without the attribute and the nested tuple. A tuple whose
/// value isn't a relation is kept as it is, and one holding an empty
/// relation disappears. The order the attributes are taken in doesn't
/// change the result.
pub fn unnest<K, V, P>(
    rel: &GenericRelation<K, V, P>,
    attrs: &GenericSet<K, P>,
) -> GenericRelation<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone + NestedRelation<K, P>,
    P: SharedPointerKind,
{
    attrs.reduce(rel.clone(), |rel, attr| unnest_one(&rel, attr))
}

fn unnest_one<K, V, P>(rel: &GenericRelation<K, V, P>, attr: &K) -> GenericRelation<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone + NestedRelation<K, P>,
    P: SharedPointerKind,
{
    let out = rel.reduce(GenericSet::new(), |mut out, tuple| {
        match tuple.get(attr).and_then(V::as_relation) {
            Some(nested) => {
                let outer = tuple.without(attr);
                for inner in nested {
                    out.insert(outer.clone().update(inner.clone()));
                }
            }
            None => {
                out.insert(tuple.clone());
            }
        }
        out
    });
    debug!(tuples = rel.len(), unnested = out.len(), "unnest");
    out
}

/// Flatten a set of sets into one set.
pub fn union<A, P>(sets: &GenericSet<GenericSet<A, P>, P>) -> GenericSet<A, P>
where
    A: Hash + Eq + Clone,
    P: SharedPointerKind,
{
    GenericSet::unions(sets.iter().cloned())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;
    use crate::{Map, Set};
    use ::proptest::collection::{hash_set, vec};
    use ::proptest::proptest;
    use pretty_assertions::assert_eq;

    type Rel = Relation<&'static str, u8>;

    const ATTRS: [&str; 3] = ["a", "b", "c"];

    /// The join by definition: every pair of tuples that agree on their
    /// shared attributes.
    fn nested_loop_join(s: &Rel, t: &Rel) -> Rel {
        let mut out = Set::new();
        for a in s {
            for b in t {
                if a.iter().all(|(k, v)| b.get(k).map_or(true, |w| w == v)) {
                    out.insert(a.clone().update(b.clone()));
                }
            }
        }
        out
    }

    /// Every relation over `header` with values drawn from `0..2`.
    fn all_relations(header: &[&'static str]) -> Vec<Rel> {
        let tuples: Vec<Map<&'static str, u8>> = (0..1u32 << header.len())
            .map(|bits| {
                header
                    .iter()
                    .enumerate()
                    .map(|(i, attr)| (*attr, (bits >> i & 1) as u8))
                    .collect()
            })
            .collect();
        (0..1u32 << tuples.len())
            .map(|mask| {
                tuples
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask >> i & 1 == 1)
                    .map(|(_, t)| t.clone())
                    .collect()
            })
            .collect()
    }

    fn headers() -> Vec<Vec<&'static str>> {
        let mut out = Vec::new();
        for mask in 1u32..8 {
            let header: Vec<_> = (0..3usize).filter(|i| mask >> i & 1 == 1).map(|i| ATTRS[i]).collect();
            if header.len() <= 2 {
                out.push(header);
            }
        }
        out
    }

    #[test]
    fn join_matches_nested_loop_exhaustively() {
        let family: Vec<Rel> = headers().iter().flat_map(|h| all_relations(h)).collect();
        for s in &family {
            for t in &family {
                assert_eq!(nested_loop_join(s, t), join(s, t), "joining {:?} with {:?}", s, t);
            }
        }
    }

    #[test]
    fn join_with_empty_is_empty() {
        let s: Rel = relation(&["a"], vec![vec![1]]).unwrap();
        assert!(join(&s, &Set::new()).is_empty());
        assert!(join(&Set::new(), &s).is_empty());
    }

    #[test]
    fn join_without_common_attributes_is_a_product() {
        let s: Rel = relation(&["a"], vec![vec![1], vec![2]]).unwrap();
        let t: Rel = relation(&["b"], vec![vec![1], vec![2], vec![3]]).unwrap();
        let joined = join(&s, &t);
        assert_eq!(6, joined.len());
        assert!(joined.contains(&crate::map! {"a" => 2, "b" => 3}));
    }

    #[test]
    fn relation_rejects_ragged_rows() {
        let rel: Result<Rel> = relation(&["a", "b"], vec![vec![1, 2], vec![3]]);
        assert_eq!(
            Err(Error::ShapeMismatch {
                row: 1,
                expected: 2,
                found: 1
            }),
            rel
        );
    }

    #[test]
    fn project_merges_duplicates() {
        let rel: Rel = relation(&["a", "b"], vec![vec![1, 1], vec![1, 2], vec![2, 2]]).unwrap();
        let projected = project(&rel, &crate::set!["a"]);
        assert_eq!(crate::set![crate::map! {"a" => 1}, crate::map! {"a" => 2}], projected);
    }

    #[test]
    fn union_flattens() {
        let sets = crate::set![crate::set![1, 2], crate::set![2, 3], Set::new()];
        assert_eq!(crate::set![1, 2, 3], union(&sets));
        assert!(union(&Set::<Set<i32>>::new()).is_empty());
    }

    fn text(s: &str) -> String {
        s.to_string()
    }

    fn attrs(names: &[&str]) -> Set<String> {
        names.iter().map(|n| text(n)).collect()
    }

    fn int_relation(header: &[&str], rows: &[&[i64]]) -> Relation<String, Value> {
        let header: Vec<String> = header.iter().map(|h| text(h)).collect();
        relation(
            &header,
            rows.iter().map(|row| row.iter().map(|v| Value::Int(*v))),
        )
        .unwrap()
    }

    #[test]
    fn nest_then_unnest_round_trip() {
        let rel = int_relation(
            &["c", "a"],
            &[&[1, 10], &[1, 11], &[2, 13], &[3, 11], &[4, 14], &[3, 10], &[4, 13]],
        );
        let nested = nest(&rel, text("aa"), &attrs(&["a"]));
        assert_eq!(4, nested.len());
        let nested = nest(&nested, text("cc"), &attrs(&["c"]));
        assert_eq!(3, nested.len());
        let crowded = nested.filter(|tuple| {
            tuple
                .get("cc")
                .and_then(Value::as_relation)
                .map_or(false, |cc| cc.len() > 1)
        });
        let flat = unnest(&crowded, &attrs(&["aa", "cc"]));
        let expected = int_relation(&["c", "a"], &[&[1, 10], &[1, 11], &[3, 11], &[3, 10]]);
        assert_eq!(expected, flat);
    }

    #[test]
    fn nest_collects_each_group_under_the_new_attribute() {
        let rel = int_relation(&["k", "v"], &[&[1, 10], &[1, 11], &[2, 20]]);
        let nested = nest(&rel, text("vs"), &attrs(&["v"]));
        let expected: Relation<String, Value> = crate::set![
            crate::map! {
                text("k") => Value::Int(1),
                text("vs") => Value::Relation(int_relation(&["v"], &[&[10], &[11]]))
            },
            crate::map! {
                text("k") => Value::Int(2),
                text("vs") => Value::Relation(int_relation(&["v"], &[&[20]]))
            },
        ];
        assert_eq!(expected, nested);
        let empty: Relation<String, Value> = Set::new();
        assert!(nest(&empty, text("vs"), &attrs(&["v"])).is_empty());
    }

    #[test]
    fn unnest_undoes_nest() {
        let rel = int_relation(&["x", "y", "z"], &[&[1, 1, 1], &[1, 2, 1], &[2, 2, 2], &[2, 3, 3]]);
        let nested = nest(&rel, text("yz"), &attrs(&["y", "z"]));
        assert_eq!(2, nested.len());
        assert_eq!(rel, unnest(&nested, &attrs(&["yz"])));
    }

    #[test]
    fn unnest_order_does_not_matter() {
        let rel = int_relation(&["p", "q", "r"], &[&[1, 1, 1], &[1, 2, 1], &[2, 1, 2], &[2, 2, 1]]);
        let nested = nest(&rel, text("qq"), &attrs(&["q"]));
        let nested = nest(&nested, text("rr"), &attrs(&["r"]));
        let one_way = unnest(&unnest(&nested, &attrs(&["qq"])), &attrs(&["rr"]));
        let other_way = unnest(&unnest(&nested, &attrs(&["rr"])), &attrs(&["qq"]));
        assert_eq!(one_way, other_way);
        assert_eq!(rel, one_way);
    }

    #[test]
    fn unnest_skips_plain_values_and_drops_empty_groups() {
        let empty: Relation<String, Value> = Set::new();
        let rel: Relation<String, Value> = crate::set![
            crate::map! {text("k") => Value::Int(1), text("n") => Value::Int(5)},
            crate::map! {text("k") => Value::Int(2), text("n") => Value::Relation(empty)},
        ];
        let flat = unnest(&rel, &attrs(&["n"]));
        assert_eq!(
            crate::set![crate::map! {text("k") => Value::Int(1), text("n") => Value::Int(5)}],
            flat
        );
    }

    proptest! {
        #[test]
        fn join_matches_nested_loop_on_three_attributes(
            ref s in hash_set(vec(0u8..3, 3), 0..12),
            ref t in hash_set(vec(0u8..3, 2), 0..12),
        ) {
            let s: Rel = relation(&["a", "b", "c"], s.iter().cloned()).unwrap();
            let t: Rel = relation(&["b", "d"], t.iter().cloned()).unwrap();
            assert_eq!(nested_loop_join(&s, &t), join(&s, &t));
            assert_eq!(join(&s, &t), join(&t, &s));
        }
    }
}
