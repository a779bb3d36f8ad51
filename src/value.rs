// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A dynamically typed value.
//!
//! [`Value`] covers the scalar kinds plus arrays, sets, maps and relations
//! of values, so heterogeneous data can be stored in one collection and
//! relations can be nested inside tuples.
//!
//! Hashing a value always starts with its kind, so values of different
//! kinds whose contents happen to have the same bits don't collide: the
//! integer `1`, the float `1.0` and `true` all hash differently.
//!
//! # Examples
//!
//! ```
//! # #[macro_use] extern crate frozen;
//! # use frozen::Value;
//! # fn main() -> frozen::Result<()> {
//! let pi = Value::try_from(3.14)?;
//! let row = map!{Value::from("pi") => pi, Value::from("n") => Value::from(3)};
//! assert_eq!(Some(&Value::from(3)), row.get(&Value::from("n")));
//! assert!(Value::try_from(f64::NAN).is_err());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};
use crate::hashmap::Map;
use crate::hashset::Set;
use crate::relation::{GenericRelation, NestedRelation, Relation};
use crate::shared_ptr::DefaultSharedPtr;

/// A float that can be hashed.
///
/// NaN is rejected, since it isn't equal to itself, and `-0.0` is stored as
/// `0.0` so that the two zeroes, which compare equal, hash the same.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Float(u64);

impl Float {
    /// The float this wraps.
    pub fn get(self) -> f64 {
        f64::from_bits(self.0)
    }
}

impl TryFrom<f64> for Float {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        if value.is_nan() {
            return Err(Error::Unhashable {
                type_name: "f64",
                reason: "NaN is not equal to itself",
            });
        }
        // Adding zero turns -0.0 into 0.0 and leaves everything else alone.
        Ok(Float((value + 0.0).to_bits()))
    }
}

impl From<Float> for f64 {
    fn from(value: Float) -> f64 {
        value.get()
    }
}

impl fmt::Debug for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.get(), f)
    }
}

/// A dynamically typed value, usable as a set member, a map key or a
/// relation attribute value.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(Float),
    Complex(Float, Float),
    Str(String),
    Array(Vec<Value>),
    Set(Set<Value>),
    Map(Map<Value, Value>),
    Relation(Relation<String, Value>),
}

/// The kind tag every value's hash starts with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Kind {
    Bool,
    Int,
    Float,
    Complex,
    Str,
    Array,
    Set,
    Map,
    Relation,
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Complex(..) => Kind::Complex,
            Value::Str(_) => Kind::Str,
            Value::Array(_) => Kind::Array,
            Value::Set(_) => Kind::Set,
            Value::Map(_) => Kind::Map,
            Value::Relation(_) => Kind::Relation,
        }
    }

    /// The relation held by this value, if it is one.
    pub fn as_relation(&self) -> Option<&Relation<String, Value>> {
        match self {
            Value::Relation(relation) => Some(relation),
            _ => None,
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.kind() as u8);
        match self {
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.hash(state),
            Value::Complex(re, im) => {
                re.hash(state);
                im.hash(state);
            }
            Value::Str(s) => s.hash(state),
            Value::Array(values) => values.hash(state),
            Value::Set(set) => set.hash(state),
            Value::Map(map) => map.hash(state),
            Value::Relation(relation) => relation.hash(state),
        }
    }
}

impl NestedRelation<String, DefaultSharedPtr> for Value {
    fn from_relation(relation: GenericRelation<String, Self, DefaultSharedPtr>) -> Self {
        Value::Relation(relation)
    }

    fn as_relation(&self) -> Option<&GenericRelation<String, Self, DefaultSharedPtr>> {
        Value::as_relation(self)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i.into())
    }
}

impl From<Float> for Value {
    fn from(f: Float) -> Self {
        Value::Float(f)
    }
}

impl TryFrom<f64> for Value {
    type Error = Error;

    fn try_from(f: f64) -> Result<Self> {
        Float::try_from(f).map(Value::Float)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

impl From<Set<Value>> for Value {
    fn from(set: Set<Value>) -> Self {
        Value::Set(set)
    }
}

impl From<Map<Value, Value>> for Value {
    fn from(map: Map<Value, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<Relation<String, Value>> for Value {
    fn from(relation: Relation<String, Value>) -> Self {
        Value::Relation(relation)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hasher::hash_value;
    use pretty_assertions::assert_eq;
    use static_assertions::assert_impl_all;

    assert_impl_all!(Value: Send, Sync, Clone, Eq, Hash);

    fn float(f: f64) -> Value {
        Value::try_from(f).unwrap()
    }

    #[test]
    fn kinds_never_collide() {
        // Same bits underneath, different kinds.
        let values = [
            Value::Bool(true),
            Value::Int(1),
            float(f64::from_bits(1)),
            Value::Array(vec![Value::Int(1)]),
            Value::Set(crate::set![Value::Int(1)]),
        ];
        for (i, a) in values.iter().enumerate() {
            for b in &values[i + 1..] {
                assert_ne!(a, b);
                assert_ne!(hash_value(a), hash_value(b));
            }
        }
        assert_ne!(hash_value(&Value::Int(0)), hash_value(&Value::Bool(false)));
    }

    #[test]
    fn nan_is_unhashable() {
        assert_eq!(
            Err(Error::Unhashable {
                type_name: "f64",
                reason: "NaN is not equal to itself"
            }),
            Value::try_from(f64::NAN)
        );
    }

    #[test]
    fn zeroes_are_one_value() {
        assert_eq!(float(0.0), float(-0.0));
        assert_eq!(hash_value(&float(0.0)), hash_value(&float(-0.0)));
        assert_ne!(float(1.0), float(-1.0));
        assert_eq!(2.5, f64::from(Float::try_from(2.5).unwrap()));
    }

    #[test]
    fn values_nest_in_collections() {
        let inner = crate::map! {Value::from("x") => Value::from(1)};
        let outer = crate::set![Value::from(inner.clone()), Value::from("x")];
        assert!(outer.contains(&Value::Map(inner)));
        assert!(outer.contains(&Value::from("x")));
        assert!(!outer.contains(&Value::from(vec![Value::from("x")])));
    }

    #[test]
    fn relations_round_trip_through_values() {
        let rel: Relation<String, Value> =
            crate::set![crate::map! {"a".to_string() => Value::from(true)}];
        let value = <Value as NestedRelation<_, _>>::from_relation(rel.clone());
        assert_eq!(Kind::Relation, value.kind());
        assert_eq!(Some(&rel), value.as_relation());
        assert_eq!(None, Value::from(3).as_relation());
    }
}
