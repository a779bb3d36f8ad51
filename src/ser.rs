// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Serde support.
//!
//! A set serializes as a sequence. A map whose keys all serialize as
//! strings serializes as a map, so it becomes an object in formats like
//! JSON; any other map serializes as a sequence of `(key, value)` pairs.
//! A map deserializes from either shape, which needs a self-describing
//! format.

use archery::SharedPointerKind;
use serde::de::{Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Impossible, Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use crate::hashmap::GenericMap;
use crate::hashset::GenericSet;

struct SeqVisitor<'de, S, A> {
    phantom_s: PhantomData<S>,
    phantom_a: PhantomData<A>,
    phantom_lifetime: PhantomData<&'de ()>,
}

impl<'de, S, A> SeqVisitor<'de, S, A> {
    pub(crate) fn new() -> SeqVisitor<'de, S, A> {
        SeqVisitor {
            phantom_s: PhantomData,
            phantom_a: PhantomData,
            phantom_lifetime: PhantomData,
        }
    }
}

impl<'de, S, A> Visitor<'de> for SeqVisitor<'de, S, A>
where
    S: From<Vec<A>>,
    A: Deserialize<'de>,
{
    type Value = S;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<Access>(self, mut access: Access) -> Result<Self::Value, Access::Error>
    where
        Access: SeqAccess<'de>,
    {
        let mut v: Vec<A> = match access.size_hint() {
            None => Vec::new(),
            Some(l) => Vec::with_capacity(l),
        };
        while let Some(i) = access.next_element()? {
            v.push(i)
        }
        Ok(From::from(v))
    }
}

/// Accepts a map, or a sequence of key/value pairs.
struct EntriesVisitor<'de, S, K, V> {
    phantom_s: PhantomData<S>,
    phantom_k: PhantomData<K>,
    phantom_v: PhantomData<V>,
    phantom_lifetime: PhantomData<&'de ()>,
}

impl<'de, S, K, V> EntriesVisitor<'de, S, K, V> {
    pub(crate) fn new() -> EntriesVisitor<'de, S, K, V> {
        EntriesVisitor {
            phantom_s: PhantomData,
            phantom_k: PhantomData,
            phantom_v: PhantomData,
            phantom_lifetime: PhantomData,
        }
    }
}

impl<'de, S, K, V> Visitor<'de> for EntriesVisitor<'de, S, K, V>
where
    S: From<Vec<(K, V)>>,
    K: Deserialize<'de>,
    V: Deserialize<'de>,
{
    type Value = S;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map or a sequence of key/value pairs")
    }

    fn visit_map<Access>(self, mut access: Access) -> Result<Self::Value, Access::Error>
    where
        Access: MapAccess<'de>,
    {
        let mut v: Vec<(K, V)> = match access.size_hint() {
            None => Vec::new(),
            Some(l) => Vec::with_capacity(l),
        };
        while let Some(i) = access.next_entry()? {
            v.push(i)
        }
        Ok(From::from(v))
    }

    fn visit_seq<Access>(self, access: Access) -> Result<Self::Value, Access::Error>
    where
        Access: SeqAccess<'de>,
    {
        SeqVisitor::<'de, S, (K, V)>::new().visit_seq(access)
    }
}

// Key probe

#[derive(Debug)]
struct NotAString;

impl fmt::Display for NotAString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key is not a string")
    }
}

impl std::error::Error for NotAString {}

impl ser::Error for NotAString {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        NotAString
    }
}

/// A serializer that succeeds only for strings, used to decide whether a
/// map's keys can be the keys of a serialized map.
struct KeyProbe;

macro_rules! reject {
    ($($method:ident($($arg:ty),*);)*) => {
        $(fn $method(self, $(_: $arg),*) -> Result<(), NotAString> {
            Err(NotAString)
        })*
    };
}

impl Serializer for KeyProbe {
    type Ok = ();
    type Error = NotAString;
    type SerializeSeq = Impossible<(), NotAString>;
    type SerializeTuple = Impossible<(), NotAString>;
    type SerializeTupleStruct = Impossible<(), NotAString>;
    type SerializeTupleVariant = Impossible<(), NotAString>;
    type SerializeMap = Impossible<(), NotAString>;
    type SerializeStruct = Impossible<(), NotAString>;
    type SerializeStructVariant = Impossible<(), NotAString>;

    fn serialize_str(self, _: &str) -> Result<(), NotAString> {
        Ok(())
    }

    fn serialize_newtype_struct<T>(self, _: &'static str, value: &T) -> Result<(), NotAString>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    reject! {
        serialize_bool(bool);
        serialize_i8(i8);
        serialize_i16(i16);
        serialize_i32(i32);
        serialize_i64(i64);
        serialize_u8(u8);
        serialize_u16(u16);
        serialize_u32(u32);
        serialize_u64(u64);
        serialize_f32(f32);
        serialize_f64(f64);
        serialize_char(char);
        serialize_bytes(&[u8]);
        serialize_none();
        serialize_unit();
        serialize_unit_struct(&'static str);
        serialize_unit_variant(&'static str, u32, &'static str);
    }

    fn serialize_some<T>(self, _: &T) -> Result<(), NotAString>
    where
        T: Serialize + ?Sized,
    {
        Err(NotAString)
    }

    fn serialize_newtype_variant<T>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<(), NotAString>
    where
        T: Serialize + ?Sized,
    {
        Err(NotAString)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, NotAString> {
        Err(NotAString)
    }

    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, NotAString> {
        Err(NotAString)
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct, NotAString> {
        Err(NotAString)
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant, NotAString> {
        Err(NotAString)
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap, NotAString> {
        Err(NotAString)
    }

    fn serialize_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStruct, NotAString> {
        Err(NotAString)
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant, NotAString> {
        Err(NotAString)
    }
}

// Set

impl<'de, A, P> Deserialize<'de> for GenericSet<A, P>
where
    A: Deserialize<'de> + Hash + Eq + Clone,
    P: SharedPointerKind,
{
    fn deserialize<D>(des: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        des.deserialize_seq(SeqVisitor::new())
    }
}

impl<A: Serialize + Hash + Eq, P: SharedPointerKind> Serialize for GenericSet<A, P> {
    fn serialize<Ser>(&self, ser: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: Serializer,
    {
        let mut s = ser.serialize_seq(Some(self.len()))?;
        for i in self.iter() {
            s.serialize_element(i)?;
        }
        s.end()
    }
}

// Map

impl<'de, K, V, P> Deserialize<'de> for GenericMap<K, V, P>
where
    K: Deserialize<'de> + Hash + Eq + Clone,
    V: Deserialize<'de> + Hash + Clone,
    P: SharedPointerKind,
{
    fn deserialize<D>(des: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        des.deserialize_any(EntriesVisitor::<'de, GenericMap<K, V, P>, K, V>::new())
    }
}

impl<K, V, P> Serialize for GenericMap<K, V, P>
where
    K: Serialize + Hash + Eq,
    V: Serialize + Hash,
    P: SharedPointerKind,
{
    fn serialize<Ser>(&self, ser: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: Serializer,
    {
        if self.keys().all(|k| k.serialize(KeyProbe).is_ok()) {
            let mut s = ser.serialize_map(Some(self.len()))?;
            for (k, v) in self.iter() {
                s.serialize_entry(k, v)?;
            }
            s.end()
        } else {
            let mut s = ser.serialize_seq(Some(self.len()))?;
            for entry in self.iter() {
                s.serialize_element(&entry)?;
            }
            s.end()
        }
    }
}

// Tests

#[cfg(test)]
mod test {
    use crate::hashmap::Map;
    use crate::hashset::Set;
    use crate::proptest::{map, set};
    use ::proptest::num::i32;
    use ::proptest::proptest;
    use pretty_assertions::assert_eq;
    use serde_json::{from_str, json, to_string, to_value};

    #[test]
    fn string_keys_make_an_object() {
        let m: Map<String, i32> = crate::map! {"a".to_string() => 1, "b".to_string() => 2};
        assert_eq!(json!({"a": 1, "b": 2}), to_value(&m).unwrap());
        let empty: Map<String, i32> = Map::new();
        assert_eq!(json!({}), to_value(&empty).unwrap());
    }

    #[test]
    fn other_keys_make_pairs() {
        let m: Map<i32, bool> = crate::map! {7 => true};
        assert_eq!(json!([[7, true]]), to_value(&m).unwrap());
        let m: Map<(u8, u8), u8> = crate::map! {(1, 2) => 3};
        assert_eq!(json!([[[1, 2], 3]]), to_value(&m).unwrap());
    }

    #[test]
    fn either_shape_deserializes() {
        let expected: Map<String, i32> = crate::map! {"a".to_string() => 1};
        assert_eq!(expected, from_str::<Map<String, i32>>(r#"{"a": 1}"#).unwrap());
        assert_eq!(expected, from_str::<Map<String, i32>>(r#"[["a", 1]]"#).unwrap());
        assert!(from_str::<Map<String, i32>>("3").is_err());
    }

    proptest! {
        #[cfg_attr(miri, ignore)]
        #[test]
        fn ser_set(ref v in set(i32::ANY, 0..100)) {
            assert_eq!(v, &from_str::<Set<i32>>(&to_string(&v).unwrap()).unwrap());
        }

        #[cfg_attr(miri, ignore)]
        #[test]
        fn ser_map(ref v in map(i32::ANY, i32::ANY, 0..100)) {
            assert_eq!(v, &from_str::<Map<i32, i32>>(&to_string(&v).unwrap()).unwrap());
        }

        #[cfg_attr(miri, ignore)]
        #[test]
        fn ser_string_map(ref v in map(".*", i32::ANY, 0..100)) {
            assert_eq!(v, &from_str::<Map<String, i32>>(&to_string(&v).unwrap()).unwrap());
        }
    }
}
