// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! A minimal IPLD data model, just enough to walk a decoded `dag-cbor` block
//! for its outgoing [`Cid`] links in document order. This mirrors the shape
//! of `forest_ipld::Ipld` (selectors, JSON conversion and the `ipld!` macro
//! are dropped — this crate only ever needs `links_dag_cbor` below).

use std::collections::BTreeMap;
use std::fmt;

use cid::Cid;
use serde::de::{self, Deserialize};

/// Represents an IPLD data structure decoded from `dag-cbor`.
#[derive(Debug, Clone, PartialEq)]
pub enum Ipld {
    Null,
    Bool(bool),
    Integer(i128),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Ipld>),
    Map(BTreeMap<String, Ipld>),
    Link(Cid),
}

struct IpldVisitor;

impl<'de> de::Visitor<'de> for IpldVisitor {
    type Value = Ipld;

    fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str("any valid dag-cbor value")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.visit_string(String::from(value))
    }

    fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Ipld::String(value))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.visit_byte_buf(v.to_owned())
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Ipld::Bytes(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Ipld::Integer(v.into()))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Ipld::Integer(v.into()))
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Ipld::Bool(v))
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.visit_unit()
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Ipld::Null)
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Ipld::Float(v))
    }

    fn visit_seq<V>(self, mut visitor: V) -> Result<Self::Value, V::Error>
    where
        V: de::SeqAccess<'de>,
    {
        let mut vec = Vec::new();
        while let Some(elem) = visitor.next_element()? {
            vec.push(elem);
        }
        Ok(Ipld::List(vec))
    }

    fn visit_map<V>(self, mut visitor: V) -> Result<Self::Value, V::Error>
    where
        V: de::MapAccess<'de>,
    {
        let mut values = BTreeMap::new();
        while let Some((key, value)) = visitor.next_entry()? {
            values.insert(key, value);
        }
        Ok(Ipld::Map(values))
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        // dag-cbor represents a CID link as a tag-42 byte string; the `cid`
        // crate's own `Deserialize` impl knows how to pull one of these out
        // of whichever self-describing deserializer handed it to us.
        Cid::deserialize(deserializer).map(Ipld::Link)
    }
}

impl<'de> de::Deserialize<'de> for Ipld {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(IpldVisitor)
    }
}

/// Decodes a `dag-cbor` block and returns its outgoing [`Cid`] links, in the
/// order they are first encountered by a depth-first walk of the decoded
/// value (map entries in key order, since dag-cbor map keys are canonically
/// sorted; list entries in index order).
pub fn links_dag_cbor(bytes: &[u8]) -> Result<Vec<Cid>, crate::Error> {
    let ipld: Ipld = serde_ipld_dagcbor::from_slice(bytes)
        .map_err(|e| crate::Error::MalformedBlock(e.to_string()))?;
    let mut links = Vec::new();
    walk(&ipld, &mut links);
    Ok(links)
}

fn walk(ipld: &Ipld, links: &mut Vec<Cid>) {
    match ipld {
        Ipld::Link(cid) => links.push(*cid),
        Ipld::List(list) => {
            for v in list {
                walk(v, links);
            }
        }
        // `Ipld::Map` iterates in `BTreeMap` (lexicographic) key order,
        // which is deterministic but not guaranteed to match the source
        // object's field order. Filecoin's own dag-cbor nodes are tuple
        // (array) encoded for exactly this reason; maps only show up for
        // genuinely dynamic key sets, where there is no "natural" order.
        Ipld::Map(map) => {
            for v in map.values() {
                walk(v, links);
            }
        }
        _ => {}
    }
}
