// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! A minimal `dag-pb` (`PBNode`/`PBLink`) reader, scoped to exactly the
//! fields treewalk splitting needs: the ordered list of link CIDs.
//!
//! No crate in this lineage pins a `dag-pb` decoder against a `cid`-crate
//! version this workspace can use without splitting the dependency graph
//! (see DESIGN.md), so this is a small hand-written reader of the
//! well-known protobuf shape:
//!
//! ```text
//! message PBLink {
//!   optional bytes Hash = 1;
//!   optional string Name = 2;
//!   optional uint64 Tsize = 3;
//! }
//! message PBNode {
//!   repeated PBLink Links = 2;
//!   optional bytes Data = 1;
//! }
//! ```
//!
//! Protobuf field order on the wire is not significant, but `dag-pb`
//! (per the [spec](https://ipld.io/specs/codecs/dag-pb/spec/)) requires
//! `Links` to already be present in the encoded order that determines
//! traversal; this reader just returns them as encountered.

use cid::Cid;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbLink {
    pub hash: Cid,
    pub name: String,
    pub tsize: u64,
}

/// Returns the `Links` of a `dag-pb` node, in wire order.
pub fn links(bytes: &[u8]) -> Result<Vec<Cid>, Error> {
    let mut links = Vec::new();
    let mut cursor = 0usize;
    while cursor < bytes.len() {
        let (tag, wire_type, consumed) = read_tag(bytes, cursor)?;
        cursor += consumed;
        match (tag, wire_type) {
            // PBNode.Links, field 2, length-delimited
            (2, 2) => {
                let (len, consumed) = read_varint(bytes, cursor)?;
                cursor += consumed;
                let end = cursor
                    .checked_add(len as usize)
                    .filter(|&end| end <= bytes.len())
                    .ok_or_else(|| Error::MalformedBlock("truncated PBLink".into()))?;
                let link = read_pb_link(&bytes[cursor..end])?;
                links.push(link.hash);
                cursor = end;
            }
            // PBNode.Data, field 1, length-delimited: skip.
            (_, 2) => {
                let (len, consumed) = read_varint(bytes, cursor)?;
                cursor += consumed;
                cursor = cursor
                    .checked_add(len as usize)
                    .filter(|&end| end <= bytes.len())
                    .ok_or_else(|| Error::MalformedBlock("truncated PBNode field".into()))?;
            }
            (_, 0) => {
                let (_, consumed) = read_varint(bytes, cursor)?;
                cursor += consumed;
            }
            (_, other) => {
                return Err(Error::MalformedBlock(format!(
                    "unsupported dag-pb wire type: {other}"
                )))
            }
        }
    }
    Ok(links)
}

fn read_pb_link(bytes: &[u8]) -> Result<PbLink, Error> {
    let mut hash = None;
    let mut name = String::new();
    let mut tsize = 0u64;
    let mut cursor = 0usize;
    while cursor < bytes.len() {
        let (tag, wire_type, consumed) = read_tag(bytes, cursor)?;
        cursor += consumed;
        match (tag, wire_type) {
            (1, 2) => {
                let (len, consumed) = read_varint(bytes, cursor)?;
                cursor += consumed;
                let end = cursor
                    .checked_add(len as usize)
                    .filter(|&end| end <= bytes.len())
                    .ok_or_else(|| Error::MalformedBlock("truncated PBLink.Hash".into()))?;
                hash = Some(
                    Cid::read_bytes(&bytes[cursor..end])
                        .map_err(|e| Error::MalformedBlock(e.to_string()))?,
                );
                cursor = end;
            }
            (2, 2) => {
                let (len, consumed) = read_varint(bytes, cursor)?;
                cursor += consumed;
                let end = cursor
                    .checked_add(len as usize)
                    .filter(|&end| end <= bytes.len())
                    .ok_or_else(|| Error::MalformedBlock("truncated PBLink.Name".into()))?;
                name = String::from_utf8_lossy(&bytes[cursor..end]).into_owned();
                cursor = end;
            }
            (3, 0) => {
                let (v, consumed) = read_varint(bytes, cursor)?;
                tsize = v;
                cursor += consumed;
            }
            (_, 2) => {
                let (len, consumed) = read_varint(bytes, cursor)?;
                cursor += consumed;
                cursor = cursor
                    .checked_add(len as usize)
                    .filter(|&end| end <= bytes.len())
                    .ok_or_else(|| Error::MalformedBlock("truncated PBLink field".into()))?;
            }
            (_, 0) => {
                let (_, consumed) = read_varint(bytes, cursor)?;
                cursor += consumed;
            }
            (_, other) => {
                return Err(Error::MalformedBlock(format!(
                    "unsupported dag-pb wire type: {other}"
                )))
            }
        }
    }
    Ok(PbLink {
        hash: hash.ok_or_else(|| Error::MalformedBlock("PBLink missing Hash".into()))?,
        name,
        tsize,
    })
}

/// Reads a protobuf field tag: `(field_number, wire_type, bytes_consumed)`.
fn read_tag(bytes: &[u8], at: usize) -> Result<(u64, u64, usize), Error> {
    let (key, consumed) = read_varint(bytes, at)?;
    Ok((key >> 3, key & 0x7, consumed))
}

fn read_varint(bytes: &[u8], at: usize) -> Result<(u64, usize), Error> {
    let mut value = 0u64;
    let mut shift = 0u32;
    let mut i = at;
    loop {
        let byte = *bytes
            .get(i)
            .ok_or_else(|| Error::MalformedBlock("truncated varint".into()))?;
        value |= u64::from(byte & 0x7f) << shift;
        i += 1;
        if byte & 0x80 == 0 {
            return Ok((value, i - at));
        }
        shift += 7;
        if shift >= 64 {
            return Err(Error::MalformedBlock("varint too large".into()));
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use cid::multihash::{Code, MultihashDigest};

    #[test]
    fn reads_links_in_order() {
        let a = Cid::new_v1(crate::codec::RAW, Code::Sha2_256.digest(b"a"));
        let b = Cid::new_v1(crate::codec::RAW, Code::Sha2_256.digest(b"b"));
        let node = test_support::encode_node(&[(a, "a", 1), (b, "b", 2)], b"");
        assert_eq!(links(&node).unwrap(), vec![a, b]);
    }

    #[test]
    fn leaf_node_has_no_links() {
        let node = test_support::encode_node(&[], b"leaf data");
        assert!(links(&node).unwrap().is_empty());
    }
}
