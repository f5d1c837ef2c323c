// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Multicodec tags relevant to DAG traversal, and the well-known empty-CID
//! sentinel used as a placeholder root.
//!
//! These numbers come from the multicodec table; there isn't a single crate
//! in this lineage's dependency graph that exposes them as named constants
//! (Forest's own actor crates just inline `pub const DAG_CBOR: u64 = 0x71;`
//! next to a `// TODO is there a better place to get this?`), so this module
//! centralizes the three this crate actually decodes links from.

use cid::multihash::{Code, MultihashDigest};
use cid::Cid;

/// Raw bytes, no links.
pub const RAW: u64 = 0x55;
/// MerkleDAG protobuf (UnixFS et al.), links live in the `Links` field.
pub const DAG_PB: u64 = 0x70;
/// MerkleDAG CBOR, links are any CBOR tag-42 byte string.
pub const DAG_CBOR: u64 = 0x71;

/// The well-known identity-encoded CID `bafkqaaa`: CIDv1, `raw` codec,
/// identity multihash of the empty byte string. Used as the placeholder
/// root on every simple-split chunk after the first.
pub fn empty_cid() -> Cid {
    Cid::new_v1(RAW, Code::Identity.digest(&[]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cid_is_bafkqaaa() {
        assert_eq!(empty_cid().to_string(), "bafkqaaa");
    }
}
