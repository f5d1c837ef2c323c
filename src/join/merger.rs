// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! A deduplicating merger for treewalk-split CAR files: each input chunk
//! repeats the ancestor path down to its first block, so a naive
//! concatenation would duplicate every ancestor once per chunk it appears
//! in. This walks every input in order and keeps only the first copy of
//! each root and each block.

use std::collections::HashSet;
use std::io::Read;

use cid::Cid;

use crate::car::{self, CarHeader};
use crate::error::Error;

/// Merges multiple CARs, unioning roots and blocks by [`Cid`], each in
/// first-seen order across all inputs.
pub fn merge(readers: impl IntoIterator<Item = impl Read>) -> Result<Vec<u8>, Error> {
    let mut roots: Vec<Cid> = Vec::new();
    let mut seen_roots: HashSet<Cid> = HashSet::new();
    let mut seen_blocks: HashSet<Cid> = HashSet::new();
    let mut body = Vec::new();

    for mut reader in readers {
        let header = car::read_header(&mut reader)?;
        for root in header.roots {
            if seen_roots.insert(root) {
                roots.push(root);
            }
        }
        while let Some(block) = car::read_block(&mut reader)? {
            if seen_blocks.insert(block.cid) {
                car::write_block(&mut body, &block)?;
            }
        }
    }

    let mut out = Vec::new();
    car::write_header(&mut out, &CarHeader::new(roots))?;
    out.extend_from_slice(&body);
    Ok(out)
}

/// The treewalk strategy's join: identical to [`merge`], since treewalk
/// chunks are already self-rooted and the only thing a join needs to undo
/// is the per-chunk ancestor-path duplication.
pub fn join_treewalk(readers: impl IntoIterator<Item = impl Read>) -> Result<Vec<u8>, Error> {
    merge(readers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::Block;
    use cid::multihash::{Code, MultihashDigest};

    fn cid_for(bytes: &[u8]) -> Cid {
        Cid::new_v1(crate::codec::RAW, Code::Sha2_256.digest(bytes))
    }

    fn chunk(roots: Vec<Cid>, blocks: &[(Cid, Vec<u8>)]) -> Vec<u8> {
        let mut buf = Vec::new();
        car::write_header(&mut buf, &CarHeader::new(roots)).unwrap();
        for (cid, data) in blocks {
            car::write_block(
                &mut buf,
                &Block {
                    cid: *cid,
                    data: data.clone(),
                },
            )
            .unwrap();
        }
        buf
    }

    #[test]
    fn dedups_shared_ancestor_blocks() {
        let root = cid_for(b"root");
        let a = cid_for(b"a");
        let b = cid_for(b"b");

        // Both chunks repeat `root` as the ancestor-path prefix.
        let first = chunk(vec![root], &[(root, b"root".to_vec()), (a, b"a".to_vec())]);
        let second = chunk(vec![root], &[(root, b"root".to_vec()), (b, b"b".to_vec())]);

        let merged = merge([first.as_slice(), second.as_slice()]).unwrap();

        let mut cursor = merged.as_slice();
        let header = car::read_header(&mut cursor).unwrap();
        assert_eq!(header.roots, vec![root]);

        let mut cids = Vec::new();
        while let Some(block) = car::read_block(&mut cursor).unwrap() {
            cids.push(block.cid);
        }
        assert_eq!(cids, vec![root, a, b]);
    }

    #[test]
    fn unions_roots_in_first_seen_order() {
        let root_a = cid_for(b"root-a");
        let root_b = cid_for(b"root-b");
        let first = chunk(vec![root_a], &[(root_a, b"a".to_vec())]);
        let second = chunk(vec![root_b], &[(root_b, b"b".to_vec())]);

        let merged = merge([first.as_slice(), second.as_slice()]).unwrap();
        let header = car::read_header(merged.as_slice()).unwrap();
        assert_eq!(header.roots, vec![root_a, root_b]);
    }
}
