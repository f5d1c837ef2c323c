// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The DAG-aware splitter: walks the tree rooted at a single CID so that
//! every output chunk is headed by the *original* root and carries the
//! ancestor path down to its first block, making each chunk independently
//! decodable and re-rootable.

use std::collections::VecDeque;
use std::io::Read;
use std::path::Path;

use cid::Cid;

use super::links;
use crate::blockstore::{BlockStore, IndexedCarBlockStore, MemoryBlockStore};
use crate::car::{self, Block, CarHeader};
use crate::error::Error;

/// A subtree not yet visited: the CID to fetch next, and the ancestor
/// blocks (root-to-parent, inclusive of the block that linked to it) that
/// must prefix whichever chunk eventually contains it.
struct PendingSubtree {
    parents: Vec<Block>,
    cid: Cid,
}

pub struct TreewalkSplitter<S> {
    root: Cid,
    /// The in-progress output chunk. `None` once it has been handed to the
    /// caller and no replacement has been started yet.
    wcar: Option<Vec<u8>>,
    pending: VecDeque<PendingSubtree>,
    store: S,
    target_size: usize,
}

impl<S: BlockStore> TreewalkSplitter<S> {
    /// Builds a splitter from a root CID and a store already populated with
    /// every block reachable from it.
    pub fn from_block_store(root: Cid, store: S, target_size: usize) -> Result<Self, Error> {
        if target_size == 0 {
            return Err(Error::InvalidArgument(
                "target_size must be positive".into(),
            ));
        }
        let root_data = store
            .get(&root)?
            .ok_or(Error::MissingBlock(root))?;
        let root_block = Block {
            cid: root,
            data: root_data,
        };

        let wcar = new_car(root, std::slice::from_ref(&root_block))?;

        let pending = links(&root_block.cid, &root_block.data)?
            .into_iter()
            .map(|cid| PendingSubtree {
                parents: vec![root_block.clone()],
                cid,
            })
            .collect();

        Ok(Self {
            root,
            wcar: Some(wcar),
            pending,
            store,
            target_size,
        })
    }

    /// Returns the next chunk, or `Ok(None)` once every reachable block has
    /// been packed.
    pub fn next(&mut self) -> Result<Option<Vec<u8>>, Error> {
        loop {
            let Some(subtree) = self.pending.pop_front() else {
                return Ok(self.wcar.take());
            };

            let data = self
                .store
                .get(&subtree.cid)?
                .ok_or(Error::MissingBlock(subtree.cid))?;
            let block = Block {
                cid: subtree.cid,
                data,
            };

            let wcar = self
                .wcar
                .as_mut()
                .expect("wcar is only None after next() returns, ending iteration");

            let would_overflow = wcar.len() + block.data.len() > self.target_size;
            car::write_block(&mut *wcar, &block)?;

            let mut parents = subtree.parents;
            parents.push(block.clone());

            let child_links = links(&block.cid, &block.data)?;
            if !child_links.is_empty() {
                for cid in child_links.into_iter().rev() {
                    self.pending.push_front(PendingSubtree {
                        parents: parents.clone(),
                        cid,
                    });
                }
            }

            if would_overflow {
                let ready = self.wcar.take().expect("checked above");
                self.wcar = Some(new_car(self.root, &parents)?);
                return Ok(Some(ready));
            }
        }
    }
}

impl TreewalkSplitter<IndexedCarBlockStore> {
    /// Splits a CAR found on disk without loading it fully into memory.
    pub fn from_path(path: impl AsRef<Path>, target_size: usize) -> Result<Self, Error> {
        let store = IndexedCarBlockStore::open(path)?;
        let root = single_root(store.roots())?;
        Self::from_block_store(root, store, target_size)
    }
}

impl TreewalkSplitter<MemoryBlockStore> {
    /// Splits a CAR read from an arbitrary `Read`, buffering every block in
    /// memory first. Prefer [`TreewalkSplitter::from_path`] for large, seekable
    /// inputs.
    pub fn from_reader(reader: impl Read, target_size: usize) -> Result<Self, Error> {
        let store = MemoryBlockStore::load(reader)?;
        let root = single_root(store.roots())?;
        Self::from_block_store(root, store, target_size)
    }
}

fn single_root(roots: &[Cid]) -> Result<Cid, Error> {
    match roots {
        [root] => Ok(*root),
        other => Err(Error::UnsupportedRootCount(other.len())),
    }
}

fn new_car(root: Cid, parents: &[Block]) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    car::write_header(&mut buf, &CarHeader::new(vec![root]))?;
    for block in parents {
        car::write_block(&mut buf, block)?;
    }
    Ok(buf)
}
