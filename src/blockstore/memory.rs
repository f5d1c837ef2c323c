// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::HashMap;
use std::io::Read;

use cid::Cid;

use super::BlockStore;
use crate::car;
use crate::error::Error;

/// A [`BlockStore`] that holds every block of a CAR in memory, keyed by
/// [`Cid`]. Built by a single streaming pass over the source.
pub struct MemoryBlockStore {
    roots: Vec<Cid>,
    blocks: HashMap<Cid, Vec<u8>>,
}

impl MemoryBlockStore {
    pub fn load(mut reader: impl Read) -> Result<Self, Error> {
        let header = car::read_header(&mut reader)?;
        let mut blocks = HashMap::new();
        while let Some(block) = car::read_block(&mut reader)? {
            blocks.insert(block.cid, block.data);
        }
        Ok(Self {
            roots: header.roots,
            blocks,
        })
    }

    pub fn roots(&self) -> &[Cid] {
        &self.roots
    }
}

impl BlockStore for MemoryBlockStore {
    fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.blocks.get(cid).cloned())
    }
}
