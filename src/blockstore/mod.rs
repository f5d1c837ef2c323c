// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Block lookup abstractions used by the treewalk splitter to resolve a
//! link's [`Cid`] to its data without forcing every caller to hold the
//! whole archive in memory.

mod indexed;
mod memory;

pub use indexed::IndexedCarBlockStore;
pub use memory::MemoryBlockStore;

use cid::Cid;

use crate::error::Error;

/// Looks up block data by [`Cid`]. Implementors only need to support reads:
/// splitting never introduces a block that wasn't already in the source CAR.
pub trait BlockStore {
    fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, Error>;
}
