// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The two splitting strategies: [`simple`], which chunks a CAR by raw byte
//! count without any awareness of the DAG it carries, and [`treewalk`],
//! which walks the DAG so that every chunk is independently re-rootable.

pub mod simple;
pub mod treewalk;

use cid::Cid;

use crate::codec;
use crate::error::Error;

/// Which strategy to use for a split or join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Simple,
    Treewalk,
}

/// Returns the outgoing links of a block, dispatching on its CID's
/// multicodec. A codec this crate doesn't know how to decode is treated as
/// a leaf rather than an error, so that DAGs mixing in unrecognized codecs
/// (as long as they don't carry their own outgoing links this crate would
/// need to follow) still split cleanly.
pub(crate) fn links(cid: &Cid, data: &[u8]) -> Result<Vec<Cid>, Error> {
    match cid.codec() {
        codec::RAW => Ok(Vec::new()),
        codec::DAG_CBOR => crate::ipld::links_dag_cbor(data),
        codec::DAG_PB => crate::dagpb::links(data),
        _ => Ok(Vec::new()),
    }
}
