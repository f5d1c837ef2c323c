// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use thiserror::Error;

/// Errors produced by the `car`, `blockstore`, `split` and `join` modules.
///
/// Every variant corresponds to a kind from the error taxonomy: this crate
/// never handles one of these internally and recovers, it always surfaces
/// it from `next()` (or the one-shot `merge`/`join_simple` calls) to the
/// caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed CAR header: {0}")]
    MalformedHeader(String),

    #[error("malformed CAR block: {0}")]
    MalformedBlock(String),

    #[error("unsupported CAR version: {0}, only version 1 is supported")]
    UnsupportedVersion(u64),

    #[error("unsupported root count: {0}, treewalk splitting requires exactly one root")]
    UnsupportedRootCount(usize),

    #[error("missing block for CID: {0}")]
    MissingBlock(Cid),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation cancelled")]
    Cancelled,
}
