// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Chunking for CAR files. Split a single CARv1 file into multiple smaller
//! CAR files using a byte-accumulating or DAG-aware strategy, and join
//! split archives back into one.

pub mod blockstore;
pub mod car;
pub mod cli;
mod codec;
mod dagpb;
pub mod error;
mod ipld;
pub mod join;
pub mod split;

pub use error::Error;
