// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Recombining split CAR files back into one.

pub mod merger;

pub use merger::{join_treewalk, merge};
