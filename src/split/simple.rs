// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The byte-accumulating splitter: streams blocks off the input in document
//! order and cuts a new chunk once the working buffer reaches
//! `target_size`, with no regard for the DAG the blocks form.

use std::io::Read;

use crate::car::{self, CarHeader};
use crate::codec;
use crate::error::Error;

/// Splits a CAR by raw byte count. The first chunk carries the source's
/// true roots; every later chunk is headed by the empty-CID sentinel, since
/// only the first chunk can claim to contain the thing the root names.
pub struct SimpleSplitter<R> {
    reader: R,
    next_header: CarHeader,
    target_size: usize,
    done: bool,
}

impl<R: Read> SimpleSplitter<R> {
    pub fn new(mut reader: R, target_size: usize) -> Result<Self, Error> {
        if target_size == 0 {
            return Err(Error::InvalidArgument(
                "target_size must be positive".into(),
            ));
        }
        let header = car::read_header(&mut reader)?;
        Ok(Self {
            reader,
            next_header: header,
            target_size,
            done: false,
        })
    }

    /// Returns the next chunk, or `Ok(None)` once the input is exhausted.
    pub fn next(&mut self) -> Result<Option<Vec<u8>>, Error> {
        if self.done {
            return Ok(None);
        }

        let mut buf = Vec::new();
        car::write_header(&mut buf, &self.next_header)?;

        let mut wrote_any = false;
        loop {
            match car::read_block(&mut self.reader)? {
                Some(block) => {
                    car::write_block(&mut buf, &block)?;
                    wrote_any = true;
                    if buf.len() >= self.target_size {
                        break;
                    }
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        self.next_header = CarHeader::new(vec![codec::empty_cid()]);

        if !wrote_any {
            return Ok(None);
        }
        Ok(Some(buf))
    }
}

/// Concatenates split chunks back into one CAR: the first reader passes
/// through unchanged, and every subsequent reader has its header record
/// stripped before the rest is appended.
pub fn join_simple(readers: impl IntoIterator<Item = impl Read>) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    for (i, mut reader) in readers.into_iter().enumerate() {
        if i == 0 {
            reader.read_to_end(&mut out)?;
        } else {
            let _discarded_header = car::read_header(&mut reader)?;
            reader.read_to_end(&mut out)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::Block;
    use cid::multihash::{Code, MultihashDigest};
    use cid::Cid;

    fn cid_for(bytes: &[u8]) -> Cid {
        Cid::new_v1(codec::RAW, Code::Sha2_256.digest(bytes))
    }

    fn build_car(root: Cid, blocks: &[(Cid, Vec<u8>)]) -> Vec<u8> {
        let mut buf = Vec::new();
        car::write_header(&mut buf, &CarHeader::new(vec![root])).unwrap();
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
    fn single_chunk_when_under_target() {
        let root = cid_for(b"root");
        let car = build_car(root, &[(root, b"small".to_vec())]);

        let mut splitter = SimpleSplitter::new(car.as_slice(), 1024 * 1024).unwrap();
        let chunk = splitter.next().unwrap().unwrap();
        assert!(splitter.next().unwrap().is_none());

        let header = car::read_header(chunk.as_slice()).unwrap();
        assert_eq!(header.roots, vec![root]);
    }

    #[test]
    fn rejects_zero_target_size() {
        let root = cid_for(b"root");
        let car = build_car(root, &[(root, b"small".to_vec())]);

        let err = SimpleSplitter::new(car.as_slice(), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn later_chunks_use_empty_sentinel_root() {
        let root = cid_for(b"root");
        let a = cid_for(b"a");
        let b = cid_for(b"b");
        let car = build_car(
            root,
            &[(root, vec![0u8; 10]), (a, vec![1u8; 10]), (b, vec![2u8; 10])],
        );

        let mut splitter = SimpleSplitter::new(car.as_slice(), 20).unwrap();
        let first = splitter.next().unwrap().unwrap();
        let second = splitter.next().unwrap().unwrap();
        assert!(splitter.next().unwrap().is_none());

        assert_eq!(car::read_header(first.as_slice()).unwrap().roots, vec![root]);
        assert_eq!(
            car::read_header(second.as_slice()).unwrap().roots,
            vec![codec::empty_cid()]
        );
    }

    #[test]
    fn join_recovers_original_bytes() {
        let root = cid_for(b"root");
        let a = cid_for(b"a");
        let b = cid_for(b"b");
        let car = build_car(
            root,
            &[(root, vec![0u8; 10]), (a, vec![1u8; 10]), (b, vec![2u8; 10])],
        );

        let mut splitter = SimpleSplitter::new(car.as_slice(), 20).unwrap();
        let mut chunks = Vec::new();
        while let Some(chunk) = splitter.next().unwrap() {
            chunks.push(chunk);
        }
        assert!(chunks.len() > 1);

        let joined = join_simple(chunks.iter().map(|c| c.as_slice())).unwrap();
        assert_eq!(joined, car);
    }
}
