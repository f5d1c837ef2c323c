// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! An indexed, read-only view over a CARv1 file on disk, grounded on the
//! indexing strategy of `PlainCar`: a single linear scan over the file
//! records each block's offset and length without reading its data, so that
//! later lookups can seek straight to it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use cid::Cid;
use integer_encoding::VarIntReader;

use super::BlockStore;
use crate::error::Error;

#[derive(Debug, Clone, Copy)]
struct BlockLocation {
    offset: u64,
    length: u64,
}

pub struct IndexedCarBlockStore {
    file: RefCell<File>,
    index: HashMap<Cid, BlockLocation>,
    roots: Vec<Cid>,
}

impl IndexedCarBlockStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = File::open(path)?;
        Self::from_file(file)
    }

    pub fn from_file(file: File) -> Result<Self, Error> {
        let mut cursor = file.try_clone()?;
        let roots = crate::car::read_header(&mut cursor)?.roots;

        let mut reader = BufReader::with_capacity(1024, cursor);
        let mut index = HashMap::new();
        while let Some((cid, location)) = read_block_location_and_skip(&mut reader)? {
            index.insert(cid, location);
        }

        if index.is_empty() {
            return Err(Error::MalformedBlock(
                "CARv1 file must contain at least one block".into(),
            ));
        }

        Ok(Self {
            file: RefCell::new(file),
            index,
            roots,
        })
    }

    pub fn roots(&self) -> &[Cid] {
        &self.roots
    }
}

impl BlockStore for IndexedCarBlockStore {
    fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, Error> {
        let Some(location) = self.index.get(cid) else {
            return Ok(None);
        };
        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(location.offset))?;
        let mut data = vec![0u8; usize::try_from(location.length).unwrap()];
        file.read_exact(&mut data)?;
        Ok(Some(data))
    }
}

/// Reads one block frame's length and [`Cid`], then seeks past its data
/// without reading it. `Ok(None)` at a clean end of stream.
fn read_block_location_and_skip(
    mut reader: impl Read + Seek,
) -> Result<Option<(Cid, BlockLocation)>, Error> {
    let mut first_byte = [0u8; 1];
    match reader.read(&mut first_byte)? {
        0 => return Ok(None),
        1 => {}
        _ => unreachable!(),
    }
    let body_length: u64 = first_byte
        .chain(&mut reader)
        .read_varint()
        .map_err(|e| Error::MalformedBlock(format!("invalid length varint: {e}")))?;
    let frame_body_offset = reader.stream_position()?;

    let mut counted = CountRead::new(&mut reader);
    let cid = Cid::read_bytes(&mut counted).map_err(|e| Error::MalformedBlock(e.to_string()))?;
    let cid_length = counted.bytes_read() as u64;

    let block_data_offset = frame_body_offset + cid_length;
    let next_frame_offset = frame_body_offset + body_length;
    let block_data_length = next_frame_offset - block_data_offset;

    reader.seek(SeekFrom::Start(next_frame_offset))?;
    Ok(Some((
        cid,
        BlockLocation {
            offset: block_data_offset,
            length: block_data_length,
        },
    )))
}

struct CountRead<R> {
    inner: R,
    count: usize,
}

impl<R> CountRead<R> {
    fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }
    fn bytes_read(&self) -> usize {
        self.count
    }
}

impl<R: Read> Read for CountRead<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::{self, Block, CarHeader};
    use cid::multihash::{Code, MultihashDigest};
    use std::io::Write;

    fn cid_for(bytes: &[u8]) -> Cid {
        Cid::new_v1(crate::codec::RAW, Code::Sha2_256.digest(bytes))
    }

    #[test]
    fn indexes_and_resolves_blocks() {
        let root = cid_for(b"root");
        let leaf = cid_for(b"leaf");

        let mut buf = Vec::new();
        car::write_header(&mut buf, &CarHeader::new(vec![root])).unwrap();
        car::write_block(
            &mut buf,
            &Block {
                cid: root,
                data: b"root data".to_vec(),
            },
        )
        .unwrap();
        car::write_block(
            &mut buf,
            &Block {
                cid: leaf,
                data: b"leaf data".to_vec(),
            },
        )
        .unwrap();

        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&buf).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();

        let store = IndexedCarBlockStore::from_file(file).unwrap();
        assert_eq!(store.roots(), &[root]);
        assert_eq!(store.get(&root).unwrap().unwrap(), b"root data");
        assert_eq!(store.get(&leaf).unwrap().unwrap(), b"leaf data");
        assert!(store.get(&cid_for(b"missing")).unwrap().is_none());
    }

    #[test]
    fn truncated_length_varint_is_malformed_block_not_io() {
        let root = cid_for(b"root");
        let mut buf = Vec::new();
        car::write_header(&mut buf, &CarHeader::new(vec![root])).unwrap();
        // A varint continuation byte with nothing following it.
        buf.push(0x80);

        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&buf).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();

        let err = IndexedCarBlockStore::from_file(file).unwrap_err();
        assert!(matches!(err, Error::MalformedBlock(_)));
    }
}
