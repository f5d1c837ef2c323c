// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! # Varint frames
//!
//! A CARv1 file is a concatenation of _varint frames_: each frame is the
//! _body length_ encoded as an
//! [varint](https://docs.rs/integer-encoding/3.0.0/integer_encoding/trait.VarInt.html),
//! followed by the frame body itself.
//!
//! ```text
//!        varint frame
//! │◄───────────────────────►│
//! │                         │
//! ├───────────┬─────────────┤
//! │varint:    │             │
//! │body length│frame body   │
//! └───────────┼─────────────┤
//! ```
//!
//! The first frame is a _header frame_: the body is a [`CarHeader`] encoded
//! as `dag-cbor`. Every subsequent frame is a _block frame_: the body is a
//! concatenation of a [`Cid`] and the block data it addresses.
//!
//! ```text
//!  ┌───────────┬───┬──────────┤
//!  │body length│cid│block data│
//!  └───────────┴───┼──────────┤
//! ```

use std::io::{self, Read, Write};

use cid::Cid;
use integer_encoding::{VarIntReader, VarIntWriter};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The CARv1 header frame body: `{"roots": [Cid, ...], "version": 1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarHeader {
    pub roots: Vec<Cid>,
    pub version: u64,
}

impl CarHeader {
    pub fn new(roots: Vec<Cid>) -> Self {
        Self { roots, version: 1 }
    }
}

/// A single `(Cid, block data)` record, as read from or written to a CAR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub cid: Cid,
    pub data: Vec<u8>,
}

/// Reads the header frame from the start of a CAR stream, leaving `reader`
/// positioned at the first block frame.
pub fn read_header(mut reader: impl Read) -> Result<CarHeader, Error> {
    let body = read_frame(&mut reader, FrameKind::Header)?
        .ok_or_else(|| Error::MalformedHeader("unexpected end of file".into()))?;
    let header: CarHeader = serde_ipld_dagcbor::from_slice(&body)
        .map_err(|e| Error::MalformedHeader(e.to_string()))?;
    if header.version != 1 {
        return Err(Error::UnsupportedVersion(header.version));
    }
    Ok(header)
}

/// Writes a header frame.
pub fn write_header(mut writer: impl Write, header: &CarHeader) -> Result<(), Error> {
    let body = serde_ipld_dagcbor::to_vec(header)
        .map_err(|e| Error::MalformedHeader(e.to_string()))?;
    write_frame(&mut writer, &body)
}

/// Reads the next block frame, or `Ok(None)` at a clean end of stream.
pub fn read_block(mut reader: impl Read) -> Result<Option<Block>, Error> {
    let Some(body) = read_frame(&mut reader, FrameKind::Block)? else {
        return Ok(None);
    };
    let mut cursor = body.as_slice();
    let cid = Cid::read_bytes(&mut cursor).map_err(|e| Error::MalformedBlock(e.to_string()))?;
    Ok(Some(Block {
        cid,
        data: cursor.to_vec(),
    }))
}

/// Writes a block frame.
pub fn write_block(mut writer: impl Write, block: &Block) -> Result<(), Error> {
    let mut body = block.cid.to_bytes();
    body.extend_from_slice(&block.data);
    write_frame(&mut writer, &body)
}

/// Which kind of frame `read_frame` is reading, so a truncation or
/// ill-formed length varint can surface as the matching `Error` variant
/// rather than a generic `Io`.
#[derive(Clone, Copy)]
enum FrameKind {
    Header,
    Block,
}

impl FrameKind {
    fn malformed(self, msg: String) -> Error {
        match self {
            FrameKind::Header => Error::MalformedHeader(msg),
            FrameKind::Block => Error::MalformedBlock(msg),
        }
    }
}

/// Reads one length-delimited frame body, or `Ok(None)` if the reader is
/// exhausted before the length varint's first byte (a clean EOF between
/// frames; a truncation mid-varint or mid-body is a malformed-frame error,
/// not a generic I/O one).
fn read_frame(mut reader: impl Read, kind: FrameKind) -> Result<Option<Vec<u8>>, Error> {
    let mut first_byte = [0u8; 1];
    match reader.read(&mut first_byte)? {
        0 => return Ok(None),
        1 => {}
        _ => unreachable!(),
    }
    let body_len: usize = first_byte
        .chain(&mut reader)
        .read_varint()
        .map_err(|e| kind.malformed(format!("invalid length varint: {e}")))?;
    let mut body = vec![0u8; body_len];
    reader
        .read_exact(&mut body)
        .map_err(|e| kind.malformed(format!("truncated frame body: {e}")))?;
    Ok(Some(body))
}

fn write_frame(mut writer: impl Write, body: &[u8]) -> Result<(), Error> {
    writer.write_varint(body.len())?;
    writer.write_all(body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cid::multihash::{Code, MultihashDigest};

    fn cid_for(bytes: &[u8]) -> Cid {
        Cid::new_v1(crate::codec::RAW, Code::Sha2_256.digest(bytes))
    }

    #[test]
    fn round_trips_header_and_blocks() {
        let root = cid_for(b"root");
        let leaf = cid_for(b"leaf");

        let mut buf = Vec::new();
        write_header(&mut buf, &CarHeader::new(vec![root])).unwrap();
        write_block(
            &mut buf,
            &Block {
                cid: root,
                data: b"root data".to_vec(),
            },
        )
        .unwrap();
        write_block(
            &mut buf,
            &Block {
                cid: leaf,
                data: b"leaf data".to_vec(),
            },
        )
        .unwrap();

        let mut cursor = buf.as_slice();
        let header = read_header(&mut cursor).unwrap();
        assert_eq!(header.roots, vec![root]);
        assert_eq!(header.version, 1);

        let first = read_block(&mut cursor).unwrap().unwrap();
        assert_eq!(first.cid, root);
        assert_eq!(first.data, b"root data");

        let second = read_block(&mut cursor).unwrap().unwrap();
        assert_eq!(second.cid, leaf);
        assert_eq!(second.data, b"leaf data");

        assert!(read_block(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn rejects_non_v1_header() {
        let mut buf = Vec::new();
        write_header(
            &mut buf,
            &CarHeader {
                roots: vec![cid_for(b"root")],
                version: 2,
            },
        )
        .unwrap();
        let err = read_header(buf.as_slice()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(2)));
    }

    #[test]
    fn truncated_block_body_is_malformed_block_not_io() {
        let root = cid_for(b"root");
        let mut buf = Vec::new();
        write_header(&mut buf, &CarHeader::new(vec![root])).unwrap();
        write_block(
            &mut buf,
            &Block {
                cid: root,
                data: b"root data".to_vec(),
            },
        )
        .unwrap();
        // Drop the last few bytes of the block frame's body.
        buf.truncate(buf.len() - 3);

        let mut cursor = buf.as_slice();
        read_header(&mut cursor).unwrap();
        let err = read_block(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::MalformedBlock(_)));
    }

    #[test]
    fn truncated_header_length_varint_is_malformed_header_not_io() {
        // A varint continuation byte (high bit set) with nothing following.
        let buf = [0x80u8];
        let err = read_header(buf.as_slice()).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(_)));
    }
}
