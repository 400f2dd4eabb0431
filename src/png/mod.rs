//! # PNG Chunk Codec
//!
//! Builds and walks the chunk stream of a PNG file.
//!
//! ## Layout (simplified)
//!
//! ```text
//! 89 50 4E 47 0D 0A 1A 0A     <- 8-byte signature
//! [len][IHDR][data][crc]      <- header chunk
//! [len][IDAT][data][crc]      <- one or more image data chunks
//! [len][zTXt][data][crc]      <- our metadata, spliced in by `embed`
//! [0  ][IEND][    ][crc]      <- terminator
//! ```
//!
//! `len` is a big-endian u32 counting the data bytes only. `crc` is a
//! big-endian CRC-32 over the type tag and data, never the length.

pub mod embed;

use crate::error::{CanvasError, Result};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub const IHDR: [u8; 4] = *b"IHDR";
pub const IEND: [u8; 4] = *b"IEND";
pub const ZTXT: [u8; 4] = *b"zTXt";

/// Length + type + CRC.
pub const CHUNK_OVERHEAD: usize = 12;

/// Frame `payload` as a chunk of type `tag`.
pub fn make_chunk(tag: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(4 + payload.len());
    body.extend_from_slice(&tag);
    body.extend_from_slice(payload);
    let crc = crc32fast::hash(&body);

    let mut out = Vec::with_capacity(CHUNK_OVERHEAD + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out.extend_from_slice(&crc.to_be_bytes());
    out
}

/// A borrowed view of one chunk inside a PNG byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Byte offset of the length field.
    pub offset: usize,
    pub tag: [u8; 4],
    pub data: &'a [u8],
    pub crc: u32,
}

impl Chunk<'_> {
    /// Total bytes the chunk occupies in the stream.
    pub fn total_len(&self) -> usize {
        CHUNK_OVERHEAD + self.data.len()
    }

    pub fn end(&self) -> usize {
        self.offset + self.total_len()
    }

    /// Ancillary chunks have a lowercase first letter.
    pub fn is_ancillary(&self) -> bool {
        self.tag[0] & 0x20 != 0
    }

    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }

    pub fn computed_crc(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.tag);
        hasher.update(self.data);
        hasher.finalize()
    }
}

/// Forward iterator over the chunks of a PNG, starting after the signature.
///
/// Stops after yielding `IEND`. Yields an error (and then stops) on a
/// truncated chunk or a checksum mismatch.
pub struct ChunkReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    finished: bool,
}

impl<'a> ChunkReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < PNG_SIGNATURE.len() || bytes[..8] != PNG_SIGNATURE {
            return Err(CanvasError::MalformedContainer(
                "missing PNG signature".to_string(),
            ));
        }
        Ok(Self {
            bytes,
            pos: PNG_SIGNATURE.len(),
            finished: false,
        })
    }

    fn fail(&mut self, msg: String) -> Option<Result<Chunk<'a>>> {
        self.finished = true;
        Some(Err(CanvasError::MalformedContainer(msg)))
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let offset = self.pos;
        let rest = &self.bytes[offset..];
        if rest.is_empty() {
            return self.fail("stream ended before IEND chunk".to_string());
        }
        if rest.len() < CHUNK_OVERHEAD {
            return self.fail(format!("truncated chunk header at offset {}", offset));
        }

        let len = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let tag = [rest[4], rest[5], rest[6], rest[7]];
        if !tag.iter().all(|b| b.is_ascii_alphabetic()) {
            return self.fail(format!("invalid chunk type at offset {}", offset));
        }
        // Length is untrusted; on 32-bit targets it can overflow usize.
        let chunk_end = len.checked_add(CHUNK_OVERHEAD).filter(|&end| end <= rest.len());
        let Some(data_end) = chunk_end.map(|end| end - 4) else {
            return self.fail(format!(
                "chunk {} at offset {} declares {} bytes past end of stream",
                String::from_utf8_lossy(&tag),
                offset,
                len
            ));
        };

        let data = &rest[8..data_end];
        let crc = u32::from_be_bytes([
            rest[data_end],
            rest[data_end + 1],
            rest[data_end + 2],
            rest[data_end + 3],
        ]);
        let chunk = Chunk { offset, tag, data, crc };
        if chunk.computed_crc() != crc {
            return self.fail(format!(
                "CRC mismatch in {} chunk at offset {}",
                chunk.tag_str(),
                offset
            ));
        }

        self.pos = chunk.end();
        if tag == IEND {
            self.finished = true;
        }
        Some(Ok(chunk))
    }
}

/// Offset of the `IEND` chunk's length field.
pub fn find_iend(bytes: &[u8]) -> Result<usize> {
    for chunk in ChunkReader::new(bytes)? {
        let chunk = chunk?;
        if chunk.tag == IEND {
            return Ok(chunk.offset);
        }
    }
    Err(CanvasError::MalformedContainer(
        "no IEND chunk found".to_string(),
    ))
}

/// Collect every chunk, validating the whole stream.
pub fn read_chunks(bytes: &[u8]) -> Result<Vec<Chunk<'_>>> {
    ChunkReader::new(bytes)?.collect()
}
