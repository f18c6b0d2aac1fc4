//! Binary format for bitmap indexes.
//!
//! # Layout
//!
//! ```text
//! Offset  Size  Field
//! 0       4     start_value: u32 BE = start_block * 8
//! 4       4     end_value:   u32 BE = end_block * 8
//! 8       N     payload: end_block - start_block + 1 bytes,
//!               payload[0] = end_block, payload[N - 1] = start_block
//! ```
//!
//! A buffer must hold at least one payload byte, so the minimum valid
//! length is 9 bytes. Header values are divided by 8 on read; since they are
//! always written block-aligned the round trip is lossless.

use std::io::{Read, Write};

use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};

use crate::config::{IndexConfig, FORMAT_MAX_BLOCKS};
use crate::error::{IndexError, Result};
use crate::index::types::{BitmapIndex, BLOCK_BITS};

/// Header size: start_value(4) + end_value(4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Smallest buffer `decode` accepts: header plus one payload byte.
pub const MIN_ENCODED_SIZE: usize = HEADER_SIZE + 1;

/// Largest buffer the format can describe.
pub const MAX_ENCODED_SIZE: usize = HEADER_SIZE + FORMAT_MAX_BLOCKS as usize;

/// Upper bound on the capacity reserved from an untrusted sequence length hint.
const MAX_PREALLOC: usize = 64 * 1024;

/// Parse the header into `(start_block, end_block)`.
fn parse_header(header: &[u8]) -> Result<(u32, u32)> {
    let start_value = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    let end_value = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
    let start = start_value / BLOCK_BITS;
    let end = end_value / BLOCK_BITS;
    if end < start {
        tracing::warn!(start, end, "Rejected bitmap index header with reversed range");
        return Err(IndexError::InvalidFormat(format!(
            "end block {} precedes start block {}",
            end, start
        )));
    }
    Ok((start, end))
}

impl BitmapIndex {
    /// Total serialized size in bytes.
    pub fn serialized_size(&self) -> usize {
        HEADER_SIZE + self.block_count()
    }

    /// Serialize into a fresh buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size());
        buf.extend_from_slice(&(self.start() * BLOCK_BITS).to_be_bytes());
        buf.extend_from_slice(&(self.end() * BLOCK_BITS).to_be_bytes());
        buf.extend_from_slice(self.data());
        buf
    }

    /// Serialize the index into the writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&(self.start() * BLOCK_BITS).to_be_bytes())?;
        writer.write_all(&(self.end() * BLOCK_BITS).to_be_bytes())?;
        writer.write_all(self.data())?;
        Ok(())
    }

    /// Deserialize an index that occupies all of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        Self::decode_with(buf, &IndexConfig::unbounded())
    }

    /// Deserialize an index that occupies all of `buf`, enforcing `config`.
    pub fn decode_with(buf: &[u8], config: &IndexConfig) -> Result<Self> {
        if buf.len() <= HEADER_SIZE {
            return Err(IndexError::TruncatedBuffer(buf.len()));
        }

        let (start, end) = parse_header(&buf[..HEADER_SIZE])?;
        let span = (end - start) as u64 + 1;
        config.check_span(span)?;

        let payload = &buf[HEADER_SIZE..];
        if payload.len() as u64 != span {
            tracing::warn!(
                start,
                end,
                payload = payload.len(),
                "Rejected bitmap index with mismatched payload length"
            );
            return Err(IndexError::InvalidFormat(format!(
                "payload is {} bytes, block range {}..={} needs {}",
                payload.len(),
                start,
                end,
                span
            )));
        }

        tracing::debug!(start, end, "Decoded bitmap index");
        Ok(Self::from_raw(start, end, payload.to_vec()))
    }

    /// Read one encoded index from a stream, using the header to size the
    /// payload. Streams may concatenate several indexes back to back.
    ///
    /// Accepts any span the format can express; use
    /// [`read_from_with`](Self::read_from_with) to bound the allocation for
    /// untrusted input.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Self::read_from_with(reader, &IndexConfig::unbounded())
    }

    /// Like [`read_from`](Self::read_from), with an explicit span limit that
    /// bounds the payload allocation.
    pub fn read_from_with<R: Read>(reader: &mut R, config: &IndexConfig) -> Result<Self> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header).map_err(|e| {
            IndexError::InvalidFormat(format!("Failed to read index header: {}", e))
        })?;

        let (start, end) = parse_header(&header)?;
        let span = (end - start) as u64 + 1;
        config.check_span(span)?;

        let mut data = vec![0u8; span as usize];
        reader.read_exact(&mut data).map_err(|e| {
            IndexError::InvalidFormat(format!("Failed to read index payload: {}", e))
        })?;

        Ok(Self::from_raw(start, end, data))
    }
}

/// Serialize `index` to the wire format.
pub fn encode(index: &BitmapIndex) -> Vec<u8> {
    index.encode()
}

/// Deserialize a wire-format buffer.
pub fn decode(buf: &[u8]) -> Result<BitmapIndex> {
    BitmapIndex::decode(buf)
}

// ── Serde bridge ──────────────────────────────────────────────────

impl Serialize for BitmapIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.encode())
    }
}

struct BitmapIndexVisitor;

impl<'de> Visitor<'de> for BitmapIndexVisitor {
    type Value = BitmapIndex;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("an encoded bitmap index")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<BitmapIndex, E> {
        BitmapIndex::decode(v).map_err(E::custom)
    }

    fn visit_seq<A: SeqAccess<'de>>(
        self,
        mut seq: A,
    ) -> std::result::Result<BitmapIndex, A::Error> {
        let hint = seq.size_hint().unwrap_or(MIN_ENCODED_SIZE);
        let mut buf = Vec::with_capacity(hint.min(MAX_PREALLOC));
        while let Some(byte) = seq.next_element::<u8>()? {
            if buf.len() == MAX_ENCODED_SIZE {
                return Err(de::Error::invalid_length(buf.len() + 1, &self));
            }
            buf.push(byte);
        }
        BitmapIndex::decode(&buf).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for BitmapIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_byte_buf(BitmapIndexVisitor)
    }
}

// ── Tests ──────────────────────────────────────────────────────────
