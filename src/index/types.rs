//! Block-aligned bitmap store.
//!
//! A `BitmapIndex` represents a set of `u32` values as a dense run of bytes
//! covering an inclusive range of 8-value blocks. Block `k` holds the values
//! `8k..=8k+7`; bit `p` of its byte (0 = least significant) is value `8k + p`.
//!
//! ## Payload layout
//!
//! ```text
//! data[0]          -> block `end`   (highest)
//! data[1]          -> block `end - 1`
//! ...
//! data[len - 1]    -> block `start` (lowest)
//! ```
//!
//! `data.len() == end - start + 1` always holds, and `data` is never empty.
//! The empty set has no `BitmapIndex` at all; callers carry it as
//! `Option::<BitmapIndex>::None`.

use std::fmt;

use crate::error::{IndexError, Result};

/// Number of values covered by one block (one payload byte).
pub const BLOCK_BITS: u32 = 8;

/// Block number containing `value`.
#[inline]
pub fn block_of(value: u32) -> u32 {
    value / BLOCK_BITS
}

/// Compact bitmap over an inclusive block range.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitmapIndex {
    start: u32,
    end: u32,
    data: Vec<u8>,
}

impl BitmapIndex {
    /// Assemble an index from its raw parts, validating the layout invariants.
    pub fn from_parts(start: u32, end: u32, data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(IndexError::EmptyData);
        }
        if end < start {
            return Err(IndexError::InvalidFormat(format!(
                "end block {} precedes start block {}",
                end, start
            )));
        }
        let expected = (end - start) as u64 + 1;
        if data.len() as u64 != expected {
            return Err(IndexError::InvalidFormat(format!(
                "payload is {} bytes, block range {}..={} needs {}",
                data.len(),
                start,
                end,
                expected
            )));
        }
        Ok(Self { start, end, data })
    }

    /// Crate-internal constructor for callers that computed the range themselves.
    pub(crate) fn from_raw(start: u32, end: u32, data: Vec<u8>) -> Self {
        debug_assert!(end >= start);
        debug_assert_eq!(data.len() as u64, (end - start) as u64 + 1);
        Self { start, end, data }
    }

    /// Lowest block in range.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Highest block in range.
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Payload bytes, highest block first.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of blocks in range (== payload length).
    pub fn block_count(&self) -> usize {
        self.data.len()
    }

    /// Smallest value the block range can hold.
    pub fn lowest_value(&self) -> u32 {
        self.start * BLOCK_BITS
    }

    /// Largest value the block range can hold.
    pub fn highest_value(&self) -> u32 {
        self.end * BLOCK_BITS + (BLOCK_BITS - 1)
    }

    /// Whether the block ranges of `self` and `other` share at least one block.
    pub fn overlaps(&self, other: &BitmapIndex) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Bits of `block`, or 0 when the block is outside the range.
    pub fn block_bits(&self, block: u32) -> u8 {
        if block < self.start || block > self.end {
            return 0;
        }
        self.data[(self.end - block) as usize]
    }

    /// Payload bytes for the blocks `lo..=hi`, which must lie inside the range.
    pub(crate) fn block_slice(&self, lo: u32, hi: u32) -> &[u8] {
        let first = (self.end - hi) as usize;
        let last = (self.end - lo) as usize;
        &self.data[first..=last]
    }

    pub(crate) fn block_slice_mut(&mut self, lo: u32, hi: u32) -> &mut [u8] {
        let first = (self.end - hi) as usize;
        let last = (self.end - lo) as usize;
        &mut self.data[first..=last]
    }

    /// Membership test.
    pub fn contains(&self, value: u32) -> bool {
        self.block_bits(block_of(value)) & (1u8 << (value % BLOCK_BITS)) != 0
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// True when no bit is set. A freshly built or decoded index is never
    /// empty, but intersections and differences can clear every bit while
    /// keeping their block range.
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }

    /// Shrink the block range to the lowest and highest blocks that still
    /// have a member. Returns `None` when no member is left.
    pub fn trimmed(self) -> Option<BitmapIndex> {
        let first = self.data.iter().position(|&b| b != 0)?;
        let last = self.data.iter().rposition(|&b| b != 0)?;
        if first == 0 && last == self.data.len() - 1 {
            return Some(self);
        }
        let end = self.end - first as u32;
        let start = self.end - last as u32;
        Some(Self::from_raw(start, end, self.data[first..=last].to_vec()))
    }

    /// Members in natural payload order: blocks from `end` down to `start`,
    /// ascending within each block.
    pub fn iter(&self) -> Members<'_> {
        Members {
            data: &self.data,
            top: self.end * BLOCK_BITS,
            pos: 0,
            base: 0,
            current: 0,
        }
    }

    /// Members in ascending order.
    pub fn sorted_members(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.len());
        let low = self.lowest_value();
        for (i, &byte) in self.data.iter().rev().enumerate() {
            let base = low + i as u32 * BLOCK_BITS;
            let mut bits = byte;
            while bits != 0 {
                out.push(base + bits.trailing_zeros());
                bits &= bits - 1;
            }
        }
        out
    }
}

impl fmt::Debug for BitmapIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitmapIndex")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("members", &self.len())
            .finish()
    }
}

impl<'a> IntoIterator for &'a BitmapIndex {
    type Item = u32;
    type IntoIter = Members<'a>;

    fn into_iter(self) -> Members<'a> {
        self.iter()
    }
}

/// Iterator over the members of a [`BitmapIndex`] in natural payload order.
pub struct Members<'a> {
    data: &'a [u8],
    /// First value of block `end`.
    top: u32,
    /// Next payload byte to load.
    pos: usize,
    /// First value of the block whose bits are in `current`.
    base: u32,
    /// Remaining unvisited bits of the current byte.
    current: u8,
}

impl Iterator for Members<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        while self.current == 0 {
            let &byte = self.data.get(self.pos)?;
            self.base = self.top - self.pos as u32 * BLOCK_BITS;
            self.current = byte;
            self.pos += 1;
        }
        let bit = self.current.trailing_zeros();
        self.current &= self.current - 1;
        Some(self.base + bit)
    }
}

/// Decode the members of a possibly absent index in natural payload order.
///
/// An absent index means "no members" and yields an empty vector.
pub fn members(index: Option<&BitmapIndex>) -> Vec<u32> {
    match index {
        Some(index) => index.iter().collect(),
        None => Vec::new(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_valid() {
        // {3, 9, 40}: block 5 bit 0, block 1 bit 1, block 0 bit 3.
        let idx = BitmapIndex::from_parts(0, 5, vec![0x01, 0, 0, 0, 0x02, 0x08]).unwrap();
        assert_eq!(idx.start(), 0);
        assert_eq!(idx.end(), 5);
        assert_eq!(idx.block_count(), 6);
        assert_eq!(idx.len(), 3);
    }

    #[test]
    fn test_from_parts_empty_data() {
        let err = BitmapIndex::from_parts(0, 0, vec![]).unwrap_err();
        assert!(matches!(err, IndexError::EmptyData));
    }

    #[test]
    fn test_from_parts_reversed_range() {
        let err = BitmapIndex::from_parts(5, 2, vec![1]).unwrap_err();
        assert!(err.to_string().contains("precedes"));
    }

    #[test]
    fn test_from_parts_length_mismatch() {
        let err = BitmapIndex::from_parts(2, 4, vec![1, 2]).unwrap_err();
        assert!(err.to_string().contains("needs 3"), "unexpected error: {}", err);
    }

    #[test]
    fn test_contains_inside_and_outside_range() {
        let idx = BitmapIndex::from_parts(1, 2, vec![0b1000_0000, 0b0000_0001]).unwrap();
        assert!(idx.contains(8));
        assert!(idx.contains(23));
        assert!(!idx.contains(9));
        assert!(!idx.contains(0));
        assert!(!idx.contains(24));
        assert!(!idx.contains(u32::MAX));
    }

    #[test]
    fn test_value_bounds() {
        let idx = BitmapIndex::from_parts(1, 2, vec![1, 1]).unwrap();
        assert_eq!(idx.lowest_value(), 8);
        assert_eq!(idx.highest_value(), 23);

        let top = block_of(u32::MAX);
        let idx = BitmapIndex::from_parts(top, top, vec![0x80]).unwrap();
        assert_eq!(idx.highest_value(), u32::MAX);
        assert!(idx.contains(u32::MAX));
    }

    #[test]
    fn test_iter_natural_order() {
        let idx = BitmapIndex::from_parts(0, 5, vec![0x01, 0, 0, 0, 0x02, 0x08]).unwrap();
        let natural: Vec<u32> = idx.iter().collect();
        assert_eq!(natural, vec![40, 9, 3]);
        assert_eq!(idx.sorted_members(), vec![3, 9, 40]);
    }

    #[test]
    fn test_iter_ascending_within_block() {
        let idx = BitmapIndex::from_parts(0, 1, vec![0b0000_0101, 0b1000_0011]).unwrap();
        let natural: Vec<u32> = (&idx).into_iter().collect();
        assert_eq!(natural, vec![8, 10, 0, 1, 7]);
        assert_eq!(idx.sorted_members(), vec![0, 1, 7, 8, 10]);
    }

    #[test]
    fn test_iter_top_of_domain() {
        let top = block_of(u32::MAX);
        let idx = BitmapIndex::from_parts(top - 1, top, vec![0xff, 0x01]).unwrap();
        let values: Vec<u32> = idx.iter().collect();
        assert_eq!(values.len(), 9);
        assert_eq!(values[0], u32::MAX - 7);
        assert_eq!(values[7], u32::MAX);
        assert_eq!(values[8], (top - 1) * 8);
    }

    #[test]
    fn test_members_absent_is_empty() {
        assert!(members(None).is_empty());
    }

    #[test]
    fn test_members_present() {
        let idx = BitmapIndex::from_parts(2, 2, vec![0b0001_0010]).unwrap();
        assert_eq!(members(Some(&idx)), vec![17, 20]);
    }

    #[test]
    fn test_is_empty_and_trimmed() {
        let zero = BitmapIndex::from_parts(3, 5, vec![0, 0, 0]).unwrap();
        assert!(zero.is_empty());
        assert_eq!(zero.len(), 0);
        assert!(zero.trimmed().is_none());

        // Blocks 10..=14, members only in blocks 13 and 11.
        let padded = BitmapIndex::from_parts(10, 14, vec![0, 0x04, 0, 0x10, 0]).unwrap();
        let before = padded.sorted_members();
        let trimmed = padded.trimmed().unwrap();
        assert_eq!(trimmed.start(), 11);
        assert_eq!(trimmed.end(), 13);
        assert_eq!(trimmed.data(), &[0x04, 0, 0x10]);
        assert_eq!(trimmed.sorted_members(), before);
    }

    #[test]
    fn test_trimmed_already_minimal() {
        let idx = BitmapIndex::from_parts(0, 1, vec![1, 1]).unwrap();
        let trimmed = idx.clone().trimmed().unwrap();
        assert_eq!(trimmed, idx);
    }

    #[test]
    fn test_block_bits_and_overlap() {
        let a = BitmapIndex::from_parts(0, 1, vec![0xaa, 0x55]).unwrap();
        let b = BitmapIndex::from_parts(1, 3, vec![1, 2, 3]).unwrap();
        let c = BitmapIndex::from_parts(4, 4, vec![1]).unwrap();
        assert_eq!(a.block_bits(0), 0x55);
        assert_eq!(a.block_bits(1), 0xaa);
        assert_eq!(a.block_bits(2), 0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!b.overlaps(&c));
        assert_eq!(b.block_slice(1, 2), &[2, 3]);
    }

    #[test]
    fn test_debug_is_compact() {
        let idx = BitmapIndex::from_parts(0, 0, vec![0x0f]).unwrap();
        let dbg = format!("{:?}", idx);
        assert_eq!(dbg, "BitmapIndex { start: 0, end: 0, members: 4 }");
    }
}
