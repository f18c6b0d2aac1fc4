//! Set algebra over bitmap indexes.
//!
//! Operands are compared block by block. A block outside an index's range is
//! all-zero for that index, so only the overlapping blocks need bitwise work:
//!
//! - AND keeps `[max(start), min(end)]`; disjoint ranges yield no index.
//! - OR spans `[min(start), max(end)]`.
//! - NOT (difference) keeps the left operand's range and clears the bits the
//!   right operand sets in the overlapping blocks.
//!
//! The empty set is `None`. The free functions take `Option<&BitmapIndex>`
//! so the absent sentinel flows through query pipelines unchanged.
//!
//! Difference exists in two forms. [`BitmapIndex::difference_in_place`]
//! (and `-=`) mutates its receiver; [`BitmapIndex::difference`], [`not`] and
//! `&a - &b` work on a copy and leave both operands untouched.

use std::ops::{BitAnd, BitOr, Sub, SubAssign};

use crate::index::types::BitmapIndex;

impl BitmapIndex {
    /// Intersection. `None` when the block ranges do not overlap.
    ///
    /// The result keeps the full overlap range even if every bit in it ends
    /// up cleared; use [`trimmed`](Self::trimmed) to collapse that case.
    pub fn intersect(&self, other: &BitmapIndex) -> Option<BitmapIndex> {
        if !self.overlaps(other) {
            return None;
        }
        let start = self.start().max(other.start());
        let end = self.end().min(other.end());

        let data = self
            .block_slice(start, end)
            .iter()
            .zip(other.block_slice(start, end))
            .map(|(a, b)| a & b)
            .collect();

        Some(BitmapIndex::from_raw(start, end, data))
    }

    /// Union over the combined block range.
    pub fn union(&self, other: &BitmapIndex) -> BitmapIndex {
        let start = self.start().min(other.start());
        let end = self.end().max(other.end());

        let mut data = vec![0u8; (end - start) as usize + 1];
        for src in [self, other] {
            let offset = (end - src.end()) as usize;
            for (dst, byte) in data[offset..].iter_mut().zip(src.data()) {
                *dst |= byte;
            }
        }

        BitmapIndex::from_raw(start, end, data)
    }

    /// Remove every member of `other` from `self`, in place.
    ///
    /// The receiver keeps its block range. Blocks outside `other`'s range
    /// are left as they are; disjoint ranges leave the receiver unchanged.
    pub fn difference_in_place(&mut self, other: &BitmapIndex) {
        if !self.overlaps(other) {
            return;
        }
        let lo = self.start().max(other.start());
        let hi = self.end().min(other.end());

        let src = other.block_slice(lo, hi);
        for (dst, byte) in self.block_slice_mut(lo, hi).iter_mut().zip(src) {
            *dst &= !byte;
        }
    }

    /// Members of `self` that are not in `other`, as a new index.
    pub fn difference(&self, other: &BitmapIndex) -> BitmapIndex {
        let mut out = self.clone();
        out.difference_in_place(other);
        out
    }
}

/// AND of two possibly absent indexes.
pub fn and(a: Option<&BitmapIndex>, b: Option<&BitmapIndex>) -> Option<BitmapIndex> {
    match (a, b) {
        (Some(a), Some(b)) => a.intersect(b),
        _ => None,
    }
}

/// OR of two possibly absent indexes. An absent side yields the other side.
pub fn or(a: Option<&BitmapIndex>, b: Option<&BitmapIndex>) -> Option<BitmapIndex> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (Some(x), None) | (None, Some(x)) => Some(x.clone()),
        (None, None) => None,
    }
}

/// `a` minus `b` of two possibly absent indexes. Neither operand is modified.
pub fn not(a: Option<&BitmapIndex>, b: Option<&BitmapIndex>) -> Option<BitmapIndex> {
    let a = a?;
    Some(match b {
        Some(b) => a.difference(b),
        None => a.clone(),
    })
}

/// Intersect any number of indexes, e.g. one per query predicate.
///
/// Stops at the first intermediate result without members. The returned
/// index is trimmed, so `None` is the only representation of "no match".
pub fn and_all<'a, I>(indexes: I) -> Option<BitmapIndex>
where
    I: IntoIterator<Item = &'a BitmapIndex>,
{
    let mut iter = indexes.into_iter();
    let mut acc = iter.next()?.clone();
    for (step, next) in iter.enumerate() {
        acc = match acc.intersect(next).and_then(BitmapIndex::trimmed) {
            Some(acc) => acc,
            None => {
                tracing::trace!(step, "Intersection became empty, short-circuiting");
                return None;
            }
        };
    }
    acc.trimmed()
}

/// Union of any number of indexes. `None` for an empty input.
pub fn or_all<'a, I>(indexes: I) -> Option<BitmapIndex>
where
    I: IntoIterator<Item = &'a BitmapIndex>,
{
    indexes
        .into_iter()
        .fold(None, |acc: Option<BitmapIndex>, next| match acc {
            Some(acc) => Some(acc.union(next)),
            None => Some(next.clone()),
        })
}

impl BitAnd for &BitmapIndex {
    type Output = Option<BitmapIndex>;

    fn bitand(self, rhs: &BitmapIndex) -> Option<BitmapIndex> {
        self.intersect(rhs)
    }
}

impl BitOr for &BitmapIndex {
    type Output = BitmapIndex;

    fn bitor(self, rhs: &BitmapIndex) -> BitmapIndex {
        self.union(rhs)
    }
}

impl Sub for &BitmapIndex {
    type Output = BitmapIndex;

    fn sub(self, rhs: &BitmapIndex) -> BitmapIndex {
        self.difference(rhs)
    }
}

impl SubAssign<&BitmapIndex> for BitmapIndex {
    fn sub_assign(&mut self, rhs: &BitmapIndex) {
        self.difference_in_place(rhs);
    }
}

// ── Tests ──────────────────────────────────────────────────────────
