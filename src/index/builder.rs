//! Index builder -- creates a bitmap index from an explicit member set.
//!
//! The block range is `min / 8 ..= max / 8`. The payload is allocated once
//! and each member sets bit `v % 8` of the byte owned by its block. Since
//! block `end` holds the maximum, the first payload byte is never zero.

use crate::config::IndexConfig;
use crate::error::{IndexError, Result};
use crate::index::types::{block_of, BitmapIndex, BLOCK_BITS};

/// Builds bitmap indexes under a set of [`IndexConfig`] limits.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    config: IndexConfig,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBuilder {
    /// Builder limited only by what the wire format can express.
    pub fn new() -> Self {
        Self {
            config: IndexConfig::unbounded(),
        }
    }

    pub fn with_config(config: IndexConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Build an index from `members`. Order and duplicates don't matter.
    ///
    /// Fails with [`IndexError::EmptyInput`] when there are no members and
    /// with [`IndexError::SpanTooLarge`] when the block span exceeds the
    /// configured limit (checked before the payload is allocated).
    pub fn build<I>(&self, members: I) -> Result<BitmapIndex>
    where
        I: IntoIterator<Item = u32>,
    {
        let members: Vec<u32> = members.into_iter().collect();

        let (min, max) = members
            .iter()
            .fold(None, |acc: Option<(u32, u32)>, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .ok_or(IndexError::EmptyInput)?;

        let start = block_of(min);
        let end = block_of(max);
        let span = (end - start) as u64 + 1;
        self.config.check_span(span)?;

        let mut data = vec![0u8; span as usize];
        for &v in &members {
            data[(end - block_of(v)) as usize] |= 1u8 << (v % BLOCK_BITS);
        }

        tracing::debug!(
            members = members.len(),
            start,
            end,
            "Built bitmap index"
        );

        Ok(BitmapIndex::from_raw(start, end, data))
    }
}

/// Build an index from `members`, limited only by the wire format.
pub fn build<I>(members: I) -> Result<BitmapIndex>
where
    I: IntoIterator<Item = u32>,
{
    IndexBuilder::new().build(members)
}

// ── Tests ──────────────────────────────────────────────────────────
