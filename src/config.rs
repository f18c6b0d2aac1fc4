//! Resource limits for building and decoding indexes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// Default cap on the block span of a single index: 16 Mi blocks,
/// i.e. a 16 MiB payload covering 128 Mi consecutive integers.
pub const DEFAULT_MAX_BLOCKS: u32 = 1 << 24;

/// Largest block span the wire format can express (`u32::MAX / 8 + 1`).
pub const FORMAT_MAX_BLOCKS: u32 = u32::MAX / 8 + 1;

/// Limits applied by the builder and the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Maximum number of blocks (payload bytes) a single index may span.
    pub max_blocks: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_blocks: DEFAULT_MAX_BLOCKS,
        }
    }
}

impl IndexConfig {
    /// Config without a span limit beyond what the wire format allows.
    pub fn unbounded() -> Self {
        Self {
            max_blocks: FORMAT_MAX_BLOCKS,
        }
    }

    /// Check a span of `blocks` blocks against the limit.
    pub fn check_span(&self, blocks: u64) -> Result<()> {
        if blocks > self.max_blocks as u64 {
            return Err(IndexError::SpanTooLarge {
                blocks,
                max: self.max_blocks,
            });
        }
        Ok(())
    }

    /// Read config from a JSON file. Returns None if the file doesn't exist.
    pub fn read_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        if config.max_blocks == 0 {
            return Err(IndexError::InvalidFormat(
                "max_blocks must be at least 1".into(),
            ));
        }
        Ok(Some(config))
    }

    /// Write config to a JSON file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
