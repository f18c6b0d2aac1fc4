//! Compact bitmap set index.
//!
//! Provides:
//! - `types` -- the block-aligned store (`BitmapIndex`) and member decoding
//! - `builder` -- construction from an explicit member set
//! - `format` -- the 8-byte-header binary format and serde bridge
//! - `algebra` -- AND / OR / NOT over present-or-absent indexes

pub mod algebra;
pub mod builder;
pub mod format;
pub mod types;

pub use algebra::{and, and_all, not, or, or_all};
pub use builder::{build, IndexBuilder};
pub use format::{decode, encode, HEADER_SIZE, MIN_ENCODED_SIZE};
pub use types::{block_of, members, BitmapIndex, Members, BLOCK_BITS};
