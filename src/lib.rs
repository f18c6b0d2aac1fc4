//! Compact bitmap set index.
//!
//! A [`BitmapIndex`] stores a sparse set of `u32` values (typically row ids
//! matching a predicate) as one byte per 8-value block over the block range
//! the set spans. Indexes are built from member lists, persisted through a
//! fixed binary format, and combined with AND / OR / NOT before being decoded
//! back into ids.
//!
//! The empty set is represented by `None`; a present index always carries at
//! least one payload byte.
//!
//! ```
//! use bitmap_index::{and, build, decode, members};
//!
//! let a = build([1, 2, 9]).unwrap();
//! let b = decode(&build([2, 10]).unwrap().encode()).unwrap();
//! let both = and(Some(&a), Some(&b));
//! assert_eq!(members(both.as_ref()), vec![2]);
//! ```

pub mod config;
pub mod error;
pub mod index;

pub use config::IndexConfig;
pub use error::{IndexError, Result};
pub use index::*;
