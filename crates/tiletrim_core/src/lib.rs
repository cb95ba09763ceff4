//! # tiletrim core
//!
//! The trim engine: given a clustered archive and a maximum zoom, it
//! discards entries beyond the zoom cutoff, clamps runs that straddle
//! it, deduplicates the physical byte ranges entries share, assigns
//! every retained range a packed output offset, and drives the two-pass
//! copy that emits the smaller archive.
//!
//! ## Pipeline
//!
//! [`EntryNormalizer`] → [`RangeCollector`] → [`CompactionPlan`] →
//! [`trim`], which owns the header recomputation and the final copy.
//! Everything is synchronous and single-threaded; the distinct-range
//! set must be complete before any output offset can be assigned, so
//! the two passes cannot overlap.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod dedup;
mod error;
mod normalize;
mod plan;
mod trim;

pub use dedup::{ByteRange, RangeCollector};
pub use error::{TrimError, TrimResult};
pub use normalize::EntryNormalizer;
pub use plan::{CompactionPlan, PlannedRange};
pub use trim::{trim, TrimOptions, TrimSummary};
