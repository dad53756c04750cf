//! An ordered, concurrent skiplist index over records it does not own.
//!
//! A skiplist stores elements so that they can be accessed, inserted and
//! removed in `O(log(n))` on average. Conceptually it resembles:
//!
//! ```text
//! <head> ----------> [2] --------------------------------------------------> [9] ---------->
//! <head> ----------> [2] ------------------------------------[7] ----------> [9] ---------->
//! <head> ----------> [2] ----------> [4] ------------------> [7] ----------> [9] --> [10] ->
//! <head> --> [1] --> [2] --> [3] --> [4] --> [5] --> [6] --> [7] --> [8] --> [9] --> [10] ->
//! ```
//!
//! where each node `[x]` links to nodes further down the list, allowing a
//! search to skip ahead. The height of each node is drawn from a geometric
//! distribution when it is inserted; there is no other balancing.
//!
//! [`ZeroCopyIndex`] only keeps a reference to each record, plus the key
//! extracted from it and an optional tag. The records stay wherever the
//! caller put them (a slice, an arena, a memory-mapped file), and the index
//! can export them in key order as a list of [`IoSlice`][std::io::IoSlice]s
//! pointing straight into that memory, ready for a vectored write. See
//! [`export`].
//!
//! How keys are extracted, compared and how many bytes of each record are
//! exported is described by a [`Layout`]. The comparison **must** be a total
//! order: it must be consistent over time, anti-symmetric and transitive.
//! Failing that, lookups may miss records which are in the index.
//!
//! # Examples
//!
//! ```
//! use zerocopy_skiplist::{MergeStrategy, OrdLayout, ZeroCopyIndex};
//!
//! let hot = [[7_u32, 70], [1, 10]];
//! let cold = [[4_u32, 40], [7, 0]];
//! let layout = OrdLayout::new(|r: &[u32; 2]| r[0]);
//!
//! let index = ZeroCopyIndex::<_, _, &str>::new(8, layout.clone())?;
//! for record in &hot {
//!     let _ = index.insert_tagged(record, "hot");
//! }
//! let other = ZeroCopyIndex::new(8, layout)?;
//! for record in &cold {
//!     let _ = other.insert_tagged(record, "cold");
//! }
//!
//! let _ = index.merge(&other, MergeStrategy::Ours)?;
//! let keys: Vec<u32> = index.read().iter().map(|node| *node.key()).collect();
//! assert_eq!(keys, [1, 4, 7]);
//! assert_eq!(index.io_slices_tagged(&"hot").len(), 2);
//! # Ok::<(), zerocopy_skiplist::Error>(())
//! ```

mod config;
mod error;
pub mod export;
mod index;
mod layout;
pub mod level_generator;
mod merge;
mod node;
mod topology;
mod view;

pub use config::{Config, DEFAULT_MAX_HEIGHT};
pub use error::Error;
pub use index::{Entry, ZeroCopyIndex};
pub use layout::{FnLayout, Layout, OrdLayout};
pub use merge::{MergeStrategy, MergeSummary};
pub use topology::Insertion;
pub use view::{Iter, NodeRef, ReadView};
