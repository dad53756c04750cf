//! Zero-copy export of the index as a list of buffer descriptors.
//!
//! Every exporter walks the base level of the index under a shared lock and
//! returns one [`IoSlice`] per selected record, in key order, pointing
//! straight into the record's memory. The list can be handed as-is to
//! [`Write::write_vectored`][std::io::Write::write_vectored] or a `pwritev`
//! wrapper; writing it is left to the caller. Records whose span is empty are
//! skipped.
//!
//! ```
//! use std::io::Write;
//!
//! use zerocopy::{Immutable, IntoBytes};
//! use zerocopy_skiplist::{OrdLayout, ZeroCopyIndex, export};
//!
//! #[derive(IntoBytes, Immutable)]
//! #[repr(C)]
//! struct Entry {
//!     id: u32,
//!     value: u32,
//! }
//!
//! let entries = [Entry { id: 2, value: 20 }, Entry { id: 1, value: 10 }];
//! let index = ZeroCopyIndex::<_, _>::new(4, OrdLayout::new(|e: &Entry| e.id))?;
//! for entry in &entries {
//!     let _ = index.insert(entry);
//! }
//!
//! let slices = index.io_slices();
//! assert_eq!(export::total_len(&slices), 16);
//!
//! let mut file = Vec::new();
//! for batch in export::chunks(&slices, export::MAX_IOVECS) {
//!     file.write_vectored(batch)?;
//! }
//! let expected: Vec<u8> = [1_u32, 10, 2, 20].iter().flat_map(|v| v.to_ne_bytes()).collect();
//! assert_eq!(file, expected);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::IoSlice;

use zerocopy::{Immutable, IntoBytes};

use crate::{index::ZeroCopyIndex, layout::Layout, view::NodeRef};

/// Maximum number of buffers accepted by a single vectored write on Linux
/// (`IOV_MAX`).
pub const MAX_IOVECS: usize = 1024;

/// Split a list of buffers into consecutive batches of at most `max` buffers,
/// preserving order.
///
/// A `max` of zero is treated as one.
#[inline]
pub fn chunks<'s, 'a>(
    slices: &'s [IoSlice<'a>],
    max: usize,
) -> impl Iterator<Item = &'s [IoSlice<'a>]> {
    slices.chunks(max.max(1))
}

/// Total number of bytes described by `slices`.
#[inline]
#[must_use]
pub fn total_len(slices: &[IoSlice<'_>]) -> usize {
    slices.iter().map(|slice| slice.len()).sum()
}

// ////////////////////////////////////////////////////////////////////////////
// Exporters
// ////////////////////////////////////////////////////////////////////////////

impl<'a, T, L, A> ZeroCopyIndex<'a, T, L, A>
where
    L: Layout<T>,
{
    /// Walk the base level, emitting the span returned by `select` for each
    /// node, if any.
    ///
    /// The successor of each node is read before `select` runs.
    fn collect_slices<F>(&self, mut select: F) -> Vec<IoSlice<'a>>
    where
        F: FnMut(NodeRef<'_, 'a, T, L::Key, A>) -> Option<&'a [u8]>,
    {
        let topology = self.inner.read_recursive();
        let mut slices = Vec::with_capacity(topology.len());
        let mut current = topology.first();
        while let Some(id) = current {
            current = topology.node(id).next();
            if let Some(bytes) = select(NodeRef::new(&topology, id)) {
                if !bytes.is_empty() {
                    slices.push(IoSlice::new(bytes));
                }
            }
        }
        slices
    }

    /// Export every record through a caller-supplied serializer.
    ///
    /// The returned span must borrow from storage living at least as long as
    /// the records, typically the record itself.
    pub fn io_slices_with<F>(&self, mut bytes: F) -> Vec<IoSlice<'a>>
    where
        F: FnMut(&'a T) -> &'a [u8],
    {
        self.collect_slices(|node| Some(bytes(node.record())))
    }

    /// Export the records for which `predicate` holds, through a
    /// caller-supplied serializer.
    ///
    /// The predicate sees the key, record and tag of each node. It runs with
    /// the index read-locked: it may call the read-only methods of the index
    /// but must not modify it.
    pub fn io_slices_filtered_with<P, F>(&self, mut predicate: P, mut bytes: F) -> Vec<IoSlice<'a>>
    where
        P: FnMut(&NodeRef<'_, 'a, T, L::Key, A>) -> bool,
        F: FnMut(&'a T) -> &'a [u8],
    {
        self.collect_slices(|node| predicate(&node).then(|| bytes(node.record())))
    }
}

impl<'a, T, L, A> ZeroCopyIndex<'a, T, L, A>
where
    L: Layout<T>,
    A: PartialEq,
{
    /// Export the records whose tag equals `tag`, through a caller-supplied
    /// serializer.
    pub fn io_slices_tagged_with<F>(&self, tag: &A, bytes: F) -> Vec<IoSlice<'a>>
    where
        F: FnMut(&'a T) -> &'a [u8],
    {
        self.io_slices_filtered_with(|node| node.tag() == Some(tag), bytes)
    }

    /// Export the records whose tag differs from `tag`, including untagged
    /// records, through a caller-supplied serializer.
    pub fn io_slices_untagged_with<F>(&self, tag: &A, bytes: F) -> Vec<IoSlice<'a>>
    where
        F: FnMut(&'a T) -> &'a [u8],
    {
        self.io_slices_filtered_with(|node| node.tag() != Some(tag), bytes)
    }
}

impl<'a, T, L, A> ZeroCopyIndex<'a, T, L, A>
where
    T: IntoBytes + Immutable,
    L: Layout<T>,
{
    /// The raw bytes of `record`, truncated to the size reported by the
    /// layout.
    #[inline]
    fn raw_bytes(&self, record: &'a T) -> &'a [u8] {
        let bytes = record.as_bytes();
        bytes.get(..self.layout.size(record)).unwrap_or(bytes)
    }

    /// Export the in-memory representation of every record, sized by the
    /// layout.
    pub fn io_slices(&self) -> Vec<IoSlice<'a>> {
        self.io_slices_with(|record| self.raw_bytes(record))
    }

    /// Export the records for which `predicate` holds.
    ///
    /// See [`io_slices_filtered_with`][Self::io_slices_filtered_with] for
    /// what the predicate may do.
    pub fn io_slices_filtered<P>(&self, predicate: P) -> Vec<IoSlice<'a>>
    where
        P: FnMut(&NodeRef<'_, 'a, T, L::Key, A>) -> bool,
    {
        self.io_slices_filtered_with(predicate, |record| self.raw_bytes(record))
    }
}

impl<'a, T, L, A> ZeroCopyIndex<'a, T, L, A>
where
    T: IntoBytes + Immutable,
    L: Layout<T>,
    A: PartialEq,
{
    /// Export the records whose tag equals `tag`.
    pub fn io_slices_tagged(&self, tag: &A) -> Vec<IoSlice<'a>> {
        self.io_slices_tagged_with(tag, |record| self.raw_bytes(record))
    }

    /// Export the records whose tag differs from `tag`, including untagged
    /// records.
    ///
    /// Together with [`io_slices_tagged`][Self::io_slices_tagged] this covers
    /// every record exactly once.
    pub fn io_slices_untagged(&self, tag: &A) -> Vec<IoSlice<'a>> {
        self.io_slices_untagged_with(tag, |record| self.raw_bytes(record))
    }
}
