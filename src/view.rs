//! Navigation over a read-locked index.

use std::{fmt, iter::FusedIterator, ptr};

use parking_lot::RwLockReadGuard;

use crate::{layout::Layout, node::NodeId, topology::Topology};

// ////////////////////////////////////////////////////////////////////////////
// ReadView
// ////////////////////////////////////////////////////////////////////////////

/// A read-locked view of a [`ZeroCopyIndex`][crate::ZeroCopyIndex], obtained
/// through [`ZeroCopyIndex::read`][crate::ZeroCopyIndex::read].
///
/// While the view is alive the index cannot be modified, so the [`NodeRef`]s
/// it hands out stay valid and can be used to walk the index in either
/// direction.
pub struct ReadView<'v, 'a, T, L, A>
where
    L: Layout<T>,
{
    topology: RwLockReadGuard<'v, Topology<'a, T, L::Key, A>>,
    layout: &'v L,
}

impl<'v, 'a, T, L, A> ReadView<'v, 'a, T, L, A>
where
    L: Layout<T>,
{
    pub(crate) fn new(
        topology: RwLockReadGuard<'v, Topology<'a, T, L::Key, A>>,
        layout: &'v L,
    ) -> Self {
        ReadView { topology, layout }
    }

    #[inline]
    fn node_ref(&self, id: NodeId) -> NodeRef<'_, 'a, T, L::Key, A> {
        NodeRef {
            topology: &self.topology,
            id,
        }
    }

    /// Returns the number of records in the index.
    #[inline]
    pub fn len(&self) -> usize {
        self.topology.len()
    }

    /// Returns `true` if the index contains no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.topology.len() == 0
    }

    /// The highest level currently holding a node.
    #[inline]
    pub fn height(&self) -> usize {
        self.topology.height()
    }

    /// The node holding `key`.
    #[inline]
    pub fn find(&self, key: &L::Key) -> Option<NodeRef<'_, 'a, T, L::Key, A>> {
        self.topology
            .find(self.layout, key)
            .map(|id| self.node_ref(id))
    }

    /// The node with the smallest key.
    #[inline]
    pub fn first(&self) -> Option<NodeRef<'_, 'a, T, L::Key, A>> {
        self.topology.first().map(|id| self.node_ref(id))
    }

    /// The node with the largest key.
    #[inline]
    pub fn last(&self) -> Option<NodeRef<'_, 'a, T, L::Key, A>> {
        self.topology.last().map(|id| self.node_ref(id))
    }

    /// Iterate over the nodes in key order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, 'a, T, L::Key, A> {
        Iter {
            first: self.first(),
            last: self.last(),
            size: self.len(),
        }
    }
}

impl<'s, 'a, T, L, A> IntoIterator for &'s ReadView<'_, 'a, T, L, A>
where
    L: Layout<T>,
{
    type Item = NodeRef<'s, 'a, T, L::Key, A>;
    type IntoIter = Iter<'s, 'a, T, L::Key, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ////////////////////////////////////////////////////////////////////////////
// NodeRef
// ////////////////////////////////////////////////////////////////////////////

/// A node of the index, borrowed from a [`ReadView`].
///
/// Two `NodeRef`s compare equal if they designate the same node of the same
/// index.
pub struct NodeRef<'v, 'a, T, K, A> {
    topology: &'v Topology<'a, T, K, A>,
    id: NodeId,
}

impl<'v, 'a, T, K, A> NodeRef<'v, 'a, T, K, A> {
    pub(crate) fn new(topology: &'v Topology<'a, T, K, A>, id: NodeId) -> Self {
        NodeRef { topology, id }
    }

    /// The key of the node, as extracted when the record was inserted.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &'v K {
        &self.topology.node(self.id).key
    }

    /// The indexed record.
    #[inline]
    #[must_use]
    pub fn record(&self) -> &'a T {
        self.topology.node(self.id).record
    }

    /// The tag attached to the record, if any.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> Option<&'v A> {
        self.topology.node(self.id).tag.as_ref()
    }

    /// The highest level the node participates in.
    #[inline]
    #[must_use]
    pub fn level(&self) -> usize {
        self.topology.node(self.id).level()
    }

    /// The following node in key order, or `None` if this is the last one.
    #[inline]
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        self.topology
            .node(self.id)
            .next()
            .map(|id| NodeRef::new(self.topology, id))
    }

    /// The preceding node in key order, or `None` if this is the first one.
    #[inline]
    #[must_use]
    pub fn prev(&self) -> Option<Self> {
        self.topology
            .node(self.id)
            .backward
            .map(|id| NodeRef::new(self.topology, id))
    }
}

impl<T, K, A> Clone for NodeRef<'_, '_, T, K, A> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, K, A> Copy for NodeRef<'_, '_, T, K, A> {}

impl<T, K, A> PartialEq for NodeRef<'_, '_, T, K, A> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.topology, other.topology) && self.id == other.id
    }
}

impl<T, K, A> Eq for NodeRef<'_, '_, T, K, A> {}

impl<T, K, A> fmt::Debug for NodeRef<'_, '_, T, K, A>
where
    K: fmt::Debug,
    A: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", self.key())
            .field("tag", &self.tag())
            .field("level", &self.level())
            .finish_non_exhaustive()
    }
}

// /////////////////////////////////
// Iterators
// /////////////////////////////////

/// Double-ended iterator over the nodes of a [`ReadView`], in key order.
pub struct Iter<'v, 'a, T, K, A> {
    first: Option<NodeRef<'v, 'a, T, K, A>>,
    last: Option<NodeRef<'v, 'a, T, K, A>>,
    size: usize,
}

impl<'v, 'a, T, K, A> Iterator for Iter<'v, 'a, T, K, A> {
    type Item = NodeRef<'v, 'a, T, K, A>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.first?;
        if Some(current) == self.last {
            self.first = None;
            self.last = None;
        } else {
            self.first = current.next();
        }
        self.size -= 1;
        Some(current)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.size, Some(self.size))
    }
}

impl<T, K, A> DoubleEndedIterator for Iter<'_, '_, T, K, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let current = self.last?;
        if Some(current) == self.first {
            self.first = None;
            self.last = None;
        } else {
            self.last = current.prev();
        }
        self.size -= 1;
        Some(current)
    }
}

impl<T, K, A> ExactSizeIterator for Iter<'_, '_, T, K, A> {}

impl<T, K, A> FusedIterator for Iter<'_, '_, T, K, A> {}

#[cfg(test)]
mod tests {
    use anyhow::{Context, Result};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::{config::Config, index::ZeroCopyIndex, layout::OrdLayout};

    fn key(record: &u64) -> u64 {
        *record
    }

    type Index<'a> = ZeroCopyIndex<'a, u64, OrdLayout<u64, u64, fn(&u64) -> u64>, char>;

    fn index(records: &[u64]) -> Result<Index<'_>> {
        let index = ZeroCopyIndex::with_config(
            Config::with_max_height(8).seed(99),
            OrdLayout::new(key as fn(&u64) -> u64),
        )?;
        for record in records {
            let _ = index.insert(record);
        }
        Ok(index)
    }

    #[test]
    fn empty() -> Result<()> {
        let index = index(&[])?;
        let view = index.read();
        assert!(view.is_empty());
        assert!(view.first().is_none());
        assert!(view.last().is_none());
        assert!(view.find(&0).is_none());
        assert_eq!(view.iter().len(), 0);
        Ok(())
    }

    #[rstest]
    #[case(vec![1])]
    #[case(vec![2, 1])]
    #[case((0..1000).rev().collect())]
    #[case((0..1000).map(|i| (i * 389) % 1000).collect())]
    fn links_are_mirrored(#[case] records: Vec<u64>) -> Result<()> {
        let index = index(&records)?;
        let view = index.read();

        let nodes: Vec<_> = view.iter().collect();
        assert_eq!(nodes.len(), records.len());
        assert_eq!(nodes.first().copied(), view.first());
        assert_eq!(nodes.last().copied(), view.last());
        assert!(view.first().context("empty")?.prev().is_none());
        assert!(view.last().context("empty")?.next().is_none());

        for pair in nodes.windows(2) {
            assert!(pair[0].key() < pair[1].key());
            assert_eq!(pair[0].next(), Some(pair[1]));
            assert_eq!(pair[1].prev(), Some(pair[0]));
        }
        Ok(())
    }

    #[test]
    fn iter_rev_and_mixed() -> Result<()> {
        let records: Vec<u64> = (0..100).collect();
        let index = index(&records)?;
        let view = index.read();

        let reversed: Vec<u64> = view.iter().rev().map(|node| *node.key()).collect();
        assert_eq!(reversed, (0..100).rev().collect::<Vec<_>>());

        let mut iter = view.iter();
        for i in 0..50 {
            assert_eq!(iter.len(), 100 - 2 * i);
            assert_eq!(iter.next().map(|node| *node.key()), Some(i as u64));
            assert_eq!(iter.next_back().map(|node| *node.key()), Some(99 - i as u64));
        }
        assert!(iter.next().is_none());
        assert!(iter.next_back().is_none());
        Ok(())
    }

    #[test]
    fn node_accessors() -> Result<()> {
        let records = [10_u64, 20, 30];
        let index = index(&[])?;
        let _ = index.insert_tagged(&records[0], 'a');
        let _ = index.insert(&records[1]);
        let _ = index.insert_tagged(&records[2], 'c');

        let view = index.read();
        let node = view.find(&20).context("missing node")?;
        assert_eq!(*node.key(), 20);
        assert!(std::ptr::eq(node.record(), &records[1]));
        assert_eq!(node.tag(), None);
        assert!(node.level() <= view.height());
        assert_eq!(node.prev().and_then(|node| node.tag().copied()), Some('a'));
        assert_eq!(node.next().and_then(|node| node.tag().copied()), Some('c'));
        assert!(view.find(&25).is_none());

        let tags: String = (&view).into_iter().filter_map(|node| node.tag()).collect();
        assert_eq!(tags, "ac");
        Ok(())
    }

    #[test]
    fn debug() -> Result<()> {
        let records = [4_u64];
        let index = index(&[])?;
        let _ = index.insert_tagged(&records[0], 'z');
        let view = index.read();
        let node = view.first().context("empty")?;
        let rendered = format!("{node:?}");
        assert!(rendered.starts_with("NodeRef { key: 4, tag: Some('z'), level: "));
        Ok(())
    }
}
