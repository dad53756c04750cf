//! The skiplist proper: level assignment, search and the splicing of nodes in
//! and out of the level chains.
//!
//! Nothing in here is synchronised; [`ZeroCopyIndex`][crate::ZeroCopyIndex]
//! wraps a [`Topology`] in a reader/writer lock and is the only way to reach
//! it from outside the crate.

use std::cmp::Ordering;

use tracing::trace;

use crate::{
    layout::Layout,
    level_generator::{Geometric, LevelGenerator},
    node::{Node, NodeId, Slab},
};

/// Outcome of inserting a record into the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub enum Insertion {
    /// The key was not present and a new node was created.
    Inserted,
    /// A node with the same key already existed; its record (and tag, if one
    /// was given) was replaced in place.
    Updated,
}

impl Insertion {
    /// Returns `true` if a new node was created.
    #[inline]
    #[must_use]
    pub fn is_inserted(self) -> bool {
        self == Insertion::Inserted
    }
}

/// Result of a search.
///
/// `update[i]` is the last node visited at level `i` before dropping down a
/// level, with `None` standing for the header. Only levels `0..=height` are
/// meaningful; the remaining entries are `None`, i.e. the header, which is
/// exactly what an insertion raising the height needs.
pub(crate) struct Path {
    pub update: Vec<Option<NodeId>>,
    pub found: Option<NodeId>,
}

// ////////////////////////////////////////////////////////////////////////////
// Topology
// ////////////////////////////////////////////////////////////////////////////

pub(crate) struct Topology<'a, T, K, A> {
    /// Header links, one per configured level.
    head: Box<[Option<NodeId>]>,
    nodes: Slab<Node<'a, T, K, A>>,
    /// Highest level with at least one node; 0 when empty.
    height: usize,
    len: usize,
    level_generator: Geometric,
}

impl<'a, T, K, A> Topology<'a, T, K, A> {
    pub fn new(level_generator: Geometric) -> Self {
        Topology {
            head: vec![None; level_generator.total()].into_boxed_slice(),
            nodes: Slab::new(),
            height: 0,
            len: 0,
            level_generator,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn max_height(&self) -> usize {
        self.head.len()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<'a, T, K, A> {
        &self.nodes[id]
    }

    #[inline]
    pub fn first(&self) -> Option<NodeId> {
        self.head.first().copied().flatten()
    }

    /// Follow the link at `level` out of `from`, where `None` is the header.
    #[inline]
    fn link(&self, from: Option<NodeId>, level: usize) -> Option<NodeId> {
        match from {
            None => self.head[level],
            Some(id) => self.nodes[id].forward[level],
        }
    }

    #[inline]
    fn link_mut(&mut self, from: Option<NodeId>, level: usize) -> &mut Option<NodeId> {
        match from {
            None => &mut self.head[level],
            Some(id) => &mut self.nodes[id].forward[level],
        }
    }

    /// The last node, reached by always advancing as far as possible before
    /// dropping a level.
    pub fn last(&self) -> Option<NodeId> {
        (0..=self.height).rev().fold(None, |mut current, level| {
            while let Some(next) = self.link(current, level) {
                current = Some(next);
            }
            current
        })
    }

    /// Top-down search for `key`.
    pub fn search<L>(&self, layout: &L, key: &K) -> Path
    where
        L: Layout<T, Key = K>,
    {
        let mut update = vec![None; self.head.len()];
        let mut current = None;
        for level in (0..=self.height).rev() {
            while let Some(next) = self.link(current, level) {
                if layout.compare(&self.nodes[next].key, key) == Ordering::Less {
                    current = Some(next);
                } else {
                    break;
                }
            }
            update[level] = current;
        }
        let found = self
            .link(current, 0)
            .filter(|&candidate| layout.compare(&self.nodes[candidate].key, key).is_eq());
        Path { update, found }
    }

    /// Find the node holding `key`.
    ///
    /// Same walk as [`search`][Self::search], without recording the path.
    pub fn find<L>(&self, layout: &L, key: &K) -> Option<NodeId>
    where
        L: Layout<T, Key = K>,
    {
        let mut current = None;
        for level in (0..=self.height).rev() {
            while let Some(next) = self.link(current, level) {
                match layout.compare(&self.nodes[next].key, key) {
                    Ordering::Less => current = Some(next),
                    Ordering::Equal => return Some(next),
                    Ordering::Greater => break,
                }
            }
        }
        None
    }

    /// Insert `record`, or update the node which already holds its key.
    ///
    /// On update the tag is only replaced when `tag` is `Some`.
    pub fn insert<L>(&mut self, layout: &L, record: &'a T, tag: Option<A>) -> Insertion
    where
        L: Layout<T, Key = K>,
    {
        let key = layout.key(record);
        let path = self.search(layout, &key);
        if let Some(id) = path.found {
            self.replace(id, record, tag);
            return Insertion::Updated;
        }
        let _ = self.insert_at(path.update, record, key, tag);
        Insertion::Inserted
    }

    /// Link a new node for `record` behind `update`, the path of a search for
    /// `key` which came back empty.
    pub fn insert_at(
        &mut self,
        update: Vec<Option<NodeId>>,
        record: &'a T,
        key: K,
        tag: Option<A>,
    ) -> NodeId {
        let level = self.level_generator.level();
        let id = self.splice(update, Node::new(record, key, tag, level));
        trace!(?id, level, height = self.height, "linked node");
        id
    }

    /// Swap the record of an existing node, and its tag if one is given.
    pub fn replace(&mut self, id: NodeId, record: &'a T, tag: Option<A>) {
        let node = &mut self.nodes[id];
        node.record = record;
        if tag.is_some() {
            node.tag = tag;
        }
    }

    /// Swap both the record and the tag of an existing node.
    pub fn overwrite(&mut self, id: NodeId, record: &'a T, tag: Option<A>) {
        let node = &mut self.nodes[id];
        node.record = record;
        node.tag = tag;
    }

    /// Link a fresh node behind the nodes recorded in `update`.
    fn splice(&mut self, mut update: Vec<Option<NodeId>>, mut node: Node<'a, T, K, A>) -> NodeId {
        let level = node.level();
        if level > self.height {
            // Levels above the old height are only reachable from the header.
            for slot in &mut update[self.height + 1..=level] {
                *slot = None;
            }
            self.height = level;
        }

        for (l, link) in node.forward.iter_mut().enumerate() {
            *link = self.link(update[l], l);
        }
        node.backward = update[0];
        let successor = node.next();

        let id = self.nodes.insert(node);
        for (l, &prev) in update.iter().enumerate().take(level + 1) {
            *self.link_mut(prev, l) = Some(id);
        }
        if let Some(successor) = successor {
            self.nodes[successor].backward = Some(id);
        }

        self.len += 1;
        debug_assert_eq!(self.len, self.nodes.len());
        id
    }

    /// Remove the node holding `key`, returning it.
    pub fn remove<L>(&mut self, layout: &L, key: &K) -> Option<Node<'a, T, K, A>>
    where
        L: Layout<T, Key = K>,
    {
        let path = self.search(layout, key);
        let id = path.found?;
        let node = self.unsplice(&path.update, id);
        trace!(?id, level = node.level(), height = self.height, "unlinked node");
        Some(node)
    }

    fn unsplice(&mut self, update: &[Option<NodeId>], id: NodeId) -> Node<'a, T, K, A> {
        let Some(node) = self.nodes.remove(id) else {
            unreachable!("search returned dangling node handle {id:?}")
        };

        for (l, &next) in node.forward.iter().enumerate() {
            *self.link_mut(update[l], l) = next;
        }
        if let Some(successor) = node.next() {
            self.nodes[successor].backward = node.backward;
        }
        while self.height > 0 && self.head[self.height].is_none() {
            self.height -= 1;
        }

        self.len -= 1;
        debug_assert_eq!(self.len, self.nodes.len());
        node
    }

    /// An empty topology with the same number of levels and an independent
    /// level generator.
    pub fn fork(&self) -> Self {
        Topology::new(self.level_generator.fork())
    }

    /// Drop every node.  Records are untouched.
    pub fn clear(&mut self) {
        self.head.fill(None);
        self.nodes.clear();
        self.height = 0;
        self.len = 0;
    }

    /// Checks the integrity of the skiplist, panicking on any violation.
    #[cfg(test)]
    pub fn check<L>(&self, layout: &L)
    where
        L: Layout<T, Key = K>,
    {
        assert!(self.height < self.head.len());
        assert_eq!(self.len, self.nodes.len());
        if self.len == 0 {
            assert_eq!(self.height, 0);
        }
        if self.height > 0 {
            assert!(self.head[self.height].is_some(), "top level is empty");
        }
        for level in self.height + 1..self.head.len() {
            assert!(self.head[level].is_none(), "link above height");
        }

        // Level 0: strictly increasing, backward links mirror forward links.
        let mut count = 0;
        let mut prev: Option<NodeId> = None;
        let mut current = self.first();
        while let Some(id) = current {
            let node = &self.nodes[id];
            assert!(node.level() <= self.height);
            assert_eq!(node.backward, prev, "backward link of {id:?}");
            if let Some(prev) = prev {
                assert!(layout.compare(&self.nodes[prev].key, &node.key).is_lt());
            }
            count += 1;
            prev = current;
            current = node.next();
        }
        assert_eq!(count, self.len);

        // Upper levels: ordered subsequences of level 0 made of tall enough
        // nodes, and every tall enough node is linked.
        for level in 1..=self.height {
            let mut expected = self.first();
            let mut current = self.head[level];
            while let Some(id) = current {
                while let Some(candidate) = expected {
                    if candidate == id || self.nodes[candidate].level() >= level {
                        break;
                    }
                    expected = self.nodes[candidate].next();
                }
                assert_eq!(expected, Some(id), "level {level} skips a node");
                assert!(self.nodes[id].level() >= level);
                expected = self.nodes[id].next();
                current = self.nodes[id].forward[level];
            }
            while let Some(candidate) = expected {
                assert!(self.nodes[candidate].level() < level, "level {level} is cut short");
                expected = self.nodes[candidate].next();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Context, Result};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{Insertion, Topology};
    use crate::{layout::OrdLayout, level_generator::Geometric};

    fn identity(record: &u32) -> u32 {
        *record
    }

    fn layout() -> OrdLayout<u32, u32, fn(&u32) -> u32> {
        OrdLayout::new(identity as fn(&u32) -> u32)
    }

    fn keys(topology: &Topology<'_, u32, u32, ()>) -> Vec<u32> {
        let mut keys = Vec::new();
        let mut current = topology.first();
        while let Some(id) = current {
            keys.push(topology.node(id).key);
            current = topology.node(id).next();
        }
        keys
    }

    #[test]
    fn empty() -> Result<()> {
        let layout = layout();
        let mut topology: Topology<'_, u32, u32, ()> = Topology::new(Geometric::new(8, 0.5)?);
        topology.check(&layout);
        assert_eq!(topology.first(), None);
        assert_eq!(topology.last(), None);
        assert_eq!(topology.find(&layout, &1), None);
        assert!(topology.remove(&layout, &1).is_none());
        assert_eq!(topology.height(), 0);
        assert_eq!(topology.max_height(), 8);
        Ok(())
    }

    #[rstest]
    fn insert_remove(#[values(1, 2, 4, 16)] levels: usize, #[values(1, 7, 42)] seed: u64) -> Result<()> {
        let layout = layout();
        let records: Vec<u32> = (0..500).map(|i| (i * 7919) % 1000).collect();
        let mut topology = Topology::new(Geometric::with_seed(levels, 0.5, seed)?);

        for record in &records {
            assert_eq!(topology.insert(&layout, record, None::<()>), Insertion::Inserted);
        }
        topology.check(&layout);
        assert_eq!(topology.len(), records.len());

        let mut sorted = records.clone();
        sorted.sort_unstable();
        assert_eq!(keys(&topology), sorted);

        for record in records.iter().step_by(3) {
            let removed = topology.remove(&layout, record).map(|node| node.key);
            assert_eq!(removed, Some(*record));
            topology.check(&layout);
        }
        sorted.retain(|key| !records.iter().step_by(3).any(|r| r == key));
        assert_eq!(keys(&topology), sorted);
        Ok(())
    }

    #[test]
    fn update_keeps_topology() -> Result<()> {
        let layout = layout();
        let a = 5_u32;
        let b = 5_u32;
        let mut topology = Topology::new(Geometric::new(4, 0.5)?);
        assert!(topology.insert(&layout, &a, Some("first")).is_inserted());
        let id = topology.first();

        assert_eq!(topology.insert(&layout, &b, None), Insertion::Updated);
        assert_eq!(topology.first(), id);
        assert_eq!(topology.len(), 1);

        let node = topology.node(topology.first().context("empty")?);
        assert!(std::ptr::eq(node.record, &b));
        assert_eq!(node.tag, Some("first"));

        assert_eq!(topology.insert(&layout, &a, Some("second")), Insertion::Updated);
        let node = topology.node(topology.first().context("empty")?);
        assert!(std::ptr::eq(node.record, &a));
        assert_eq!(node.tag, Some("second"));
        Ok(())
    }

    #[rstest]
    fn find_agrees_with_search(#[values(1, 3, 12)] levels: usize) -> Result<()> {
        let layout = layout();
        let records: Vec<u32> = (0..300).map(|i| i * 2).collect();
        let mut topology: Topology<'_, u32, u32, ()> =
            Topology::new(Geometric::with_seed(levels, 0.25, 11)?);
        for record in &records {
            let _ = topology.insert(&layout, record, None);
        }

        for key in 0..=600 {
            let found = topology.find(&layout, &key);
            assert_eq!(found, topology.search(&layout, &key).found);
            assert_eq!(found.is_some(), key % 2 == 0 && key < 600);
            if let Some(id) = found {
                assert_eq!(topology.node(id).key, key);
            }
        }
        Ok(())
    }

    #[test]
    fn last_walks_to_the_end() -> Result<()> {
        let layout = layout();
        let records: Vec<u32> = (0..100).rev().collect();
        let mut topology: Topology<'_, u32, u32, ()> = Topology::new(Geometric::new(6, 0.5)?);
        for record in &records {
            let _ = topology.insert(&layout, record, None);
        }
        let last = topology.last().map(|id| topology.node(id).key);
        assert_eq!(last, Some(99));
        Ok(())
    }

    #[test]
    fn height_shrinks_with_top_level() -> Result<()> {
        let layout = layout();
        let records: Vec<u32> = (0..256).collect();
        let mut topology: Topology<'_, u32, u32, ()> =
            Topology::new(Geometric::with_seed(12, 0.5, 3)?);
        for record in &records {
            let _ = topology.insert(&layout, record, None);
        }
        assert!(topology.height() > 0);

        while topology.height() > 0 {
            let height = topology.height();
            let tallest: Vec<u32> = records
                .iter()
                .filter(|key| {
                    topology
                        .find(&layout, key)
                        .is_some_and(|id| topology.node(id).level() == height)
                })
                .copied()
                .collect();
            for key in &tallest {
                assert!(topology.remove(&layout, key).is_some());
            }
            topology.check(&layout);

            let populated = records
                .iter()
                .filter_map(|key| topology.find(&layout, key))
                .map(|id| topology.node(id).level())
                .max()
                .unwrap_or(0);
            assert!(topology.height() < height);
            assert_eq!(topology.height(), populated);
        }
        Ok(())
    }

    #[test]
    fn clear() -> Result<()> {
        let layout = layout();
        let records: Vec<u32> = (0..50).collect();
        let mut topology: Topology<'_, u32, u32, ()> = Topology::new(Geometric::new(6, 0.5)?);
        for record in &records {
            let _ = topology.insert(&layout, record, None);
        }
        topology.clear();
        topology.check(&layout);
        assert_eq!(topology.len(), 0);
        assert_eq!(topology.first(), None);

        assert!(topology.insert(&layout, &records[3], None).is_inserted());
        topology.check(&layout);
        Ok(())
    }
}
