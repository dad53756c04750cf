//! Nodes of the index and the slab in which they are stored.
//!
//! Nodes never own the record they point to; they hold a shared reference to
//! it together with the key extracted at insertion time. Links between nodes
//! are [`NodeId`] handles into the [`Slab`] owned by the index, so that the
//! topology can be rewritten without any raw pointers.

use std::{fmt, iter, ops};

// ////////////////////////////////////////////////////////////////////////////
// NodeId
// ////////////////////////////////////////////////////////////////////////////

/// Handle to a node stored in a [`Slab`].
///
/// Handles are only meaningful for the slab which issued them, and only for as
/// long as the node has not been removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

// ////////////////////////////////////////////////////////////////////////////
// Node
// ////////////////////////////////////////////////////////////////////////////

/// A node of the index.
///
/// A node of level `n` has `n + 1` forward links, stored in a boxed slice
/// sized exactly for that level. `forward[0]` is the successor in key order
/// and `backward` is the predecessor; the first node has no predecessor since
/// the header is not a node.
pub(crate) struct Node<'a, T, K, A> {
    /// The external record; never copied, never freed by the index.
    pub record: &'a T,
    /// Key extracted from `record` when the node was created.
    pub key: K,
    /// Optional caller-defined tag used to filter exports.
    pub tag: Option<A>,
    /// Links to the next node at each level the node participates in.
    pub forward: Box<[Option<NodeId>]>,
    /// The immediately previous node at level 0.
    pub backward: Option<NodeId>,
}

impl<'a, T, K, A> Node<'a, T, K, A> {
    /// Create a new unlinked node reaching up to `level`.
    pub fn new(record: &'a T, key: K, tag: Option<A>, level: usize) -> Self {
        Node {
            record,
            key,
            tag,
            forward: iter::repeat_n(None, level + 1).collect(),
            backward: None,
        }
    }

    /// How high the node reaches.
    #[inline]
    pub fn level(&self) -> usize {
        self.forward.len() - 1
    }

    /// The successor at level 0.
    #[inline]
    pub fn next(&self) -> Option<NodeId> {
        self.forward.first().copied().flatten()
    }
}

impl<T, K, A> fmt::Debug for Node<'_, T, K, A>
where
    K: fmt::Debug,
    A: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("tag", &self.tag)
            .field("forward", &self.forward)
            .field("backward", &self.backward)
            .finish_non_exhaustive()
    }
}

// ////////////////////////////////////////////////////////////////////////////
// Slab
// ////////////////////////////////////////////////////////////////////////////

/// Storage for nodes, addressed by [`NodeId`].
///
/// Slots freed by [`Slab::remove`] are recycled by later insertions.
pub(crate) struct Slab<N> {
    slots: Vec<Option<N>>,
    free: Vec<usize>,
}

impl<N> Slab<N> {
    pub fn new() -> Self {
        Slab {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Store `node`, returning its handle.
    pub fn insert(&mut self, node: N) -> NodeId {
        if let Some(slot) = self.free.pop() {
            if let Some(entry) = self.slots.get_mut(slot) {
                *entry = Some(node);
                return NodeId(slot);
            }
        }
        self.slots.push(Some(node));
        NodeId(self.slots.len() - 1)
    }

    /// Take the node out of the slab, releasing its slot.
    pub fn remove(&mut self, id: NodeId) -> Option<N> {
        let node = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&N> {
        self.slots.get(id.0)?.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut N> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

impl<N> ops::Index<NodeId> for Slab<N> {
    type Output = N;

    #[inline]
    fn index(&self, id: NodeId) -> &N {
        match self.get(id) {
            Some(node) => node,
            None => unreachable!("dangling node handle {id:?}"),
        }
    }
}

impl<N> ops::IndexMut<NodeId> for Slab<N> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut N {
        match self.get_mut(id) {
            Some(node) => node,
            None => unreachable!("dangling node handle {id:?}"),
        }
    }
}
