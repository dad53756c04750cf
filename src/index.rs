//! The zero-copy ordered index.

use std::fmt;

use parking_lot::RwLock;
use tracing::debug;

use crate::{
    config::Config,
    error::Error,
    layout::Layout,
    level_generator::LevelGenerator,
    topology::{Insertion, Topology},
    view::ReadView,
};

// ////////////////////////////////////////////////////////////////////////////
// ZeroCopyIndex
// ////////////////////////////////////////////////////////////////////////////

/// An ordered index over records owned by someone else.
///
/// The index stores a reference to each record together with its key, as
/// extracted by the [`Layout`] `L`, and an optional tag of type `A`. Records
/// are never copied, moved or dropped by the index: the lifetime `'a` ties
/// the index to the storage holding them (a slice, an arena, a memory map,
/// ...), which therefore cannot be moved, resized or freed while the index
/// is alive.
///
/// Keys are unique: inserting a record whose key is already present replaces
/// the previously indexed record.
///
/// All methods take `&self`. A single reader/writer lock guards the whole
/// index: [`insert`][ZeroCopyIndex::insert], [`remove`][ZeroCopyIndex::remove],
/// [`clear`][ZeroCopyIndex::clear] and [`merge`][ZeroCopyIndex::merge] take it
/// exclusively, everything else takes it shared. Shared acquisitions are
/// recursive, so a thread already reading the index (through a [`ReadView`]
/// or an export predicate) can keep reading it while a writer waits. No
/// operation blocks on anything but this lock.
///
/// # Examples
///
/// ```
/// use zerocopy_skiplist::{OrdLayout, ZeroCopyIndex};
///
/// let records = [(3_u32, 'c'), (1, 'a'), (2, 'b')];
/// let index = ZeroCopyIndex::<_, _>::new(8, OrdLayout::new(|r: &(u32, char)| r.0))?;
/// for record in &records {
///     let _ = index.insert(record);
/// }
///
/// assert_eq!(index.len(), 3);
/// assert_eq!(index.first(), Some(&(1, 'a')));
/// assert_eq!(index.last(), Some(&(3, 'c')));
/// assert!(std::ptr::eq(index.get(&2).unwrap(), &records[2]));
/// # Ok::<(), zerocopy_skiplist::Error>(())
/// ```
pub struct ZeroCopyIndex<'a, T, L, A = ()>
where
    L: Layout<T>,
{
    pub(crate) inner: RwLock<Topology<'a, T, L::Key, A>>,
    pub(crate) layout: L,
    config: Config,
}

/// A record found in the index, together with its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<'a, T, A> {
    /// The indexed record.
    pub record: &'a T,
    /// The tag attached to the record, if any.
    pub tag: Option<A>,
}

// ///////////////////////////////////////////////
// Inherent methods
// ///////////////////////////////////////////////

impl<'a, T, L, A> ZeroCopyIndex<'a, T, L, A>
where
    L: Layout<T>,
{
    /// Create an empty index with `max_height` levels and the default
    /// promotion probability.
    ///
    /// # Errors
    ///
    /// A `max_height` of zero is rejected with [`Error::InvalidConfig`].
    #[inline]
    pub fn new(max_height: usize, layout: L) -> Result<Self, Error> {
        Self::with_config(Config::with_max_height(max_height), layout)
    }

    /// Create an empty index from a full [`Config`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is not valid.
    pub fn with_config(config: Config, layout: L) -> Result<Self, Error> {
        let level_generator = config.level_generator()?;
        debug!(
            max_height = level_generator.total(),
            p = level_generator.p(),
            seeded = config.seed.is_some(),
            "created index"
        );
        Ok(ZeroCopyIndex {
            inner: RwLock::new(Topology::new(level_generator)),
            layout,
            config,
        })
    }

    /// The layout used to extract, size and compare keys.
    #[inline]
    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// The configuration the index was created with.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The configured number of levels.
    #[inline]
    pub fn max_height(&self) -> usize {
        self.config.max_height
    }

    /// The highest level (counting from 0) currently holding a node, or 0 if
    /// the index is empty.
    #[inline]
    pub fn height(&self) -> usize {
        self.inner.read_recursive().height()
    }

    /// Returns the number of records in the index.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.read_recursive().len()
    }

    /// Returns `true` if the index contains no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index `record` without a tag.
    ///
    /// If a record with the same key is already indexed, it is replaced by
    /// `record` and its tag is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use zerocopy_skiplist::{Insertion, OrdLayout, ZeroCopyIndex};
    ///
    /// let records = [(1_u8, "old"), (1, "new")];
    /// let index = ZeroCopyIndex::<_, _>::new(4, OrdLayout::new(|r: &(u8, &str)| r.0))?;
    /// assert_eq!(index.insert(&records[0]), Insertion::Inserted);
    /// assert_eq!(index.insert(&records[1]), Insertion::Updated);
    /// assert_eq!(index.len(), 1);
    /// assert_eq!(index.get(&1), Some(&(1, "new")));
    /// # Ok::<(), zerocopy_skiplist::Error>(())
    /// ```
    #[inline]
    pub fn insert(&self, record: &'a T) -> Insertion {
        self.inner.write().insert(&self.layout, record, None)
    }

    /// Index `record` with the tag `tag`.
    ///
    /// If a record with the same key is already indexed, both the record and
    /// the tag are replaced.
    #[inline]
    pub fn insert_tagged(&self, record: &'a T, tag: A) -> Insertion {
        self.inner.write().insert(&self.layout, record, Some(tag))
    }

    /// Remove the record with the given key from the index, returning it.
    ///
    /// Returns `None` (and leaves the index untouched) if the key is absent.
    #[inline]
    pub fn remove(&self, key: &L::Key) -> Option<&'a T> {
        self.inner
            .write()
            .remove(&self.layout, key)
            .map(|node| node.record)
    }

    /// Remove every record from the index.
    ///
    /// The records themselves are not affected.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        debug!(len = inner.len(), "clearing index");
        inner.clear();
    }

    /// Returns the record with the given key.
    #[inline]
    pub fn get(&self, key: &L::Key) -> Option<&'a T> {
        let inner = self.inner.read_recursive();
        inner
            .find(&self.layout, key)
            .map(|id| inner.node(id).record)
    }

    /// Returns `true` if a record with the given key is indexed.
    #[inline]
    pub fn contains_key(&self, key: &L::Key) -> bool {
        self.inner.read_recursive().find(&self.layout, key).is_some()
    }

    /// Returns the record with the smallest key, or `None` if the index is
    /// empty.
    #[inline]
    pub fn first(&self) -> Option<&'a T> {
        let inner = self.inner.read_recursive();
        inner.first().map(|id| inner.node(id).record)
    }

    /// Returns the record with the largest key, or `None` if the index is
    /// empty.
    #[inline]
    pub fn last(&self) -> Option<&'a T> {
        let inner = self.inner.read_recursive();
        inner.last().map(|id| inner.node(id).record)
    }

    /// Lock the index for reading and return a view through which nodes can
    /// be navigated.
    ///
    /// The index cannot be modified while the view is alive. Read-only
    /// methods may still be called from the same thread, even with a writer
    /// waiting on the lock; calling a mutating method deadlocks.
    ///
    /// # Examples
    ///
    /// ```
    /// use zerocopy_skiplist::{OrdLayout, ZeroCopyIndex};
    ///
    /// let records = [10_u64, 30, 20];
    /// let index = ZeroCopyIndex::<_, _>::new(4, OrdLayout::new(|r: &u64| *r))?;
    /// for record in &records {
    ///     let _ = index.insert(record);
    /// }
    ///
    /// let view = index.read();
    /// let middle = view.find(&20).unwrap();
    /// assert_eq!(middle.prev().map(|node| *node.key()), Some(10));
    /// assert_eq!(middle.next().map(|node| *node.key()), Some(30));
    /// assert!(middle.next().and_then(|node| node.next()).is_none());
    /// # Ok::<(), zerocopy_skiplist::Error>(())
    /// ```
    #[inline]
    pub fn read(&self) -> ReadView<'_, 'a, T, L, A> {
        ReadView::new(self.inner.read_recursive(), &self.layout)
    }
}

impl<'a, T, L, A> ZeroCopyIndex<'a, T, L, A>
where
    L: Layout<T>,
    A: Clone,
{
    /// Returns the record with the given key together with its tag.
    #[inline]
    pub fn find(&self, key: &L::Key) -> Option<Entry<'a, T, A>> {
        let inner = self.inner.read_recursive();
        inner.find(&self.layout, key).map(|id| {
            let node = inner.node(id);
            Entry {
                record: node.record,
                tag: node.tag.clone(),
            }
        })
    }

    /// Build an independent index holding the same records and tags.
    ///
    /// The copy has the same configuration but its own nodes, so that either
    /// index may be modified without affecting the other. Records are shared
    /// by reference, never duplicated.
    ///
    /// # Examples
    ///
    /// ```
    /// use zerocopy_skiplist::{OrdLayout, ZeroCopyIndex};
    ///
    /// let records = [1_u32, 2, 3];
    /// let index = ZeroCopyIndex::<_, _>::new(4, OrdLayout::new(|r: &u32| *r))?;
    /// for record in &records {
    ///     let _ = index.insert(record);
    /// }
    ///
    /// let copy = index.copy();
    /// let _ = copy.remove(&2);
    /// assert_eq!(copy.len(), 2);
    /// assert_eq!(index.len(), 3);
    /// assert!(std::ptr::eq(copy.get(&1).unwrap(), index.get(&1).unwrap()));
    /// # Ok::<(), zerocopy_skiplist::Error>(())
    /// ```
    #[must_use]
    pub fn copy(&self) -> Self
    where
        L: Clone,
    {
        let source = self.inner.read_recursive();
        let mut target = source.fork();
        let mut current = source.first();
        while let Some(id) = current {
            let node = source.node(id);
            let _ = target.insert(&self.layout, node.record, node.tag.clone());
            current = node.next();
        }
        debug!(len = target.len(), height = target.height(), "copied index");

        ZeroCopyIndex {
            inner: RwLock::new(target),
            layout: self.layout.clone(),
            config: self.config.clone(),
        }
    }
}

// ///////////////////////////////////////////////
// Trait implementation
// ///////////////////////////////////////////////

impl<T, L, A> Clone for ZeroCopyIndex<'_, T, L, A>
where
    L: Layout<T> + Clone,
    A: Clone,
{
    /// Equivalent to [`ZeroCopyIndex::copy`].
    #[inline]
    fn clone(&self) -> Self {
        self.copy()
    }
}

impl<T, L, A> fmt::Debug for ZeroCopyIndex<'_, T, L, A>
where
    L: Layout<T>,
    L::Key: fmt::Debug,
    A: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.read();
        f.debug_map()
            .entries(view.iter().map(|node| (node.key(), node.tag())))
            .finish()
    }
}

// ////////////////////////////////////////////////////////////////////////////
// Tests
// ////////////////////////////////////////////////////////////////////////////
