//! How the index reads the records it points to.
//!
//! The index never interprets a record itself: a [`Layout`] tells it how to
//! extract the sort key, how to compare two keys and how many bytes of the
//! record are written out by [`io_slices`][crate::ZeroCopyIndex::io_slices].
//!
//! The comparison function **must** be well-behaved. Specifically, given some
//! ordering function `f(a, b)`, it must satisfy the following properties:
//!
//! - Be well defined: `f(a, b)` should always return the same value
//! - Be anti-symmetric: `f(a, b) == Greater` iff `f(b, a) == Less` and `f(a, b)
//!   == Equal == f(b, a)`.
//! - By transitive: If `f(a, b) == Greater` and `f(b, c) == Greater` then `f(a,
//!   c) == Greater`.
//!
//! Failure to satisfy these properties will result in records being skipped,
//! duplicated or emitted out of order.

use std::{cmp::Ordering, fmt, marker::PhantomData, mem};

/// Key extraction, sizing and ordering for a record type `T`.
pub trait Layout<T> {
    /// The sort key.
    type Key;

    /// Extract the key of `record`.
    ///
    /// Called once per insertion; the key is cached on the node afterwards and
    /// must not change while the record is indexed.
    fn key(&self, record: &T) -> Self::Key;

    /// Number of bytes of `record` to write out.
    ///
    /// Defaults to the in-memory size of `T`.
    #[inline]
    fn size(&self, record: &T) -> usize {
        mem::size_of_val(record)
    }

    /// Three-way comparison of two keys.
    fn compare(&self, a: &Self::Key, b: &Self::Key) -> Ordering;
}

// ////////////////////////////////////////////////////////////////////////////
// FnLayout
// ////////////////////////////////////////////////////////////////////////////

/// A [`Layout`] assembled from three functions: key extractor, size
/// extractor and comparator.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use zerocopy_skiplist::{FnLayout, Layout};
///
/// struct Entry {
///     path: &'static str,
///     mode: u32,
/// }
///
/// // Sort by path length first, then lexicographically.
/// let layout = FnLayout::new(
///     |entry: &Entry| entry.path,
///     |_: &Entry| 4,
///     |a: &&str, b: &&str| a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
/// );
///
/// let short = Entry { path: "b", mode: 0 };
/// let long = Entry { path: "aa", mode: 0 };
/// assert_eq!(layout.compare(&layout.key(&short), &layout.key(&long)), Ordering::Less);
/// ```
pub struct FnLayout<T, K, KF, SF, CF> {
    key: KF,
    size: SF,
    compare: CF,
    _marker: PhantomData<fn(&T) -> K>,
}

impl<T, K, KF, SF, CF> FnLayout<T, K, KF, SF, CF>
where
    KF: Fn(&T) -> K,
    SF: Fn(&T) -> usize,
    CF: Fn(&K, &K) -> Ordering,
{
    /// Create a layout from a key extractor, a size extractor and a
    /// comparator.
    #[inline]
    pub fn new(key: KF, size: SF, compare: CF) -> Self {
        FnLayout {
            key,
            size,
            compare,
            _marker: PhantomData,
        }
    }
}

impl<T, K, KF, SF, CF> Layout<T> for FnLayout<T, K, KF, SF, CF>
where
    KF: Fn(&T) -> K,
    SF: Fn(&T) -> usize,
    CF: Fn(&K, &K) -> Ordering,
{
    type Key = K;

    #[inline]
    fn key(&self, record: &T) -> K {
        (self.key)(record)
    }

    #[inline]
    fn size(&self, record: &T) -> usize {
        (self.size)(record)
    }

    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        (self.compare)(a, b)
    }
}

impl<T, K, KF, SF, CF> Clone for FnLayout<T, K, KF, SF, CF>
where
    KF: Clone,
    SF: Clone,
    CF: Clone,
{
    fn clone(&self) -> Self {
        FnLayout {
            key: self.key.clone(),
            size: self.size.clone(),
            compare: self.compare.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, K, KF, SF, CF> fmt::Debug for FnLayout<T, K, KF, SF, CF> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLayout").finish_non_exhaustive()
    }
}

// ////////////////////////////////////////////////////////////////////////////
// OrdLayout
// ////////////////////////////////////////////////////////////////////////////

/// A [`Layout`] for keys implementing [`Ord`], with records written out in
/// full.
///
/// # Examples
///
/// ```
/// use zerocopy_skiplist::{Layout, OrdLayout};
///
/// let layout = OrdLayout::new(|record: &(u64, [u8; 8])| record.0);
/// assert_eq!(layout.key(&(7, [0; 8])), 7);
/// assert_eq!(layout.size(&(7, [0; 8])), 16);
/// ```
pub struct OrdLayout<T, K, KF> {
    key: KF,
    _marker: PhantomData<fn(&T) -> K>,
}

impl<T, K, KF> OrdLayout<T, K, KF>
where
    K: Ord,
    KF: Fn(&T) -> K,
{
    /// Create a layout ordering records by the key returned from `key`.
    #[inline]
    pub fn new(key: KF) -> Self {
        OrdLayout {
            key,
            _marker: PhantomData,
        }
    }
}

impl<T, K, KF> Layout<T> for OrdLayout<T, K, KF>
where
    K: Ord,
    KF: Fn(&T) -> K,
{
    type Key = K;

    #[inline]
    fn key(&self, record: &T) -> K {
        (self.key)(record)
    }

    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

impl<T, K, KF: Clone> Clone for OrdLayout<T, K, KF> {
    fn clone(&self) -> Self {
        OrdLayout {
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, K, KF> fmt::Debug for OrdLayout<T, K, KF> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrdLayout").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{FnLayout, Layout, OrdLayout};

    #[derive(Clone, Copy)]
    struct Record {
        id: u32,
        len: u16,
        _payload: [u8; 10],
    }

    #[test]
    fn fn_layout_uses_given_functions() {
        let layout = FnLayout::new(
            |record: &Record| record.id,
            |record: &Record| usize::from(record.len),
            |a: &u32, b: &u32| b.cmp(a),
        );
        let record = Record {
            id: 3,
            len: 6,
            _payload: [0; 10],
        };
        assert_eq!(layout.key(&record), 3);
        assert_eq!(layout.size(&record), 6);
        assert_eq!(layout.compare(&1, &2), Ordering::Greater);

        let cloned = layout.clone();
        assert_eq!(cloned.compare(&2, &1), Ordering::Less);
    }

    #[rstest]
    #[case(1, 2, Ordering::Less)]
    #[case(2, 2, Ordering::Equal)]
    #[case(3, 2, Ordering::Greater)]
    fn ord_layout_compares_with_ord(#[case] a: u32, #[case] b: u32, #[case] expected: Ordering) {
        let layout = OrdLayout::new(|record: &Record| record.id);
        assert_eq!(layout.compare(&a, &b), expected);
    }

    #[test]
    fn ord_layout_default_size() {
        let layout = OrdLayout::new(|record: &Record| record.id);
        let record = Record {
            id: 0,
            len: 0,
            _payload: [0; 10],
        };
        assert_eq!(layout.size(&record), size_of::<Record>());
    }
}
