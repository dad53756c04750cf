//! Merging one index into another.

use std::{fmt, ptr, str::FromStr};

use tracing::debug;

use crate::{error::Error, index::ZeroCopyIndex, layout::Layout};

/// How [`ZeroCopyIndex::merge`] resolves a key present in both indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeStrategy {
    /// The incoming record and tag replace the existing ones.
    Theirs,
    /// The existing entry is kept and the incoming one skipped.
    Ours,
    /// The merge stops with [`Error::Conflict`].
    Error,
}

impl TryFrom<i64> for MergeStrategy {
    type Error = Error;

    /// `0` is [`Theirs`][MergeStrategy::Theirs], `1` is
    /// [`Ours`][MergeStrategy::Ours] and `2` is
    /// [`Error`][MergeStrategy::Error].
    fn try_from(value: i64) -> Result<Self, Error> {
        match value {
            0 => Ok(MergeStrategy::Theirs),
            1 => Ok(MergeStrategy::Ours),
            2 => Ok(MergeStrategy::Error),
            _ => Err(Error::InvalidStrategy(value.to_string())),
        }
    }
}

impl FromStr for MergeStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "theirs" => Ok(MergeStrategy::Theirs),
            "ours" => Ok(MergeStrategy::Ours),
            "error" => Ok(MergeStrategy::Error),
            _ => Err(Error::InvalidStrategy(s.to_owned())),
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MergeStrategy::Theirs => "theirs",
            MergeStrategy::Ours => "ours",
            MergeStrategy::Error => "error",
        })
    }
}

/// What a successful merge did to the destination.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct MergeSummary {
    /// Keys which were only in the source.
    pub inserted: usize,
    /// Conflicting keys whose entry was taken from the source.
    pub replaced: usize,
    /// Conflicting keys whose entry was kept.
    pub skipped: usize,
}

impl<'a, T, L, A> ZeroCopyIndex<'a, T, L, A>
where
    L: Layout<T>,
    A: Clone,
{
    /// Merge every entry of `other` into this index.
    ///
    /// Keys missing from this index are inserted with their tag; keys present
    /// in both are resolved according to `strategy`. `other` is only read.
    ///
    /// The destination is locked exclusively and then the source shared, in
    /// that order. Merging an index into itself is detected and never
    /// modifies it. Merging `a` into `b` while another thread merges `b`
    /// into `a` can deadlock: each thread holds its own exclusive lock and
    /// waits for the other's shared one.
    ///
    /// # Errors
    ///
    /// - [`Error::HeightMismatch`] if the two indexes do not have the same
    ///   maximum height. Nothing is modified.
    /// - [`Error::Conflict`] on the first conflicting key under
    ///   [`MergeStrategy::Error`]. **The merge is not atomic:** entries
    ///   inserted before the conflict stay in this index. Merge into a
    ///   [`copy`][ZeroCopyIndex::copy] first when that matters.
    ///
    /// # Examples
    ///
    /// ```
    /// use zerocopy_skiplist::{MergeStrategy, OrdLayout, ZeroCopyIndex};
    ///
    /// let ours = [(1_u32, "a"), (3, "old")];
    /// let theirs = [(2_u32, "b"), (3, "new")];
    /// let layout = OrdLayout::new(|r: &(u32, &str)| r.0);
    ///
    /// let a = ZeroCopyIndex::<_, _>::new(8, layout.clone())?;
    /// let b = ZeroCopyIndex::<_, _>::new(8, layout)?;
    /// for record in &ours {
    ///     let _ = a.insert(record);
    /// }
    /// for record in &theirs {
    ///     let _ = b.insert(record);
    /// }
    ///
    /// let summary = a.merge(&b, MergeStrategy::Theirs)?;
    /// assert_eq!((summary.inserted, summary.replaced), (1, 1));
    /// assert_eq!(a.get(&3), Some(&(3, "new")));
    /// assert_eq!(b.len(), 2);
    /// # Ok::<(), zerocopy_skiplist::Error>(())
    /// ```
    pub fn merge(&self, other: &Self, strategy: MergeStrategy) -> Result<MergeSummary, Error> {
        if ptr::eq(self, other) {
            return self.merge_self(strategy);
        }
        if self.max_height() != other.max_height() {
            return Err(Error::HeightMismatch {
                ours: self.max_height(),
                theirs: other.max_height(),
            });
        }

        let mut ours = self.inner.write();
        let theirs = other.inner.read_recursive();
        let mut summary = MergeSummary::default();

        let mut current = theirs.first();
        while let Some(id) = current {
            let node = theirs.node(id);
            current = node.next();

            let key = self.layout.key(node.record);
            let path = ours.search(&self.layout, &key);
            match (path.found, strategy) {
                (None, _) => {
                    let _ = ours.insert_at(path.update, node.record, key, node.tag.clone());
                    summary.inserted += 1;
                }
                (Some(existing), MergeStrategy::Theirs) => {
                    ours.overwrite(existing, node.record, node.tag.clone());
                    summary.replaced += 1;
                }
                (Some(_), MergeStrategy::Ours) => summary.skipped += 1,
                (Some(_), MergeStrategy::Error) => {
                    debug!(
                        inserted = summary.inserted,
                        len = ours.len(),
                        "merge stopped on conflicting key"
                    );
                    return Err(Error::Conflict {
                        applied: summary.inserted,
                    });
                }
            }
        }

        debug!(
            %strategy,
            inserted = summary.inserted,
            replaced = summary.replaced,
            skipped = summary.skipped,
            len = ours.len(),
            "merged index"
        );
        Ok(summary)
    }

    /// Every key conflicts with itself, and resolving the conflict either way
    /// leaves the index unchanged.
    fn merge_self(&self, strategy: MergeStrategy) -> Result<MergeSummary, Error> {
        let len = self.len();
        let summary = match strategy {
            MergeStrategy::Theirs => MergeSummary {
                replaced: len,
                ..MergeSummary::default()
            },
            MergeStrategy::Ours => MergeSummary {
                skipped: len,
                ..MergeSummary::default()
            },
            MergeStrategy::Error if len > 0 => return Err(Error::Conflict { applied: 0 }),
            MergeStrategy::Error => MergeSummary::default(),
        };
        debug!(%strategy, len, "merged index into itself");
        Ok(summary)
    }
}
