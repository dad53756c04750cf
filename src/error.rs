//! Errors reported by the index.

use thiserror::Error;

use crate::level_generator::GeometricError;

/// Errors that can occur when building or merging a
/// [`ZeroCopyIndex`][crate::ZeroCopyIndex].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The configuration could not produce a level generator.
    #[error("invalid index configuration: {0}")]
    InvalidConfig(#[from] GeometricError),
    /// Only indexes with the same maximum height can be merged.  Nothing was
    /// modified.
    #[error("cannot merge indexes with different maximum heights ({ours} and {theirs}).")]
    HeightMismatch {
        /// Maximum height of the destination.
        ours: usize,
        /// Maximum height of the source.
        theirs: usize,
    },
    /// A key present in both indexes was found while merging with
    /// [`MergeStrategy::Error`][crate::MergeStrategy::Error].
    ///
    /// The merge stops at the first conflict; the `applied` entries inserted
    /// before it remain in the destination.
    #[error("key conflict detected during merge ({applied} entries already applied).")]
    Conflict {
        /// Number of entries inserted into the destination before the
        /// conflict was found.
        applied: usize,
    },
    /// A merge strategy could not be parsed.
    #[error("invalid merge strategy: {0}.")]
    InvalidStrategy(String),
}
