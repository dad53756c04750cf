//! Geometric level generator.

use std::sync::atomic::{self, AtomicU64};

use rand::prelude::*;
use thiserror::Error;

use crate::level_generator::LevelGenerator;

/// Default probability that a node is promoted to the next level.
pub const DEFAULT_P: f64 = 0.25;

/// Errors that can occur when creating a [`Geometric`] level generator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[expect(
    clippy::module_name_repetitions,
    reason = "Using 'Error' would be too generic and may cause confusion."
)]
#[non_exhaustive]
pub enum GeometricError {
    /// The maximum number of levels must be non-zero.
    #[error("max must be non-zero.")]
    ZeroMax,
    /// The maximum number of levels must be less than `i32::MAX`.
    #[error("max must be less than i32::MAX.")]
    MaxTooLarge,
    /// The probability `$p$` must be in the range `$(0, 1)$`.
    #[error("p must be in (0, 1).")]
    InvalidProbability,
}

/// A level generator using a geometric distribution.
///
/// This distribution assumes that if a node is present at some level `$n$`,
/// then the probability that it is present at level `$n+1$` is some constant
/// `$p \in (0, 1)$`. This produces a geometric distribution, albeit truncated
/// at the maximum number of levels allowed.
#[derive(Debug)]
pub struct Geometric {
    /// The total number of levels that are assumed to exist.
    total: usize,
    /// The probability that a node is present in the next level.
    p: f64,
    /// The random number generator.
    rng: SmallRng,
    /// Number of generators forked from this one so far.
    forks: AtomicU64,
}

impl Geometric {
    /// Create a new geometric level generator with `total` number of levels,
    /// and `p` as the probability that a given node is present in the next
    /// level.
    ///
    /// The generator is seeded from the thread-local generator.
    ///
    /// # Errors
    ///
    /// `p` must be strictly between 0 and 1, and `total` must be at least 1
    /// and fit in an `i32`.
    #[inline]
    pub fn new(total: usize, p: f64) -> Result<Self, GeometricError> {
        Self::with_rng(total, p, SmallRng::from_rng(&mut rand::rng()))
    }

    /// Same as [`Geometric::new`], but with a fixed seed so that the sequence
    /// of levels (and therefore the shape of the index) is reproducible.
    ///
    /// # Errors
    ///
    /// See [`Geometric::new`].
    #[inline]
    pub fn with_seed(total: usize, p: f64, seed: u64) -> Result<Self, GeometricError> {
        Self::with_rng(total, p, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(total: usize, p: f64, rng: SmallRng) -> Result<Self, GeometricError> {
        if total == 0 {
            return Err(GeometricError::ZeroMax);
        }
        if i32::try_from(total).is_err() {
            return Err(GeometricError::MaxTooLarge);
        }
        if !(0.0 < p && p < 1.0) {
            return Err(GeometricError::InvalidProbability);
        }
        Ok(Geometric {
            total,
            p,
            rng,
            forks: AtomicU64::new(0),
        })
    }

    /// An independent generator with the same parameters, seeded from this
    /// one.
    ///
    /// The level stream of `self` is left untouched and every fork gets a
    /// different seed, so the n-th fork of a seeded generator is
    /// reproducible.
    #[must_use]
    #[inline]
    pub fn fork(&self) -> Self {
        let n = self.forks.fetch_add(1, atomic::Ordering::Relaxed);
        let seed = self.rng.clone().next_u64() ^ n.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Geometric {
            total: self.total,
            p: self.p,
            rng: SmallRng::seed_from_u64(seed),
            forks: AtomicU64::new(0),
        }
    }

    /// The promotion probability `$p$`.
    #[must_use]
    #[inline]
    pub fn p(&self) -> f64 {
        self.p
    }
}

impl Clone for Geometric {
    fn clone(&self) -> Self {
        Geometric {
            total: self.total,
            p: self.p,
            rng: self.rng.clone(),
            forks: AtomicU64::new(self.forks.load(atomic::Ordering::Relaxed)),
        }
    }
}

impl LevelGenerator for Geometric {
    #[inline]
    fn total(&self) -> usize {
        self.total
    }

    /// Starting from level 0, keep promoting the node with probability `$p$`
    /// until either a draw fails or the top level (`total - 1`) is reached.
    #[inline]
    fn level(&mut self) -> usize {
        let mut level = 0;
        while level + 1 < self.total && self.rng.random::<f64>() < self.p {
            level += 1;
        }
        level
    }
}
