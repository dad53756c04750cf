//! Construction-time configuration of an index.

use crate::level_generator::{Geometric, GeometricError, geometric::DEFAULT_P};

/// Default number of levels, comfortable for a few million records at
/// $p = 1/4$.
pub const DEFAULT_MAX_HEIGHT: usize = 16;

/// Configuration of a [`ZeroCopyIndex`][crate::ZeroCopyIndex].
///
/// Only `max_height` matters for compatibility between indexes: two indexes
/// can be merged if and only if they share the same maximum height.
///
/// # Examples
///
/// ```
/// use zerocopy_skiplist::Config;
///
/// let config = Config::with_max_height(8).probability(0.5).seed(1234);
/// assert_eq!(config.max_height, 8);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Config {
    /// The number of levels of the index.  Must be non-zero.
    pub max_height: usize,
    /// The probability that a node is promoted to the next level.  Must be in
    /// $(0, 1)$.
    pub probability: f64,
    /// Seed for the level generator.  When `None`, the generator is seeded
    /// from the thread-local random number generator.
    pub seed: Option<u64>,
}

impl Config {
    /// Default configuration with the given maximum height.
    #[must_use]
    #[inline]
    pub fn with_max_height(max_height: usize) -> Self {
        Config {
            max_height,
            ..Config::default()
        }
    }

    /// Set the promotion probability.
    #[must_use]
    #[inline]
    pub fn probability(mut self, p: f64) -> Self {
        self.probability = p;
        self
    }

    /// Seed the level generator, making the shape of the index reproducible.
    #[must_use]
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the level generator described by this configuration.
    ///
    /// # Errors
    ///
    /// Fails if the maximum height is zero or too large, or if the
    /// probability is outside of $(0, 1)$.
    #[inline]
    pub fn level_generator(&self) -> Result<Geometric, GeometricError> {
        match self.seed {
            Some(seed) => Geometric::with_seed(self.max_height, self.probability, seed),
            None => Geometric::new(self.max_height, self.probability),
        }
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Config {
            max_height: DEFAULT_MAX_HEIGHT,
            probability: DEFAULT_P,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    use super::{Config, DEFAULT_MAX_HEIGHT};
    use crate::level_generator::{GeometricError, LevelGenerator};

    #[test]
    fn default() -> Result<()> {
        let config = Config::default();
        assert_eq!(config.max_height, DEFAULT_MAX_HEIGHT);
        assert_eq!(config.seed, None);
        let generator = config.level_generator()?;
        assert_eq!(generator.total(), DEFAULT_MAX_HEIGHT);
        assert!((generator.p() - 0.25).abs() < f64::EPSILON);
        Ok(())
    }

    #[test]
    fn builder() {
        let config = Config::with_max_height(4).probability(0.5).seed(9);
        assert_eq!(config.max_height, 4);
        assert_eq!(config.seed, Some(9));
        assert!((config.probability - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_zero_height() {
        assert_eq!(
            Config::with_max_height(0).level_generator().err(),
            Some(GeometricError::ZeroMax)
        );
    }

    #[test]
    fn rejects_bad_probability() {
        assert_eq!(
            Config::default().probability(1.5).level_generator().err(),
            Some(GeometricError::InvalidProbability)
        );
    }
}
