// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree shape parameters.

use crate::error::ConfigError;

/// Strategy used to divide an overflowing node in two.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SplitPolicy {
    /// Seeds are the entries with the extreme centers along the axis with the
    /// wider spread; the rest are ordered by signed distance to the
    /// perpendicular bisector of the seed centers. Linear in the node size.
    Linear,
    /// Seeds are the pair that would waste the most area if merged; the rest
    /// are handed out by least enlargement. Quadratic in the node size, but
    /// tends to produce tighter nodes.
    #[default]
    Quadratic,
}

/// Fill bounds and split strategy for an [`RTree`](crate::RTree).
///
/// Every non-root node holds between `min_record` and `max_record` children.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RTreeConfig {
    /// Maximum number of children per node.
    pub max_record: usize,
    /// Minimum number of children per non-root node. At most `max_record / 2`.
    pub min_record: usize,
    /// Node split strategy.
    pub split: SplitPolicy,
}

impl Default for RTreeConfig {
    fn default() -> Self {
        Self {
            max_record: 13,
            min_record: 5,
            split: SplitPolicy::Quadratic,
        }
    }
}

impl RTreeConfig {
    /// Create a configuration with the given fill bounds and the default split policy.
    pub const fn new(max_record: usize, min_record: usize) -> Self {
        Self {
            max_record,
            min_record,
            split: SplitPolicy::Quadratic,
        }
    }

    /// Replace the split policy.
    #[must_use]
    pub const fn with_split(mut self, split: SplitPolicy) -> Self {
        self.split = split;
        self
    }

    /// Check the fill bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_record < 2 {
            return Err(ConfigError::MaxTooSmall(self.max_record));
        }
        if self.min_record < 1 {
            return Err(ConfigError::MinTooSmall);
        }
        if self.min_record > self.max_record / 2 {
            return Err(ConfigError::MinTooLarge {
                min: self.min_record,
                max: self.max_record,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(RTreeConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_bounds() {
        assert_eq!(
            RTreeConfig::new(1, 1).validate(),
            Err(ConfigError::MaxTooSmall(1))
        );
        assert_eq!(
            RTreeConfig::new(8, 0).validate(),
            Err(ConfigError::MinTooSmall)
        );
        assert_eq!(
            RTreeConfig::new(8, 5).validate(),
            Err(ConfigError::MinTooLarge { min: 5, max: 8 })
        );
        assert!(RTreeConfig::new(8, 4).validate().is_ok());
    }
}
