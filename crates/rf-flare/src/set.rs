//! Flare emitter set

use serde::{Deserialize, Serialize};

use rf_core::{RfError, RfResult};

/// The cabinet's flare emitters, addressed `0..len()`
///
/// The count is fixed for the lifetime of the scheduler and never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct FlareSet {
    count: usize,
}

impl FlareSet {
    pub fn new(count: usize) -> RfResult<Self> {
        if count == 0 {
            return Err(RfError::config("flare set is empty"));
        }
        Ok(Self { count })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Always false; kept for API symmetry with `len`
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of mirrored pairs walked by the paired pattern (at least one)
    #[inline]
    pub fn pair_count(&self) -> usize {
        (self.count / 2).max(1)
    }

    pub fn contains(&self, slot: usize) -> bool {
        slot < self.count
    }
}

impl TryFrom<usize> for FlareSet {
    type Error = RfError;

    fn try_from(count: usize) -> RfResult<Self> {
        Self::new(count)
    }
}

impl From<FlareSet> for usize {
    fn from(set: FlareSet) -> usize {
        set.count
    }
}
