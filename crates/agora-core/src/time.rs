//! Physical time
//!
//! Millisecond-precision wall-clock timestamps. The core never reads an
//! ambient clock; callers supply `PhysicalTime` values on every
//! time-dependent operation, which keeps election deadlines and edge
//! `created_at` ordering deterministic under test.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A physical wall-clock timestamp in milliseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct PhysicalTime {
    /// Milliseconds since the Unix epoch
    pub ts_ms: u64,
}

impl PhysicalTime {
    /// Construct from milliseconds since the Unix epoch.
    pub fn from_ms(ts_ms: u64) -> Self {
        Self { ts_ms }
    }

    /// Advance by a duration in milliseconds, saturating at `u64::MAX`.
    pub fn saturating_add_ms(self, duration_ms: u64) -> Self {
        Self {
            ts_ms: self.ts_ms.saturating_add(duration_ms),
        }
    }

    /// Milliseconds elapsed since `earlier`, or zero if `earlier` is later.
    pub fn saturating_since(self, earlier: PhysicalTime) -> u64 {
        self.ts_ms.saturating_sub(earlier.ts_ms)
    }
}

impl fmt::Display for PhysicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.ts_ms)
    }
}

impl From<u64> for PhysicalTime {
    fn from(ts_ms: u64) -> Self {
        Self { ts_ms }
    }
}
