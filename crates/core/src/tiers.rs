//! Threshold-based severity classification.

use crate::alert::Severity;

/// Two ascending cut points splitting a magnitude into Medium/High/Critical.
///
/// `value < high` is Medium, `high <= value < critical` is High and
/// anything at or above `critical` is Critical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityTiers<T> {
    pub high: T,
    pub critical: T,
}

impl<T: PartialOrd + Copy> SeverityTiers<T> {
    pub fn new(high: T, critical: T) -> Self {
        Self { high, critical }
    }

    pub fn classify(&self, value: T) -> Severity {
        if value < self.high {
            Severity::Medium
        } else if value < self.critical {
            Severity::High
        } else {
            Severity::Critical
        }
    }
}
