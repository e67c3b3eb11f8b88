//! Immutable store snapshots

use tempo_core::DigitTable;

/// What observers see. Replaced wholesale on change, never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// Whole seconds, clamped at zero
    pub total_seconds: u64,
    /// `HH:MM:SS`
    pub display_time: String,
    pub running: bool,
}

impl Snapshot {
    pub fn new(total_seconds: u64, running: bool, digits: &DigitTable) -> Self {
        let signed = i64::try_from(total_seconds).unwrap_or(i64::MAX);
        Snapshot {
            total_seconds,
            display_time: digits.compose(signed).to_string(),
            running,
        }
    }

    /// Whether `self` differs from the given visible state
    pub fn differs(&self, total_seconds: u64, running: bool) -> bool {
        self.total_seconds != total_seconds || self.running != running
    }
}
