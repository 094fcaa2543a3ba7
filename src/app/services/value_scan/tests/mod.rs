//! Tests for value scanning and formatting

use super::time::{TimeSystem, TimeUnit};

mod format_tests;
mod time_tests;

/// Time system counting days since 2000-01-01
pub fn days_since_2000() -> TimeSystem {
    TimeSystem::from_epoch_str("2000-01-01T00:00:00", TimeUnit::Day, 1950).unwrap()
}
