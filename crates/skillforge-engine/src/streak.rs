//! The streak tracker
//!
//! Counts consecutive calendar days with at least one qualifying activity.
//!
//! # Timezone policy
//!
//! Calendar days are bounded at UTC midnight. All timestamps entering the
//! core are `DateTime<Utc>` and the day key is `timestamp.date_naive()`;
//! "yesterday" is computed relative to the timestamp passed in, never a
//! cached clock. Devices in other timezones will see their streak roll over
//! at their local offset from midnight UTC; picking one fixed boundary keeps
//! streaks consistent across devices.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of comparing an activity timestamp against the last one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayTransition {
    /// Same calendar day; count unchanged
    SameDay,
    /// Exactly one calendar day later; count incremented
    NextDay,
    /// No prior activity, or a gap of two or more days; count reset to 1
    Reset,
}

/// Persisted shape of the streak state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreakRecord {
    pub count: u32,
    #[serde(default)]
    pub longest: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_date: Option<NaiveDate>,
}

/// Consecutive-day activity counter for one learner
///
/// Invariant: `count == 0` only before the first ever activity; after that
/// every update leaves `count >= 1` (a gap resets to 1, not 0, because the
/// activity that revealed the gap itself counts as a day).
#[derive(Debug, Clone, Default)]
pub struct StreakTracker {
    count: u32,
    longest: u32,
    last_activity_date: Option<NaiveDate>,
}

impl StreakTracker {
    pub fn from_record(record: StreakRecord) -> Self {
        Self {
            count: record.count,
            longest: record.longest.max(record.count),
            last_activity_date: record.last_activity_date,
        }
    }

    pub fn record(&self) -> StreakRecord {
        StreakRecord {
            count: self.count,
            longest: self.longest,
            last_activity_date: self.last_activity_date,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn longest(&self) -> u32 {
        self.longest
    }

    pub fn last_activity_date(&self) -> Option<NaiveDate> {
        self.last_activity_date
    }

    /// Classify the day transition without mutating state
    pub fn classify(&self, at: DateTime<Utc>) -> DayTransition {
        let today = at.date_naive();
        match self.last_activity_date {
            Some(last) if last == today => DayTransition::SameDay,
            Some(last) if last.checked_add_days(Days::new(1)) == Some(today) => {
                DayTransition::NextDay
            }
            _ => DayTransition::Reset,
        }
    }

    /// Apply an activity at `at`, returning the transition and new count
    ///
    /// Idempotent within a calendar day: repeat calls on the same day return
    /// the unchanged count.
    pub fn observe(&mut self, at: DateTime<Utc>) -> (DayTransition, u32) {
        let transition = self.classify(at);
        match transition {
            DayTransition::SameDay => {}
            DayTransition::NextDay => self.count += 1,
            DayTransition::Reset => self.count = 1,
        }
        self.longest = self.longest.max(self.count);
        self.last_activity_date = Some(at.date_naive());
        (transition, self.count)
    }

    /// Administrative reset
    pub fn reset(&mut self) {
        self.count = 0;
        self.longest = 0;
        self.last_activity_date = None;
    }
}
