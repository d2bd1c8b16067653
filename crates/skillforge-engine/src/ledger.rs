//! The XP ledger
//!
//! Owns the cumulative XP counter for one learner. The counter never
//! decreases outside [`XpLedger::reset`]; level is derived on demand via
//! [`crate::rules::level_for_xp`] and never stored.

use serde::{Deserialize, Serialize};

use crate::rules::level_for_xp;

/// Persisted shape of the ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XpRecord {
    pub total: u64,
}

/// Result of crediting the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credit {
    pub amount: u64,
    pub total: u64,
    pub previous_level: u32,
    pub level: u32,
}

impl Credit {
    pub fn leveled_up(&self) -> bool {
        self.level > self.previous_level
    }
}

/// Cumulative XP counter for one learner
#[derive(Debug, Clone, Default)]
pub struct XpLedger {
    total: u64,
}

impl XpLedger {
    pub fn new(total: u64) -> Self {
        Self { total }
    }

    pub fn from_record(record: XpRecord) -> Self {
        Self::new(record.total)
    }

    pub fn record(&self) -> XpRecord {
        XpRecord { total: self.total }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn level(&self) -> u32 {
        level_for_xp(self.total)
    }

    /// Add XP to the ledger
    ///
    /// Saturates instead of overflowing; a learner at u64::MAX XP has other
    /// problems.
    pub fn credit(&mut self, amount: u64) -> Credit {
        let previous_level = self.level();
        self.total = self.total.saturating_add(amount);
        Credit {
            amount,
            total: self.total,
            previous_level,
            level: self.level(),
        }
    }

    /// Administrative reset, the only path by which XP decreases
    pub fn reset(&mut self) {
        self.total = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_accumulates() {
        let mut ledger = XpLedger::default();
        ledger.credit(50);
        let credit = ledger.credit(70);
        assert_eq!(credit.total, 120);
        assert_eq!(ledger.total(), 120);
    }

    #[test]
    fn credit_reports_level_crossing() {
        let mut ledger = XpLedger::new(90);
        let credit = ledger.credit(20);
        assert_eq!(credit.previous_level, 1);
        assert_eq!(credit.level, 2);
        assert!(credit.leveled_up());

        let credit = ledger.credit(10);
        assert!(!credit.leveled_up());
    }

    #[test]
    fn record_round_trips() {
        let ledger = XpLedger::new(777);
        let json = serde_json::to_string(&ledger.record()).unwrap();
        let back: XpRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(XpLedger::from_record(back).total(), 777);
    }

    #[test]
    fn reset_zeroes_the_counter() {
        let mut ledger = XpLedger::new(500);
        ledger.reset();
        assert_eq!(ledger.total(), 0);
        assert_eq!(ledger.level(), 1);
    }
}
