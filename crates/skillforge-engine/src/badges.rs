//! The badge registry
//!
//! A pure sink: badges are written here by achievement unlocks, level-up
//! rewards, and challenge completion. Keyed by id; awarding the same id twice
//! returns the existing instance instead of duplicating it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use skillforge_types::{BadgeDef, BadgeId, BadgeInstance};

/// Persisted shape: badge id -> awarded instance
pub type BadgeRecord = BTreeMap<BadgeId, BadgeInstance>;

/// Set of badges awarded to one learner
#[derive(Debug, Clone, Default)]
pub struct BadgeRegistry {
    badges: BTreeMap<BadgeId, BadgeInstance>,
}

impl BadgeRegistry {
    pub fn from_record(record: BadgeRecord) -> Self {
        Self { badges: record }
    }

    pub fn record(&self) -> &BadgeRecord {
        &self.badges
    }

    /// Award a badge, idempotently
    ///
    /// Returns the stored instance and whether it was newly awarded.
    pub fn award(&mut self, def: &BadgeDef, at: DateTime<Utc>) -> (BadgeInstance, bool) {
        if let Some(existing) = self.badges.get(&def.id) {
            return (existing.clone(), false);
        }
        let instance = def.awarded_at(at);
        self.badges.insert(def.id.clone(), instance.clone());
        (instance, true)
    }

    pub fn contains(&self, id: &BadgeId) -> bool {
        self.badges.contains_key(id)
    }

    /// All awarded badges, oldest first
    pub fn list(&self) -> Vec<BadgeInstance> {
        let mut badges: Vec<_> = self.badges.values().cloned().collect();
        badges.sort_by_key(|b| b.awarded_at);
        badges
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    /// Administrative reset
    pub fn reset(&mut self) {
        self.badges.clear();
    }
}
