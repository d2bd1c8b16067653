//! The challenge progress tracker's bookkeeping
//!
//! Challenge definitions come from an external catalog; this module owns the
//! per-learner instances with their mutable progress counters. The one
//! delicate property is one-shot completion: the `Active -> Completed`
//! transition happens exactly once, the moment progress reaches the target,
//! and that is the only moment the session issues the reward.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use skillforge_types::{ChallengeId, ChallengeInstance, ChallengeStatus};

/// Persisted shape: challenge id -> instance
pub type ChallengeRecord = BTreeMap<ChallengeId, ChallengeInstance>;

/// Result of advancing a challenge
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    /// The instance after the update
    pub instance: ChallengeInstance,
    /// True only on the call that crossed the completion boundary
    pub just_completed: bool,
}

/// Per-learner challenge instances
#[derive(Debug, Clone, Default)]
pub struct ChallengeBook {
    challenges: BTreeMap<ChallengeId, ChallengeInstance>,
}

impl ChallengeBook {
    pub fn from_record(record: ChallengeRecord) -> Self {
        Self { challenges: record }
    }

    pub fn record(&self) -> &ChallengeRecord {
        &self.challenges
    }

    /// Merge freshly fetched catalog definitions into the book
    ///
    /// An existing instance with non-zero progress or completed status is
    /// kept as-is; untouched instances are replaced so title/target/end-date
    /// edits from the catalog take effect. Instances absent from the new
    /// catalog are kept: a completed challenge still owes its place in the
    /// completed count.
    pub fn merge(&mut self, incoming: Vec<ChallengeInstance>) {
        for challenge in incoming {
            match self.challenges.get(&challenge.id) {
                Some(existing) if existing.progress > 0 || existing.is_completed() => {}
                _ => {
                    self.challenges.insert(challenge.id.clone(), challenge);
                }
            }
        }
    }

    /// Advance a challenge's progress counter
    ///
    /// Unknown ids return `None`. Progress is clamped to `[0, target]`; an
    /// increment past the target is truncated, not rejected. Advancing an
    /// already-completed challenge is a no-op that returns the unchanged
    /// instance with `just_completed == false`.
    pub fn advance(
        &mut self,
        id: &ChallengeId,
        increment: u64,
        at: DateTime<Utc>,
    ) -> Option<Advance> {
        let challenge = self.challenges.get_mut(id)?;

        if challenge.is_completed() {
            return Some(Advance {
                instance: challenge.clone(),
                just_completed: false,
            });
        }

        challenge.progress = challenge
            .progress
            .saturating_add(increment)
            .min(challenge.target);

        let just_completed = challenge.progress >= challenge.target;
        if just_completed {
            challenge.status = ChallengeStatus::Completed;
            challenge.completed_at = Some(at);
        }

        Some(Advance {
            instance: challenge.clone(),
            just_completed,
        })
    }

    pub fn get(&self, id: &ChallengeId) -> Option<&ChallengeInstance> {
        self.challenges.get(id)
    }

    /// Challenges still in progress
    pub fn active(&self) -> Vec<ChallengeInstance> {
        self.challenges
            .values()
            .filter(|c| !c.is_completed())
            .cloned()
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.challenges.values().filter(|c| c.is_completed()).count()
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    /// Administrative reset
    pub fn reset(&mut self) {
        self.challenges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillforge_types::ChallengeReward;

    fn challenge(id: &str, target: u64) -> ChallengeInstance {
        ChallengeInstance {
            id: ChallengeId::new(id),
            title: id.to_string(),
            description: String::new(),
            kind: "daily".to_string(),
            target,
            progress: 0,
            reward: ChallengeReward {
                xp: Some(75),
                badge: None,
            },
            status: ChallengeStatus::Active,
            end_date: Utc::now() + chrono::Duration::days(1),
            completed_at: None,
        }
    }

    #[test]
    fn unknown_id_is_a_no_op() {
        let mut book = ChallengeBook::default();
        assert!(book
            .advance(&ChallengeId::new("nope"), 1, Utc::now())
            .is_none());
    }

    #[test]
    fn progress_clamps_at_target() {
        let mut book = ChallengeBook::default();
        book.merge(vec![challenge("c", 3)]);

        let advance = book.advance(&ChallengeId::new("c"), 10, Utc::now()).unwrap();
        assert_eq!(advance.instance.progress, 3);
        assert!(advance.just_completed);
    }

    #[test]
    fn completion_fires_exactly_once() {
        let mut book = ChallengeBook::default();
        book.merge(vec![challenge("c", 2)]);
        let id = ChallengeId::new("c");

        let advance = book.advance(&id, 1, Utc::now()).unwrap();
        assert!(!advance.just_completed);

        let advance = book.advance(&id, 1, Utc::now()).unwrap();
        assert!(advance.just_completed);
        let completed_at = advance.instance.completed_at.unwrap();

        // Further advances change nothing.
        let advance = book.advance(&id, 5, Utc::now()).unwrap();
        assert!(!advance.just_completed);
        assert_eq!(advance.instance.status, ChallengeStatus::Completed);
        assert_eq!(advance.instance.progress, 2);
        assert_eq!(advance.instance.completed_at, Some(completed_at));
    }

    #[test]
    fn merge_keeps_instances_with_progress() {
        let mut book = ChallengeBook::default();
        book.merge(vec![challenge("a", 5), challenge("b", 5)]);
        book.advance(&ChallengeId::new("a"), 2, Utc::now());

        // Catalog refresh with a bigger target for both.
        book.merge(vec![challenge("a", 10), challenge("b", 10)]);

        assert_eq!(book.get(&ChallengeId::new("a")).unwrap().target, 5);
        assert_eq!(book.get(&ChallengeId::new("a")).unwrap().progress, 2);
        assert_eq!(book.get(&ChallengeId::new("b")).unwrap().target, 10);
    }

    #[test]
    fn merge_keeps_challenges_dropped_from_catalog() {
        let mut book = ChallengeBook::default();
        book.merge(vec![challenge("old", 1)]);
        book.advance(&ChallengeId::new("old"), 1, Utc::now());

        book.merge(vec![challenge("new", 3)]);
        assert_eq!(book.completed_count(), 1);
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn active_excludes_completed() {
        let mut book = ChallengeBook::default();
        book.merge(vec![challenge("a", 1), challenge("b", 5)]);
        book.advance(&ChallengeId::new("a"), 1, Utc::now());

        let active = book.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, ChallengeId::new("b"));
    }
}
