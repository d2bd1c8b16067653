//! The achievement rule engine's definitions and unlock bookkeeping
//!
//! Achievement definitions live in code, not in the store; only the unlocked
//! set is persisted. Predicates come in two shapes: `Immediate` ones are pure
//! functions of the incoming event, `Deferred` ones judge aggregate stats
//! fetched from the [`StatsProvider`](crate::providers::StatsProvider). The
//! split lets the session apply a timeout/fallback policy only where
//! suspension is actually possible.
//!
//! The streak ladder is a second predicate source over the same unlocked-set
//! namespace; its ids all carry the `streak_` prefix, which catalog ids are
//! forbidden from using, so the two sources cannot collide.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use skillforge_types::{
    AchievementId, AchievementInstance, ActivityDetails, ActivityKind, BadgeDef,
};

use crate::providers::LearnerStats;

/// Id prefix reserved for the streak ladder
pub const STREAK_ID_PREFIX: &str = "streak_";

// ============================================================================
// Predicates & Definitions
// ============================================================================

/// Unlock condition for an achievement
pub enum Predicate {
    /// Pure function of the incoming event; never suspends
    Immediate(fn(&ActivityKind, &ActivityDetails) -> bool),
    /// Judged against aggregate stats; requires an external lookup that may
    /// fail or time out, in which case the predicate counts as not satisfied
    Deferred(fn(&LearnerStats) -> bool),
}

impl std::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate(_) => write!(f, "Predicate::Immediate"),
            Self::Deferred(_) => write!(f, "Predicate::Deferred"),
        }
    }
}

/// Definition of an achievement
#[derive(Debug)]
pub struct AchievementDef {
    pub id: AchievementId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub predicate: Predicate,
    /// Bonus XP granted on unlock (0 for none)
    pub xp_reward: u64,
    /// Badge awarded alongside the unlock
    pub badge: Option<BadgeDef>,
}

impl AchievementDef {
    pub fn needs_stats(&self) -> bool {
        matches!(self.predicate, Predicate::Deferred(_))
    }

    /// Evaluate the predicate against an event and (optionally) fetched stats
    ///
    /// A deferred predicate with no stats available is not satisfied; it will
    /// be re-evaluated on the next qualifying event.
    pub fn evaluate(
        &self,
        kind: &ActivityKind,
        details: &ActivityDetails,
        stats: Option<&LearnerStats>,
    ) -> bool {
        match self.predicate {
            Predicate::Immediate(check) => check(kind, details),
            Predicate::Deferred(check) => stats.map(check).unwrap_or(false),
        }
    }
}

/// The built-in achievement catalog
///
/// Panics in debug builds if a definition trespasses on the streak ladder's
/// id namespace.
pub fn default_catalog() -> Vec<AchievementDef> {
    let catalog = vec![
        AchievementDef {
            id: AchievementId::new("first_quiz"),
            name: "First Steps".to_string(),
            description: "Complete your first quiz".to_string(),
            icon: "footprints".to_string(),
            predicate: Predicate::Immediate(|kind, _| {
                matches!(
                    kind,
                    ActivityKind::QuizCompleted | ActivityKind::QuizPerfect
                )
            }),
            xp_reward: 25,
            badge: None,
        },
        AchievementDef {
            id: AchievementId::new("perfectionist"),
            name: "Perfectionist".to_string(),
            description: "Score 100% on a quiz".to_string(),
            icon: "target".to_string(),
            predicate: Predicate::Immediate(|kind, details| {
                *kind == ActivityKind::QuizPerfect || details.perfect == Some(true)
            }),
            xp_reward: 50,
            badge: None,
        },
        AchievementDef {
            id: AchievementId::new("quiz_10"),
            name: "Getting Serious".to_string(),
            description: "Complete 10 quizzes".to_string(),
            icon: "books".to_string(),
            predicate: Predicate::Deferred(|stats| stats.total_quizzes >= 10),
            xp_reward: 75,
            badge: None,
        },
        AchievementDef {
            id: AchievementId::new("quiz_50"),
            name: "Quiz Veteran".to_string(),
            description: "Complete 50 quizzes".to_string(),
            icon: "medal".to_string(),
            predicate: Predicate::Deferred(|stats| stats.total_quizzes >= 50),
            xp_reward: 150,
            badge: Some(BadgeDef::new(
                "quiz_veteran",
                "Quiz Veteran",
                "Completed 50 quizzes",
                "medal",
            )),
        },
        AchievementDef {
            id: AchievementId::new("explorer"),
            name: "Explorer".to_string(),
            description: "Try quizzes in 5 different categories".to_string(),
            icon: "compass".to_string(),
            predicate: Predicate::Deferred(|stats| stats.categories_attempted >= 5),
            xp_reward: 100,
            badge: None,
        },
        AchievementDef {
            id: AchievementId::new("bookworm"),
            name: "Bookworm".to_string(),
            description: "Finish 20 lessons".to_string(),
            icon: "book".to_string(),
            predicate: Predicate::Deferred(|stats| stats.total_lessons >= 20),
            xp_reward: 100,
            badge: None,
        },
    ];

    debug_assert!(
        catalog
            .iter()
            .all(|def| !def.id.as_str().starts_with(STREAK_ID_PREFIX)),
        "catalog ids must not use the streak ladder namespace"
    );

    catalog
}

// ============================================================================
// Streak ladder
// ============================================================================

/// One rung of the streak-length achievement ladder
#[derive(Debug, Clone)]
pub struct StreakRung {
    pub threshold: u32,
    pub id: AchievementId,
    pub name: String,
    pub xp_reward: u64,
    pub badge: BadgeDef,
}

/// Fixed ladder of streak-length thresholds
pub fn streak_ladder() -> Vec<StreakRung> {
    [
        (3, "Warming Up", 30),
        (7, "Week Warrior", 70),
        (14, "Fortnight Fighter", 140),
        (30, "Monthly Master", 300),
        (100, "Centurion", 1000),
    ]
    .into_iter()
    .map(|(threshold, name, xp_reward)| StreakRung {
        threshold,
        id: AchievementId::new(format!("{STREAK_ID_PREFIX}{threshold}")),
        name: name.to_string(),
        xp_reward,
        badge: BadgeDef::new(
            format!("{STREAK_ID_PREFIX}{threshold}"),
            name,
            format!("Kept a {threshold}-day streak"),
            "flame",
        ),
    })
    .collect()
}

// ============================================================================
// Unlocked set
// ============================================================================

/// Persisted shape: achievement id -> unlock time
///
/// Stored as a map so ids this build's catalog does not know about survive a
/// round-trip untouched.
pub type UnlockRecord = BTreeMap<AchievementId, DateTime<Utc>>;

/// The set of achievements a learner has unlocked
///
/// Insertion is the idempotence guard: unlocking is a one-way transition
/// from absent to present, and re-insertion is a no-op.
#[derive(Debug, Clone, Default)]
pub struct UnlockedSet {
    unlocked: BTreeMap<AchievementId, DateTime<Utc>>,
}

impl UnlockedSet {
    pub fn from_record(record: UnlockRecord) -> Self {
        Self { unlocked: record }
    }

    pub fn record(&self) -> &UnlockRecord {
        &self.unlocked
    }

    pub fn contains(&self, id: &AchievementId) -> bool {
        self.unlocked.contains_key(id)
    }

    /// Insert an unlock; returns false (and changes nothing) if already present
    pub fn insert(&mut self, id: AchievementId, at: DateTime<Utc>) -> bool {
        if self.unlocked.contains_key(&id) {
            return false;
        }
        self.unlocked.insert(id, at);
        true
    }

    /// All unlocked achievements, oldest first
    pub fn list(&self) -> Vec<AchievementInstance> {
        let mut instances: Vec<_> = self
            .unlocked
            .iter()
            .map(|(id, unlocked_at)| AchievementInstance {
                id: id.clone(),
                unlocked_at: *unlocked_at,
            })
            .collect();
        instances.sort_by_key(|i| i.unlocked_at);
        instances
    }

    pub fn len(&self) -> usize {
        self.unlocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unlocked.is_empty()
    }

    /// Administrative reset
    pub fn reset(&mut self) {
        self.unlocked.clear();
    }
}
