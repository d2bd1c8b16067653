//! Persistent gamification records
//!
//! Everything here round-trips through `serde_json` when written to the state
//! store. Unknown fields are tolerated on the way in so that a newer app
//! version's records survive being read by this one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AchievementId, BadgeId, ChallengeId};

// ============================================================================
// Achievements & Badges
// ============================================================================

/// An unlocked achievement
///
/// Keyed by `id`; the key set is the source of truth for "already unlocked".
/// At most one instance per definition id ever exists for a given user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementInstance {
    pub id: AchievementId,
    pub unlocked_at: DateTime<Utc>,
}

/// An awarded badge
///
/// Badges originate from achievement unlocks, level-up rewards, or challenge
/// completion. Awarding the same id twice never duplicates the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeInstance {
    pub id: BadgeId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub awarded_at: DateTime<Utc>,
}

/// Badge payload before it is stamped with an award time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeDef {
    pub id: BadgeId,
    pub name: String,
    pub description: String,
    pub icon: String,
}

impl BadgeDef {
    pub fn new(
        id: impl Into<BadgeId>,
        name: impl Into<String>,
        description: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            icon: icon.into(),
        }
    }

    /// Stamp the definition into an awarded instance
    pub fn awarded_at(&self, at: DateTime<Utc>) -> BadgeInstance {
        BadgeInstance {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            awarded_at: at,
        }
    }
}

// ============================================================================
// Challenges
// ============================================================================

/// Lifecycle state of a challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Active,
    Completed,
}

/// Reward attached to a challenge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeReward {
    /// XP granted on completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<u64>,
    /// Badge awarded on completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<BadgeDef>,
}

/// A challenge with its mutable progress counter
///
/// # Invariants
///
/// 1. `progress` is non-decreasing and clamped to `[0, target]`
/// 2. `status` transitions `Active -> Completed` exactly once, the moment
///    `progress >= target`
/// 3. The reward is issued exactly once, at that transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeInstance {
    pub id: ChallengeId,
    pub title: String,
    pub description: String,
    /// Free-form kind tag from the catalog provider ("daily", "weekly", ...)
    pub kind: String,
    pub target: u64,
    pub progress: u64,
    pub reward: ChallengeReward,
    pub status: ChallengeStatus,
    pub end_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ChallengeInstance {
    pub fn is_completed(&self) -> bool {
        self.status == ChallengeStatus::Completed
    }
}

// ============================================================================
// Levels & Summary
// ============================================================================

/// Progress within the current level band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// XP earned past the lower boundary of the current level
    pub current: u64,
    /// XP still needed to reach the next level
    pub needed: u64,
    /// Width of the current level band in XP
    pub total: u64,
    /// `current / total`, in `[0, 1]`
    pub progress: f64,
}

/// Result of a single XP award
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardOutcome {
    /// XP granted by this event after multipliers and rounding
    pub xp_awarded: u64,
    /// Cumulative XP after the award
    pub total_xp: u64,
    /// Level after the award
    pub level: u32,
    /// Whether this award crossed a level boundary
    pub leveled_up: bool,
}

/// Read-only snapshot of a learner's gamification state
///
/// Produced by the summary aggregator; performs no writes and returns
/// well-defined zero/empty defaults for a brand-new user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamificationSummary {
    pub xp: u64,
    pub level: u32,
    pub next_level_progress: LevelProgress,
    pub streak: u32,
    pub longest_streak: u32,
    pub achievements: Vec<AchievementInstance>,
    pub badges: Vec<BadgeInstance>,
    pub active_challenges: Vec<ChallengeInstance>,
    pub completed_challenge_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_instance_round_trips() {
        let challenge = ChallengeInstance {
            id: ChallengeId::new("daily_quiz_3"),
            title: "Quiz Hat-Trick".to_string(),
            description: "Complete 3 quizzes today".to_string(),
            kind: "daily".to_string(),
            target: 3,
            progress: 1,
            reward: ChallengeReward {
                xp: Some(75),
                badge: None,
            },
            status: ChallengeStatus::Active,
            end_date: Utc::now(),
            completed_at: None,
        };

        let json = serde_json::to_string(&challenge).unwrap();
        let back: ChallengeInstance = serde_json::from_str(&json).unwrap();
        assert_eq!(back, challenge);
    }

    #[test]
    fn badge_def_stamps_instance() {
        let def = BadgeDef::new("level_5", "Level 5", "Reached level 5", "star");
        let at = Utc::now();
        let instance = def.awarded_at(at);
        assert_eq!(instance.id, BadgeId::new("level_5"));
        assert_eq!(instance.awarded_at, at);
    }
}
