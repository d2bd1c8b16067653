//! Activity events
//!
//! Every XP-relevant thing a learner does enters the core as an
//! [`ActivityKind`] plus [`ActivityDetails`]. The kind set is closed so the
//! XP rule table can be matched exhaustively; kinds the core does not know
//! about arrive as `Other` and award nothing rather than erroring, because
//! activity events originate from loosely coupled callers that must never
//! crash on a stale or mistyped kind.

use serde::{Deserialize, Serialize};

/// Kind of learner activity feeding the gamification core
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// A quiz was finished (any score)
    QuizCompleted,
    /// A quiz was finished with a perfect score
    QuizPerfect,
    /// A lesson was read to the end
    LessonFinished,
    /// A new quiz category was attempted for the first time
    CategoryExplored,
    /// Daily streak bonus (emitted by the streak tracker itself)
    StreakBonus,
    /// Bonus XP attached to an achievement unlock
    AchievementUnlocked,
    /// Bonus XP attached to a challenge completion
    ChallengeCompleted,
    /// Unrecognized activity; always a zero-XP no-op
    #[serde(untagged)]
    Other(String),
}

/// Quiz difficulty, used as an XP multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// XP multiplier applied on top of the base award
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Easy => 1.0,
            Self::Medium => 1.2,
            Self::Hard => 1.5,
        }
    }
}

/// Details accompanying an activity event
///
/// All fields are optional; an empty value is a valid event. `xp_override`
/// carries the exact reward amount for `AchievementUnlocked` and
/// `ChallengeCompleted` events, which have no base rule of their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityDetails {
    /// Difficulty of the quiz, if the event came from one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    /// Current streak length, for streak bonus events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    /// Whether the quiz was answered perfectly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perfect: Option<bool>,
    /// Category the activity belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Explicit XP amount for reward-carrying events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_override: Option<u64>,
}

impl ActivityDetails {
    /// Builder: set difficulty
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Builder: set streak length
    pub fn with_streak(mut self, streak: u32) -> Self {
        self.streak = Some(streak);
        self
    }

    /// Builder: mark as a perfect score
    pub fn perfect(mut self) -> Self {
        self.perfect = Some(true);
        self
    }

    /// Builder: set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builder: set an explicit XP amount
    pub fn with_xp(mut self, xp: u64) -> Self {
        self.xp_override = Some(xp);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_kinds_serialize_as_snake_case() {
        let json = serde_json::to_string(&ActivityKind::QuizCompleted).unwrap();
        assert_eq!(json, "\"quiz_completed\"");
    }

    #[test]
    fn unknown_kind_round_trips_through_other() {
        let kind: ActivityKind = serde_json::from_str("\"pet_the_mascot\"").unwrap();
        assert_eq!(kind, ActivityKind::Other("pet_the_mascot".to_string()));
    }

    #[test]
    fn difficulty_multipliers() {
        assert_eq!(Difficulty::Easy.multiplier(), 1.0);
        assert_eq!(Difficulty::Medium.multiplier(), 1.2);
        assert_eq!(Difficulty::Hard.multiplier(), 1.5);
    }
}
