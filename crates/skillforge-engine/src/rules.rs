//! XP rules and the level curve
//!
//! The activity -> XP mapping is a typed, exhaustively matched table rather
//! than a keyed literal, so a new [`ActivityKind`] variant is a compile error
//! here until it gets a rule. The level curve is pure arithmetic and is never
//! persisted; level is always recomputed from total XP to avoid drift.

use skillforge_types::{ActivityDetails, ActivityKind, BadgeDef, LevelProgress};

/// Base XP awarded per activity kind, before multipliers
///
/// `AchievementUnlocked` and `ChallengeCompleted` carry their amount in
/// `ActivityDetails::xp_override` instead of a base rule; `Other` is always
/// a zero-XP no-op.
#[derive(Debug, Clone)]
pub struct XpRules {
    pub quiz_completed: u64,
    pub quiz_perfect: u64,
    pub lesson_finished: u64,
    pub category_explored: u64,
    pub streak_bonus: u64,
}

impl Default for XpRules {
    fn default() -> Self {
        Self {
            quiz_completed: 50,
            quiz_perfect: 100,
            lesson_finished: 30,
            category_explored: 40,
            streak_bonus: 20,
        }
    }
}

impl XpRules {
    /// Compute the XP award for an activity event
    ///
    /// Multipliers compose multiplicatively; the result is rounded
    /// half-away-from-zero.
    pub fn award_for(&self, kind: &ActivityKind, details: &ActivityDetails) -> u64 {
        let base = match kind {
            ActivityKind::QuizCompleted => self.quiz_completed,
            ActivityKind::QuizPerfect => self.quiz_perfect,
            ActivityKind::LessonFinished => self.lesson_finished,
            ActivityKind::CategoryExplored => self.category_explored,
            ActivityKind::StreakBonus => self.streak_bonus,
            ActivityKind::AchievementUnlocked | ActivityKind::ChallengeCompleted => {
                return details.xp_override.unwrap_or(0);
            }
            ActivityKind::Other(_) => return 0,
        };

        let mut multiplier = 1.0_f64;

        if let Some(difficulty) = details.difficulty {
            multiplier *= difficulty.multiplier();
        }

        // Streak bonus scales with streak length, capped at 2x.
        if *kind == ActivityKind::StreakBonus {
            if let Some(streak) = details.streak {
                multiplier *= (f64::from(streak) * 0.1).min(2.0);
            }
        }

        (base as f64 * multiplier).round() as u64
    }
}

// ============================================================================
// Level curve
// ============================================================================

/// Level for a cumulative XP total: `floor(sqrt(xp / 100)) + 1`
///
/// Non-decreasing step function; the XP boundary for level `L` is
/// `(L - 1)^2 * 100`.
pub fn level_for_xp(total_xp: u64) -> u32 {
    // Integer sqrt via f64 is exact well past any reachable XP total, but
    // guard the boundary against float error anyway.
    let mut level = ((total_xp as f64 / 100.0).sqrt().floor()) as u32 + 1;
    while xp_floor_for_level(level + 1) <= total_xp {
        level += 1;
    }
    while level > 1 && xp_floor_for_level(level) > total_xp {
        level -= 1;
    }
    level
}

/// Lower XP boundary of a level: `(L - 1)^2 * 100`
pub fn xp_floor_for_level(level: u32) -> u64 {
    let l = u64::from(level.saturating_sub(1));
    l * l * 100
}

/// Progress within the current level band
pub fn level_progress(total_xp: u64) -> LevelProgress {
    let level = level_for_xp(total_xp);
    let lower = xp_floor_for_level(level);
    let upper = xp_floor_for_level(level + 1);
    let band = upper - lower;
    let current = total_xp - lower;

    LevelProgress {
        current,
        needed: band - current,
        total: band,
        progress: current as f64 / band as f64,
    }
}

// ============================================================================
// Level rewards
// ============================================================================

/// Badge handed out when a level is first reached
///
/// At most one reward per level; idempotence comes from the badge registry
/// keying by id.
pub fn level_reward(level: u32) -> Option<BadgeDef> {
    let (id, name, description) = match level {
        5 => ("level_5", "Rising Star", "Reached level 5"),
        10 => ("level_10", "Dedicated Learner", "Reached level 10"),
        25 => ("level_25", "Scholar", "Reached level 25"),
        50 => ("level_50", "Sage", "Reached level 50"),
        _ => return None,
    };
    Some(BadgeDef::new(id, name, description, "trophy"))
}
