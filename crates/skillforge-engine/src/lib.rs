//! SkillForge Engine - The gamification core
//!
//! Converts learner activity into XP, levels, streaks, achievements, badges,
//! and challenge progress. Everything hangs off a per-user
//! [`GamificationSession`] with the persistent store and external providers
//! injected, so the whole core is unit-testable against in-memory fakes.
//!
//! # Invariants
//!
//! 1. XP awards are deterministic given the same inputs; level is a pure
//!    function of total XP with exact boundary arithmetic
//! 2. Achievements and badges unlock at most once per id
//! 3. Challenge rewards are issued exactly once, at the completion boundary
//! 4. No degraded path (store failure, lookup failure, unknown id) ever
//!    surfaces an error to the caller; gamification is strictly additive

pub mod achievements;
pub mod badges;
pub mod challenges;
pub mod ledger;
pub mod providers;
pub mod rules;
pub mod session;
pub mod streak;

use thiserror::Error;

/// Errors internal to the engine and its provider contracts
///
/// These never escape the session's public entry points; they exist so
/// providers and store plumbing can report failures for logging.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] skillforge_store::StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("external lookup failed: {message}")]
    LookupFailed { message: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;

pub use achievements::{
    default_catalog, streak_ladder, AchievementDef, Predicate, StreakRung, UnlockedSet,
};
pub use badges::BadgeRegistry;
pub use challenges::{Advance, ChallengeBook};
pub use ledger::XpLedger;
pub use providers::{
    ChallengeCatalog, LearnerStats, StaticChallengeCatalog, StaticStats, StatsProvider,
    UnavailableStats,
};
pub use rules::{level_for_xp, level_progress, level_reward, xp_floor_for_level, XpRules};
pub use session::GamificationSession;
pub use streak::{DayTransition, StreakTracker};
