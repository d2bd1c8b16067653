//! External collaborator contracts
//!
//! Deferred achievement predicates need aggregate statistics the core does
//! not own, and the challenge tracker seeds its catalog from an external
//! service. Both arrive through async traits so tests inject doubles and a
//! real backend substitutes without touching engine logic. Lookups may fail
//! or hang; callers wrap them in a timeout and treat any failure as "no data
//! this time".

use async_trait::async_trait;
use skillforge_types::ChallengeInstance;

use crate::Result;

/// Aggregate learner statistics from the backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnerStats {
    /// Total quizzes ever taken
    pub total_quizzes: u64,
    /// Distinct quiz categories attempted
    pub categories_attempted: u64,
    /// Total lessons finished
    pub total_lessons: u64,
    /// Quizzes answered perfectly
    pub perfect_quizzes: u64,
}

/// Aggregate statistics lookup used by deferred achievement predicates
#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// Fetch current aggregate stats for the session's learner
    async fn learner_stats(&self) -> Result<LearnerStats>;
}

/// Source of currently-active challenge definitions
#[async_trait]
pub trait ChallengeCatalog: Send + Sync {
    /// Fetch the current set of active challenges, with zeroed progress
    async fn active_challenges(&self) -> Result<Vec<ChallengeInstance>>;
}

// ============================================================================
// Shipped doubles
// ============================================================================

/// Stats provider returning a fixed snapshot
///
/// The shipped stand-in; tests mutate the snapshot between events via
/// interior mutability.
#[derive(Debug, Default)]
pub struct StaticStats {
    stats: std::sync::Mutex<LearnerStats>,
}

impl StaticStats {
    pub fn new(stats: LearnerStats) -> Self {
        Self {
            stats: std::sync::Mutex::new(stats),
        }
    }

    /// Replace the snapshot returned by subsequent lookups
    pub fn set(&self, stats: LearnerStats) {
        *self.stats.lock().unwrap() = stats;
    }
}

#[async_trait]
impl StatsProvider for StaticStats {
    async fn learner_stats(&self) -> Result<LearnerStats> {
        Ok(self.stats.lock().unwrap().clone())
    }
}

/// Stats provider that always errors, for exercising the degraded path
#[derive(Debug, Default)]
pub struct UnavailableStats;

#[async_trait]
impl StatsProvider for UnavailableStats {
    async fn learner_stats(&self) -> Result<LearnerStats> {
        Err(crate::EngineError::LookupFailed {
            message: "stats backend unavailable".to_string(),
        })
    }
}

/// Challenge catalog serving a fixed list
#[derive(Debug, Default)]
pub struct StaticChallengeCatalog {
    challenges: Vec<ChallengeInstance>,
}

impl StaticChallengeCatalog {
    pub fn new(challenges: Vec<ChallengeInstance>) -> Self {
        Self { challenges }
    }
}

#[async_trait]
impl ChallengeCatalog for StaticChallengeCatalog {
    async fn active_challenges(&self) -> Result<Vec<ChallengeInstance>> {
        Ok(self.challenges.clone())
    }
}
