//! SkillForge Leaderboard - Ranking gateway over a pluggable data source
//!
//! The gateway turns raw `{user, value}` pairs from a [`LeaderboardSource`]
//! into a ranked, decorated leaderboard. Ranking and shaping live here so a
//! real backend can be substituted for the shipped stand-in without touching
//! any of it.
//!
//! # Invariants
//!
//! 1. Entries are sorted descending by value; ties keep the source's input
//!    order and rank is assigned by position
//! 2. `BadgeTier` is derived purely from rank, never from source data
//! 3. Queries are read-only and safe to issue at any frequency

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use skillforge_types::UserId;

/// Errors from leaderboard queries
#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("source fetch failed: {message}")]
    SourceFailed { message: String },
}

pub type Result<T> = std::result::Result<T, LeaderboardError>;

// ============================================================================
// Query shape
// ============================================================================

/// Metric users are ranked by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Total experience points
    Xp,
    /// Current streak length in days
    Streak,
}

impl Metric {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Xp => "Experience",
            Self::Streak => "Streak",
        }
    }
}

/// Time window the ranking covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    AllTime,
    Weekly,
    Monthly,
}

/// Decoration for top placements, derived purely from rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTier {
    Gold,
    Silver,
    Bronze,
}

impl BadgeTier {
    /// Tier for a 1-based rank; ranks past 3 get none
    pub fn from_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Self::Gold),
            2 => Some(Self::Silver),
            3 => Some(Self::Bronze),
            _ => None,
        }
    }
}

// ============================================================================
// Source contract
// ============================================================================

/// Raw score row from the data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScore {
    pub user_id: UserId,
    pub display_name: String,
    pub value: u64,
    /// Level, where the provider knows it (XP rankings)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

/// Provider of raw `{user, value}` pairs for a metric and timeframe
///
/// Implementations only fetch; all ranking happens in the gateway.
#[async_trait]
pub trait LeaderboardSource: Send + Sync {
    async fn fetch(&self, metric: Metric, timeframe: Timeframe) -> Result<Vec<RawScore>>;
}

// ============================================================================
// Ranked output
// ============================================================================

/// One ranked leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: UserId,
    pub display_name: String,
    pub value: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_tier: Option<BadgeTier>,
}

/// A ranked leaderboard page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    /// Rank of the viewing user, even when outside the page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_rank: Option<usize>,
    pub total_users: usize,
}

// ============================================================================
// Gateway
// ============================================================================

/// Read-only ranking gateway over a [`LeaderboardSource`]
pub struct LeaderboardGateway<S> {
    source: S,
}

impl<S: LeaderboardSource> LeaderboardGateway<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch and rank the leaderboard for a metric and timeframe
    ///
    /// `viewer` resolves `viewer_rank` against the full ranking before the
    /// page is cut to `limit`.
    pub async fn get_leaderboard(
        &self,
        metric: Metric,
        timeframe: Timeframe,
        limit: usize,
        viewer: Option<&UserId>,
    ) -> Result<Leaderboard> {
        let raw = self.source.fetch(metric, timeframe).await?;
        Ok(rank(raw, limit, viewer))
    }
}

/// Rank raw scores: stable descending sort, positional ranks, tier decoration
fn rank(mut raw: Vec<RawScore>, limit: usize, viewer: Option<&UserId>) -> Leaderboard {
    let total_users = raw.len();

    // Stable sort: ties keep the source's input order.
    raw.sort_by(|a, b| b.value.cmp(&a.value));

    let viewer_rank = viewer.and_then(|id| {
        raw.iter()
            .position(|score| &score.user_id == id)
            .map(|position| position + 1)
    });

    let entries = raw
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(position, score)| {
            let rank = position + 1;
            LeaderboardEntry {
                rank,
                user_id: score.user_id,
                display_name: score.display_name,
                value: score.value,
                level: score.level,
                badge_tier: BadgeTier::from_rank(rank),
            }
        })
        .collect();

    Leaderboard {
        entries,
        viewer_rank,
        total_users,
    }
}

// ============================================================================
// Stand-in source
// ============================================================================

/// Deterministic stand-in data source
///
/// Generates a plausible population from a fixed seed so demo screens are
/// stable across calls. A real backend replaces this behind
/// [`LeaderboardSource`].
pub struct SampleLeaderboardSource {
    seed: u64,
    population: usize,
}

impl SampleLeaderboardSource {
    pub fn new(seed: u64, population: usize) -> Self {
        Self { seed, population }
    }
}

impl Default for SampleLeaderboardSource {
    fn default() -> Self {
        Self::new(17, 100)
    }
}

#[async_trait]
impl LeaderboardSource for SampleLeaderboardSource {
    async fn fetch(&self, metric: Metric, timeframe: Timeframe) -> Result<Vec<RawScore>> {
        // Distinct seed per query shape keeps boards stable but different.
        let seed = self.seed
            ^ ((metric as u64) << 8)
            ^ ((timeframe as u64) << 16);
        let mut rng = StdRng::seed_from_u64(seed);

        let scores = (0..self.population)
            .map(|i| {
                let value = match metric {
                    Metric::Xp => rng.gen_range(0..25_000),
                    Metric::Streak => rng.gen_range(0..120),
                };
                RawScore {
                    user_id: UserId::from_uuid(uuid::Uuid::from_u128(rng.gen())),
                    display_name: format!("learner_{i:03}"),
                    value,
                    level: match metric {
                        Metric::Xp => {
                            Some(((value as f64 / 100.0).sqrt().floor()) as u32 + 1)
                        }
                        Metric::Streak => None,
                    },
                }
            })
            .collect();

        Ok(scores)
    }
}
