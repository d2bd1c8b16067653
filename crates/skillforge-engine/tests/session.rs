//! End-to-end tests for the gamification session
//!
//! These drive the public entry points against in-memory fakes, covering the
//! cross-component flows: XP + level rewards, streak bonuses, achievement
//! unlock cascades, challenge completion, and the degraded store/lookup
//! paths.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use skillforge_engine::{
    ChallengeCatalog, GamificationSession, LearnerStats, StaticChallengeCatalog, StaticStats,
    StatsProvider, UnavailableStats,
};
use skillforge_store::{FailingStore, MemoryStore, StateStore};
use skillforge_types::{
    ActivityDetails, ActivityKind, BadgeDef, BadgeId, ChallengeId, ChallengeInstance,
    ChallengeReward, ChallengeStatus, UserId,
};

fn day(d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, hour, 0, 0).unwrap()
}

fn challenge(id: &str, target: u64, xp: Option<u64>, badge: Option<BadgeDef>) -> ChallengeInstance {
    ChallengeInstance {
        id: ChallengeId::new(id),
        title: id.to_string(),
        description: String::new(),
        kind: "daily".to_string(),
        target,
        progress: 0,
        reward: ChallengeReward { xp, badge },
        status: ChallengeStatus::Active,
        end_date: day(31, 0),
        completed_at: None,
    }
}

async fn session_with(
    store: Arc<dyn StateStore>,
    stats: Arc<dyn StatsProvider>,
) -> GamificationSession {
    GamificationSession::load(
        UserId::new(),
        store,
        stats,
        Arc::new(StaticChallengeCatalog::default()),
    )
    .await
}

async fn fresh_session() -> GamificationSession {
    session_with(
        Arc::new(MemoryStore::new()),
        Arc::new(StaticStats::default()),
    )
    .await
}

// ============================================================================
// XP & levels
// ============================================================================

#[tokio::test]
async fn unknown_activity_is_a_no_op() {
    let mut session = fresh_session().await;

    let outcome = session
        .award_xp(
            ActivityKind::Other("unknown_activity".to_string()),
            ActivityDetails::default(),
        )
        .await;

    assert_eq!(outcome.xp_awarded, 0);
    assert_eq!(outcome.total_xp, 0);
    assert!(!outcome.leveled_up);
    assert_eq!(session.total_xp(), 0);
    assert!(session.summary().achievements.is_empty());
}

#[tokio::test]
async fn quiz_award_includes_first_quiz_unlock() {
    let mut session = fresh_session().await;

    let outcome = session
        .award_xp(ActivityKind::QuizCompleted, ActivityDetails::default())
        .await;

    // The outcome reports the event's own award; the unlock bonus lands on
    // the ledger afterwards.
    assert_eq!(outcome.xp_awarded, 50);
    assert_eq!(session.total_xp(), 75);

    let summary = session.summary();
    assert_eq!(summary.achievements.len(), 1);
    assert_eq!(summary.achievements[0].id.as_str(), "first_quiz");
}

#[tokio::test]
async fn level_up_awards_the_level_badge_once() {
    let mut session = fresh_session().await;

    // Level 5 starts at 1600 XP; perfect hard quizzes are 150 each.
    for _ in 0..11 {
        session
            .award_xp(
                ActivityKind::QuizPerfect,
                ActivityDetails::default()
                    .with_difficulty(skillforge_types::Difficulty::Hard),
            )
            .await;
    }
    assert!(session.level() >= 5);

    let badges = session.summary().badges;
    let level_badges: Vec<_> = badges
        .iter()
        .filter(|b| b.id == BadgeId::new("level_5"))
        .collect();
    assert_eq!(level_badges.len(), 1);
}

#[tokio::test]
async fn state_survives_a_restart() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let stats: Arc<dyn StatsProvider> = Arc::new(StaticStats::default());

    {
        let mut session = session_with(store.clone(), stats.clone()).await;
        session
            .award_xp(ActivityKind::LessonFinished, ActivityDetails::default())
            .await;
        assert_eq!(session.total_xp(), 30);
    }

    let reloaded = session_with(store, stats).await;
    assert_eq!(reloaded.total_xp(), 30);
}

// ============================================================================
// Streaks
// ============================================================================

#[tokio::test]
async fn streak_same_day_is_idempotent() {
    let mut session = fresh_session().await;

    assert_eq!(session.update_streak(day(1, 9)).await, 1);
    assert_eq!(session.update_streak(day(1, 21)).await, 1);
    assert_eq!(session.total_xp(), 0);
}

#[tokio::test]
async fn streak_gap_resets_to_one() {
    let mut session = fresh_session().await;

    session.update_streak(day(1, 9)).await;
    session.update_streak(day(2, 9)).await;
    assert_eq!(session.streak_count(), 2);

    // Three days idle.
    assert_eq!(session.update_streak(day(5, 9)).await, 1);
}

#[tokio::test]
async fn three_day_streak_pays_ladder_and_bonus() {
    let mut session = fresh_session().await;

    session.update_streak(day(1, 9)).await;
    session.update_streak(day(2, 9)).await;
    assert_eq!(session.total_xp(), 0);

    let count = session.update_streak(day(3, 9)).await;
    assert_eq!(count, 3);

    // streak_3 rung: 30 XP + badge; streak bonus: 20 * 0.3 = 6 XP.
    assert_eq!(session.total_xp(), 36);

    let summary = session.summary();
    assert!(summary.badges.iter().any(|b| b.id == BadgeId::new("streak_3")));
    assert!(summary
        .achievements
        .iter()
        .any(|a| a.id.as_str() == "streak_3"));

    // The rung never pays twice, even across a reset and re-climb.
    session.update_streak(day(7, 9)).await;
    session.update_streak(day(8, 9)).await;
    session.update_streak(day(9, 9)).await;
    let streak_unlocks = session
        .summary()
        .achievements
        .iter()
        .filter(|a| a.id.as_str() == "streak_3")
        .count();
    assert_eq!(streak_unlocks, 1);
}

// ============================================================================
// Achievements
// ============================================================================

#[tokio::test]
async fn qualifying_event_unlocks_exactly_once() {
    let mut session = fresh_session().await;

    session
        .award_xp(ActivityKind::QuizCompleted, ActivityDetails::default())
        .await;
    let total_after_first = session.total_xp();

    session
        .award_xp(ActivityKind::QuizCompleted, ActivityDetails::default())
        .await;

    // Second event: 50 XP for the quiz, no second unlock bonus.
    assert_eq!(session.total_xp(), total_after_first + 50);
    assert_eq!(session.summary().achievements.len(), 1);
}

#[tokio::test]
async fn deferred_predicates_unlock_from_stats() {
    let stats = Arc::new(StaticStats::new(LearnerStats {
        total_quizzes: 50,
        ..Default::default()
    }));
    let mut session = session_with(Arc::new(MemoryStore::new()), stats).await;

    session
        .award_xp(ActivityKind::QuizCompleted, ActivityDetails::default())
        .await;

    let summary = session.summary();
    let ids: Vec<&str> = summary.achievements.iter().map(|a| a.id.as_str()).collect();
    assert!(ids.contains(&"first_quiz"));
    assert!(ids.contains(&"quiz_10"));
    assert!(ids.contains(&"quiz_50"));

    // quiz_50 carries a badge.
    assert!(summary
        .badges
        .iter()
        .any(|b| b.id == BadgeId::new("quiz_veteran")));

    // 50 (quiz) + 25 + 75 + 150 (unlock bonuses).
    assert_eq!(session.total_xp(), 300);
}

#[tokio::test]
async fn failed_stats_lookup_retries_on_next_event() {
    let stats = Arc::new(StaticStats::default());
    let mut session = session_with(Arc::new(MemoryStore::new()), stats.clone()).await;

    session
        .award_xp(ActivityKind::QuizCompleted, ActivityDetails::default())
        .await;
    assert!(!session
        .summary()
        .achievements
        .iter()
        .any(|a| a.id.as_str() == "quiz_10"));

    // Backend catches up; the next qualifying event unlocks.
    stats.set(LearnerStats {
        total_quizzes: 10,
        ..Default::default()
    });
    session
        .award_xp(ActivityKind::QuizCompleted, ActivityDetails::default())
        .await;
    assert!(session
        .summary()
        .achievements
        .iter()
        .any(|a| a.id.as_str() == "quiz_10"));
}

#[tokio::test]
async fn unavailable_stats_never_surface_an_error() {
    let mut session =
        session_with(Arc::new(MemoryStore::new()), Arc::new(UnavailableStats)).await;

    let outcome = session
        .award_xp(ActivityKind::QuizCompleted, ActivityDetails::default())
        .await;

    // Immediate predicates still fire; deferred ones silently stay locked.
    assert_eq!(outcome.xp_awarded, 50);
    let summary = session.summary();
    let ids: Vec<&str> = summary.achievements.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["first_quiz"]);
}

/// Stats provider that never answers, for the timeout path
struct HangingStats;

#[async_trait]
impl StatsProvider for HangingStats {
    async fn learner_stats(&self) -> skillforge_engine::Result<LearnerStats> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(LearnerStats::default())
    }
}

#[tokio::test]
async fn stats_timeout_counts_as_not_satisfied() {
    let mut session = session_with(Arc::new(MemoryStore::new()), Arc::new(HangingStats))
        .await
        .with_lookup_timeout(Duration::from_millis(20));

    let outcome = session
        .award_xp(ActivityKind::QuizCompleted, ActivityDetails::default())
        .await;

    assert_eq!(outcome.xp_awarded, 50);
    assert!(!session
        .summary()
        .achievements
        .iter()
        .any(|a| a.id.as_str() == "quiz_10"));
}

// ============================================================================
// Challenges
// ============================================================================

#[tokio::test]
async fn challenge_completion_is_one_shot() {
    let catalog = StaticChallengeCatalog::new(vec![challenge(
        "quiz_sprint",
        2,
        Some(75),
        Some(BadgeDef::new("sprinter", "Sprinter", "Finished a sprint", "bolt")),
    )]);
    let mut session = GamificationSession::load(
        UserId::new(),
        Arc::new(MemoryStore::new()),
        Arc::new(StaticStats::default()),
        Arc::new(catalog),
    )
    .await;
    session.load_active_challenges().await;

    let id = ChallengeId::new("quiz_sprint");

    let first = session.advance_challenge(&id, 1).await.unwrap();
    assert_eq!(first.status, ChallengeStatus::Active);
    assert_eq!(session.total_xp(), 0);

    let second = session.advance_challenge(&id, 5).await.unwrap();
    assert_eq!(second.status, ChallengeStatus::Completed);
    assert_eq!(second.progress, 2);
    assert_eq!(session.total_xp(), 75);

    // Advancing a completed challenge is a no-op.
    let third = session.advance_challenge(&id, 1).await.unwrap();
    assert_eq!(third.status, ChallengeStatus::Completed);
    assert_eq!(third.completed_at, second.completed_at);
    assert_eq!(session.total_xp(), 75);

    let badges = session.summary().badges;
    assert_eq!(
        badges
            .iter()
            .filter(|b| b.id == BadgeId::new("sprinter"))
            .count(),
        1
    );
}

#[tokio::test]
async fn unknown_challenge_id_returns_none() {
    let mut session = fresh_session().await;
    assert!(session
        .advance_challenge(&ChallengeId::new("missing"), 1)
        .await
        .is_none());
}

#[tokio::test]
async fn catalog_reload_preserves_progress() {
    let catalog = StaticChallengeCatalog::new(vec![challenge("weekly", 10, Some(200), None)]);
    let mut session = GamificationSession::load(
        UserId::new(),
        Arc::new(MemoryStore::new()),
        Arc::new(StaticStats::default()),
        Arc::new(catalog),
    )
    .await;

    session.load_active_challenges().await;
    session
        .advance_challenge(&ChallengeId::new("weekly"), 4)
        .await
        .unwrap();

    session.load_active_challenges().await;
    let active = session.summary().active_challenges;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].progress, 4);
}

/// Catalog that always errors, for the degraded fetch path
struct BrokenCatalog;

#[async_trait]
impl ChallengeCatalog for BrokenCatalog {
    async fn active_challenges(&self) -> skillforge_engine::Result<Vec<ChallengeInstance>> {
        Err(skillforge_engine::EngineError::LookupFailed {
            message: "catalog service down".to_string(),
        })
    }
}

#[tokio::test]
async fn catalog_failure_keeps_the_current_book() {
    let mut session = GamificationSession::load(
        UserId::new(),
        Arc::new(MemoryStore::new()),
        Arc::new(StaticStats::default()),
        Arc::new(BrokenCatalog),
    )
    .await;

    session.load_active_challenges().await;
    assert!(session.summary().active_challenges.is_empty());
}

// ============================================================================
// Degraded store
// ============================================================================

#[tokio::test]
async fn store_failure_keeps_memory_authoritative() {
    let store = Arc::new(FailingStore::new());
    store.set_failing(true);
    let mut session = session_with(store.clone(), Arc::new(StaticStats::default())).await;

    let outcome = session
        .award_xp(ActivityKind::QuizCompleted, ActivityDetails::default())
        .await;
    assert_eq!(outcome.xp_awarded, 50);
    assert_eq!(session.total_xp(), 75);

    session
        .award_xp(ActivityKind::LessonFinished, ActivityDetails::default())
        .await;
    assert_eq!(session.total_xp(), 105);
}

// ============================================================================
// Summary
// ============================================================================

#[tokio::test]
async fn summary_zero_state_for_a_new_user() {
    let session = fresh_session().await;
    let summary = session.summary();

    assert_eq!(summary.xp, 0);
    assert_eq!(summary.level, 1);
    assert_eq!(summary.streak, 0);
    assert_eq!(summary.longest_streak, 0);
    assert!(summary.achievements.is_empty());
    assert!(summary.badges.is_empty());
    assert!(summary.active_challenges.is_empty());
    assert_eq!(summary.completed_challenge_count, 0);
    assert_eq!(summary.next_level_progress.progress, 0.0);
    assert_eq!(summary.next_level_progress.needed, 100);
}

#[tokio::test]
async fn summary_progress_matches_the_boundary_formula() {
    let mut session = fresh_session().await;

    // 3 lessons: 90 XP, still level 1.
    for _ in 0..3 {
        session
            .award_xp(ActivityKind::LessonFinished, ActivityDetails::default())
            .await;
    }

    let progress = session.summary().next_level_progress;
    assert_eq!(progress.current, 90);
    assert_eq!(progress.needed, 10);
    assert_eq!(progress.total, 100);
    assert!((progress.progress - 0.9).abs() < 1e-9);
}

#[tokio::test]
async fn reset_returns_to_zero_state() {
    let mut session = fresh_session().await;
    session
        .award_xp(ActivityKind::QuizCompleted, ActivityDetails::default())
        .await;
    session.update_streak(day(1, 9)).await;

    session.reset().await;

    let summary = session.summary();
    assert_eq!(summary.xp, 0);
    assert_eq!(summary.level, 1);
    assert_eq!(summary.streak, 0);
    assert!(summary.achievements.is_empty());
    assert!(summary.badges.is_empty());
}
