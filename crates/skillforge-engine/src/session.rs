//! The per-user gamification session
//!
//! [`GamificationSession`] is the single entry point the rest of the app
//! talks to. It owns one learner's XP ledger, streak, unlocked achievements,
//! badges, and challenge instances, with the persistent store and the
//! external providers injected as dependencies.
//!
//! # Invariants
//!
//! 1. One event's side effects run to completion before the next begins;
//!    the session takes `&mut self` and is not shared across tasks
//! 2. Store failures are logged and swallowed; in-memory state stays
//!    authoritative for the rest of the session
//! 3. A failed or timed-out external lookup is "predicate not satisfied",
//!    never an error surfaced to the caller

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use skillforge_store::{StateStore, StoreKey};
use skillforge_types::{
    ActivityDetails, ActivityKind, AwardOutcome, BadgeDef, BadgeInstance, ChallengeId,
    ChallengeInstance, GamificationSummary, UserId,
};

use crate::achievements::{default_catalog, streak_ladder, AchievementDef, UnlockedSet};
use crate::badges::BadgeRegistry;
use crate::challenges::ChallengeBook;
use crate::ledger::XpLedger;
use crate::providers::{ChallengeCatalog, LearnerStats, StatsProvider};
use crate::rules::{level_progress, level_reward, XpRules};
use crate::streak::{DayTransition, StreakTracker};

/// Default timeout for external lookups (stats, challenge catalog)
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

/// One learner's gamification state and its entry points
pub struct GamificationSession {
    user_id: UserId,
    store: Arc<dyn StateStore>,
    stats: Arc<dyn StatsProvider>,
    catalog_provider: Arc<dyn ChallengeCatalog>,
    rules: XpRules,
    catalog: Vec<AchievementDef>,
    ledger: XpLedger,
    streak: StreakTracker,
    unlocked: UnlockedSet,
    badges: BadgeRegistry,
    challenges: ChallengeBook,
    lookup_timeout: Duration,
}

impl GamificationSession {
    /// Load a session from the store, defaulting anything absent or unreadable
    ///
    /// A corrupt or offline store never blocks startup; affected pieces start
    /// from their zero state and the failure is logged.
    pub async fn load(
        user_id: UserId,
        store: Arc<dyn StateStore>,
        stats: Arc<dyn StatsProvider>,
        catalog_provider: Arc<dyn ChallengeCatalog>,
    ) -> Self {
        let ledger = XpLedger::from_record(read_or_default(&*store, StoreKey::XpTotal).await);
        let streak = StreakTracker::from_record(read_or_default(&*store, StoreKey::Streak).await);
        let unlocked =
            UnlockedSet::from_record(read_or_default(&*store, StoreKey::Achievements).await);
        let badges = BadgeRegistry::from_record(read_or_default(&*store, StoreKey::Badges).await);
        let challenges =
            ChallengeBook::from_record(read_or_default(&*store, StoreKey::Challenges).await);

        Self {
            user_id,
            store,
            stats,
            catalog_provider,
            rules: XpRules::default(),
            catalog: default_catalog(),
            ledger,
            streak,
            unlocked,
            badges,
            challenges,
            lookup_timeout: LOOKUP_TIMEOUT,
        }
    }

    /// Override the external-lookup timeout
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn total_xp(&self) -> u64 {
        self.ledger.total()
    }

    pub fn level(&self) -> u32 {
        self.ledger.level()
    }

    pub fn streak_count(&self) -> u32 {
        self.streak.count()
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Award XP for an activity event
    ///
    /// Computes and persists the award, handles level-up rewards, then runs
    /// the achievement pass over the same event. Unknown activity kinds award
    /// nothing and touch nothing.
    pub async fn award_xp(
        &mut self,
        kind: ActivityKind,
        details: ActivityDetails,
    ) -> AwardOutcome {
        if let ActivityKind::Other(ref name) = kind {
            debug!(user = %self.user_id, kind = %name, "unknown activity kind; no-op");
            return AwardOutcome {
                xp_awarded: 0,
                total_xp: self.ledger.total(),
                level: self.ledger.level(),
                leveled_up: false,
            };
        }

        let outcome = self.apply_award(&kind, &details).await;
        self.run_achievement_pass(&kind, &details).await;
        outcome
    }

    /// Record a day's activity against the streak
    ///
    /// Idempotent within a UTC calendar day. On a day change the new state is
    /// persisted, the streak achievement ladder is checked, and from a 3-day
    /// streak upward a streak bonus XP event is emitted.
    pub async fn update_streak(&mut self, at: DateTime<Utc>) -> u32 {
        let (transition, count) = self.streak.observe(at);

        if transition == DayTransition::SameDay {
            debug!(user = %self.user_id, count, "streak already counted today");
            return count;
        }

        self.persist(StoreKey::Streak, &self.streak.record()).await;
        self.check_streak_achievements(count).await;

        if count >= 3 {
            let details = ActivityDetails::default().with_streak(count);
            self.award_xp(ActivityKind::StreakBonus, details).await;
        }

        count
    }

    /// Advance a challenge's progress counter
    ///
    /// Unknown ids are a safe no-op returning `None`. The reward is issued
    /// exactly once, on the call that first reaches the target; advancing a
    /// completed challenge returns the unchanged instance.
    pub async fn advance_challenge(
        &mut self,
        id: &ChallengeId,
        increment: u64,
    ) -> Option<ChallengeInstance> {
        let advance = match self.challenges.advance(id, increment, Utc::now()) {
            Some(advance) => advance,
            None => {
                debug!(user = %self.user_id, challenge = %id, "unknown challenge id; no-op");
                return None;
            }
        };

        let was_already_completed = advance.instance.is_completed() && !advance.just_completed;
        if !was_already_completed {
            self.persist(StoreKey::Challenges, self.challenges.record())
                .await;
        }

        if advance.just_completed {
            info!(
                user = %self.user_id,
                challenge = %advance.instance.id,
                "challenge completed"
            );
            let reward = advance.instance.reward.clone();
            if let Some(badge) = reward.badge {
                self.grant_badge(&badge).await;
            }
            if let Some(xp) = reward.xp {
                let details = ActivityDetails::default().with_xp(xp);
                self.award_xp(ActivityKind::ChallengeCompleted, details).await;
            }
        }

        Some(advance.instance)
    }

    /// Refresh the challenge book from the external catalog
    ///
    /// Merges rather than overwrites: instances with progress survive. A
    /// failed or timed-out fetch keeps the current book.
    pub async fn load_active_challenges(&mut self) {
        let fetch = tokio::time::timeout(
            self.lookup_timeout,
            self.catalog_provider.active_challenges(),
        )
        .await;

        match fetch {
            Ok(Ok(incoming)) => {
                self.challenges.merge(incoming);
                self.persist(StoreKey::Challenges, self.challenges.record())
                    .await;
            }
            Ok(Err(e)) => {
                warn!(user = %self.user_id, error = %e, "challenge catalog fetch failed");
            }
            Err(_) => {
                warn!(user = %self.user_id, "challenge catalog fetch timed out");
            }
        }
    }

    /// Award a badge directly (idempotent by id)
    pub async fn award_badge(&mut self, def: &BadgeDef) -> BadgeInstance {
        self.grant_badge(def).await
    }

    /// All awarded badges, oldest first
    pub fn badges(&self) -> Vec<BadgeInstance> {
        self.badges.list()
    }

    /// Read-only snapshot of the whole gamification state
    ///
    /// Performs no writes; a brand-new user gets level 1, zero XP and streak,
    /// and empty collections.
    pub fn summary(&self) -> GamificationSummary {
        GamificationSummary {
            xp: self.ledger.total(),
            level: self.ledger.level(),
            next_level_progress: level_progress(self.ledger.total()),
            streak: self.streak.count(),
            longest_streak: self.streak.longest(),
            achievements: self.unlocked.list(),
            badges: self.badges.list(),
            active_challenges: self.challenges.active(),
            completed_challenge_count: self.challenges.completed_count(),
        }
    }

    /// Administrative reset of all gamification state
    pub async fn reset(&mut self) {
        self.ledger.reset();
        self.streak.reset();
        self.unlocked.reset();
        self.badges.reset();
        self.challenges.reset();

        self.persist(StoreKey::XpTotal, &self.ledger.record()).await;
        self.persist(StoreKey::Streak, &self.streak.record()).await;
        self.persist(StoreKey::Achievements, self.unlocked.record())
            .await;
        self.persist(StoreKey::Badges, self.badges.record()).await;
        self.persist(StoreKey::Challenges, self.challenges.record())
            .await;
        info!(user = %self.user_id, "gamification state reset");
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Credit the ledger and handle level-up rewards; no achievement pass
    ///
    /// Unlock cascades grant their bonus XP through here, so a reward can
    /// never re-enter predicate evaluation and loop.
    async fn apply_award(&mut self, kind: &ActivityKind, details: &ActivityDetails) -> AwardOutcome {
        let amount = self.rules.award_for(kind, details);
        if amount == 0 {
            return AwardOutcome {
                xp_awarded: 0,
                total_xp: self.ledger.total(),
                level: self.ledger.level(),
                leveled_up: false,
            };
        }

        let credit = self.ledger.credit(amount);
        self.persist(StoreKey::XpTotal, &self.ledger.record()).await;

        if credit.leveled_up() {
            info!(user = %self.user_id, level = credit.level, "level up");
            for level in (credit.previous_level + 1)..=credit.level {
                if let Some(badge) = level_reward(level) {
                    self.grant_badge(&badge).await;
                }
            }
        }

        AwardOutcome {
            xp_awarded: amount,
            total_xp: credit.total,
            level: credit.level,
            leveled_up: credit.leveled_up(),
        }
    }

    /// Evaluate the catalog against an event and apply any unlocks
    async fn run_achievement_pass(&mut self, kind: &ActivityKind, details: &ActivityDetails) {
        let needs_stats = self
            .catalog
            .iter()
            .any(|def| !self.unlocked.contains(&def.id) && def.needs_stats());
        let stats = if needs_stats { self.fetch_stats().await } else { None };

        let mut satisfied = Vec::new();
        for def in &self.catalog {
            if self.unlocked.contains(&def.id) {
                continue;
            }
            if def.evaluate(kind, details, stats.as_ref()) {
                satisfied.push((
                    def.id.clone(),
                    def.name.clone(),
                    def.xp_reward,
                    def.badge.clone(),
                ));
            }
        }

        let mut any_unlocked = false;
        for (id, name, xp_reward, badge) in satisfied {
            let at = Utc::now();
            if !self.unlocked.insert(id.clone(), at) {
                continue;
            }
            any_unlocked = true;
            info!(user = %self.user_id, achievement = %id, name = %name, "achievement unlocked");

            if let Some(badge) = badge {
                self.grant_badge(&badge).await;
            }
            if xp_reward > 0 {
                let details = ActivityDetails::default().with_xp(xp_reward);
                self.apply_award(&ActivityKind::AchievementUnlocked, &details)
                    .await;
            }
        }

        if any_unlocked {
            self.persist(StoreKey::Achievements, self.unlocked.record())
                .await;
        }
    }

    /// Walk the streak ladder and unlock any rung the new count reaches
    async fn check_streak_achievements(&mut self, count: u32) {
        let due: Vec<_> = streak_ladder()
            .into_iter()
            .filter(|rung| count >= rung.threshold && !self.unlocked.contains(&rung.id))
            .collect();

        let mut any_unlocked = false;
        for rung in due {
            let at = Utc::now();
            if !self.unlocked.insert(rung.id.clone(), at) {
                continue;
            }
            any_unlocked = true;
            info!(
                user = %self.user_id,
                achievement = %rung.id,
                streak = rung.threshold,
                "streak achievement unlocked"
            );

            self.grant_badge(&rung.badge).await;
            if rung.xp_reward > 0 {
                let details = ActivityDetails::default().with_xp(rung.xp_reward);
                self.apply_award(&ActivityKind::AchievementUnlocked, &details)
                    .await;
            }
        }

        if any_unlocked {
            self.persist(StoreKey::Achievements, self.unlocked.record())
                .await;
        }
    }

    /// Award a badge and persist the set when it is new
    async fn grant_badge(&mut self, def: &BadgeDef) -> BadgeInstance {
        let (instance, fresh) = self.badges.award(def, Utc::now());
        if fresh {
            info!(user = %self.user_id, badge = %instance.id, "badge awarded");
            self.persist(StoreKey::Badges, self.badges.record()).await;
        }
        instance
    }

    /// Fetch aggregate stats under the lookup timeout
    ///
    /// Any failure degrades to `None`, which deferred predicates treat as
    /// not satisfied.
    async fn fetch_stats(&self) -> Option<LearnerStats> {
        match tokio::time::timeout(self.lookup_timeout, self.stats.learner_stats()).await {
            Ok(Ok(stats)) => Some(stats),
            Ok(Err(e)) => {
                warn!(user = %self.user_id, error = %e, "stats lookup failed; deferred predicates skipped");
                None
            }
            Err(_) => {
                warn!(user = %self.user_id, "stats lookup timed out; deferred predicates skipped");
                None
            }
        }
    }

    /// Write-through a piece of state, logging instead of failing
    async fn persist<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(user = %self.user_id, key = %key, error = %e, "state serialization failed");
                return;
            }
        };
        if let Err(e) = self.store.set(key, raw).await {
            warn!(
                user = %self.user_id,
                key = %key,
                error = %e,
                "state write failed; in-memory state remains authoritative"
            );
        }
    }
}

/// Read and decode one piece of state, defaulting on absence or failure
async fn read_or_default<T>(store: &dyn StateStore, key: StoreKey) -> T
where
    T: DeserializeOwned + Default,
{
    match store.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "stored state unreadable; starting from defaults");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key = %key, error = %e, "state read failed; starting from defaults");
            T::default()
        }
    }
}
