//! SkillForge Types - Canonical domain types for the gamification core
//!
//! This crate contains all foundational types for SkillForge with zero
//! dependencies on other skillforge crates. It defines the type system for:
//!
//! - Identity types (UserId, AchievementId, BadgeId, ChallengeId)
//! - Activity events and their XP-relevant details
//! - Achievement, badge, and challenge records
//! - Level progress and the read-only gamification summary
//!
//! # Architectural Invariants
//!
//! These types support the core SkillForge invariants:
//!
//! 1. Total XP never decreases outside an explicit administrative reset
//! 2. Level is derived from total XP, never stored independently
//! 3. Achievements and badges unlock at most once per id
//! 4. Challenge completion pays its reward exactly once

pub mod activity;
pub mod identity;
pub mod records;

pub use activity::*;
pub use identity::*;
pub use records::*;
