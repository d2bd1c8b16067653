//! SkillForge Store - Durable key-value persistence for the gamification core
//!
//! The core survives process restarts by writing each piece of state under a
//! fixed logical key as a self-describing JSON string. This crate defines:
//!
//! - [`StateStore`]: the async get/set contract a real backend implements
//! - [`StoreKey`]: the closed set of logical keys the core uses
//! - [`MemoryStore`]: the in-memory implementation used by tests and demos
//! - [`FailingStore`]: a test double whose writes/reads fail on demand
//!
//! # Invariants
//!
//! 1. A store failure is never fatal to the caller; the core logs it and
//!    keeps its in-memory state authoritative for the session
//! 2. Last write wins; the store provides no cross-device merging

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("read failed for key {key}: {message}")]
    ReadFailed { key: String, message: String },

    #[error("write failed for key {key}: {message}")]
    WriteFailed { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Logical keys under which the core persists its state
///
/// Closed set so a backend can enumerate everything the core will ever ask
/// for; rendered to stable string names that must never change once shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Cumulative XP record
    XpTotal,
    /// Streak count and last activity date
    Streak,
    /// Unlocked achievement set
    Achievements,
    /// Awarded badge set
    Badges,
    /// Challenge instances with progress
    Challenges,
}

impl StoreKey {
    /// Stable storage name for this key
    pub fn name(&self) -> &'static str {
        match self {
            Self::XpTotal => "gamification.xp_total",
            Self::Streak => "gamification.streak",
            Self::Achievements => "gamification.achievements",
            Self::Badges => "gamification.badges",
            Self::Challenges => "gamification.challenges",
        }
    }

    /// All keys the core uses
    pub fn all() -> [StoreKey; 5] {
        [
            Self::XpTotal,
            Self::Streak,
            Self::Achievements,
            Self::Badges,
            Self::Challenges,
        ]
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Durable key-value store contract
///
/// Values are self-describing JSON strings the core round-trips losslessly.
/// Implementations are free to back this with anything that can hold strings.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the value stored under `key`, if any
    async fn get(&self, key: StoreKey) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value
    async fn set(&self, key: StoreKey, value: String) -> Result<()>;
}

/// In-memory store
///
/// The default store for tests and single-process demos. State does not
/// survive the process, which is exactly what unit tests want.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<&'static str, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key.name()).cloned())
    }

    async fn set(&self, key: StoreKey, value: String) -> Result<()> {
        self.values.write().await.insert(key.name(), value);
        Ok(())
    }
}

/// Store double that can be switched into a failing mode
///
/// Wraps a [`MemoryStore`] and, while `fail` is set, errors every operation.
/// Used to exercise the degraded paths where the core must stay usable with
/// only its in-memory state.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle failure mode
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    fn failing(&self) -> bool {
        self.fail.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for FailingStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>> {
        if self.failing() {
            return Err(StoreError::ReadFailed {
                key: key.name().to_string(),
                message: "store offline".to_string(),
            });
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: StoreKey, value: String) -> Result<()> {
        if self.failing() {
            return Err(StoreError::WriteFailed {
                key: key.name().to_string(),
                message: "store offline".to_string(),
            });
        }
        self.inner.set(key, value).await
    }
}

/// Convenience alias for a shared store handle
pub type SharedStore = Arc<dyn StateStore>;
