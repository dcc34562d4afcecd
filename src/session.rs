//! Per-session memo of loaded (module, tier) pairs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::budget::BudgetTracker;
use crate::error::{KrError, Result};

/// Records the highest tier level loaded per module within one session.
///
/// Levels only ever increase; re-recording a lower or equal level is a
/// no-op. This is what makes re-resolution idempotent: a second plan for the
/// same candidates contains only the delta.
#[derive(Debug, Clone, Default)]
pub struct SessionCache {
    loaded: HashMap<String, u8>,
}

impl SessionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn already_loaded_at_least(&self, module_id: &str, level: u8) -> bool {
        self.loaded
            .get(module_id)
            .is_some_and(|&loaded| loaded >= level)
    }

    pub fn record_loaded(&mut self, module_id: &str, level: u8) {
        let entry = self.loaded.entry(module_id.to_string()).or_insert(0);
        if level > *entry {
            *entry = level;
        }
    }

    /// Highest level loaded for `module_id`, if any.
    #[must_use]
    pub fn loaded_level(&self, module_id: &str) -> Option<u8> {
        self.loaded.get(module_id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

/// Serializable snapshot of one session's cache and budget, used by the CLI
/// to carry a session across process invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub ceiling: u64,
    pub consumed: u64,
    #[serde(default)]
    pub loaded: HashMap<String, u8>,
}

impl SessionState {
    #[must_use]
    pub fn snapshot(cache: &SessionCache, budget: &BudgetTracker) -> Self {
        Self {
            ceiling: budget.ceiling(),
            consumed: budget.consumed(),
            loaded: cache.loaded.clone(),
        }
    }

    pub fn restore(self) -> Result<(SessionCache, BudgetTracker)> {
        let budget = BudgetTracker::restore(self.ceiling, self.consumed)?;
        Ok((SessionCache { loaded: self.loaded }, budget))
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            KrError::SessionState(format!("read state {}: {err}", path.display()))
        })?;
        serde_json::from_str(&raw)
            .map_err(|err| KrError::SessionState(format!("parse state {}: {err}", path.display())))
    }

    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)
            .map_err(|err| KrError::SessionState(format!("serialize state: {err}")))?;
        std::fs::write(path, raw).map_err(|err| {
            KrError::SessionState(format!("write state {}: {err}", path.display()))
        })
    }
}
