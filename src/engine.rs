//! Resolution engine façade.
//!
//! Owns the shared read-mostly store and graph plus a registry of
//! per-session (cache, budget) pairs. A session resolves serially against
//! its own state; independent sessions resolve in parallel without
//! coordination beyond the store's single-flight content cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::budget::BudgetTracker;
use crate::graph::DependencyGraph;
use crate::resolver::{Candidate, LoadPlan, Resolver};
use crate::session::{SessionCache, SessionState};
use crate::store::ModuleStore;

pub struct ResolutionEngine {
    store: Arc<ModuleStore>,
    graph: Arc<DependencyGraph>,
    default_ceiling: u64,
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

struct Session {
    cache: SessionCache,
    budget: BudgetTracker,
}

impl ResolutionEngine {
    #[must_use]
    pub fn new(store: Arc<ModuleStore>, graph: Arc<DependencyGraph>, default_ceiling: u64) -> Self {
        Self {
            store,
            graph,
            default_ceiling,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &ModuleStore {
        &self.store
    }

    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Resolve `candidates` for `session_id`, creating the session with the
    /// default ceiling on first use. The task description is carried for
    /// logging only; candidate scoring happened upstream.
    pub fn resolve(&self, session_id: &str, task: &str, candidates: &[Candidate]) -> LoadPlan {
        let session = self.session_handle(session_id, self.default_ceiling);

        // Hold only this session's lock during resolution; other sessions
        // proceed concurrently.
        let mut session = session.lock();
        info!(
            target: "engine",
            session = session_id,
            task,
            candidates = candidates.len(),
            "resolving"
        );
        let resolver = Resolver::new(&self.store, &self.graph);
        let Session { cache, budget } = &mut *session;
        resolver.resolve(candidates, cache, budget)
    }

    /// Open (or reuse) a session with an explicit budget ceiling. The
    /// ceiling applies only when the session does not already exist.
    pub fn open_session(&self, session_id: &str, ceiling: u64) {
        self.session_handle(session_id, ceiling);
    }

    /// Destroy a session, discarding its cache and budget.
    pub fn end_session(&self, session_id: &str) {
        if self.sessions.lock().remove(session_id).is_some() {
            debug!(target: "engine", session = session_id, "session ended");
        }
    }

    /// Snapshot a session's state for persistence. None if it never resolved.
    #[must_use]
    pub fn session_state(&self, session_id: &str) -> Option<SessionState> {
        let session = self.sessions.lock().get(session_id).cloned()?;
        let session = session.lock();
        Some(SessionState::snapshot(&session.cache, &session.budget))
    }

    /// Recreate a session from persisted state, replacing any existing
    /// session with the same id.
    pub fn restore_session(&self, session_id: &str, state: SessionState) -> crate::Result<()> {
        let (cache, budget) = state.restore()?;
        self.sessions.lock().insert(
            session_id.to_string(),
            Arc::new(Mutex::new(Session { cache, budget })),
        );
        Ok(())
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    fn session_handle(&self, session_id: &str, ceiling: u64) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock();
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!(target: "engine", session = session_id, ceiling, "session opened");
                Arc::new(Mutex::new(Session {
                    cache: SessionCache::new(),
                    budget: BudgetTracker::new(ceiling),
                }))
            })
            .clone()
    }
}
