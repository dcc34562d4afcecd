//! kr - tiered knowledge-module resolution.
//!
//! Given a task and an externally scored candidate list, kr decides which
//! knowledge modules, and which disclosure tier of each, fit into a bounded
//! context budget: dependency expansion, prefix-closed tier selection,
//! at-most-once loading per session.

pub mod app;
pub mod budget;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod resolver;
pub mod session;
pub mod store;

pub use budget::BudgetTracker;
pub use engine::ResolutionEngine;
pub use error::{KrError, Result};
pub use graph::DependencyGraph;
pub use manifest::{ModuleKind, ModuleManifest, TierSpec};
pub use resolver::{Candidate, LoadEntry, LoadPlan, RejectReason, RejectedCandidate, Resolver};
pub use session::{SessionCache, SessionState};
pub use store::ModuleStore;
