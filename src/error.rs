use thiserror::Error;

/// Errors surfaced by kr.
///
/// Configuration problems (bad manifests, cycles, missing content) are fatal
/// and abort startup. Budget rejections and unknown candidate ids are not
/// errors at all; they come back as data inside a
/// [`LoadPlan`](crate::resolver::LoadPlan).
#[derive(Debug, Error)]
pub enum KrError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid manifest for module '{id}': {message}")]
    InvalidManifest { id: String, message: String },

    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("module '{from}' requires '{to}', which is not in the store")]
    UnknownDependency { from: String, to: String },

    #[error("module not found: {0}")]
    ModuleNotFound(String),

    #[error("tier {level} not found for module '{id}'")]
    TierNotFound { id: String, level: u8 },

    #[error("session state error: {0}")]
    SessionState(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KrError>;
