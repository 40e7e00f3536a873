//! Error types for the orchestrator

use thiserror::Error;
use zadig_core::domain::workflow::JobType;

/// Errors raised by the catalog and environment repositories
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The requested document does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Database query failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored document could not be encoded or decoded
    #[error("invalid document: {0}")]
    Document(#[from] serde_json::Error),
}

impl RepositoryError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors raised while resolving, linting or compiling a workflow job
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("job {job} is a {job_type} job, not a testing job")]
    UnexpectedJobType { job: String, job_type: JobType },

    /// No job with the referenced name exists in any stage
    #[error("referenced job {0} not found")]
    ReferencedJobNotFound(String),

    /// The referenced job does not run strictly before the referencing job
    #[error("can not quote job {referenced} in job {job}")]
    InvalidReference { job: String, referenced: String },

    /// A catalog lookup required for compilation failed
    #[error("failed to find {what}: {source}")]
    Lookup {
        what: String,
        #[source]
        source: RepositoryError,
    },
}

impl CompileError {
    /// Wraps a repository error with what was being looked up
    pub fn lookup(what: impl Into<String>) -> impl FnOnce(RepositoryError) -> Self {
        let what = what.into();
        move |source| Self::Lookup { what, source }
    }
}

/// Errors raised while merging service changes into an environment
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("service group index {index} out of range for {groups} groups")]
    GroupIndexOutOfRange { index: usize, groups: usize },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
