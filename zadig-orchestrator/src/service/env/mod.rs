//! Environment Service
//!
//! Merges Helm service changes into persisted environments. Service entities
//! are classified as native or imported ([`classifier`]), regrouped after the
//! project template ([`reconciler`]) and written under the environment lock
//! ([`committer`]).

pub mod classifier;
pub mod committer;
pub mod lock;
pub mod reconciler;
pub mod scope;

use crate::error::EnvError;

pub use classifier::ServiceSet;
pub use committer::{EnvironmentService, ServicesUpdate};
pub use lock::{NamedLockGuard, NamedLocks, env_lock_key};
pub use scope::EnvScope;

pub type Result<T> = std::result::Result<T, EnvError>;
