//! Service Module
//!
//! Business logic layer for the orchestrator: the testing job compiler and
//! the environment merge engine.

pub mod env;
pub mod job;

pub use env as env_service;
pub use job as job_service;
