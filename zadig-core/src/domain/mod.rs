//! Core domain types
//!
//! This module contains the core domain structures used across Zadig services.
//! These types represent the user-authored workflow graph, the read-only catalog,
//! the compiled tasks handed to the scheduler and the persisted environments.

pub mod catalog;
pub mod environment;
pub mod repo;
pub mod task;
pub mod vars;
pub mod workflow;
