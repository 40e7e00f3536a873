//! Zadig orchestrator
//!
//! Compiles testing jobs of a workflow into executable tasks and merges Helm
//! service changes into persisted environments.

pub mod config;
pub mod db;
pub mod error;
pub mod repository;
pub mod service;
