//! Zadig Core
//!
//! Core types shared by the job compiler and the environment merge engine.
//!
//! This crate contains:
//! - Workflow graph types with one typed spec per job kind
//! - Catalog definitions (test suites, clusters, registries, object storage)
//! - The compiled task model consumed by the execution scheduler
//! - Persisted environment documents
//!
//! Note: Persistence and compilation logic live in the orchestrator.

pub mod domain;
