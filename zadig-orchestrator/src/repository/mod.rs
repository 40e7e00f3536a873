//! Repository Module
//!
//! Data access layer for the orchestrator. The job compiler reads the catalog
//! through [`CatalogRepository`]; the environment merge engine mutates
//! environment documents inside an [`EnvironmentTx`].
//!
//! All repositories are trait-based so the services can run against the
//! in-memory implementations in tests.

pub mod catalog;
pub mod environment;
pub mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use zadig_core::domain::catalog::{BasicImage, K8sCluster, RegistryNamespace, S3Storage, TestingInfo};
use zadig_core::domain::environment::{EnvServiceVersion, Product, ProductService, TemplateProduct};

use crate::error::RepositoryError;

pub use catalog::PgCatalogRepository;
pub use environment::{PgEnvironmentRepository, PgEnvironmentTx};
pub use memory::{InMemoryCatalog, InMemoryEnvironmentRepository, InMemoryEnvironmentTx};

/// Read-only access to user-authored catalog definitions
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Finds a test suite definition by name
    async fn find_testing(&self, name: &str) -> Result<TestingInfo, RepositoryError>;

    /// Lists the test suite definitions with the given names
    ///
    /// Names without a definition are silently absent from the result.
    async fn list_testings(&self, names: &[String]) -> Result<Vec<TestingInfo>, RepositoryError>;

    async fn find_basic_image(&self, id: &str) -> Result<BasicImage, RepositoryError>;

    async fn list_registries(&self) -> Result<Vec<RegistryNamespace>, RepositoryError>;

    async fn find_cluster(&self, id: &str) -> Result<K8sCluster, RepositoryError>;

    /// Finds the object storage flagged as the system default
    async fn find_default_object_store(&self) -> Result<S3Storage, RepositoryError>;

    async fn find_object_store(&self, id: &str) -> Result<S3Storage, RepositoryError>;
}

/// Opens transactions over environment documents
#[async_trait]
pub trait EnvironmentRepository: Send + Sync {
    type Tx: EnvironmentTx;

    /// Begins a transaction serialized with every other transaction on `lock_key`
    /// by the storage backend itself
    async fn begin(&self, lock_key: &str) -> Result<Self::Tx, RepositoryError>;
}

/// One storage transaction over environment documents
///
/// Dropping a transaction without calling [`EnvironmentTx::commit`] discards
/// every write made through it.
#[async_trait]
pub trait EnvironmentTx: Send + Sized {
    async fn find_template(&mut self, product_name: &str) -> Result<TemplateProduct, RepositoryError>;

    async fn find_product(
        &mut self,
        product_name: &str,
        env_name: &str,
    ) -> Result<Product, RepositoryError>;

    async fn update_product(&mut self, product: &Product) -> Result<(), RepositoryError>;

    async fn update_all_services(
        &mut self,
        product_name: &str,
        env_name: &str,
        services: &[Vec<ProductService>],
    ) -> Result<(), RepositoryError>;

    async fn update_services_group(
        &mut self,
        product_name: &str,
        env_name: &str,
        index: usize,
        group: &[ProductService],
    ) -> Result<(), RepositoryError>;

    async fn create_service_version(
        &mut self,
        version: &EnvServiceVersion,
    ) -> Result<(), RepositoryError>;

    async fn commit(self) -> Result<(), RepositoryError>;

    async fn abort(self) -> Result<(), RepositoryError>;
}

/// A single JSONB document column
#[derive(sqlx::FromRow)]
struct DocumentRow {
    doc: serde_json::Value,
}

impl DocumentRow {
    fn decode<T: DeserializeOwned>(self) -> Result<T, RepositoryError> {
        Ok(serde_json::from_value(self.doc)?)
    }
}

/// Current time as unix seconds, the unit environment documents are stamped in
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
