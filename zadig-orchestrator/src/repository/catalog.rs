//! Catalog Repository
//!
//! Postgres-backed catalog. Every definition is stored as a JSONB document
//! next to the columns it is looked up by.

use async_trait::async_trait;
use sqlx::PgPool;
use zadig_core::domain::catalog::{BasicImage, K8sCluster, RegistryNamespace, S3Storage, TestingInfo};

use super::{CatalogRepository, DocumentRow};
use crate::error::RepositoryError;

#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_id(
        &self,
        table: &'static str,
        kind: &'static str,
        id: &str,
    ) -> Result<DocumentRow, RepositoryError> {
        sqlx::query_as::<_, DocumentRow>(&format!("SELECT doc FROM {table} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::not_found(kind, id))
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn find_testing(&self, name: &str) -> Result<TestingInfo, RepositoryError> {
        sqlx::query_as::<_, DocumentRow>("SELECT doc FROM testings WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::not_found("testing", name))?
            .decode()
    }

    async fn list_testings(&self, names: &[String]) -> Result<Vec<TestingInfo>, RepositoryError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT doc
            FROM testings
            WHERE name = ANY($1)
            ORDER BY array_position($1, name::text)
            "#,
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DocumentRow::decode).collect()
    }

    async fn find_basic_image(&self, id: &str) -> Result<BasicImage, RepositoryError> {
        self.find_by_id("basic_images", "basic image", id)
            .await?
            .decode()
    }

    async fn list_registries(&self) -> Result<Vec<RegistryNamespace>, RepositoryError> {
        let rows = sqlx::query_as::<_, DocumentRow>("SELECT doc FROM registry_namespaces ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(DocumentRow::decode).collect()
    }

    async fn find_cluster(&self, id: &str) -> Result<K8sCluster, RepositoryError> {
        self.find_by_id("k8s_clusters", "cluster", id).await?.decode()
    }

    async fn find_default_object_store(&self) -> Result<S3Storage, RepositoryError> {
        sqlx::query_as::<_, DocumentRow>(
            "SELECT doc FROM s3_storages WHERE is_default ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::not_found("default object storage", ""))?
        .decode()
    }

    async fn find_object_store(&self, id: &str) -> Result<S3Storage, RepositoryError> {
        self.find_by_id("s3_storages", "object storage", id)
            .await?
            .decode()
    }
}
