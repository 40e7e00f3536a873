//! Environment Repository
//!
//! Postgres-backed environment documents. Each transaction takes a
//! transaction-scoped advisory lock on the caller's lock key, so updates to
//! one environment are serialized across orchestrator processes as well.

use async_trait::async_trait;
use sqlx::{Connection, PgPool, Postgres, Transaction};
use zadig_core::domain::environment::{EnvServiceVersion, Product, ProductService, TemplateProduct};

use super::{DocumentRow, EnvironmentRepository, EnvironmentTx, unix_now};
use crate::error::RepositoryError;

#[derive(Clone)]
pub struct PgEnvironmentRepository {
    pool: PgPool,
}

impl PgEnvironmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnvironmentRepository for PgEnvironmentRepository {
    type Tx = PgEnvironmentTx;

    async fn begin(&self, lock_key: &str) -> Result<PgEnvironmentTx, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(lock_key)
            .execute(&mut *tx)
            .await?;

        tracing::debug!("Environment transaction started: {}", lock_key);
        Ok(PgEnvironmentTx { tx })
    }
}

/// Open Postgres transaction; rolled back when dropped uncommitted
pub struct PgEnvironmentTx {
    tx: Transaction<'static, Postgres>,
}

fn ensure_updated(
    rows_affected: u64,
    product_name: &str,
    env_name: &str,
) -> Result<(), RepositoryError> {
    if rows_affected == 0 {
        return Err(RepositoryError::not_found(
            "environment",
            format!("{}/{}", product_name, env_name),
        ));
    }
    Ok(())
}

#[async_trait]
impl EnvironmentTx for PgEnvironmentTx {
    async fn find_template(&mut self, product_name: &str) -> Result<TemplateProduct, RepositoryError> {
        sqlx::query_as::<_, DocumentRow>("SELECT doc FROM template_products WHERE product_name = $1")
            .bind(product_name)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| RepositoryError::not_found("project template", product_name))?
            .decode()
    }

    async fn find_product(
        &mut self,
        product_name: &str,
        env_name: &str,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT doc
            FROM products
            WHERE product_name = $1 AND env_name = $2
            FOR UPDATE
            "#,
        )
        .bind(product_name)
        .bind(env_name)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| {
            RepositoryError::not_found("environment", format!("{}/{}", product_name, env_name))
        })?
        .decode()
    }

    async fn update_product(&mut self, product: &Product) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET doc = $3, production = $4, update_time = $5
            WHERE product_name = $1 AND env_name = $2
            "#,
        )
        .bind(&product.product_name)
        .bind(&product.env_name)
        .bind(serde_json::to_value(product)?)
        .bind(product.production)
        .bind(product.update_time)
        .execute(&mut *self.tx)
        .await?;

        ensure_updated(result.rows_affected(), &product.product_name, &product.env_name)
    }

    async fn update_all_services(
        &mut self,
        product_name: &str,
        env_name: &str,
        services: &[Vec<ProductService>],
    ) -> Result<(), RepositoryError> {
        let now = unix_now();
        let result = sqlx::query(
            r#"
            UPDATE products
            SET doc = jsonb_set(jsonb_set(doc, '{services}', $3::jsonb), '{update_time}', to_jsonb($4::bigint)),
                update_time = $4
            WHERE product_name = $1 AND env_name = $2
            "#,
        )
        .bind(product_name)
        .bind(env_name)
        .bind(serde_json::to_value(services)?)
        .bind(now)
        .execute(&mut *self.tx)
        .await?;

        ensure_updated(result.rows_affected(), product_name, env_name)
    }

    async fn update_services_group(
        &mut self,
        product_name: &str,
        env_name: &str,
        index: usize,
        group: &[ProductService],
    ) -> Result<(), RepositoryError> {
        let now = unix_now();
        let result = sqlx::query(
            r#"
            UPDATE products
            SET doc = jsonb_set(jsonb_set(doc, ARRAY['services', $3::text], $4::jsonb), '{update_time}', to_jsonb($5::bigint)),
                update_time = $5
            WHERE product_name = $1 AND env_name = $2
            "#,
        )
        .bind(product_name)
        .bind(env_name)
        .bind(index.to_string())
        .bind(serde_json::to_value(group)?)
        .bind(now)
        .execute(&mut *self.tx)
        .await?;

        ensure_updated(result.rows_affected(), product_name, env_name)
    }

    /// Runs inside a savepoint so a failed insert leaves the transaction usable
    async fn create_service_version(
        &mut self,
        version: &EnvServiceVersion,
    ) -> Result<(), RepositoryError> {
        let mut savepoint = Connection::begin(&mut *self.tx).await?;
        sqlx::query(
            r#"
            INSERT INTO env_service_versions
                (id, product_name, env_name, production, service_name, release_name,
                 revision, doc, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(version.id)
        .bind(&version.product_name)
        .bind(&version.env_name)
        .bind(version.production)
        .bind(&version.service.service_name)
        .bind(&version.service.release_name)
        .bind(version.service.revision)
        .bind(serde_json::to_value(version)?)
        .bind(&version.created_by)
        .bind(version.created_at)
        .execute(&mut *savepoint)
        .await?;

        savepoint.commit().await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn abort(self) -> Result<(), RepositoryError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
