use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::config::Config;

pub async fn create_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .connect(&config.database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Catalog documents, keyed by the id the compiler looks them up by
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS testings (
            name VARCHAR(255) PRIMARY KEY,
            project_name VARCHAR(255) NOT NULL DEFAULT '',
            doc JSONB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    for table in ["basic_images", "registry_namespaces", "k8s_clusters"] {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id VARCHAR(255) PRIMARY KEY,
                doc JSONB NOT NULL
            )
            "#
        ))
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS s3_storages (
            id VARCHAR(255) PRIMARY KEY,
            is_default BOOLEAN NOT NULL DEFAULT FALSE,
            doc JSONB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Project templates and environments
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS template_products (
            product_name VARCHAR(255) PRIMARY KEY,
            doc JSONB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            product_name VARCHAR(255) NOT NULL,
            env_name VARCHAR(255) NOT NULL,
            production BOOLEAN NOT NULL DEFAULT FALSE,
            update_time BIGINT NOT NULL DEFAULT 0,
            doc JSONB NOT NULL,
            PRIMARY KEY (product_name, env_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS env_service_versions (
            id UUID PRIMARY KEY,
            product_name VARCHAR(255) NOT NULL,
            env_name VARCHAR(255) NOT NULL,
            production BOOLEAN NOT NULL,
            service_name VARCHAR(255) NOT NULL,
            release_name VARCHAR(255) NOT NULL,
            revision BIGINT NOT NULL,
            doc JSONB NOT NULL,
            created_by VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_s3_storages_default ON s3_storages(is_default)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_env_service_versions_env ON env_service_versions(product_name, env_name, created_at DESC)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
