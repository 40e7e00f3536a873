//! In-memory repositories
//!
//! Used by the test suites and by `compile --catalog <file>` to run the
//! compiler without a database.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use zadig_core::domain::catalog::{BasicImage, K8sCluster, RegistryNamespace, S3Storage, TestingInfo};
use zadig_core::domain::environment::{EnvServiceVersion, Product, ProductService, TemplateProduct};

use super::{CatalogRepository, EnvironmentRepository, EnvironmentTx, unix_now};
use crate::error::RepositoryError;

// =============================================================================
// Catalog
// =============================================================================

/// Catalog held entirely in memory
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InMemoryCatalog {
    testings: Vec<TestingInfo>,
    basic_images: Vec<BasicImage>,
    registries: Vec<RegistryNamespace>,
    clusters: Vec<K8sCluster>,
    object_stores: Vec<S3Storage>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_testing(mut self, testing: TestingInfo) -> Self {
        self.testings.retain(|t| t.name != testing.name);
        self.testings.push(testing);
        self
    }

    pub fn with_basic_image(mut self, image: BasicImage) -> Self {
        self.basic_images.push(image);
        self
    }

    pub fn with_registry(mut self, registry: RegistryNamespace) -> Self {
        self.registries.push(registry);
        self
    }

    pub fn with_cluster(mut self, cluster: K8sCluster) -> Self {
        self.clusters.push(cluster);
        self
    }

    pub fn with_object_store(mut self, storage: S3Storage) -> Self {
        self.object_stores.push(storage);
        self
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn find_testing(&self, name: &str) -> Result<TestingInfo, RepositoryError> {
        self.testings
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("testing", name))
    }

    async fn list_testings(&self, names: &[String]) -> Result<Vec<TestingInfo>, RepositoryError> {
        let mut seen = HashSet::new();
        Ok(names
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .filter_map(|name| self.testings.iter().find(|t| &t.name == name))
            .cloned()
            .collect())
    }

    async fn find_basic_image(&self, id: &str) -> Result<BasicImage, RepositoryError> {
        self.basic_images
            .iter()
            .find(|image| image.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("basic image", id))
    }

    async fn list_registries(&self) -> Result<Vec<RegistryNamespace>, RepositoryError> {
        Ok(self.registries.clone())
    }

    async fn find_cluster(&self, id: &str) -> Result<K8sCluster, RepositoryError> {
        self.clusters
            .iter()
            .find(|cluster| cluster.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("cluster", id))
    }

    async fn find_default_object_store(&self) -> Result<S3Storage, RepositoryError> {
        self.object_stores
            .iter()
            .find(|storage| storage.is_default)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("default object storage", ""))
    }

    async fn find_object_store(&self, id: &str) -> Result<S3Storage, RepositoryError> {
        self.object_stores
            .iter()
            .find(|storage| storage.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("object storage", id))
    }
}

// =============================================================================
// Environments
// =============================================================================

type ProductKey = (String, String);

fn product_key(product_name: &str, env_name: &str) -> ProductKey {
    (product_name.to_string(), env_name.to_string())
}

fn environment_not_found(product_name: &str, env_name: &str) -> RepositoryError {
    RepositoryError::not_found("environment", format!("{}/{}", product_name, env_name))
}

#[derive(Debug, Default)]
struct EnvState {
    templates: HashMap<String, TemplateProduct>,
    products: HashMap<ProductKey, Product>,
    versions: Vec<EnvServiceVersion>,
    fail_service_versions: bool,
}

/// Environment store held in memory
///
/// A transaction stages the environment documents it touches and the version
/// records it writes; commit publishes only those. Writers to the same
/// environment must be serialized by the caller.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEnvironmentRepository {
    state: Arc<Mutex<EnvState>>,
}

impl InMemoryEnvironmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_template(&self, template: TemplateProduct) {
        let mut state = self.state.lock().await;
        state
            .templates
            .insert(template.product_name.clone(), template);
    }

    pub async fn insert_product(&self, product: Product) {
        let mut state = self.state.lock().await;
        state.products.insert(
            product_key(&product.product_name, &product.env_name),
            product,
        );
    }

    pub async fn product(&self, product_name: &str, env_name: &str) -> Option<Product> {
        let state = self.state.lock().await;
        state
            .products
            .get(&product_key(product_name, env_name))
            .cloned()
    }

    pub async fn service_versions(&self) -> Vec<EnvServiceVersion> {
        self.state.lock().await.versions.clone()
    }

    /// Makes every service version write fail
    pub async fn fail_service_versions(&self, fail: bool) {
        self.state.lock().await.fail_service_versions = fail;
    }
}

#[async_trait]
impl EnvironmentRepository for InMemoryEnvironmentRepository {
    type Tx = InMemoryEnvironmentTx;

    async fn begin(&self, _lock_key: &str) -> Result<InMemoryEnvironmentTx, RepositoryError> {
        Ok(InMemoryEnvironmentTx {
            store: self.state.clone(),
            products: HashMap::new(),
            versions: Vec::new(),
        })
    }
}

pub struct InMemoryEnvironmentTx {
    store: Arc<Mutex<EnvState>>,
    products: HashMap<ProductKey, Product>,
    versions: Vec<EnvServiceVersion>,
}

impl InMemoryEnvironmentTx {
    /// Staged copy of an environment, loaded from the store on first access
    async fn product_mut(
        &mut self,
        product_name: &str,
        env_name: &str,
    ) -> Result<&mut Product, RepositoryError> {
        match self.products.entry(product_key(product_name, env_name)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let stored = self
                    .store
                    .lock()
                    .await
                    .products
                    .get(entry.key())
                    .cloned()
                    .ok_or_else(|| environment_not_found(product_name, env_name))?;
                Ok(entry.insert(stored))
            }
        }
    }
}

#[async_trait]
impl EnvironmentTx for InMemoryEnvironmentTx {
    async fn find_template(&mut self, product_name: &str) -> Result<TemplateProduct, RepositoryError> {
        self.store
            .lock()
            .await
            .templates
            .get(product_name)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("project template", product_name))
    }

    async fn find_product(
        &mut self,
        product_name: &str,
        env_name: &str,
    ) -> Result<Product, RepositoryError> {
        // Let concurrent writers run between the read and the write
        tokio::task::yield_now().await;
        Ok(self.product_mut(product_name, env_name).await?.clone())
    }

    async fn update_product(&mut self, product: &Product) -> Result<(), RepositoryError> {
        let stored = self
            .product_mut(&product.product_name, &product.env_name)
            .await?;
        *stored = product.clone();
        Ok(())
    }

    async fn update_all_services(
        &mut self,
        product_name: &str,
        env_name: &str,
        services: &[Vec<ProductService>],
    ) -> Result<(), RepositoryError> {
        let stored = self.product_mut(product_name, env_name).await?;
        stored.services = services.to_vec();
        stored.update_time = unix_now();
        Ok(())
    }

    async fn update_services_group(
        &mut self,
        product_name: &str,
        env_name: &str,
        index: usize,
        group: &[ProductService],
    ) -> Result<(), RepositoryError> {
        let stored = self.product_mut(product_name, env_name).await?;
        let Some(slot) = stored.services.get_mut(index) else {
            return Err(RepositoryError::not_found(
                "service group",
                format!("{}/{}[{}]", product_name, env_name, index),
            ));
        };
        *slot = group.to_vec();
        stored.update_time = unix_now();
        Ok(())
    }

    async fn create_service_version(
        &mut self,
        version: &EnvServiceVersion,
    ) -> Result<(), RepositoryError> {
        if self.store.lock().await.fail_service_versions {
            return Err(RepositoryError::Database(sqlx::Error::PoolClosed));
        }
        self.versions.push(version.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        let mut state = self.store.lock().await;
        state.products.extend(self.products);
        state.versions.extend(self.versions);
        Ok(())
    }

    async fn abort(self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catalog_lookups() {
        let catalog = InMemoryCatalog::new()
            .with_testing(TestingInfo {
                name: "smoke".to_string(),
                ..Default::default()
            })
            .with_object_store(S3Storage {
                id: "s3-1".to_string(),
                is_default: true,
                ..Default::default()
            });

        assert_eq!(catalog.find_testing("smoke").await.unwrap().name, "smoke");
        assert!(catalog.find_testing("missing").await.unwrap_err().is_not_found());
        assert_eq!(catalog.find_default_object_store().await.unwrap().id, "s3-1");

        let listed = catalog
            .list_testings(&["missing".to_string(), "smoke".to_string()])
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);

        let listed = catalog
            .list_testings(&["smoke".to_string(), "smoke".to_string()])
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_uncommitted_tx_is_discarded() {
        let repo = InMemoryEnvironmentRepository::new();
        repo.insert_product(Product {
            product_name: "mall".to_string(),
            env_name: "dev".to_string(),
            ..Default::default()
        })
        .await;

        let mut tx = repo.begin("k").await.unwrap();
        tx.update_all_services("mall", "dev", &[vec![ProductService::native("api")]])
            .await
            .unwrap();
        drop(tx);
        assert!(repo.product("mall", "dev").await.unwrap().services.is_empty());

        let mut tx = repo.begin("k").await.unwrap();
        tx.update_all_services("mall", "dev", &[vec![ProductService::native("api")]])
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(repo.product("mall", "dev").await.unwrap().services.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_txs_on_different_envs_both_commit() {
        let repo = InMemoryEnvironmentRepository::new();
        for env_name in ["dev", "qa"] {
            repo.insert_product(Product {
                product_name: "mall".to_string(),
                env_name: env_name.to_string(),
                services: vec![vec![]],
                ..Default::default()
            })
            .await;
        }

        let mut dev = repo.begin("mall/dev").await.unwrap();
        let mut qa = repo.begin("mall/qa").await.unwrap();
        dev.update_services_group("mall", "dev", 0, &[ProductService::native("api")])
            .await
            .unwrap();
        qa.update_services_group("mall", "qa", 0, &[ProductService::native("web")])
            .await
            .unwrap();
        let product = dev.find_product("mall", "dev").await.unwrap();
        dev.create_service_version(&EnvServiceVersion::new(&product, &product.services[0][0], "ci"))
            .await
            .unwrap();
        let product = qa.find_product("mall", "qa").await.unwrap();
        qa.create_service_version(&EnvServiceVersion::new(&product, &product.services[0][0], "ci"))
            .await
            .unwrap();

        dev.commit().await.unwrap();
        qa.commit().await.unwrap();

        let dev = repo.product("mall", "dev").await.unwrap();
        assert_eq!(dev.services[0][0].service_name, "api");
        let qa = repo.product("mall", "qa").await.unwrap();
        assert_eq!(qa.services[0][0].service_name, "web");
        assert_eq!(repo.service_versions().await.len(), 2);
    }
}
