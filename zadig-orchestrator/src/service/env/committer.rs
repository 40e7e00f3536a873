//! Transactional committer
//!
//! Every write to an environment's service list runs inside an [`EnvScope`]:
//! the environment lock is held, the current document is read inside the
//! transaction, and the reconciled result is written back or discarded as a
//! whole.

use zadig_core::domain::environment::{EnvServiceVersion, Product, ProductService};

use super::Result;
use super::classifier::ServiceSet;
use super::lock::NamedLocks;
use super::reconciler::{reconcile, reconcile_group};
use super::scope::EnvScope;
use crate::error::EnvError;
use crate::repository::{EnvironmentRepository, EnvironmentTx, unix_now};

/// A proposed change to an environment's grouped services
#[derive(Debug, Clone)]
pub enum ServicesUpdate {
    /// Replace every group
    All(Vec<Vec<ProductService>>),
    /// Replace the group at `index`
    Group {
        index: usize,
        group: Vec<ProductService>,
    },
}

/// Merges service changes into persisted environments
pub struct EnvironmentService<R: EnvironmentRepository> {
    repo: R,
    locks: NamedLocks,
}

impl<R: EnvironmentRepository> EnvironmentService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_locks(repo, NamedLocks::new())
    }

    /// Shares `locks` with other services writing the same environments
    pub fn with_locks(repo: R, locks: NamedLocks) -> Self {
        Self { repo, locks }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Updates one service of an environment
    ///
    /// `product` only identifies the environment and selects the template
    /// variant; the services themselves are re-read inside the transaction.
    /// Failing to record the service version is logged and does not abort the
    /// update.
    pub async fn update_service_in_env(
        &self,
        product: &Product,
        service: &ProductService,
        user: &str,
    ) -> Result<Product> {
        let mut product = product.clone();
        product.lint_services();
        let mut service = service.clone();
        lint_service(&mut service, &product.product_name);

        let mut scope =
            EnvScope::open(&self.repo, &self.locks, &product.product_name, &product.env_name).await?;
        let result = apply_service(scope.tx(), &product, service, user).await;
        let updated = scope.finish(result).await?;

        tracing::info!(
            "Service updated in environment {}/{}",
            updated.product_name,
            updated.env_name
        );
        Ok(updated)
    }

    /// Replaces every service group of an environment, reordered by the template
    pub async fn update_all_services_in_env(
        &self,
        product_name: &str,
        env_name: &str,
        services: &[Vec<ProductService>],
        production: bool,
    ) -> Result<Vec<Vec<ProductService>>> {
        let mut scope = EnvScope::open(&self.repo, &self.locks, product_name, env_name).await?;
        let result = apply_all(scope.tx(), product_name, env_name, services, production).await;
        scope.finish(result).await
    }

    /// Replaces one service group of an environment, reordered by the template
    pub async fn update_services_group_in_env(
        &self,
        product_name: &str,
        env_name: &str,
        index: usize,
        group: &[ProductService],
        production: bool,
    ) -> Result<Vec<ProductService>> {
        let mut scope = EnvScope::open(&self.repo, &self.locks, product_name, env_name).await?;
        let result = apply_group(scope.tx(), product_name, env_name, index, group, production).await;
        scope.finish(result).await
    }

    pub async fn commit(
        &self,
        product_name: &str,
        env_name: &str,
        production: bool,
        update: ServicesUpdate,
    ) -> Result<()> {
        match update {
            ServicesUpdate::All(services) => {
                self.update_all_services_in_env(product_name, env_name, &services, production)
                    .await?;
            }
            ServicesUpdate::Group { index, group } => {
                self.update_services_group_in_env(product_name, env_name, index, &group, production)
                    .await?;
            }
        }
        Ok(())
    }
}

fn lint_service(service: &mut ProductService, product_name: &str) {
    if service.product_name.is_empty() {
        service.product_name = product_name.to_string();
    }
    if service.is_native() && service.release_name.is_empty() {
        service.release_name = service.service_name.clone();
    }
}

/// Indexes caller-provided groups the way stored ones are linted
fn classify(product_name: &str, groups: Vec<Vec<ProductService>>) -> ServiceSet {
    let mut staged = Product {
        product_name: product_name.to_string(),
        services: groups,
        ..Default::default()
    };
    staged.lint_services();
    ServiceSet::from_groups(&staged.services)
}

async fn apply_service<T: EnvironmentTx>(
    tx: &mut T,
    product: &Product,
    mut service: ProductService,
    user: &str,
) -> Result<Product> {
    let version = EnvServiceVersion::new(product, &service, user);
    if let Err(e) = tx.create_service_version(&version).await {
        tracing::error!("Failed to create service version for {}: {}", service.key(), e);
    }

    let mut current = tx.find_product(&product.product_name, &product.env_name).await?;
    current.lint_services();
    let template = tx.find_template(&product.product_name).await?;

    let now = unix_now();
    service.update_time = now;
    let strategy = service.deploy_strategy.map(|s| (service.strategy_key(), s));

    let mut set = ServiceSet::from_groups(&current.services);
    set.upsert(service);
    current.services = reconcile(template.orchestration(product.production), &set);
    if let Some((key, strategy)) = strategy {
        current.service_deploy_strategy.insert(key, strategy);
    }
    current.update_time = now;

    tx.update_product(&current).await?;
    Ok(current)
}

async fn apply_all<T: EnvironmentTx>(
    tx: &mut T,
    product_name: &str,
    env_name: &str,
    services: &[Vec<ProductService>],
    production: bool,
) -> Result<Vec<Vec<ProductService>>> {
    let template = tx.find_template(product_name).await?;
    let set = classify(product_name, services.to_vec());
    let groups = reconcile(template.orchestration(production), &set);

    tx.update_all_services(product_name, env_name, &groups).await?;
    Ok(groups)
}

async fn apply_group<T: EnvironmentTx>(
    tx: &mut T,
    product_name: &str,
    env_name: &str,
    index: usize,
    group: &[ProductService],
    production: bool,
) -> Result<Vec<ProductService>> {
    let current = tx.find_product(product_name, env_name).await?;
    if index >= current.services.len() {
        return Err(EnvError::GroupIndexOutOfRange {
            index,
            groups: current.services.len(),
        });
    }

    let template = tx.find_template(product_name).await?;
    let set = classify(product_name, vec![group.to_vec()]);
    let group = reconcile_group(template.orchestration(production), &set);

    tx.update_services_group(product_name, env_name, index, &group).await?;
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryEnvironmentRepository;
    use std::sync::Arc;
    use zadig_core::domain::environment::{DeployStrategy, TemplateProduct};

    fn groups(names: &[&[&str]]) -> Vec<Vec<String>> {
        names
            .iter()
            .map(|g| g.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn keys(groups: &[Vec<ProductService>]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.iter().map(|s| s.key().to_string()).collect())
            .collect()
    }

    fn dev() -> Product {
        Product {
            product_name: "mall".to_string(),
            env_name: "dev".to_string(),
            namespace: "mall-dev".to_string(),
            services: vec![
                vec![ProductService::native("a"), ProductService::native("b")],
                vec![ProductService::native("c"), ProductService::imported("r")],
            ],
            ..Default::default()
        }
    }

    async fn service() -> EnvironmentService<InMemoryEnvironmentRepository> {
        let repo = InMemoryEnvironmentRepository::new();
        repo.insert_template(TemplateProduct {
            product_name: "mall".to_string(),
            services: groups(&[&["a", "b"], &["c"]]),
            production_services: groups(&[&["c"], &["b", "a"]]),
        })
        .await;
        repo.insert_product(dev()).await;
        EnvironmentService::new(repo)
    }

    #[tokio::test]
    async fn test_update_native_service() {
        let svc = service().await;
        let updated = ProductService {
            revision: 2,
            deploy_strategy: Some(DeployStrategy::Deploy),
            ..ProductService::native("b")
        };

        svc.update_service_in_env(&dev(), &updated, "alice").await.unwrap();

        let stored = svc.repository().product("mall", "dev").await.unwrap();
        assert_eq!(keys(&stored.services), vec![vec!["a", "b"], vec!["c", "r"]]);
        let b = &stored.services[0][1];
        assert_eq!(b.revision, 2);
        assert_eq!(b.product_name, "mall");
        assert!(b.update_time > 0);
        assert_eq!(
            stored.service_deploy_strategy.get("b"),
            Some(&DeployStrategy::Deploy)
        );

        let versions = svc.repository().service_versions().await;
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].created_by, "alice");
    }

    #[tokio::test]
    async fn test_import_replaces_native_service() {
        let svc = service().await;
        let imported = ProductService {
            deploy_strategy: Some(DeployStrategy::Import),
            ..ProductService::imported("c")
        };

        let updated = svc.update_service_in_env(&dev(), &imported, "bob").await.unwrap();

        assert_eq!(keys(&updated.services), vec![vec!["a", "b"], vec!["r", "c"]]);
        assert!(updated.services[1].iter().all(|s| !s.is_native()));
        assert_eq!(
            updated.service_deploy_strategy.get("chart:c"),
            Some(&DeployStrategy::Import)
        );
    }

    #[tokio::test]
    async fn test_version_failure_is_not_fatal() {
        let svc = service().await;
        svc.repository().fail_service_versions(true).await;

        let updated = svc
            .update_service_in_env(&dev(), &ProductService::native("a"), "alice")
            .await
            .unwrap();

        assert!(updated.services[0][0].update_time > 0);
        assert!(svc.repository().service_versions().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_template_aborts() {
        let repo = InMemoryEnvironmentRepository::new();
        repo.insert_product(dev()).await;
        let svc = EnvironmentService::new(repo);

        let result = svc
            .update_service_in_env(&dev(), &ProductService::native("z"), "alice")
            .await;

        assert!(matches!(result, Err(EnvError::Repository(e)) if e.is_not_found()));
        let stored = svc.repository().product("mall", "dev").await.unwrap();
        assert_eq!(stored.update_time, 0);
        assert!(svc.repository().service_versions().await.is_empty());
        assert!(svc.locks.is_empty());
    }

    #[tokio::test]
    async fn test_update_all_services_production_order() {
        let svc = service().await;
        let services = vec![vec![
            ProductService::native("a"),
            ProductService::imported("r"),
            ProductService::native("b"),
            ProductService::native("c"),
        ]];

        let groups = svc
            .update_all_services_in_env("mall", "dev", &services, true)
            .await
            .unwrap();

        assert_eq!(keys(&groups), vec![vec!["c"], vec!["b", "a", "r"]]);
        let stored = svc.repository().product("mall", "dev").await.unwrap();
        assert_eq!(keys(&stored.services), keys(&groups));
        assert_eq!(stored.services[0][0].product_name, "mall");
    }

    #[tokio::test]
    async fn test_update_services_group() {
        let svc = service().await;

        let result = svc
            .update_services_group_in_env("mall", "dev", 2, &[], false)
            .await;
        assert!(matches!(
            result,
            Err(EnvError::GroupIndexOutOfRange { index: 2, groups: 2 })
        ));

        svc.commit(
            "mall",
            "dev",
            false,
            ServicesUpdate::Group {
                index: 1,
                group: vec![ProductService::imported("s"), ProductService::native("c")],
            },
        )
        .await
        .unwrap();

        let stored = svc.repository().product("mall", "dev").await.unwrap();
        assert_eq!(keys(&stored.services), vec![vec!["a", "b"], vec!["c", "s"]]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_do_not_interleave() {
        let svc = Arc::new(service().await);
        let stale = dev();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let svc = svc.clone();
                let stale = stale.clone();
                tokio::spawn(async move {
                    let release = ProductService::imported(format!("rel-{}", i));
                    svc.update_service_in_env(&stale, &release, "sync").await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = svc.repository().product("mall", "dev").await.unwrap();
        let imports = stored.services[1].iter().filter(|s| !s.is_native()).count();
        assert_eq!(imports, 17);
        assert_eq!(svc.repository().service_versions().await.len(), 16);
        assert!(svc.locks.is_empty());
    }
}
