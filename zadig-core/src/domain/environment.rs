//! Environment domain types
//!
//! An environment (product) document records which services run in one
//! project + environment pair, grouped and ordered after the project
//! template's orchestration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Prefix of deploy-strategy keys that belong to imported chart releases
pub const CHART_STRATEGY_PREFIX: &str = "chart:";

/// How a service entered the environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Provisioned from a tracked service template, keyed by service name
    #[default]
    Native,
    /// Installed directly from a chart and only tracked, keyed by release name
    Imported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployStrategy {
    Deploy,
    Import,
}

/// One service running inside an environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductService {
    pub service_name: String,
    pub release_name: String,
    pub product_name: String,
    pub kind: ServiceKind,
    pub revision: i64,
    pub deploy_strategy: Option<DeployStrategy>,
    pub update_time: i64,
}

impl ProductService {
    pub fn native(service_name: impl Into<String>) -> Self {
        let service_name = service_name.into();
        Self {
            release_name: service_name.clone(),
            service_name,
            kind: ServiceKind::Native,
            ..Default::default()
        }
    }

    pub fn imported(release_name: impl Into<String>) -> Self {
        Self {
            release_name: release_name.into(),
            kind: ServiceKind::Imported,
            ..Default::default()
        }
    }

    pub fn is_native(&self) -> bool {
        self.kind == ServiceKind::Native
    }

    /// Identity key: service name for native services, release name otherwise
    pub fn key(&self) -> &str {
        match self.kind {
            ServiceKind::Native => &self.service_name,
            ServiceKind::Imported => &self.release_name,
        }
    }

    /// Key under which the environment records this service's deploy strategy
    pub fn strategy_key(&self) -> String {
        match self.kind {
            ServiceKind::Native => self.service_name.clone(),
            ServiceKind::Imported => format!("{}{}", CHART_STRATEGY_PREFIX, self.release_name),
        }
    }
}

/// Persisted environment document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    pub product_name: String,
    pub env_name: String,
    pub namespace: String,
    pub production: bool,
    pub services: Vec<Vec<ProductService>>,
    pub service_deploy_strategy: BTreeMap<String, DeployStrategy>,
    pub update_time: i64,
}

impl Product {
    /// Normalizes the grouped services before they are indexed
    ///
    /// Every service is stamped with the owning product name and native services
    /// without a release name default to their service name.
    pub fn lint_services(&mut self) {
        for service in self.services.iter_mut().flatten() {
            if service.product_name.is_empty() {
                service.product_name = self.product_name.clone();
            }
            if service.is_native() && service.release_name.is_empty() {
                service.release_name = service.service_name.clone();
            }
        }
    }

    pub fn all_services(&self) -> impl Iterator<Item = &ProductService> {
        self.services.iter().flatten()
    }
}

/// Project template holding the canonical service orchestration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateProduct {
    pub product_name: String,
    pub services: Vec<Vec<String>>,
    pub production_services: Vec<Vec<String>>,
}

impl TemplateProduct {
    /// Orchestration for the test or production variant of the project
    pub fn orchestration(&self, production: bool) -> &[Vec<String>] {
        if production {
            &self.production_services
        } else {
            &self.services
        }
    }
}

/// History record of a service revision deployed into an environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvServiceVersion {
    pub id: Uuid,
    pub product_name: String,
    pub env_name: String,
    pub production: bool,
    pub service: ProductService,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl EnvServiceVersion {
    pub fn new(product: &Product, service: &ProductService, user: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_name: product.product_name.clone(),
            env_name: product.env_name.clone(),
            production: product.production,
            service: service.clone(),
            created_by: user.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_keys() {
        assert_eq!(ProductService::native("api").strategy_key(), "api");
        assert_eq!(ProductService::imported("redis").strategy_key(), "chart:redis");
    }

    #[test]
    fn test_lint_services_fills_product_and_release() {
        let mut product = Product {
            product_name: "mall".to_string(),
            services: vec![vec![ProductService {
                service_name: "api".to_string(),
                ..Default::default()
            }]],
            ..Default::default()
        };
        product.lint_services();

        let service = &product.services[0][0];
        assert_eq!(service.product_name, "mall");
        assert_eq!(service.release_name, "api");
    }

    #[test]
    fn test_template_orchestration_variant() {
        let template = TemplateProduct {
            product_name: "mall".to_string(),
            services: vec![vec!["a".to_string()]],
            production_services: vec![vec!["b".to_string()], vec!["c".to_string()]],
        };
        assert_eq!(template.orchestration(false).len(), 1);
        assert_eq!(template.orchestration(true).len(), 2);
    }
}
