//! Service classification
//!
//! An environment tracks native services by service name and imported chart
//! releases by release name. [`ServiceSet`] keeps both in one list with an
//! explicit kind, so a logical service never exists under both keys.

use zadig_core::domain::environment::{ProductService, ServiceKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSet {
    services: Vec<ProductService>,
}

impl ServiceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes grouped services as stored in an environment
    ///
    /// A later entry with the same kind and key replaces an earlier one.
    pub fn from_groups(groups: &[Vec<ProductService>]) -> Self {
        let mut set = Self::new();
        for service in groups.iter().flatten() {
            set.insert(service.clone());
        }
        set
    }

    pub fn native(&self, service_name: &str) -> Option<&ProductService> {
        self.services
            .iter()
            .find(|s| s.kind == ServiceKind::Native && s.service_name == service_name)
    }

    pub fn imported(&self, release_name: &str) -> Option<&ProductService> {
        self.services
            .iter()
            .find(|s| s.kind == ServiceKind::Imported && s.release_name == release_name)
    }

    /// Imported releases in insertion order
    pub fn imports(&self) -> impl Iterator<Item = &ProductService> {
        self.services.iter().filter(|s| !s.is_native())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Inserts or updates one service
    ///
    /// Any entry of the other kind carrying the same release name is removed
    /// first: a release is either tracked natively or imported, never both.
    pub fn upsert(&mut self, service: ProductService) {
        self.services.retain(|s| {
            s.kind == service.kind || s.release_name.is_empty() || s.release_name != service.release_name
        });
        self.insert(service);
    }

    fn insert(&mut self, service: ProductService) {
        match self
            .services
            .iter_mut()
            .find(|s| s.kind == service.kind && s.key() == service.key())
        {
            Some(slot) => *slot = service,
            None => self.services.push(service),
        }
    }
}
