//! Orchestration reconciliation
//!
//! Rebuilds an environment's grouped service list from the project template:
//! native services follow the template's groups and slots, imported releases
//! trail in the last group.

use zadig_core::domain::environment::ProductService;

use super::classifier::ServiceSet;

/// Replays `orchestration` group by group over `services`
///
/// Native services the template does not list are dropped. Imported releases
/// are appended to the last group, which is created when the template has no
/// groups at all.
pub fn reconcile(orchestration: &[Vec<String>], services: &ServiceSet) -> Vec<Vec<ProductService>> {
    let mut groups: Vec<Vec<ProductService>> = orchestration
        .iter()
        .map(|group| replay(group, services).collect())
        .collect();

    let imports: Vec<ProductService> = services.imports().cloned().collect();
    if !imports.is_empty() {
        match groups.last_mut() {
            Some(last) => last.extend(imports),
            None => groups.push(imports),
        }
    }
    groups
}

/// Same replay as [`reconcile`], flattened into a single group
pub fn reconcile_group(orchestration: &[Vec<String>], services: &ServiceSet) -> Vec<ProductService> {
    orchestration
        .iter()
        .flat_map(|group| replay(group, services))
        .chain(services.imports().cloned())
        .collect()
}

fn replay<'a>(
    group: &'a [String],
    services: &'a ServiceSet,
) -> impl Iterator<Item = ProductService> + 'a {
    group
        .iter()
        .filter_map(|name| services.native(name).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(groups: &[Vec<ProductService>]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.iter().map(|s| s.key().to_string()).collect())
            .collect()
    }

    fn orchestration(groups: &[&[&str]]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_reconcile_follows_template_and_trails_imports() {
        let template = orchestration(&[&["a", "b"], &["c"]]);
        let mut set = ServiceSet::from_groups(&[
            vec![ProductService::native("c"), ProductService::imported("r")],
            vec![ProductService::native("b"), ProductService::native("a")],
        ]);
        let updated = ProductService {
            revision: 2,
            ..ProductService::native("b")
        };
        set.upsert(updated.clone());

        let groups = reconcile(&template, &set);

        assert_eq!(names(&groups), vec![vec!["a", "b"], vec!["c", "r"]]);
        assert_eq!(groups[0][1], updated);
    }

    #[test]
    fn test_reconcile_drops_unlisted_and_keeps_empty_groups() {
        let template = orchestration(&[&["a"], &["missing"]]);
        let set = ServiceSet::from_groups(&[vec![
            ProductService::native("a"),
            ProductService::native("orphan"),
        ]]);

        let groups = reconcile(&template, &set);
        assert_eq!(names(&groups), vec![vec!["a".to_string()], vec![]]);
    }

    #[test]
    fn test_reconcile_without_template_groups() {
        let set = ServiceSet::from_groups(&[vec![ProductService::imported("r")]]);
        assert_eq!(names(&reconcile(&[], &set)), vec![vec!["r"]]);
        assert!(reconcile(&[], &ServiceSet::new()).is_empty());
    }

    #[test]
    fn test_reconcile_group_flattens() {
        let template = orchestration(&[&["a", "b"], &["c"]]);
        let set = ServiceSet::from_groups(&[vec![
            ProductService::imported("r"),
            ProductService::native("c"),
            ProductService::native("a"),
        ]]);

        let group = reconcile_group(&template, &set);
        let keys: Vec<_> = group.iter().map(|s| s.key()).collect();
        assert_eq!(keys, vec!["a", "c", "r"]);
    }
}
