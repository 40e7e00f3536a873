//! Repository and variable merge rules
//!
//! Job-level repositories and variables are layered on top of catalog
//! defaults, never replacing them.

use std::collections::HashSet;
use zadig_core::domain::repo::Repository;
use zadig_core::domain::vars::KeyVal;

/// Merges job-level repositories over catalog repositories
///
/// Every repository identity of either list appears exactly once. For shared
/// identities the job entry wins field by field and its unset fields fall back
/// to the catalog entry. Job entries keep their order; catalog-only entries are
/// appended.
pub fn merge_repos(catalog: &[Repository], job: &[Repository]) -> Vec<Repository> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(catalog.len() + job.len());

    for repo in job {
        let identity = repo.identity();
        if !seen.insert(identity.clone()) {
            continue;
        }
        let merged_repo = match catalog.iter().find(|base| base.identity() == identity) {
            Some(base) => repo.clone().with_defaults_from(base),
            None => repo.clone(),
        };
        merged.push(merged_repo);
    }

    for repo in catalog {
        if seen.insert(repo.identity()) {
            merged.push(repo.clone());
        }
    }

    merged
}

/// Renders job-level variables over catalog defaults
///
/// Every key of either list appears exactly once with the job value when both
/// declare it. A catalog variable keeps its type, options and credential flag.
pub fn render_key_vals(job: &[KeyVal], catalog: &[KeyVal]) -> Vec<KeyVal> {
    let mut seen = HashSet::new();
    let mut rendered = Vec::with_capacity(catalog.len() + job.len());

    for kv in job {
        if !seen.insert(kv.key.as_str()) {
            continue;
        }
        let merged = match catalog.iter().find(|base| base.key == kv.key) {
            Some(base) => KeyVal {
                value: kv.value.clone(),
                ..base.clone()
            },
            None => kv.clone(),
        };
        rendered.push(merged);
    }

    for kv in catalog {
        if seen.insert(kv.key.as_str()) {
            rendered.push(kv.clone());
        }
    }

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use zadig_core::domain::vars::KeyValType;

    fn repo(owner: &str, name: &str, branch: Option<&str>) -> Repository {
        Repository {
            source: "gitlab".to_string(),
            repo_owner: owner.to_string(),
            repo_name: name.to_string(),
            branch: branch.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_repos_job_fields_win() {
        let mut base = repo("koderover", "zadig", Some("main"));
        base.checkout_path = Some("zadig".to_string());
        let catalog = vec![base, repo("koderover", "docs", Some("main"))];
        let job = vec![repo("koderover", "zadig", Some("feature"))];

        let merged = merge_repos(&catalog, &job);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].repo_name, "zadig");
        assert_eq!(merged[0].branch.as_deref(), Some("feature"));
        assert_eq!(merged[0].checkout_path.as_deref(), Some("zadig"));
        assert_eq!(merged[1].repo_name, "docs");
    }

    #[test]
    fn test_merge_repos_every_identity_once() {
        let a = repo("o", "a", None);
        let b = repo("o", "b", Some("dev"));
        let c = repo("o", "c", None);
        let cases: Vec<(Vec<Repository>, Vec<Repository>)> = vec![
            (vec![], vec![]),
            (vec![a.clone()], vec![]),
            (vec![], vec![b.clone()]),
            (vec![a.clone(), b.clone()], vec![b.clone(), c.clone()]),
            (vec![a.clone(), a.clone()], vec![c.clone(), c.clone(), a.clone()]),
        ];

        for (catalog, job) in cases {
            let merged = merge_repos(&catalog, &job);
            let expected: HashSet<_> = catalog.iter().chain(job.iter()).map(|r| r.identity()).collect();
            let actual: Vec<_> = merged.iter().map(|r| r.identity()).collect();
            assert_eq!(actual.len(), expected.len());
            assert_eq!(actual.into_iter().collect::<HashSet<_>>(), expected);
        }
    }

    #[test]
    fn test_merge_repos_namespace_identity() {
        let mut catalog_repo = repo("someone", "zadig", Some("main"));
        catalog_repo.repo_namespace = "koderover".to_string();
        let job_repo = repo("koderover", "zadig", Some("release"));

        let merged = merge_repos(&[catalog_repo], &[job_repo]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].branch.as_deref(), Some("release"));
    }

    #[test]
    fn test_render_key_vals() {
        let mut secret = KeyVal::new("TOKEN", "default");
        secret.is_credential = true;
        let mut choice = KeyVal::new("LEVEL", "info");
        choice.kind = KeyValType::Choice;
        choice.choice_option = vec!["info".to_string(), "debug".to_string()];

        let catalog = vec![secret, choice, KeyVal::new("REGION", "cn")];
        let job = vec![KeyVal::new("LEVEL", "debug"), KeyVal::new("EXTRA", "1"), KeyVal::new("TOKEN", "xyz")];

        let rendered = render_key_vals(&job, &catalog);
        let keys: Vec<_> = rendered.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["LEVEL", "EXTRA", "TOKEN", "REGION"]);

        assert_eq!(rendered[0].value, "debug");
        assert_eq!(rendered[0].kind, KeyValType::Choice);
        assert_eq!(rendered[2].value, "xyz");
        assert!(rendered[2].is_credential);
        assert_eq!(rendered[3].value, "cn");
    }
}
