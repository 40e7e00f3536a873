//! Source repository references

use serde::{Deserialize, Serialize};

/// A code repository checked out by a job
///
/// Optional fields are "unset" when `None` (or empty for lists), which lets a
/// job-level entry override only what it declares on top of a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repository {
    pub source: String,
    pub repo_owner: String,
    pub repo_namespace: String,
    pub repo_name: String,
    pub codehost_id: Option<i64>,
    pub remote_name: Option<String>,
    pub branch: Option<String>,
    pub tag: Option<String>,
    pub pr: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prs: Vec<i64>,
    pub commit_id: Option<String>,
    pub checkout_path: Option<String>,
    pub submodules: Option<bool>,
    pub enable_proxy: Option<bool>,
}

/// Identity of a repository: where it is hosted and which one it is
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoIdentity {
    pub source: String,
    pub namespace: String,
    pub name: String,
}

impl Repository {
    /// Namespace of the repository, falling back to the owner
    pub fn namespace(&self) -> &str {
        if self.repo_namespace.is_empty() {
            &self.repo_owner
        } else {
            &self.repo_namespace
        }
    }

    pub fn identity(&self) -> RepoIdentity {
        RepoIdentity {
            source: self.source.clone(),
            namespace: self.namespace().to_string(),
            name: self.repo_name.clone(),
        }
    }

    /// Returns this repository with every unset field taken from `base`
    pub fn with_defaults_from(mut self, base: &Repository) -> Repository {
        if self.repo_owner.is_empty() {
            self.repo_owner = base.repo_owner.clone();
        }
        if self.repo_namespace.is_empty() {
            self.repo_namespace = base.repo_namespace.clone();
        }
        self.codehost_id = self.codehost_id.or(base.codehost_id);
        self.remote_name = self.remote_name.or_else(|| base.remote_name.clone());
        self.branch = self.branch.or_else(|| base.branch.clone());
        self.tag = self.tag.or_else(|| base.tag.clone());
        self.pr = self.pr.or(base.pr);
        if self.prs.is_empty() {
            self.prs = base.prs.clone();
        }
        self.commit_id = self.commit_id.or_else(|| base.commit_id.clone());
        self.checkout_path = self.checkout_path.or_else(|| base.checkout_path.clone());
        self.submodules = self.submodules.or(base.submodules);
        self.enable_proxy = self.enable_proxy.or(base.enable_proxy);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_falls_back_to_owner() {
        let repo = Repository {
            repo_owner: "koderover".to_string(),
            repo_name: "zadig".to_string(),
            ..Default::default()
        };
        assert_eq!(repo.namespace(), "koderover");
        assert_eq!(repo.identity().namespace, "koderover");
    }

    #[test]
    fn test_with_defaults_keeps_set_fields() {
        let base = Repository {
            repo_name: "zadig".to_string(),
            branch: Some("main".to_string()),
            checkout_path: Some("src".to_string()),
            ..Default::default()
        };
        let custom = Repository {
            repo_name: "zadig".to_string(),
            branch: Some("feature".to_string()),
            ..Default::default()
        };

        let merged = custom.with_defaults_from(&base);
        assert_eq!(merged.branch.as_deref(), Some("feature"));
        assert_eq!(merged.checkout_path.as_deref(), Some("src"));
    }
}
