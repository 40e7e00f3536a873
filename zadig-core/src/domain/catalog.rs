//! Catalog domain types
//!
//! The catalog holds user-authored definitions that job compilation reads but
//! never writes: test suites, base images, registries, clusters and object
//! storages.

use serde::{Deserialize, Serialize};

use super::repo::Repository;
use super::vars::KeyVal;

/// Where a job runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Infrastructure {
    #[default]
    Kubernetes,
    Vm,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptType {
    #[default]
    #[serde(rename = "shell", alias = "")]
    Shell,
    #[serde(rename = "batch_file")]
    BatchFile,
    #[serde(rename = "powershell")]
    PowerShell,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheDirType {
    #[default]
    Workspace,
    UserDefined,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceRequest {
    #[default]
    Low,
    Medium,
    High,
    Max,
    Define,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRequestSpec {
    pub cpu_limit: i64,
    pub memory_limit: i64,
    pub gpu_limit: String,
}

/// Declared job output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub name: String,
    pub description: String,
}

impl Output {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }
}

/// A tool installed before the test script runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Install {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreTest {
    pub installs: Vec<Install>,
    pub image_id: String,
    pub build_os: String,
    pub image_from: String,
    pub res_req: ResourceRequest,
    pub res_req_spec: ResourceRequestSpec,
    pub envs: Vec<KeyVal>,
    pub cluster_id: String,
    pub strategy_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadDetail {
    pub file_path: String,
    pub destination_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageUpload {
    pub enabled: bool,
    pub object_storage_id: String,
    pub upload_detail: Vec<UploadDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostTest {
    pub object_storage_upload: Option<ObjectStorageUpload>,
}

/// Catalog definition of a test suite
///
/// Immutable template for every job that references it: jobs merge their own
/// repos and variables on top of these defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestingInfo {
    pub name: String,
    pub project_name: String,
    pub desc: String,
    pub timeout: i64,
    pub repos: Vec<Repository>,
    pub pre_test: PreTest,
    pub post_test: Option<PostTest>,
    pub scripts: String,
    pub script_type: ScriptType,
    pub test_result_path: String,
    pub test_report_path: String,
    pub artifact_paths: Vec<String>,
    pub cache_enable: bool,
    pub cache_dir_type: CacheDirType,
    pub cache_user_dir: String,
    pub outputs: Vec<Output>,
    pub infrastructure: Infrastructure,
    pub vm_labels: Vec<String>,
}

impl TestingInfo {
    /// Object storage upload settings when the post-test upload is enabled
    pub fn object_storage_upload(&self) -> Option<&ObjectStorageUpload> {
        self.post_test
            .as_ref()
            .and_then(|post| post.object_storage_upload.as_ref())
            .filter(|upload| upload.enabled)
    }
}

/// Base image a job runs on
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicImage {
    pub id: String,
    pub value: String,
    pub label: String,
}

/// Image registry namespace made available to jobs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryNamespace {
    pub id: String,
    pub reg_addr: String,
    pub reg_provider: String,
    pub namespace: String,
    pub access_key: String,
    pub secret_key: String,
    pub is_default: bool,
}

/// Physical cache backend class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediumType {
    Nfs,
    Object,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NfsProperties {
    pub provision_type: String,
    pub storage_class: String,
    pub storage_size_in_gib: i64,
    pub pvc: String,
    pub subpath: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectProperties {
    pub id: String,
}

/// Cache configuration declared by a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cache {
    pub medium_type: Option<MediumType>,
    pub nfs_properties: NfsProperties,
    pub object_properties: ObjectProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sCluster {
    pub id: String,
    pub name: String,
    pub cache: Cache,
}

/// Object storage (S3 compatible) backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Storage {
    pub id: String,
    pub ak: String,
    pub sk: String,
    pub endpoint: String,
    pub bucket: String,
    pub subfolder: String,
    pub insecure: bool,
    pub is_default: bool,
    pub provider: i32,
    pub region: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_storage_upload_requires_enabled() {
        let mut info = TestingInfo {
            post_test: Some(PostTest {
                object_storage_upload: Some(ObjectStorageUpload {
                    enabled: false,
                    object_storage_id: "s3-1".to_string(),
                    upload_detail: vec![],
                }),
            }),
            ..Default::default()
        };
        assert!(info.object_storage_upload().is_none());

        if let Some(upload) = info
            .post_test
            .as_mut()
            .and_then(|p| p.object_storage_upload.as_mut())
        {
            upload.enabled = true;
        }
        assert_eq!(
            info.object_storage_upload().map(|u| u.object_storage_id.as_str()),
            Some("s3-1")
        );
    }

    #[test]
    fn test_cache_without_medium() {
        let cache: Cache = serde_json::from_str("{}").unwrap();
        assert!(cache.medium_type.is_none());

        let cache: Cache = serde_json::from_str(r#"{"medium_type":"object"}"#).unwrap();
        assert_eq!(cache.medium_type, Some(MediumType::Object));
    }
}
