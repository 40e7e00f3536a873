//! Compiled task model
//!
//! A `JobTask` is one schedulable unit produced by the job compiler. Its step
//! list is ordered and executed as-is by the runtime.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::catalog::{
    Cache, CacheDirType, Infrastructure, MediumType, Output, RegistryNamespace, ResourceRequest,
    ResourceRequestSpec, S3Storage,
};
use super::repo::Repository;
use super::vars::KeyVal;
use super::workflow::{JobErrorPolicy, JobType};

/// Job task handed to the execution scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTask {
    pub name: String,
    /// Dot-joined identity used to address the task's outputs
    pub key: String,
    pub job_info: BTreeMap<String, String>,
    pub job_type: JobType,
    pub spec: FreestyleJobSpec,
    pub timeout: i64,
    pub outputs: Vec<Output>,
    pub infrastructure: Infrastructure,
    pub vm_labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_policy: Option<JobErrorPolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FreestyleJobSpec {
    pub properties: JobProperties,
    pub steps: Vec<StepTask>,
}

/// Runtime properties of a job task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobProperties {
    pub timeout: i64,
    pub resource_request: ResourceRequest,
    pub res_req_spec: ResourceRequestSpec,
    pub custom_envs: Vec<KeyVal>,
    pub envs: Vec<KeyVal>,
    pub cluster_id: String,
    pub strategy_id: String,
    pub build_os: String,
    pub image_from: String,
    pub registries: Vec<RegistryNamespace>,
    pub share_storage_details: Vec<StorageDetail>,
    pub cache_enable: bool,
    pub cache_dir_type: CacheDirType,
    pub cache_user_dir: String,
    pub cache: Cache,
}

/// Shared storage mounted into a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDetail {
    pub name: String,
    pub medium: MediumType,
    pub sub_path: String,
    pub mount_path: String,
}

/// One stage of a job's pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepTask {
    pub name: String,
    pub job_name: String,
    #[serde(flatten)]
    pub spec: StepSpec,
    #[serde(default)]
    pub on_failure: bool,
}

impl StepTask {
    pub fn new(name: impl Into<String>, job_name: impl Into<String>, spec: StepSpec) -> Self {
        Self {
            name: name.into(),
            job_name: job_name.into(),
            spec,
            on_failure: false,
        }
    }

    /// Marks the step to run even when an earlier step failed
    pub fn run_on_failure(mut self) -> Self {
        self.on_failure = true;
        self
    }

    pub fn step_type(&self) -> StepType {
        self.spec.step_type()
    }
}

/// Step payload, one variant per step type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step_type", content = "spec")]
pub enum StepSpec {
    #[serde(rename = "tools")]
    Tools(ToolInstallSpec),
    #[serde(rename = "download_archive")]
    DownloadArchive(DownloadArchiveSpec),
    #[serde(rename = "git")]
    Git(GitSpec),
    #[serde(rename = "debug_before")]
    DebugBefore,
    #[serde(rename = "shell")]
    Shell(ScriptSpec),
    #[serde(rename = "batchfile")]
    BatchFile(ScriptSpec),
    #[serde(rename = "powershell")]
    PowerShell(ScriptSpec),
    #[serde(rename = "debug_after")]
    DebugAfter,
    #[serde(rename = "archive")]
    Archive(ArchiveSpec),
    #[serde(rename = "tar_archive")]
    TarArchive(TarArchiveSpec),
    #[serde(rename = "junit_report")]
    JunitReport(JunitReportSpec),
}

impl StepSpec {
    pub fn step_type(&self) -> StepType {
        match self {
            StepSpec::Tools(_) => StepType::Tools,
            StepSpec::DownloadArchive(_) => StepType::DownloadArchive,
            StepSpec::Git(_) => StepType::Git,
            StepSpec::DebugBefore => StepType::DebugBefore,
            StepSpec::Shell(_) => StepType::Shell,
            StepSpec::BatchFile(_) => StepType::BatchFile,
            StepSpec::PowerShell(_) => StepType::PowerShell,
            StepSpec::DebugAfter => StepType::DebugAfter,
            StepSpec::Archive(_) => StepType::Archive,
            StepSpec::TarArchive(_) => StepType::TarArchive,
            StepSpec::JunitReport(_) => StepType::JunitReport,
        }
    }
}

/// Step type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepType {
    Tools,
    DownloadArchive,
    Git,
    DebugBefore,
    Shell,
    BatchFile,
    PowerShell,
    DebugAfter,
    Archive,
    TarArchive,
    JunitReport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInstallSpec {
    pub installs: Vec<Tool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadArchiveSpec {
    pub file_name: String,
    pub object_path: String,
    pub dest_dir: String,
    pub untar: bool,
    pub ignore_err: bool,
    pub s3: Option<S3>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitSpec {
    pub repos: Vec<Repository>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptSpec {
    pub scripts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    pub file_path: String,
    pub destination_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveSpec {
    pub upload_detail: Vec<Upload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_storage_id: Option<String>,
    pub s3: Option<S3>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TarArchiveSpec {
    pub result_dirs: Vec<String>,
    pub s3_dest_dir: String,
    pub file_name: String,
    pub dest_dir: String,
    pub tar_dir: String,
    pub abs_result_dir: bool,
    pub change_tar_dir: bool,
    pub ignore_err: bool,
    pub s3_storage: Option<S3>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JunitReportSpec {
    pub source_workflow: String,
    pub source_job_key: String,
    pub task_id: i64,
    pub report_dir: String,
    pub s3_dest_dir: String,
    pub test_name: String,
    pub test_project: String,
    pub dest_dir: String,
    pub file_name: String,
    pub service_name: String,
    pub service_module: String,
}

/// Object storage credentials as consumed by a step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3 {
    pub ak: String,
    pub sk: String,
    pub endpoint: String,
    pub bucket: String,
    pub subfolder: String,
    pub insecure: bool,
    pub provider: i32,
    pub region: String,
}

impl From<&S3Storage> for S3 {
    fn from(storage: &S3Storage) -> Self {
        Self {
            ak: storage.ak.clone(),
            sk: storage.sk.clone(),
            endpoint: storage.endpoint.clone(),
            bucket: storage.bucket.clone(),
            subfolder: storage.subfolder.clone(),
            insecure: storage.insecure,
            provider: storage.provider,
            region: storage.region.clone(),
        }
    }
}
