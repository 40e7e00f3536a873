//! Workflow domain types
//!
//! A workflow is an ordered list of stages, each an ordered list of jobs. Every
//! job carries a typed spec selected by its job type, decoded once when the
//! workflow is deserialized.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::repo::Repository;
use super::vars::KeyVal;

/// Workflow definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Workflow {
    pub name: String,
    pub display_name: String,
    pub project: String,
    pub stages: Vec<WorkflowStage>,
    pub share_storages: Vec<ShareStorage>,
}

impl Workflow {
    /// Iterates over all jobs in declaration order
    pub fn jobs(&self) -> impl Iterator<Item = &WorkflowJob> {
        self.stages.iter().flat_map(|stage| stage.jobs.iter())
    }

    /// Finds the first job with the given name
    pub fn find_job(&self, name: &str) -> Option<&WorkflowJob> {
        self.jobs().find(|job| job.name == name)
    }

    /// Returns the rank (stage index, job index) of the named job
    pub fn job_rank(&self, name: &str) -> Option<JobRank> {
        self.stages.iter().enumerate().find_map(|(stage, s)| {
            s.jobs
                .iter()
                .position(|job| job.name == name)
                .map(|job| JobRank { stage, job })
        })
    }
}

/// Position of a job inside the workflow graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobRank {
    pub stage: usize,
    pub job: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowStage {
    pub name: String,
    pub jobs: Vec<WorkflowJob>,
}

/// A named unit of work inside a stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowJob {
    pub name: String,
    #[serde(flatten)]
    pub spec: JobSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_policy: Option<JobErrorPolicy>,
}

impl WorkflowJob {
    pub fn job_type(&self) -> JobType {
        self.spec.job_type()
    }
}

/// Typed job payload, one variant per job kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "spec")]
pub enum JobSpec {
    #[serde(rename = "zadig-build")]
    Build(BuildJobSpec),
    #[serde(rename = "zadig-distribute-image")]
    DistributeImage(DistributeImageJobSpec),
    #[serde(rename = "zadig-deploy")]
    Deploy(DeployJobSpec),
    #[serde(rename = "zadig-scanning")]
    Scanning(ScanningJobSpec),
    #[serde(rename = "zadig-testing")]
    Testing(TestingJobSpec),
}

impl JobSpec {
    pub fn job_type(&self) -> JobType {
        match self {
            JobSpec::Build(_) => JobType::Build,
            JobSpec::DistributeImage(_) => JobType::DistributeImage,
            JobSpec::Deploy(_) => JobType::Deploy,
            JobSpec::Scanning(_) => JobType::Scanning,
            JobSpec::Testing(_) => JobType::Testing,
        }
    }

    /// Name of the job this spec takes its targets from, if it quotes one
    pub fn quoted_job(&self) -> Option<&str> {
        let (source, job_name) = match self {
            JobSpec::Build(_) => return None,
            JobSpec::DistributeImage(spec) => (spec.source, &spec.job_name),
            JobSpec::Deploy(spec) => (spec.source, &spec.job_name),
            JobSpec::Scanning(spec) => (spec.source, &spec.job_name),
            JobSpec::Testing(spec) => (spec.source, &spec.job_name),
        };
        (source == JobSource::FromJob && !job_name.is_empty()).then_some(job_name.as_str())
    }
}

/// Job type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "zadig-build")]
    Build,
    #[serde(rename = "zadig-distribute-image")]
    DistributeImage,
    #[serde(rename = "zadig-deploy")]
    Deploy,
    #[serde(rename = "zadig-scanning")]
    Scanning,
    #[serde(rename = "zadig-testing")]
    Testing,
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobType::Build => write!(f, "zadig-build"),
            JobType::DistributeImage => write!(f, "zadig-distribute-image"),
            JobType::Deploy => write!(f, "zadig-deploy"),
            JobType::Scanning => write!(f, "zadig-scanning"),
            JobType::Testing => write!(f, "zadig-testing"),
        }
    }
}

/// Where a job takes its service targets from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobSource {
    #[default]
    #[serde(rename = "runtime", alias = "")]
    Runtime,
    #[serde(rename = "fromjob")]
    FromJob,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    #[default]
    Stop,
    IgnoreError,
    ManualCheck,
    Retry,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobErrorPolicy {
    pub policy: ErrorPolicy,
    pub maximum_retry: u32,
}

/// A (service, module) pair a job operates on
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceTestTarget {
    pub service_name: String,
    pub service_module: String,
}

impl ServiceTestTarget {
    pub fn new(service_name: impl Into<String>, service_module: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_module: service_module.into(),
        }
    }
}

// =============================================================================
// Build / distribute / deploy / scanning
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildJobSpec {
    pub docker_registry_id: String,
    pub service_and_builds: Vec<ServiceAndBuild>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceAndBuild {
    pub service_name: String,
    pub service_module: String,
    pub build_name: String,
    pub image: String,
    pub repos: Vec<Repository>,
    pub key_vals: Vec<KeyVal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributeImageJobSpec {
    pub source: JobSource,
    pub job_name: String,
    pub targets: Vec<DistributeTarget>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributeTarget {
    pub service_name: String,
    pub service_module: String,
    pub source_tag: String,
    pub target_tag: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployJobSpec {
    pub env: String,
    pub production: bool,
    pub source: JobSource,
    pub job_name: String,
    pub services: Vec<DeployServiceInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployServiceInfo {
    pub service_name: String,
    pub modules: Vec<DeployModuleInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployModuleInfo {
    pub service_module: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningJobSpec {
    pub source: JobSource,
    pub job_name: String,
    pub target_services: Vec<ServiceTestTarget>,
}

// =============================================================================
// Testing
// =============================================================================

/// Product-level tests run once per suite, service-level tests once per target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestType {
    #[default]
    #[serde(rename = "product_test", alias = "")]
    Product,
    #[serde(rename = "service_test")]
    Service,
}

impl TestType {
    /// Label written into task metadata and the `TESTING_TYPE` variable
    pub fn task_label(&self) -> &'static str {
        match self {
            TestType::Product => "",
            TestType::Service => "service_test",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestingJobSpec {
    pub test_type: TestType,
    pub source: JobSource,
    pub job_name: String,
    pub origin_job_name: String,
    pub test_modules: Vec<TestModule>,
    pub service_and_tests: Vec<ServiceAndTest>,
    pub target_services: Vec<ServiceTestTarget>,
}

/// Reference to a catalog test suite plus job-level overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestModule {
    pub name: String,
    pub project_name: String,
    pub repos: Vec<Repository>,
    pub key_vals: Vec<KeyVal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_storage_info: Option<ShareStorageInfo>,
}

impl TestModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A test module bound to the service it tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceAndTest {
    pub service_name: String,
    pub service_module: String,
    #[serde(flatten)]
    pub test_module: TestModule,
}

impl ServiceAndTest {
    pub fn matches(&self, target: &ServiceTestTarget) -> bool {
        self.service_name == target.service_name && self.service_module == target.service_module
    }
}

/// Workflow-level shared storage declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareStorage {
    pub name: String,
    pub path: String,
}

/// Job-level selection of workflow shared storages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareStorageInfo {
    pub enabled: bool,
    pub share_storages: Vec<ShareStorage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow_json() -> &'static str {
        r#"{
            "name": "release",
            "project": "mall",
            "stages": [
                {
                    "name": "build",
                    "jobs": [
                        {
                            "name": "build1",
                            "type": "zadig-build",
                            "spec": {
                                "service_and_builds": [
                                    { "service_name": "svcA", "service_module": "modA" }
                                ]
                            }
                        }
                    ]
                },
                {
                    "name": "test",
                    "jobs": [
                        {
                            "name": "test1",
                            "type": "zadig-testing",
                            "spec": {
                                "test_type": "service_test",
                                "source": "fromjob",
                                "job_name": "build1",
                                "service_and_tests": [
                                    { "service_name": "svcA", "service_module": "modA", "name": "smoke" }
                                ]
                            },
                            "error_policy": { "policy": "ignore_error" }
                        }
                    ]
                }
            ]
        }"#
    }

    #[test]
    fn test_workflow_decodes_typed_specs() {
        let workflow: Workflow = serde_json::from_str(workflow_json()).unwrap();

        let build = workflow.find_job("build1").unwrap();
        assert_eq!(build.job_type(), JobType::Build);

        let test = workflow.find_job("test1").unwrap();
        let JobSpec::Testing(spec) = &test.spec else {
            panic!("expected testing spec");
        };
        assert_eq!(spec.test_type, TestType::Service);
        assert_eq!(spec.service_and_tests[0].test_module.name, "smoke");
        assert_eq!(test.spec.quoted_job(), Some("build1"));
        assert_eq!(
            test.error_policy.as_ref().map(|p| p.policy),
            Some(ErrorPolicy::IgnoreError)
        );
    }

    #[test]
    fn test_job_rank() {
        let workflow: Workflow = serde_json::from_str(workflow_json()).unwrap();
        assert_eq!(workflow.job_rank("build1"), Some(JobRank { stage: 0, job: 0 }));
        assert_eq!(workflow.job_rank("test1"), Some(JobRank { stage: 1, job: 0 }));
        assert!(workflow.job_rank("missing").is_none());
        assert!(JobRank { stage: 0, job: 3 } < JobRank { stage: 1, job: 0 });
    }

    #[test]
    fn test_job_serializes_type_tag() {
        let job = WorkflowJob {
            name: "scan".to_string(),
            spec: JobSpec::Scanning(ScanningJobSpec::default()),
            error_policy: None,
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["type"], "zadig-scanning");
        assert_eq!(value["name"], "scan");
    }
}
