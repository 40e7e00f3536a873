//! Task Assembler
//!
//! Builds one executable `JobTask` per (test suite, target) pair. Catalog
//! lookups here are fatal: an incomplete task would be silently wrong once
//! it runs.

use rand::Rng;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use zadig_core::domain::catalog::{
    Cache, CacheDirType, Infrastructure, K8sCluster, MediumType, Output, S3Storage, ScriptType,
    TestingInfo,
};
use zadig_core::domain::repo::Repository;
use zadig_core::domain::task::{
    ArchiveSpec, DownloadArchiveSpec, FreestyleJobSpec, GitSpec, JobProperties, JobTask,
    JunitReportSpec, S3, ScriptSpec, StepSpec, StepTask, StorageDetail, TarArchiveSpec, Tool,
    ToolInstallSpec, Upload,
};
use zadig_core::domain::vars::KeyVal;
use zadig_core::domain::workflow::{
    JobErrorPolicy, JobType, ServiceTestTarget, ShareStorageInfo, TestModule, TestType, Workflow,
};

use super::preset::{merge_repos, render_key_vals};
use crate::error::CompileError;
use crate::repository::CatalogRepository;

pub const HTML_REPORT_STEP: &str = "html-report";
pub const ARCHIVE_RESULT_STEP: &str = "archive-test-result";
pub const JUNIT_REPORT_STEP: &str = "junit-report";
pub const OBJECT_STORAGE_STEP: &str = "object-storage";

const CACHE_FILE_NAME: &str = "testing-cache.tar.gz";
const ARTIFACT_RESULT_FILE_NAME: &str = "artifactResultOut.tar.gz";
const JUNIT_FILE_NAME: &str = "merged.xml";
const DEFAULT_CACHE_DIR: &str = "/workspace";
const JOB_OUTPUT_DIR: &str = "/zadig/results";
const VM_JOB_OUTPUT_DIR: &str = "$JOB_OUTPUT_PATH";
const MAX_JOB_NAME_LEN: usize = 63;
const RAND_CHARSET: &[u8] = b"bcdfghjklmnpqrstvwxz2456789";

static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("env variable pattern")
});

/// Shared context for assembling the tasks of one testing job
pub struct TaskAssembler<'a, C: CatalogRepository + ?Sized> {
    pub workflow: &'a Workflow,
    pub job_name: &'a str,
    pub error_policy: Option<&'a JobErrorPolicy>,
    pub catalog: &'a C,
    pub system_address: &'a str,
    pub task_id: i64,
    pub default_store: &'a S3Storage,
}

/// Cache settings resolved for one task
struct CachePlan {
    enable: bool,
    dir_type: CacheDirType,
    user_dir: String,
    cache: Cache,
    store: Option<S3Storage>,
}

impl CachePlan {
    fn disabled() -> Self {
        Self {
            enable: false,
            dir_type: CacheDirType::default(),
            user_dir: String::new(),
            cache: Cache::default(),
            store: None,
        }
    }

    fn cache_dir(&self) -> &str {
        match self.dir_type {
            CacheDirType::UserDefined => &self.user_dir,
            CacheDirType::Workspace => DEFAULT_CACHE_DIR,
        }
    }

    /// Object store backing the cache when object caching is active
    fn object_store(&self) -> Option<&S3Storage> {
        if self.enable && self.cache.medium_type == Some(MediumType::Object) {
            self.store.as_ref()
        } else {
            None
        }
    }
}

impl<C: CatalogRepository + ?Sized> TaskAssembler<'_, C> {
    /// Compiles one task for `module`, testing `target` for service-level tests
    pub async fn to_job_task(
        &self,
        module: &TestModule,
        target: Option<&ServiceTestTarget>,
    ) -> Result<JobTask, CompileError> {
        let info = self
            .catalog
            .find_testing(&module.name)
            .await
            .map_err(CompileError::lookup(format!("testing {}", module.name)))?;
        let image = self
            .catalog
            .find_basic_image(&info.pre_test.image_id)
            .await
            .map_err(CompileError::lookup(format!("basic image {}", info.pre_test.image_id)))?;
        let registries = self
            .catalog
            .list_registries()
            .await
            .map_err(CompileError::lookup("registries"))?;

        let test_type = match target {
            Some(_) => TestType::Service,
            None => TestType::Product,
        };
        let mut job_info = BTreeMap::new();
        job_info.insert("job_name".to_string(), self.job_name.to_string());
        job_info.insert("test_type".to_string(), test_type.task_label().to_string());
        let (name, key) = match target {
            Some(target) => {
                job_info.insert("service_name".to_string(), target.service_name.clone());
                job_info.insert("service_module".to_string(), target.service_module.clone());
                (
                    job_name_format(&format!(
                        "{}-{}-{}",
                        target.service_name, target.service_module, self.job_name
                    )),
                    [
                        self.job_name,
                        module.name.as_str(),
                        target.service_name.as_str(),
                        target.service_module.as_str(),
                    ]
                    .join("."),
                )
            }
            None => {
                let rand_str = random_suffix();
                job_info.insert("testing_name".to_string(), module.name.clone());
                job_info.insert("rand_str".to_string(), rand_str.clone());
                (
                    job_name_format(&format!("{}-{}-{}", module.name, self.job_name, rand_str)),
                    [self.job_name, module.name.as_str()].join("."),
                )
            }
        };

        let cluster = self
            .catalog
            .find_cluster(&info.pre_test.cluster_id)
            .await
            .map_err(CompileError::lookup(format!("cluster {}", info.pre_test.cluster_id)))?;
        let mut cache = self.resolve_cache(&info, &cluster).await?;

        let custom_envs = render_key_vals(&module.key_vals, &info.pre_test.envs);
        let job_repos = merge_repos(&info.repos, &module.repos);
        let envs = EnvLayers::new()
            .layer(custom_envs.clone())
            .layer(repo_variables(&job_repos))
            .layer(self.task_variables(&info, module, target))
            .resolve();

        if cache.enable {
            cache.user_dir = render_env(&cache.user_dir, &envs);
            if cache.cache.medium_type == Some(MediumType::Nfs) {
                cache.cache.nfs_properties.subpath =
                    render_env(&cache.cache.nfs_properties.subpath, &envs);
            }
        }

        let steps = self.steps(&info, module, target, &name, &cache, &job_repos, &envs).await?;

        let properties = JobProperties {
            timeout: info.timeout,
            resource_request: info.pre_test.res_req,
            res_req_spec: info.pre_test.res_req_spec.clone(),
            custom_envs,
            envs,
            cluster_id: info.pre_test.cluster_id.clone(),
            strategy_id: info.pre_test.strategy_id.clone(),
            build_os: image.value,
            image_from: info.pre_test.image_from.clone(),
            registries,
            share_storage_details: self.share_storage_details(module.share_storage_info.as_ref()),
            cache_enable: cache.enable,
            cache_dir_type: cache.dir_type,
            cache_user_dir: cache.user_dir,
            cache: cache.cache,
        };

        tracing::debug!("Compiled task {} ({} steps) for job {}", name, steps.len(), self.job_name);

        Ok(JobTask {
            name,
            key,
            job_info,
            job_type: JobType::Testing,
            spec: FreestyleJobSpec { properties, steps },
            timeout: info.timeout,
            outputs: info.outputs,
            infrastructure: info.infrastructure,
            vm_labels: info.vm_labels,
            error_policy: self.error_policy.cloned(),
        })
    }

    /// VM jobs use the catalog's cache flags; cluster jobs inherit the
    /// cluster's cache medium and run uncached when it declares none
    async fn resolve_cache(
        &self,
        info: &TestingInfo,
        cluster: &K8sCluster,
    ) -> Result<CachePlan, CompileError> {
        if info.infrastructure == Infrastructure::Vm {
            return Ok(CachePlan {
                enable: info.cache_enable,
                dir_type: info.cache_dir_type,
                user_dir: info.cache_user_dir.clone(),
                ..CachePlan::disabled()
            });
        }

        let Some(medium) = cluster.cache.medium_type else {
            return Ok(CachePlan::disabled());
        };

        let store = match medium {
            MediumType::Object => {
                let id = &cluster.cache.object_properties.id;
                let store = self
                    .catalog
                    .find_object_store(id)
                    .await
                    .map_err(CompileError::lookup(format!("cache object storage {}", id)))?;
                Some(store)
            }
            MediumType::Nfs => None,
        };

        Ok(CachePlan {
            enable: info.cache_enable,
            dir_type: info.cache_dir_type,
            user_dir: info.cache_user_dir.clone(),
            cache: cluster.cache.clone(),
            store,
        })
    }

    /// Workflow and identity variables of a task
    fn task_variables(
        &self,
        info: &TestingInfo,
        module: &TestModule,
        target: Option<&ServiceTestTarget>,
    ) -> Vec<KeyVal> {
        let workflow = self.workflow;
        let (service_name, service_module, test_type) = match target {
            Some(target) => (
                target.service_name.as_str(),
                target.service_module.as_str(),
                TestType::Service,
            ),
            None => ("", "", TestType::Product),
        };
        let display_name: String =
            url::form_urlencoded::byte_serialize(workflow.display_name.as_bytes()).collect();
        let build_url = format!(
            "{}/v1/projects/detail/{}/pipelines/custom/{}/{}?display_name={}",
            self.system_address, workflow.project, workflow.name, self.task_id, display_name
        );

        let mut vars = vec![
            KeyVal::new("CI", "true"),
            KeyVal::new("ZADIG", "true"),
            KeyVal::new("PROJECT", &workflow.project),
            KeyVal::new("WORKFLOW", &workflow.name),
            KeyVal::new("TASK_ID", self.task_id.to_string()),
        ];
        if info.infrastructure == Infrastructure::Kubernetes {
            vars.push(KeyVal::new("WORKSPACE", DEFAULT_CACHE_DIR));
        }
        vars.extend([
            KeyVal::new("TESTING_PROJECT", &module.project_name),
            KeyVal::new("TESTING_NAME", &module.name),
            KeyVal::new("TESTING_TYPE", test_type.task_label()),
            KeyVal::new("SERVICE", service_name),
            KeyVal::new("SERVICE_NAME", service_name),
            KeyVal::new("SERVICE_MODULE", service_module),
            KeyVal::new("BUILD_URL", build_url),
        ]);
        vars
    }

    fn share_storage_details(&self, info: Option<&ShareStorageInfo>) -> Vec<StorageDetail> {
        let Some(info) = info.filter(|info| info.enabled) else {
            return Vec::new();
        };

        info.share_storages
            .iter()
            .filter_map(|selected| {
                self.workflow
                    .share_storages
                    .iter()
                    .find(|storage| storage.name == selected.name)
            })
            .map(|storage| StorageDetail {
                name: storage.name.clone(),
                medium: MediumType::Nfs,
                sub_path: format!("{}/{}/{}", self.workflow.name, self.task_id, storage.name),
                mount_path: storage.path.clone(),
            })
            .collect()
    }

    /// Emits the step pipeline in its fixed order
    #[allow(clippy::too_many_arguments)]
    async fn steps(
        &self,
        info: &TestingInfo,
        module: &TestModule,
        target: Option<&ServiceTestTarget>,
        job_name: &str,
        cache: &CachePlan,
        job_repos: &[Repository],
        envs: &[KeyVal],
    ) -> Result<Vec<StepTask>, CompileError> {
        let test = module.name.as_str();
        let output_dir = |kind: &str| {
            format!("{}/{}/{}/{}", self.workflow.name, self.task_id, job_name, kind)
        };
        let cache_object_path = format!("{}/cache/{}", self.workflow.name, test);
        let mut steps = Vec::new();

        steps.push(StepTask::new(
            format!("{}-tool-install", test),
            job_name,
            StepSpec::Tools(ToolInstallSpec {
                installs: info
                    .pre_test
                    .installs
                    .iter()
                    .map(|install| Tool {
                        name: install.name.clone(),
                        version: install.version.clone(),
                    })
                    .collect(),
            }),
        ));

        if let Some(store) = cache.object_store() {
            steps.push(StepTask::new(
                format!("{}-download-archive", test),
                job_name,
                StepSpec::DownloadArchive(DownloadArchiveSpec {
                    file_name: CACHE_FILE_NAME.to_string(),
                    object_path: cache_object_path.clone(),
                    dest_dir: cache.cache_dir().to_string(),
                    untar: true,
                    ignore_err: true,
                    s3: Some(S3::from(store)),
                }),
            ));
        }

        steps.push(StepTask::new(
            format!("{}-git", test),
            job_name,
            StepSpec::Git(GitSpec {
                repos: job_repos.iter().map(|repo| render_repo(repo, envs)).collect(),
            }),
        ));

        steps.push(StepTask::new(
            format!("{}-debug_before", test),
            job_name,
            StepSpec::DebugBefore,
        ));

        let mut scripts: Vec<String> = info
            .scripts
            .replace("\r\n", "\n")
            .split('\n')
            .map(str::to_string)
            .collect();
        scripts.extend(output_script(&info.outputs, info.infrastructure));
        let script = ScriptSpec { scripts };
        let (suffix, spec) = match info.script_type {
            ScriptType::Shell => ("shell", StepSpec::Shell(script)),
            ScriptType::BatchFile => ("batchfile", StepSpec::BatchFile(script)),
            ScriptType::PowerShell => ("powershell", StepSpec::PowerShell(script)),
        };
        steps.push(StepTask::new(format!("{}-{}", test, suffix), job_name, spec));

        steps.push(StepTask::new(
            format!("{}-debug_after", test),
            job_name,
            StepSpec::DebugAfter,
        ));

        if !info.test_report_path.is_empty() {
            steps.push(
                StepTask::new(
                    HTML_REPORT_STEP,
                    job_name,
                    StepSpec::Archive(ArchiveSpec {
                        upload_detail: vec![Upload {
                            file_path: info.test_report_path.clone(),
                            destination_path: output_dir("html"),
                        }],
                        object_storage_id: None,
                        s3: Some(S3::from(self.default_store)),
                    }),
                )
                .run_on_failure(),
            );
        }

        let dest_dir = match info.script_type {
            ScriptType::Shell => "/tmp",
            ScriptType::BatchFile | ScriptType::PowerShell => "%TMP%",
        };

        if has_artifacts(&info.artifact_paths) {
            steps.push(
                StepTask::new(
                    ARCHIVE_RESULT_STEP,
                    job_name,
                    StepSpec::TarArchive(TarArchiveSpec {
                        result_dirs: info.artifact_paths.clone(),
                        s3_dest_dir: output_dir("test-result"),
                        file_name: ARTIFACT_RESULT_FILE_NAME.to_string(),
                        dest_dir: dest_dir.to_string(),
                        ..Default::default()
                    }),
                )
                .run_on_failure(),
            );
        }

        if !info.test_result_path.is_empty() {
            let (service_name, service_module) = target
                .map(|t| (t.service_name.clone(), t.service_module.clone()))
                .unwrap_or_default();
            steps.push(
                StepTask::new(
                    JUNIT_REPORT_STEP,
                    job_name,
                    StepSpec::JunitReport(JunitReportSpec {
                        source_workflow: self.workflow.name.clone(),
                        source_job_key: self.job_name.to_string(),
                        task_id: self.task_id,
                        report_dir: info.test_result_path.clone(),
                        s3_dest_dir: output_dir("junit"),
                        test_name: test.to_string(),
                        test_project: module.project_name.clone(),
                        dest_dir: dest_dir.to_string(),
                        file_name: JUNIT_FILE_NAME.to_string(),
                        service_name,
                        service_module,
                    }),
                )
                .run_on_failure(),
            );
        }

        if let Some(store) = cache.object_store() {
            steps.push(StepTask::new(
                format!("{}-tar-archive", test),
                job_name,
                StepSpec::TarArchive(TarArchiveSpec {
                    result_dirs: vec![".".to_string()],
                    s3_dest_dir: cache_object_path,
                    file_name: CACHE_FILE_NAME.to_string(),
                    tar_dir: cache.cache_dir().to_string(),
                    abs_result_dir: true,
                    change_tar_dir: true,
                    ignore_err: true,
                    s3_storage: Some(S3::from(store)),
                    ..Default::default()
                }),
            ));
        }

        if let Some(upload) = info.object_storage_upload() {
            let store = self
                .catalog
                .find_object_store(&upload.object_storage_id)
                .await
                .map_err(CompileError::lookup(format!(
                    "object storage {}",
                    upload.object_storage_id
                )))?;
            let mut s3 = S3::from(&store);
            s3.subfolder.clear();

            steps.push(StepTask::new(
                OBJECT_STORAGE_STEP,
                job_name,
                StepSpec::Archive(ArchiveSpec {
                    upload_detail: upload
                        .upload_detail
                        .iter()
                        .map(|detail| Upload {
                            file_path: detail.file_path.clone(),
                            destination_path: detail.destination_path.clone(),
                        })
                        .collect(),
                    object_storage_id: Some(upload.object_storage_id.clone()),
                    s3: Some(s3),
                }),
            ));
        }

        Ok(steps)
    }
}

// =============================================================================
// Environment variables
// =============================================================================

/// Variable layers ordered by precedence, highest first
///
/// Resolving yields every key once, valued by the highest layer declaring it.
#[derive(Debug, Default)]
pub struct EnvLayers {
    layers: Vec<Vec<KeyVal>>,
}

impl EnvLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer below every layer added so far
    pub fn layer(mut self, vars: Vec<KeyVal>) -> Self {
        self.layers.push(vars);
        self
    }

    pub fn resolve(self) -> Vec<KeyVal> {
        let mut seen = HashSet::new();
        self.layers
            .into_iter()
            .flatten()
            .filter(|kv| seen.insert(kv.key.clone()))
            .collect()
    }
}

/// Variables describing the checked-out repositories
fn repo_variables(repos: &[Repository]) -> Vec<KeyVal> {
    let mut vars = Vec::new();
    for (index, repo) in repos.iter().enumerate() {
        let prefix = env_key(&repo.repo_name);
        vars.push(KeyVal::new(format!("REPO_{}", index), &repo.repo_name));
        vars.push(KeyVal::new(format!("{}_ORG", prefix), repo.namespace()));
        if let Some(branch) = &repo.branch {
            vars.push(KeyVal::new(format!("{}_BRANCH", prefix), branch));
        }
        if let Some(tag) = &repo.tag {
            vars.push(KeyVal::new(format!("{}_TAG", prefix), tag));
        }
        let prs: Vec<String> = if repo.prs.is_empty() {
            repo.pr.into_iter().map(|pr| pr.to_string()).collect()
        } else {
            repo.prs.iter().map(|pr| pr.to_string()).collect()
        };
        if !prs.is_empty() {
            vars.push(KeyVal::new(format!("{}_PR", prefix), prs.join(",")));
        }
        if let Some(commit) = &repo.commit_id {
            vars.push(KeyVal::new(format!("{}_COMMIT_ID", prefix), commit));
        }
    }
    vars
}

/// Uppercased variable-safe form of a repository name
fn env_key(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Substitutes `$KEY` and `${KEY}` from `envs`; unknown variables stay as written
pub fn render_env(template: &str, envs: &[KeyVal]) -> String {
    ENV_VAR_RE
        .replace_all(template, |caps: &regex::Captures| {
            let key = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            envs.iter()
                .find(|kv| kv.key == key)
                .map(|kv| kv.value.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn render_repo(repo: &Repository, envs: &[KeyVal]) -> Repository {
    let render = |field: &Option<String>| field.as_deref().map(|value| render_env(value, envs));
    Repository {
        branch: render(&repo.branch),
        tag: render(&repo.tag),
        checkout_path: render(&repo.checkout_path),
        ..repo.clone()
    }
}

// =============================================================================
// Naming
// =============================================================================

/// Normalizes a task name to a lowercase DNS label
pub fn job_name_format(raw: &str) -> String {
    let name: String = raw
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .take(MAX_JOB_NAME_LEN)
        .collect();
    name.trim_matches('-').to_string()
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..5)
        .map(|_| RAND_CHARSET[rng.gen_range(0..RAND_CHARSET.len())] as char)
        .collect()
}

/// Script lines exporting declared outputs for the runtime to collect
pub fn output_script(outputs: &[Output], infrastructure: Infrastructure) -> Vec<String> {
    if outputs.is_empty() {
        return Vec::new();
    }
    let dir = match infrastructure {
        Infrastructure::Kubernetes => JOB_OUTPUT_DIR,
        Infrastructure::Vm => VM_JOB_OUTPUT_DIR,
    };

    let mut script = vec!["set +ex".to_string()];
    script.extend(
        outputs
            .iter()
            .map(|output| format!("echo ${} > {}/{}", output.name, dir, output.name)),
    );
    script
}

/// A lone empty artifact path means no artifacts were configured
fn has_artifacts(paths: &[String]) -> bool {
    match paths {
        [] => false,
        [only] => !only.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_name_format() {
        assert_eq!(job_name_format("Smoke_Test-test1-bc2d4"), "smoke-test-test1-bc2d4");
        assert_eq!(job_name_format("--svc.A--"), "svc-a");
        let long = "a".repeat(80);
        assert_eq!(job_name_format(&long).len(), MAX_JOB_NAME_LEN);
    }

    #[test]
    fn test_random_suffix_charset() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 5);
        assert!(suffix.bytes().all(|b| RAND_CHARSET.contains(&b)));
    }

    #[test]
    fn test_render_env() {
        let envs = vec![KeyVal::new("SERVICE", "api"), KeyVal::new("TASK_ID", "7")];
        assert_eq!(render_env("/cache/$SERVICE/${TASK_ID}", &envs), "/cache/api/7");
        assert_eq!(render_env("/cache/$UNKNOWN/x", &envs), "/cache/$UNKNOWN/x");
        assert_eq!(render_env("plain", &envs), "plain");
    }

    #[test]
    fn test_env_layers_precedence() {
        let envs = EnvLayers::new()
            .layer(vec![KeyVal::new("A", "custom")])
            .layer(vec![KeyVal::new("A", "repo"), KeyVal::new("B", "repo")])
            .layer(vec![KeyVal::new("B", "base"), KeyVal::new("C", "base")])
            .resolve();

        let pairs: Vec<_> = envs.iter().map(|kv| (kv.key.as_str(), kv.value.as_str())).collect();
        assert_eq!(pairs, vec![("A", "custom"), ("B", "repo"), ("C", "base")]);
    }

    #[test]
    fn test_repo_variables() {
        let repo = Repository {
            repo_owner: "koderover".to_string(),
            repo_name: "zadig-web".to_string(),
            branch: Some("main".to_string()),
            prs: vec![12, 13],
            ..Default::default()
        };
        let vars = repo_variables(&[repo]);
        let find = |key: &str| vars.iter().find(|kv| kv.key == key).map(|kv| kv.value.as_str());

        assert_eq!(find("REPO_0"), Some("zadig-web"));
        assert_eq!(find("ZADIG_WEB_ORG"), Some("koderover"));
        assert_eq!(find("ZADIG_WEB_BRANCH"), Some("main"));
        assert_eq!(find("ZADIG_WEB_PR"), Some("12,13"));
        assert_eq!(find("ZADIG_WEB_TAG"), None);
    }

    #[test]
    fn test_output_script() {
        assert!(output_script(&[], Infrastructure::Kubernetes).is_empty());
        let script = output_script(&[Output::new("VERSION")], Infrastructure::Vm);
        assert_eq!(script, vec!["set +ex", "echo $VERSION > $JOB_OUTPUT_PATH/VERSION"]);
    }

    #[test]
    fn test_has_artifacts() {
        assert!(!has_artifacts(&[]));
        assert!(!has_artifacts(&[String::new()]));
        assert!(has_artifacts(&["dist".to_string()]));
        assert!(has_artifacts(&[String::new(), String::new()]));
    }
}
