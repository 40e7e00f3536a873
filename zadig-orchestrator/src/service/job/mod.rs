//! Job Service
//!
//! Compiles testing jobs of a workflow into executable tasks.
//!
//! [`TestingJob`] is a typed view over one workflow job. Preview operations
//! (`set_preset`, `get_repos`, `get_outputs`) skip catalog entries they cannot
//! find; `to_jobs` fails on the first missing prerequisite.

pub mod assembler;
pub mod outputs;
pub mod preset;
pub mod targets;

use zadig_core::domain::repo::Repository;
use zadig_core::domain::task::JobTask;
use zadig_core::domain::workflow::{
    JobErrorPolicy, JobSource, JobSpec, TestModule, TestType, TestingJobSpec, Workflow, WorkflowJob,
};

use self::assembler::TaskAssembler;
use self::preset::{merge_repos, render_key_vals};
use self::targets::{resolve_origin_job_name, resolve_targets};
use crate::error::CompileError;
use crate::repository::CatalogRepository;

/// Controller for one testing job of a workflow
pub struct TestingJob<'a, C: CatalogRepository + ?Sized> {
    name: &'a str,
    error_policy: Option<&'a JobErrorPolicy>,
    spec: &'a mut TestingJobSpec,
    workflow: &'a Workflow,
    catalog: &'a C,
    system_address: &'a str,
}

impl<'a, C: CatalogRepository + ?Sized> TestingJob<'a, C> {
    /// Binds a testing job; fails for any other job type
    pub fn instantiate(
        job: &'a mut WorkflowJob,
        workflow: &'a Workflow,
        catalog: &'a C,
        system_address: &'a str,
    ) -> Result<Self, CompileError> {
        let job_type = job.job_type();
        let WorkflowJob {
            name,
            spec,
            error_policy,
        } = job;
        let JobSpec::Testing(spec) = spec else {
            return Err(CompileError::UnexpectedJobType {
                job: name.clone(),
                job_type,
            });
        };

        Ok(Self {
            name: name.as_str(),
            error_policy: error_policy.as_ref(),
            spec,
            workflow,
            catalog,
            system_address,
        })
    }

    pub fn spec(&self) -> &TestingJobSpec {
        self.spec
    }

    /// Fills every referenced test module with its catalog defaults
    pub async fn set_preset(&mut self) {
        let catalog = self.catalog;
        match self.spec.test_type {
            TestType::Product => {
                for module in self.spec.test_modules.iter_mut() {
                    apply_catalog_defaults(catalog, module).await;
                }
            }
            TestType::Service => {
                for test in self.spec.service_and_tests.iter_mut() {
                    apply_catalog_defaults(catalog, &mut test.test_module).await;
                }
            }
        }

        if self.spec.source == JobSource::FromJob {
            self.spec.origin_job_name = self.spec.job_name.clone();
            self.spec.job_name = resolve_origin_job_name(self.workflow, &self.spec.origin_job_name);
        }

        if self.spec.test_type == TestType::Service {
            let spec = &mut *self.spec;
            spec.target_services
                .retain(|target| spec.service_and_tests.iter().any(|test| test.matches(target)));
        }
    }

    /// Testing jobs expose no selectable options
    pub fn set_options(&mut self) -> Result<(), CompileError> {
        Ok(())
    }

    pub fn clear_selection_field(&mut self) {
        self.spec.target_services.clear();
    }

    /// The typed spec is already current once the job is instantiated
    pub fn update_with_latest_setting(&mut self) -> Result<(), CompileError> {
        Ok(())
    }

    /// Repositories every referenced test module checks out
    pub async fn get_repos(&self) -> Vec<Repository> {
        let modules: Vec<&TestModule> = match self.spec.test_type {
            TestType::Product => self.spec.test_modules.iter().collect(),
            TestType::Service => self
                .spec
                .service_and_tests
                .iter()
                .map(|test| &test.test_module)
                .collect(),
        };

        let mut repos = Vec::new();
        for module in modules {
            match self.catalog.find_testing(&module.name).await {
                Ok(info) => repos.extend(merge_repos(&info.repos, &module.repos)),
                Err(e) => tracing::error!("Failed to find testing {}: {}", module.name, e),
            }
        }
        repos
    }

    /// Applies runtime arguments given for this job
    ///
    /// Arguments for another job, or for a job of another type, are ignored.
    pub fn merge_args(&mut self, args: &WorkflowJob) {
        if args.name != self.name {
            return;
        }
        let JobSpec::Testing(args_spec) = &args.spec else {
            return;
        };

        match self.spec.test_type {
            TestType::Product => {
                for module in self.spec.test_modules.iter_mut() {
                    if let Some(arg) = args_spec.test_modules.iter().find(|a| a.name == module.name) {
                        merge_module(module, arg);
                    }
                }
            }
            TestType::Service => {
                self.spec.target_services = args_spec.target_services.clone();
                for test in self.spec.service_and_tests.iter_mut() {
                    if let Some(arg) = args_spec.service_and_tests.iter().find(|a| {
                        a.test_module.name == test.test_module.name
                            && a.service_name == test.service_name
                    }) {
                        merge_module(&mut test.test_module, &arg.test_module);
                    }
                }
            }
        }
    }

    /// Overlays a repository reported by a webhook onto every test module
    pub fn merge_webhook_repo(&mut self, repo: &Repository) {
        for module in self.spec.test_modules.iter_mut() {
            module.repos = merge_repos(&module.repos, std::slice::from_ref(repo));
        }
    }

    /// Compiles the job into one task per (test suite, target) pair
    pub async fn to_jobs(&mut self, task_id: i64) -> Result<Vec<JobTask>, CompileError> {
        let default_store = self
            .catalog
            .find_default_object_store()
            .await
            .map_err(CompileError::lookup("default object storage"))?;

        let assembler = TaskAssembler {
            workflow: self.workflow,
            job_name: self.name,
            error_policy: self.error_policy,
            catalog: self.catalog,
            system_address: self.system_address,
            task_id,
            default_store: &default_store,
        };

        let mut tasks = Vec::new();
        if self.spec.test_type == TestType::Product {
            for module in &self.spec.test_modules {
                tasks.push(assembler.to_job_task(module, None).await?);
            }
        }

        if self.spec.source == JobSource::FromJob {
            if !self.spec.origin_job_name.is_empty() {
                self.spec.job_name = self.spec.origin_job_name.clone();
            }
            self.spec.target_services = resolve_targets(self.workflow, &self.spec.job_name)?;
        }

        if self.spec.test_type == TestType::Service {
            for target in &self.spec.target_services {
                for test in self.spec.service_and_tests.iter().filter(|t| t.matches(target)) {
                    tasks.push(assembler.to_job_task(&test.test_module, Some(target)).await?);
                }
            }
        }

        tracing::info!("Compiled job {} into {} task(s)", self.name, tasks.len());
        Ok(tasks)
    }

    pub fn lint_job(&self) -> Result<(), CompileError> {
        outputs::lint_job(self.workflow, self.name, self.spec)
    }

    pub async fn get_outputs(&self) -> Vec<String> {
        outputs::get_outputs(self.catalog, self.name, self.spec).await
    }
}

async fn apply_catalog_defaults<C: CatalogRepository + ?Sized>(catalog: &C, module: &mut TestModule) {
    match catalog.find_testing(&module.name).await {
        Ok(info) => {
            module.repos = merge_repos(&info.repos, &module.repos);
            module.key_vals = render_key_vals(&module.key_vals, &info.pre_test.envs);
        }
        Err(e) => tracing::error!("Failed to find testing {}: {}", module.name, e),
    }
}

fn merge_module(module: &mut TestModule, arg: &TestModule) {
    module.repos = merge_repos(&module.repos, &arg.repos);
    module.key_vals = render_key_vals(&arg.key_vals, &module.key_vals);
}

// =============================================================================
// Workflow
// =============================================================================

/// Lints the job references of every testing job
pub fn lint_workflow(workflow: &Workflow) -> Result<(), CompileError> {
    for job in workflow.jobs() {
        if let JobSpec::Testing(spec) = &job.spec {
            outputs::lint_job(workflow, &job.name, spec)?;
        }
    }
    Ok(())
}

/// Compiles every testing job of a workflow in stage order
pub async fn compile_workflow<C: CatalogRepository + ?Sized>(
    workflow: &Workflow,
    catalog: &C,
    system_address: &str,
    task_id: i64,
) -> Result<Vec<JobTask>, CompileError> {
    lint_workflow(workflow)?;

    let mut tasks = Vec::new();
    for job in workflow.jobs() {
        if !matches!(job.spec, JobSpec::Testing(_)) {
            tracing::debug!("Skipping {} job {}", job.job_type(), job.name);
            continue;
        }
        let mut job = job.clone();
        let mut testing = TestingJob::instantiate(&mut job, workflow, catalog, system_address)?;
        tasks.extend(testing.to_jobs(task_id).await?);
    }
    Ok(tasks)
}
