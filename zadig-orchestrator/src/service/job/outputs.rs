//! Output keys and reference linting

use std::collections::HashSet;
use zadig_core::domain::catalog::Output;
use zadig_core::domain::workflow::{JobSource, TestType, TestingJobSpec, Workflow};

use crate::error::CompileError;
use crate::repository::CatalogRepository;

/// Rejects a job quoting a job that does not run strictly before it
pub fn lint_job(workflow: &Workflow, job_name: &str, spec: &TestingJobSpec) -> Result<(), CompileError> {
    if spec.source != JobSource::FromJob {
        return Ok(());
    }

    match (workflow.job_rank(&spec.job_name), workflow.job_rank(job_name)) {
        (Some(referenced), Some(own)) if referenced < own => Ok(()),
        _ => Err(CompileError::InvalidReference {
            job: job_name.to_string(),
            referenced: spec.job_name.clone(),
        }),
    }
}

/// Addressed output keys of every referenced test suite
///
/// Suites missing from the catalog are skipped. A suite referenced by several
/// modules contributes its keys once.
pub async fn get_outputs<C: CatalogRepository + ?Sized>(
    catalog: &C,
    job_name: &str,
    spec: &TestingJobSpec,
) -> Vec<String> {
    let referenced: Vec<&str> = match spec.test_type {
        TestType::Product => spec.test_modules.iter().map(|m| m.name.as_str()).collect(),
        TestType::Service => spec
            .service_and_tests
            .iter()
            .map(|t| t.test_module.name.as_str())
            .collect(),
    };
    let mut seen = HashSet::new();
    let names: Vec<String> = referenced
        .into_iter()
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect();

    let infos = match catalog.list_testings(&names).await {
        Ok(infos) => infos,
        Err(e) => {
            tracing::error!("Failed to list testings for job {}: {}", job_name, e);
            return Vec::new();
        }
    };

    let mut keys = Vec::new();
    match spec.test_type {
        TestType::Product => {
            for info in &infos {
                keys.extend(output_keys(&[job_name, info.name.as_str()].join("."), &info.outputs));
            }
        }
        TestType::Service => {
            for target in &spec.target_services {
                for test in spec.service_and_tests.iter().filter(|t| t.matches(target)) {
                    let Some(info) = infos.iter().find(|i| i.name == test.test_module.name) else {
                        continue;
                    };
                    let key = [
                        job_name,
                        info.name.as_str(),
                        target.service_name.as_str(),
                        target.service_module.as_str(),
                    ]
                    .join(".");
                    keys.extend(output_keys(&key, &info.outputs));
                }
            }
        }
    }
    keys
}

pub fn output_keys(job_key: &str, outputs: &[Output]) -> Vec<String> {
    outputs
        .iter()
        .map(|output| format!("{{{{.job.{}.output.{}}}}}", job_key, output.name))
        .collect()
}
