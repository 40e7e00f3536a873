//! Cross-job target resolution
//!
//! A job whose source is another job inherits that job's service targets.

use std::collections::HashSet;
use zadig_core::domain::workflow::{JobSpec, ServiceTestTarget, Workflow};

use crate::error::CompileError;

/// Recovers the service targets declared by the named upstream job
///
/// Stages and their jobs are scanned in declaration order and the first job
/// with that name whose type carries targets wins.
pub fn resolve_targets(
    workflow: &Workflow,
    job_name: &str,
) -> Result<Vec<ServiceTestTarget>, CompileError> {
    for job in workflow.jobs().filter(|job| job.name == job_name) {
        let targets = match &job.spec {
            JobSpec::Build(spec) => spec
                .service_and_builds
                .iter()
                .map(|build| ServiceTestTarget::new(&build.service_name, &build.service_module))
                .collect(),
            JobSpec::DistributeImage(spec) => spec
                .targets
                .iter()
                .map(|target| ServiceTestTarget::new(&target.service_name, &target.service_module))
                .collect(),
            JobSpec::Deploy(spec) => spec
                .services
                .iter()
                .flat_map(|svc| {
                    svc.modules
                        .iter()
                        .map(|module| ServiceTestTarget::new(&svc.service_name, &module.service_module))
                })
                .collect(),
            JobSpec::Scanning(spec) => spec.target_services.clone(),
            JobSpec::Testing(_) => continue,
        };
        return Ok(targets);
    }

    Err(CompileError::ReferencedJobNotFound(job_name.to_string()))
}

/// Follows a chain of job references to the job that owns the targets
///
/// Stops at the first job that does not quote another job, at an unknown
/// name, or when the chain loops back on itself.
pub fn resolve_origin_job_name(workflow: &Workflow, job_name: &str) -> String {
    let mut current = job_name.to_string();
    let mut visited = HashSet::new();

    while visited.insert(current.clone()) {
        let Some(next) = workflow
            .find_job(&current)
            .and_then(|job| job.spec.quoted_job())
        else {
            break;
        };
        current = next.to_string();
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use zadig_core::domain::workflow::{
        BuildJobSpec, DeployJobSpec, DeployModuleInfo, DeployServiceInfo, DistributeImageJobSpec,
        DistributeTarget, JobSource, ScanningJobSpec, ServiceAndBuild, TestingJobSpec, WorkflowJob,
        WorkflowStage,
    };

    fn job(name: &str, spec: JobSpec) -> WorkflowJob {
        WorkflowJob {
            name: name.to_string(),
            spec,
            error_policy: None,
        }
    }

    fn workflow(stages: Vec<Vec<WorkflowJob>>) -> Workflow {
        Workflow {
            name: "release".to_string(),
            project: "mall".to_string(),
            stages: stages
                .into_iter()
                .enumerate()
                .map(|(i, jobs)| WorkflowStage {
                    name: format!("stage-{}", i),
                    jobs,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn build(service: &str, module: &str) -> ServiceAndBuild {
        ServiceAndBuild {
            service_name: service.to_string(),
            service_module: module.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_targets_in_declaration_order() {
        let wf = workflow(vec![vec![job(
            "build1",
            JobSpec::Build(BuildJobSpec {
                service_and_builds: vec![build("svcA", "modA"), build("svcB", "modB")],
                ..Default::default()
            }),
        )]]);

        let targets = resolve_targets(&wf, "build1").unwrap();
        assert_eq!(
            targets,
            vec![
                ServiceTestTarget::new("svcA", "modA"),
                ServiceTestTarget::new("svcB", "modB")
            ]
        );
    }

    #[test]
    fn test_missing_job_is_not_found() {
        let wf = workflow(vec![vec![]]);
        assert!(matches!(
            resolve_targets(&wf, "ghost"),
            Err(CompileError::ReferencedJobNotFound(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_distribute_deploy_and_scanning_targets() {
        let wf = workflow(vec![
            vec![job(
                "distribute",
                JobSpec::DistributeImage(DistributeImageJobSpec {
                    targets: vec![DistributeTarget {
                        service_name: "svcA".to_string(),
                        service_module: "modA".to_string(),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            )],
            vec![job(
                "deploy",
                JobSpec::Deploy(DeployJobSpec {
                    services: vec![DeployServiceInfo {
                        service_name: "svcB".to_string(),
                        modules: vec![
                            DeployModuleInfo {
                                service_module: "m1".to_string(),
                                ..Default::default()
                            },
                            DeployModuleInfo {
                                service_module: "m2".to_string(),
                                ..Default::default()
                            },
                        ],
                    }],
                    ..Default::default()
                }),
            )],
            vec![job(
                "scan",
                JobSpec::Scanning(ScanningJobSpec {
                    target_services: vec![ServiceTestTarget::new("svcC", "modC")],
                    ..Default::default()
                }),
            )],
        ]);

        assert_eq!(resolve_targets(&wf, "distribute").unwrap().len(), 1);
        assert_eq!(
            resolve_targets(&wf, "deploy").unwrap(),
            vec![ServiceTestTarget::new("svcB", "m1"), ServiceTestTarget::new("svcB", "m2")]
        );
        assert_eq!(
            resolve_targets(&wf, "scan").unwrap(),
            vec![ServiceTestTarget::new("svcC", "modC")]
        );
    }

    #[test]
    fn test_testing_job_is_skipped() {
        let wf = workflow(vec![vec![job("test1", JobSpec::Testing(TestingJobSpec::default()))]]);
        assert!(resolve_targets(&wf, "test1").is_err());
    }

    #[test]
    fn test_origin_job_name_follows_chain() {
        let wf = workflow(vec![
            vec![job("build1", JobSpec::Build(BuildJobSpec::default()))],
            vec![job(
                "deploy1",
                JobSpec::Deploy(DeployJobSpec {
                    source: JobSource::FromJob,
                    job_name: "build1".to_string(),
                    ..Default::default()
                }),
            )],
            vec![
                job(
                    "loop-a",
                    JobSpec::Scanning(ScanningJobSpec {
                        source: JobSource::FromJob,
                        job_name: "loop-b".to_string(),
                        ..Default::default()
                    }),
                ),
                job(
                    "loop-b",
                    JobSpec::Scanning(ScanningJobSpec {
                        source: JobSource::FromJob,
                        job_name: "loop-a".to_string(),
                        ..Default::default()
                    }),
                ),
            ],
        ]);

        assert_eq!(resolve_origin_job_name(&wf, "deploy1"), "build1");
        assert_eq!(resolve_origin_job_name(&wf, "build1"), "build1");
        assert_eq!(resolve_origin_job_name(&wf, "ghost"), "ghost");
        assert_eq!(resolve_origin_job_name(&wf, "loop-a"), "loop-a");
    }
}
