//! Zadig orchestrator CLI
//!
//! Operator entry point for migrations, workflow linting and compilation,
//! and environment service syncs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zadig_core::domain::environment::ProductService;
use zadig_core::domain::workflow::Workflow;
use zadig_orchestrator::config::Config;
use zadig_orchestrator::db;
use zadig_orchestrator::repository::{
    CatalogRepository, InMemoryCatalog, PgCatalogRepository, PgEnvironmentRepository,
};
use zadig_orchestrator::service::env_service::{EnvironmentService, ServicesUpdate};
use zadig_orchestrator::service::job_service::{self, TestingJob};

#[derive(Parser)]
#[command(name = "zadig-orchestrator")]
#[command(about = "Zadig testing job compiler and environment merge engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the database schema
    Migrate,
    /// Check the job references of a workflow
    Lint {
        /// Workflow definition (JSON)
        #[arg(long)]
        workflow: PathBuf,
    },
    /// Compile every testing job of a workflow into tasks
    Compile {
        /// Workflow definition (JSON)
        #[arg(long)]
        workflow: PathBuf,
        /// Catalog snapshot (JSON); the database catalog is used when omitted
        #[arg(long, env = "ZADIG_CATALOG")]
        catalog: Option<PathBuf>,
        #[arg(long, default_value_t = 1)]
        task_id: i64,
    },
    /// List the output keys a testing job exposes
    Outputs {
        #[arg(long)]
        workflow: PathBuf,
        #[arg(long)]
        job: String,
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Merge a service list into an environment
    SyncEnv {
        #[arg(long)]
        product: String,
        #[arg(long)]
        env: String,
        /// Grouped services (JSON), or a single group with --group
        #[arg(long)]
        services: PathBuf,
        /// Replace only the group at this index
        #[arg(long)]
        group: Option<usize>,
        #[arg(long)]
        production: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zadig_orchestrator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.validate()?;

    match cli.command {
        Commands::Migrate => {
            let pool = db::create_pool(&config).await?;
            db::run_migrations(&pool).await?;
        }
        Commands::Lint { workflow } => {
            let workflow: Workflow = read_json(&workflow)?;
            job_service::lint_workflow(&workflow)?;
            tracing::info!("Workflow {} is valid", workflow.name);
        }
        Commands::Compile {
            workflow,
            catalog,
            task_id,
        } => {
            let workflow: Workflow = read_json(&workflow)?;
            let catalog = open_catalog(&config, catalog.as_deref()).await?;
            let tasks = job_service::compile_workflow(
                &workflow,
                catalog.as_ref(),
                &config.system_address,
                task_id,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        Commands::Outputs {
            workflow,
            job,
            catalog,
        } => {
            let workflow: Workflow = read_json(&workflow)?;
            let catalog = open_catalog(&config, catalog.as_deref()).await?;
            let mut target = workflow
                .find_job(&job)
                .cloned()
                .with_context(|| format!("job {} not found in workflow {}", job, workflow.name))?;
            let testing = TestingJob::instantiate(
                &mut target,
                &workflow,
                catalog.as_ref(),
                &config.system_address,
            )?;
            for key in testing.get_outputs().await {
                println!("{}", key);
            }
        }
        Commands::SyncEnv {
            product,
            env,
            services,
            group,
            production,
        } => {
            let update = match group {
                Some(index) => ServicesUpdate::Group {
                    index,
                    group: read_json::<Vec<ProductService>>(&services)?,
                },
                None => ServicesUpdate::All(read_json::<Vec<Vec<ProductService>>>(&services)?),
            };
            let pool = db::create_pool(&config).await?;
            let envs = EnvironmentService::new(PgEnvironmentRepository::new(pool));
            envs.commit(&product, &env, production, update).await?;
            tracing::info!("Environment {}/{} updated", product, env);
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

async fn open_catalog(
    config: &Config,
    snapshot: Option<&Path>,
) -> Result<Box<dyn CatalogRepository>> {
    match snapshot {
        Some(path) => Ok(Box::new(read_json::<InMemoryCatalog>(path)?)),
        None => {
            let pool = db::create_pool(config).await?;
            Ok(Box::new(PgCatalogRepository::new(pool)))
        }
    }
}
