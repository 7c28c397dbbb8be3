use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use eyre::{Context, Result};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use assetgen::cli::{Cli, Command, OutputFormat, get_log_path};
use assetgen::config::Config;
use assetgen::domain::Component;
use assetgen::renderer::SyntheticBackend;
use assetgen::scheduler::{JobOutcome, RenderJob, RenderJobManager, SchedulerStats};

fn setup_logging(cli: &Cli) -> Result<()> {
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Simulate output goes to stdout, so tracing writes to the file only
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context(format!("Failed to open log file {}", log_path.display()))?;

    let directive = cli.log_directive();
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&directive))?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();

    info!(%directive, log_path = %log_path.display(), "Logging initialized");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "assetgen loaded config: max_jobs={}, quiet_period_ms={}",
        config.scheduler.effective_max_jobs(),
        config.scheduler.quiet_period_ms
    );

    match cli.command {
        Some(Command::Simulate {
            components,
            documents,
            vector_every,
            max_jobs,
            quiet_period_ms,
            cancel_every,
            format,
        }) => {
            let plan = SimulationPlan {
                components,
                documents: documents.max(1),
                vector_every,
                cancel_every,
            };
            cmd_simulate(config, plan, max_jobs, quiet_period_ms, format).await
        }
        Some(Command::Config) => cmd_config(&config),
        None => {
            println!("No command given. Run `ag --help` for usage.");
            Ok(())
        }
    }
}

struct SimulationPlan {
    components: usize,
    documents: usize,
    vector_every: usize,
    cancel_every: usize,
}

impl SimulationPlan {
    fn jobs(&self) -> Vec<RenderJob> {
        (0..self.components)
            .map(|i| {
                let extension = if self.vector_every > 0 && (i + 1) % self.vector_every == 0 {
                    "svg"
                } else {
                    "png"
                };
                let document = format!("doc-{}", i % self.documents);
                let layer = format!("layer-{}", i);
                let component = Component::new(format!("component-{}", i), extension);
                RenderJob::new(document, layer, component)
            })
            .collect()
    }

    fn cancels(&self, index: usize) -> bool {
        self.cancel_every > 0 && (index + 1) % self.cancel_every == 0
    }
}

#[derive(Debug, Default, Serialize)]
struct SimulationReport {
    max_jobs: usize,
    quiet_period_ms: u64,
    completed: usize,
    failed: usize,
    cancelled: usize,
    renders: u64,
    elapsed_ms: u128,
    stats: SchedulerStats,
}

async fn cmd_simulate(
    mut config: Config,
    plan: SimulationPlan,
    max_jobs: Option<usize>,
    quiet_period_ms: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    if max_jobs.is_some() {
        config.scheduler.max_jobs = max_jobs;
    }
    if let Some(quiet) = quiet_period_ms {
        config.scheduler.quiet_period_ms = quiet;
    }
    config.validate().context("Invalid simulate options")?;

    let backend = Arc::new(SyntheticBackend::new(config.synthetic.clone()));
    let manager = RenderJobManager::spawn(config.scheduler.clone(), backend.clone(), backend.clone());
    let started = Instant::now();

    let mut handles = Vec::with_capacity(plan.components);
    for (index, job) in plan.jobs().into_iter().enumerate() {
        let component_id = job.component_id().clone();
        let handle = manager.submit(job).await.context("Failed to submit render job")?;
        if plan.cancels(index) {
            manager.cancel(&component_id).await.context("Failed to cancel render job")?;
        }
        handles.push(handle);
    }

    let outcomes = futures::future::join_all(handles.into_iter().map(|h| h.outcome())).await;

    let state = manager.snapshot().await.context("Failed to read scheduler state")?;
    manager.shutdown().await.context("Failed to shut down scheduler")?;

    let mut report = SimulationReport {
        max_jobs: state.max_jobs,
        quiet_period_ms: config.scheduler.quiet_period_ms,
        renders: backend.render_count(),
        elapsed_ms: started.elapsed().as_millis(),
        stats: state.stats,
        ..Default::default()
    };
    for outcome in &outcomes {
        match outcome {
            JobOutcome::Completed(_) => report.completed += 1,
            JobOutcome::Failed(_) => report.failed += 1,
            JobOutcome::Cancelled => report.cancelled += 1,
        }
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Simulation finished in {}ms", report.elapsed_ms);
            println!("  max jobs:      {}", report.max_jobs);
            println!("  quiet period:  {}ms", report.quiet_period_ms);
            println!("  completed:     {}", report.completed);
            println!("  failed:        {}", report.failed);
            println!("  cancelled:     {}", report.cancelled);
            println!("  renders:       {}", report.renders);
            println!("  drain cycles:  {}", report.stats.total_drains);
            println!("  peak running:  {}", report.stats.peak_running);
        }
    }

    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}
