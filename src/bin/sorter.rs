//! Run one point-cloud frame through the sorter and write everything it produces.

use anyhow::Context;
use clap::Parser;
use sorter::classifier::ModelArtifact;
use sorter::planner::SceneConfig;
use sorter::point_cloud::PcaNormalEstimator;
use sorter::{init_thread_pool, DirectoryPublisher, Perception, PipelineConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sorter")]
#[command(about = "Recognize tabletop objects and plan pick/place commands")]
struct Cli {
    /// Input cloud (.ply or .pcd, ASCII)
    #[arg(long)]
    cloud: PathBuf,

    /// Scene pick list and dropbox layout (YAML)
    #[arg(long)]
    scene: PathBuf,

    /// Trained model artifact (JSON)
    #[arg(long)]
    model: PathBuf,

    /// Pipeline configuration (YAML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Worker threads for per-cluster work
    #[arg(long)]
    threads: Option<usize>,

    /// Neighbors used for normal estimation
    #[arg(long, default_value = "15")]
    normal_k: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    init_thread_pool(cli.threads).map_err(anyhow::Error::msg)?;
    info!(threads = sorter::core::current_cpu_threads(), "Thread pool ready");

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let scene = SceneConfig::load(&cli.scene)
        .with_context(|| format!("loading scene {}", cli.scene.display()))?;
    let model = ModelArtifact::load(&cli.model)
        .with_context(|| format!("loading model {}", cli.model.display()))?;
    let cloud = sorter::io::read_cloud(&cli.cloud)
        .with_context(|| format!("reading cloud {}", cli.cloud.display()))?;
    info!(points = cloud.len(), "Read {}", cli.cloud.display());

    let publisher = DirectoryPublisher::new(&cli.out)?;
    let mut perception = Perception::new(
        config,
        scene,
        Arc::new(model),
        Arc::new(PcaNormalEstimator::new(cli.normal_k)),
        publisher,
    )?;

    let result = perception.on_frame(&cloud);
    info!(
        clusters = result.clusters.len(),
        detections = result.detections.len(),
        commands = result.plan.commands.len(),
        gaps = result.plan.gaps.len(),
        "Frame done"
    );

    Ok(())
}
