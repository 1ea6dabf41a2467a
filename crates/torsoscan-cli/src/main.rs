//! torsoscan CLI - runs the analysis pipeline on a synthetic torso
//!
//! The scheduler is driven from a tick loop the way an interactive host
//! would drive it between frames.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use torsoscan_math::Vec3;
use torsoscan_mesh::{Mesh, TorsoPhantom};
use torsoscan_pipeline::{
    pipelines, AnalysisParams, FanOutSink, JsonLinesSink, MemorySink, PipelineContext, Scheduler,
    Tick,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "torsoscan")]
#[command(about = "Incremental geometric analysis of torso scans", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calibrate and measure the built-in torso phantom
    Demo {
        /// Shift the phantom along X before analysis (metres)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset_x: f64,
        /// Shift the phantom along Y before analysis (metres)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset_y: f64,
        /// Turn the phantom about Z before analysis (degrees)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        yaw: f64,
        /// Drop the chest protrusions
        #[arg(long)]
        flat: bool,
        /// TOML file with analysis parameters
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Append the record to this JSON lines file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the default analysis parameters as TOML
    PrintConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Demo {
            offset_x,
            offset_y,
            yaw,
            flat,
            config,
            output,
        } => {
            let params = load_params(config.as_deref())?;
            let phantom = if flat {
                TorsoPhantom::without_bumps()
            } else {
                TorsoPhantom::default()
            };
            let mut torso = phantom.build();
            torso.rotate_z(yaw.to_radians());
            torso.translate(Vec3::new(offset_x, offset_y, 0.0));
            run_demo(torso, params, output.as_deref())?;
        }
        Commands::PrintConfig => {
            print!("{}", AnalysisParams::default().to_toml_string()?);
        }
    }

    Ok(())
}

fn load_params(path: Option<&Path>) -> Result<AnalysisParams> {
    match path {
        Some(path) => AnalysisParams::load(path)
            .with_context(|| format!("failed to load parameters from {}", path.display())),
        None => Ok(AnalysisParams::default()),
    }
}

fn run_demo(
    torso: Mesh,
    params: AnalysisParams,
    output: Option<&Path>,
) -> Result<()> {
    info!(
        vertices = torso.vertex_count(),
        triangles = torso.triangle_count(),
        "phantom built"
    );
    let memory = MemorySink::new();
    let mut sink = FanOutSink::new().with(memory.clone());
    if let Some(path) = output {
        sink = sink.with(
            JsonLinesSink::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?,
        );
    }

    let mut scheduler = Scheduler::new(PipelineContext::new(torso, params)?);
    pipelines::enqueue_calibration(&mut scheduler);
    pipelines::enqueue_measurement(&mut scheduler, Box::new(sink));
    scheduler.set_on_finished(|ctx| info!(entries = ctx.blackboard().len(), "pipeline finished"));

    scheduler.start()?;
    let mut ticks = 0u64;
    let mut current = scheduler.current_task();
    loop {
        let tick = scheduler.tick().context("pipeline aborted")?;
        ticks += 1;
        if scheduler.current_task() != current {
            current = scheduler.current_task();
            debug!(ticks, next = current, "stage changed");
        }
        if tick != Tick::Pending {
            break;
        }
    }
    info!(ticks, "analysis complete");

    let record = memory
        .last()
        .context("pipeline finished without a record")?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
