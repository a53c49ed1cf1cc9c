//! Rig command implementation.

use anyhow::{Context, Result};
use contracts::{RigConfig, RigSettings};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::quit::{CompositeQuitListener, StdinQuitListener};

/// Load settings, validate the run configuration and run the rig
pub async fn run_rig(cli: &Cli) -> Result<()> {
    let rig = load_rig_config(cli)?;

    info!(
        camera = %rig.camera,
        resolution = %rig.resolution,
        frequency = rig.frequency,
        tick_delays = ?rig.settings.tick_delays_s,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if cli.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        if cli.json {
            let summary = ConfigSummary::new(&rig);
            let json = serde_json::to_string_pretty(&summary)
                .context("Failed to serialize configuration summary")?;
            println!("{json}");
        } else {
            print_config_summary(&rig);
        }
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        display: cli.display.into(),
        output_dir: cli.output_dir.clone(),
        dump_every: cli.dump_every,
        max_iterations: cli.max_iterations(),
        handle_signals: true,
        ..PipelineConfig::new(rig)
    };

    let mut quit = CompositeQuitListener::new();
    match StdinQuitListener::new() {
        Ok(listener) => quit.push(Box::new(listener)),
        Err(e) => warn!(error = %e, "Stdin quit listener unavailable"),
    }

    info!(
        quit_listeners = quit.len(),
        "Starting rig... (type 'q' + Enter or press Ctrl+C to stop)"
    );
    let stats = Pipeline::new(pipeline_config)
        .run(quit)
        .await
        .context("Rig execution failed")?;

    stats.print_summary();

    if stats.is_failure() {
        if let Some(reason) = stats.reason {
            return Err(CliError::RunAborted { reason }.into());
        }
    }

    info!("Rate Sync finished");
    Ok(())
}

/// Settings file (or defaults) plus command-line values, validated
fn load_rig_config(cli: &Cli) -> Result<RigConfig> {
    let mut settings = match &cli.config {
        Some(path) => {
            info!(config = %path.display(), "Loading rig settings");
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?
        }
        None => RigSettings::default(),
    };

    if let Some(policy) = cli.stale_frames {
        settings.stale_frame_policy = policy.into();
    }

    config_loader::ConfigLoader::build(&cli.camera, &cli.resolution, cli.frequency, settings)
        .context("Invalid run configuration")
}

/// Dry-run summary for JSON output
#[derive(Debug, Serialize)]
struct ConfigSummary {
    camera: String,
    resolution: String,
    frequency: f64,
    normalized_target: f64,
    ticks: Vec<TickSummary>,
    #[serde(flatten)]
    settings: RigSettings,
}

#[derive(Debug, Serialize)]
struct TickSummary {
    name: String,
    delay_s: f64,
    ratio: f64,
}

impl ConfigSummary {
    fn new(rig: &RigConfig) -> Self {
        // Validated config: at least one positive delay
        let min_delay = rig.settings.min_delay().unwrap_or(1.0);
        Self {
            camera: rig.camera.clone(),
            resolution: rig.resolution.to_string(),
            frequency: rig.frequency,
            normalized_target: rig.frequency / min_delay,
            ticks: rig
                .settings
                .tick_delays_s
                .iter()
                .enumerate()
                .map(|(index, delay)| TickSummary {
                    name: RigConfig::tick_name(index),
                    delay_s: *delay,
                    ratio: delay / min_delay,
                })
                .collect(),
            settings: rig.settings.clone(),
        }
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(rig: &RigConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Camera: {}", rig.camera);
    println!("Resolution: {}", rig.resolution);
    println!("Target frequency: {}", rig.frequency);
    println!("\nTick sensors ({}):", rig.tick_count());
    for (index, delay) in rig.settings.tick_delays_s.iter().enumerate() {
        println!("  - {} every {}s", RigConfig::tick_name(index), delay);
    }
    println!("\nDisplay:");
    println!("  Window: {}", rig.settings.window_name);
    println!("  Stale frames: {:?}", rig.settings.stale_frame_policy);
    println!("  Poll interval: {}ms", rig.settings.poll_interval_ms);
    if let Some(limit) = rig.settings.frame_failure_limit {
        println!("  Frame failure limit: {limit}");
    }
    println!();
}
