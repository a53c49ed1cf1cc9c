//! Rig orchestrator - coordinates all components.
//!
//! Startup order: synchronizer, tick sensors, capture device, display surface,
//! then the producer threads (camera first). Any startup failure before the
//! threads exist stops the run with nothing to join. Shutdown always joins
//! every producer before the capture device and the window are released.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{CancelReason, DisplayKind, DisplaySurface, QuitListener, RigConfig, Sensor};
use ingestion::{
    open_device, spawn_producer, FrameSensor, ProducerExit, ProducerHandle, RigContext, TickSensor,
};
use renderer::{FileSurface, FileSurfaceConfig, LogSurface, Renderer};
use sync_engine::{run_consumer, ConsumerOptions, Synchronizer};
use tracing::{debug, error, info, warn};

use super::PipelineStats;
use crate::error::CliError;
use crate::quit::{watch_signals, CompositeQuitListener};

/// Name of the camera sensor in logs and metrics
pub const FRAME_SENSOR_NAME: &str = "camera";

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated rig configuration
    pub rig: RigConfig,

    /// Display surface
    pub display: DisplayKind,

    /// Output directory for the file surface
    pub output_dir: PathBuf,

    /// Write every n-th frame (file surface)
    pub dump_every: u64,

    /// Maximum consumer iterations (None = unlimited)
    pub max_iterations: Option<u64>,

    /// Install Ctrl+C / SIGTERM handlers for the duration of the run
    pub handle_signals: bool,
}

impl PipelineConfig {
    pub fn new(rig: RigConfig) -> Self {
        Self {
            rig,
            display: DisplayKind::Log,
            output_dir: PathBuf::from("./output"),
            dump_every: 1,
            max_iterations: None,
            handle_signals: true,
        }
    }
}

/// Main rig orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the rig until it is cancelled
    ///
    /// Returns `Err` when the rig could not start. A run that started and
    /// later stopped on a device or render failure returns `Ok`; check
    /// [`PipelineStats::is_failure`].
    pub async fn run(self, mut quit: CompositeQuitListener) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let rig = &self.config.rig;
        let ctx = RigContext::new(rig.tick_count());

        let mut sync = Synchronizer::from_config(rig).context("Failed to set up synchronizer")?;

        let mut tick_sensors = Vec::with_capacity(rig.tick_count());
        for (index, delay) in rig.settings.tick_delays_s.iter().enumerate() {
            let name = RigConfig::tick_name(index);
            match TickSensor::with_delay_secs(name.as_str(), *delay) {
                Ok(sensor) => tick_sensors.push((index, sensor)),
                Err(e) => {
                    ctx.cancel.cancel(CancelReason::DeviceFailure {
                        sensor: name,
                        message: e.to_string(),
                    });
                    ctx.cancel.mark_stopped();
                    return Err(e).context("Failed to set up tick sensors");
                }
            }
        }

        // Device first: failing here must not leave any thread behind
        let frame_sensor = match open_frame_sensor(rig) {
            Ok(sensor) => sensor,
            Err(e) => {
                error!(critical = true, camera = %rig.camera, error = %e, "Capture device unavailable");
                ctx.cancel.cancel(CancelReason::DeviceFailure {
                    sensor: FRAME_SENSOR_NAME.to_string(),
                    message: e.to_string(),
                });
                ctx.cancel.mark_stopped();
                return Err(e.into());
            }
        };

        let (surface, window_quit) = match build_surface(&self.config) {
            Ok(parts) => parts,
            Err(e) => {
                drop(frame_sensor);
                ctx.cancel.cancel(CancelReason::RenderFailure(e.to_string()));
                ctx.cancel.mark_stopped();
                return Err(e.into());
            }
        };
        if let Some(listener) = window_quit {
            quit.push(listener);
        }
        if quit.is_empty() {
            debug!("No quit listener installed");
        }
        let mut renderer = Renderer::new(
            surface,
            rig.settings.window_name.clone(),
            rig.settings.overlay,
        );

        let signal_task = self
            .config
            .handle_signals
            .then(|| watch_signals(ctx.cancel.clone()));

        info!(
            camera = %rig.camera,
            resolution = %rig.resolution,
            frequency = rig.frequency,
            ticks = rig.tick_count(),
            display = self.config.display.as_str(),
            "Starting producers"
        );

        let Producers {
            frame: frame_handle,
            ticks: tick_handles,
            started,
        } = start_producers(&ctx, frame_sensor, tick_sensors);

        let report = if started {
            let options = ConsumerOptions {
                poll_interval: rig.settings.poll_interval(),
                max_iterations: self.config.max_iterations,
            };
            let report =
                run_consumer(&ctx, &mut sync, &mut quit, |rv| renderer.render(rv), &options)
                    .await
                    .context("Consumer loop failed");
            Some(report)
        } else {
            None
        };

        // Shutdown
        ctx.cancel.cancel(CancelReason::EndOfRun);
        info!(reason = ?ctx.cancel.reason(), "Shutting down rig...");

        let mut shutdown_errors = Vec::new();
        for handle in tick_handles {
            if let Err(e) = join_producer(handle).await {
                shutdown_errors.push(e);
            }
        }

        let mut frames_captured = 0;
        if let Some(handle) = frame_handle {
            match join_producer(handle).await {
                Ok(mut sensor) => {
                    frames_captured = sensor.frames_captured();
                    sensor.release();
                }
                Err(e) => shutdown_errors.push(e),
            }
        }

        renderer.close();
        ctx.queues.close();
        if let Some(task) = signal_task {
            task.abort();
        }
        ctx.cancel.mark_stopped();

        if !shutdown_errors.is_empty() {
            for e in &shutdown_errors {
                error!(error = %e, "Producer shutdown failed");
            }
            return Err(CliError::shutdown(
                shutdown_errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
            .into());
        }

        let report = match report {
            Some(report) => report?,
            None => {
                let reason = ctx.cancel.reason().unwrap_or(CancelReason::EndOfRun);
                return Err(CliError::RunAborted { reason }.into());
            }
        };

        let mut sensor_names: Vec<String> =
            (0..rig.tick_count()).map(RigConfig::tick_name).collect();
        sensor_names.push(FRAME_SENSOR_NAME.to_string());

        let stats = PipelineStats {
            duration: start_time.elapsed(),
            sensor_names,
            readings_drained: report.readings_drained,
            ingestion: ctx.metrics.snapshot(),
            frames_captured,
            frames_shown: renderer.frames_shown(),
            reason: report.reason,
            hold: report.stats,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            hold_advances = stats.hold.advances,
            frames_shown = stats.frames_shown,
            "Rig shutdown complete"
        );

        Ok(stats)
    }
}

/// Open, wrap and configure the capture device
fn open_frame_sensor(rig: &RigConfig) -> Result<FrameSensor, CliError> {
    let device =
        open_device(&rig.camera).map_err(|e| CliError::device_open(&rig.camera, e.to_string()))?;
    let mut sensor = FrameSensor::new(FRAME_SENSOR_NAME, device)
        .map_err(|e| CliError::device_open(&rig.camera, e.to_string()))?
        .with_failure_limit(rig.settings.frame_failure_limit);
    sensor
        .configure(rig.resolution.width, rig.resolution.height)
        .map_err(|e| CliError::device_open(&rig.camera, e.to_string()))?;
    Ok(sensor)
}

type SurfaceParts = (Box<dyn DisplaySurface>, Option<Box<dyn QuitListener>>);

/// Create the configured display surface (and its keyboard, if it has one)
fn build_surface(config: &PipelineConfig) -> Result<SurfaceParts, CliError> {
    match config.display {
        DisplayKind::Log => Ok((Box::new(LogSurface::new("log")), None)),
        DisplayKind::File => {
            let surface = FileSurface::new(
                "file",
                FileSurfaceConfig {
                    output_dir: config.output_dir.clone(),
                    dump_every: config.dump_every,
                },
            )
            .map_err(|e| CliError::display_unavailable("file", e.to_string()))?;
            info!(output_dir = %config.output_dir.display(), "Writing frames to disk");
            Ok((Box::new(surface), None))
        }
        DisplayKind::Window => build_window_surface(),
    }
}

#[cfg(feature = "window")]
fn build_window_surface() -> Result<SurfaceParts, CliError> {
    let surface = renderer::WindowSurface::new("window")
        .map_err(|e| CliError::display_unavailable("window", e.to_string()))?;
    let quit = surface.quit_listener();
    Ok((Box::new(surface), Some(Box::new(quit))))
}

#[cfg(not(feature = "window"))]
fn build_window_surface() -> Result<SurfaceParts, CliError> {
    Err(CliError::display_unavailable(
        "window",
        "built without the `window` feature",
    ))
}

/// Producer threads that made it past startup
struct Producers {
    frame: Option<ProducerHandle<FrameSensor>>,
    ticks: Vec<ProducerHandle<TickSensor>>,
    started: bool,
}

/// Spawn the camera producer, then one producer per tick sensor
///
/// The camera goes first so a failed camera spawn leaves no tick thread
/// running. When a later spawn fails the run is cancelled and every handle
/// spawned so far is returned for the normal shutdown path.
fn start_producers(
    ctx: &RigContext,
    frame_sensor: FrameSensor,
    tick_sensors: Vec<(usize, TickSensor)>,
) -> Producers {
    let mut producers = Producers {
        frame: None,
        ticks: Vec::with_capacity(tick_sensors.len()),
        started: false,
    };

    match spawn_producer(frame_sensor, ctx.frame_index(), ctx) {
        Ok(handle) => producers.frame = Some(handle),
        Err(e) => {
            abort_startup(ctx, FRAME_SENSOR_NAME, &e);
            return producers;
        }
    }

    for (index, sensor) in tick_sensors {
        let name = sensor.name().to_string();
        match spawn_producer(sensor, index, ctx) {
            Ok(handle) => producers.ticks.push(handle),
            Err(e) => {
                abort_startup(ctx, &name, &e);
                return producers;
            }
        }
    }

    producers.started = true;
    producers
}

fn abort_startup(ctx: &RigContext, sensor: &str, e: &ingestion::IngestionError) {
    error!(critical = true, sensor = %sensor, error = %e, "Producer failed to start");
    ctx.cancel.cancel(CancelReason::DeviceFailure {
        sensor: sensor.to_string(),
        message: e.to_string(),
    });
}

/// Join a producer thread without blocking the runtime, handing back its sensor
async fn join_producer<S>(handle: ProducerHandle<S>) -> Result<S>
where
    S: Sensor + 'static,
{
    let name = handle.name().to_string();
    let (sensor, exit) = tokio::task::spawn_blocking(move || handle.join())
        .await
        .with_context(|| format!("Join task for producer {name} failed"))??;

    match &exit {
        ProducerExit::Cancelled => debug!(sensor = %name, "Producer stopped"),
        ProducerExit::Fatal(e) => {
            warn!(sensor = %name, error = %e, "Producer stopped on fatal error")
        }
        ProducerExit::QueueClosed => warn!(sensor = %name, "Producer stopped on closed queue"),
    }
    Ok(sensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{RigSettings, StaleFramePolicy};

    fn rig(camera: &str) -> RigConfig {
        let settings = RigSettings {
            tick_delays_s: vec![0.001, 0.002],
            stale_frame_policy: StaleFramePolicy::Mark,
            ..Default::default()
        };
        config_loader::ConfigLoader::build(camera, "32x24", 0.004, settings).unwrap()
    }

    fn config(camera: &str) -> PipelineConfig {
        PipelineConfig {
            max_iterations: Some(40),
            handle_signals: false,
            ..PipelineConfig::new(rig(camera))
        }
    }

    #[tokio::test]
    async fn test_run_until_iteration_limit() {
        let stats = Pipeline::new(config("stub://test?fps=500"))
            .run(CompositeQuitListener::new())
            .await
            .unwrap();

        assert_eq!(stats.reason, Some(CancelReason::EndOfRun));
        assert!(!stats.is_failure());
        assert_eq!(stats.hold.iterations, 40);
        assert_eq!(stats.frames_shown, 40);
        assert_eq!(stats.sensor_names, vec!["tick_0", "tick_1", "camera"]);
        assert_eq!(stats.readings_drained.len(), 3);
    }

    #[tokio::test]
    async fn test_unsupported_camera_fails_before_start() {
        let err = Pipeline::new(config("no-such-camera://x"))
            .run(CompositeQuitListener::new())
            .await
            .err()
            .unwrap();

        let cli_err = err.downcast_ref::<CliError>().unwrap();
        assert!(matches!(cli_err, CliError::DeviceOpen { .. }));
    }

    #[tokio::test]
    async fn test_device_disconnect_stops_run() {
        let mut config = config("stub://test?fps=0&disconnect_after=3");
        config.max_iterations = None;

        let stats = Pipeline::new(config)
            .run(CompositeQuitListener::new())
            .await
            .unwrap();

        assert!(stats.is_failure());
        assert!(matches!(
            stats.reason,
            Some(CancelReason::DeviceFailure { ref sensor, .. }) if sensor == "camera"
        ));
        assert_eq!(stats.frames_captured, 3);
    }

    #[tokio::test]
    async fn test_file_display_writes_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config("stub://test?fps=500");
        config.display = DisplayKind::File;
        config.output_dir = dir.path().to_path_buf();
        config.dump_every = 10;
        config.max_iterations = Some(20);

        let stats = Pipeline::new(config)
            .run(CompositeQuitListener::new())
            .await
            .unwrap();

        assert_eq!(stats.frames_shown, 20);
        assert!(dir.path().join("cam_000001.png").exists());
        assert!(dir.path().join("cam_000011.png").exists());
    }

    #[test]
    fn test_failed_tick_spawn_keeps_camera_until_joined() {
        let ctx = RigContext::new(1);
        let frame_sensor = open_frame_sensor(&rig("stub://test?fps=0")).unwrap();
        let ticks = vec![
            (0, TickSensor::with_delay_secs("tick_0", 0.001).unwrap()),
            (5, TickSensor::with_delay_secs("tick_5", 0.001).unwrap()),
        ];

        let producers = start_producers(&ctx, frame_sensor, ticks);

        assert!(!producers.started);
        assert!(ctx.cancel.is_cancelled());
        assert!(matches!(
            ctx.cancel.reason(),
            Some(CancelReason::DeviceFailure { ref sensor, .. }) if sensor == "tick_5"
        ));
        assert_eq!(producers.ticks.len(), 1);

        for handle in producers.ticks {
            handle.join().unwrap();
        }
        let (mut camera, _) = producers.frame.unwrap().join().unwrap();
        assert!(!camera.is_released());
        camera.release();
        assert!(camera.is_released());
    }

    #[cfg(not(feature = "window"))]
    #[tokio::test]
    async fn test_window_display_requires_feature() {
        let mut config = config("stub://test?fps=0");
        config.display = DisplayKind::Window;

        let err = Pipeline::new(config)
            .run(CompositeQuitListener::new())
            .await
            .err()
            .unwrap();
        let cli_err = err.downcast_ref::<CliError>().unwrap();
        assert!(matches!(cli_err, CliError::DisplayUnavailable { .. }));
    }
}
