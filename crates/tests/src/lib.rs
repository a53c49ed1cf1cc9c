//! # Integration Tests
//!
//! End-to-end scenarios across crates.
//!
//! - Deterministic hold-advance timeline on virtual clocks
//! - Threaded runs: quit, device failure, shutdown ordering
//! - Configuration rejection before anything starts

#[cfg(test)]
mod contract_tests {
    use contracts::{CancellationToken, RigSettings, RigState};

    #[test]
    fn test_contracts_defaults() {
        let settings = RigSettings::default();
        assert_eq!(settings.tick_delays_s, vec![0.01, 0.1, 1.0]);
        assert_eq!(CancellationToken::new().state(), RigState::Running);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{
        CancelReason, ContractError, QuitListener, Reading, RigConfig, RigSettings, RigState,
        Sensor, StaleFramePolicy,
    };
    use ingestion::{
        open_device, spawn_producer, Clock, FrameSensor, ManualClock, ProducerExit, ProducerHandle,
        RigContext, TickSensor,
    };
    use renderer::{compose_overlay, LogSurface, Renderer};
    use sync_engine::{run_consumer, ConsumerOptions, Synchronizer};

    fn rig(camera: &str, delays: Vec<f64>, frequency: f64) -> RigConfig {
        let settings = RigSettings {
            tick_delays_s: delays,
            ..Default::default()
        };
        config_loader::ConfigLoader::build(camera, "64x48", frequency, settings).unwrap()
    }

    fn frame_sensor(camera: &str) -> FrameSensor {
        let mut sensor = FrameSensor::new("camera", open_device(camera).unwrap()).unwrap();
        sensor.configure(64, 48).unwrap();
        sensor
    }

    /// Quit listener that fires on its n-th poll
    struct QuitAfter {
        polls: u64,
        limit: u64,
    }

    impl QuitListener for QuitAfter {
        fn is_quit_pressed(&mut self) -> Result<bool, ContractError> {
            self.polls += 1;
            Ok(self.polls >= self.limit)
        }
    }

    async fn join<S: Sensor + 'static>(handle: ProducerHandle<S>) -> (S, ProducerExit) {
        tokio::task::spawn_blocking(move || handle.join())
            .await
            .unwrap()
            .unwrap()
    }

    /// Delays [0.01, 0.1, 1] s, target 0.05 s, 200 ticks of the fastest sensor.
    ///
    /// Every sensor runs on its own virtual clock; readings are published in
    /// timeline order and the synchronizer steps once per fastest tick.
    #[test]
    fn test_hold_rule_timeline() {
        let config = rig("stub://e2e?fps=0", vec![0.01, 0.1, 1.0], 0.05);
        let ctx = RigContext::new(config.tick_count());
        let mut sync = Synchronizer::from_config(&config).unwrap();
        assert_eq!(sync.ratios().normalized_target(), 5.0);

        let delays_ms = [10u64, 100, 1000];
        let mut ticks: Vec<(TickSensor, Arc<ManualClock>)> = delays_ms
            .iter()
            .enumerate()
            .map(|(i, ms)| {
                let clock = Arc::new(ManualClock::new());
                let sensor =
                    TickSensor::new(RigConfig::tick_name(i), Duration::from_millis(*ms), clock.clone());
                (sensor, clock)
            })
            .collect();
        let publishers: Vec<_> = (0..=config.tick_count())
            .map(|i| ctx.queues.publisher(i, &format!("q{i}")).unwrap())
            .collect();
        let mut camera = frame_sensor("stub://e2e?fps=0");

        let mut advances = Vec::new();
        for k in 1..=200u64 {
            let now = Duration::from_millis(k * 10);
            for (index, (sensor, clock)) in ticks.iter_mut().enumerate() {
                if clock.now() + sensor.delay() <= now {
                    publishers[index].publish(sensor.produce().unwrap()).unwrap();
                }
            }
            publishers[ctx.frame_index()]
                .publish(camera.produce().unwrap())
                .unwrap();

            let outcome = sync.step(&ctx.queues);
            assert_eq!(sync.result().ticks[0], k);
            if let Some(advance) = outcome.advance {
                advances.push((k, advance));
            }
        }

        let count = advances.len() as u64;
        let bound = 200.0 / sync.ratios().normalized_target();
        assert!(count > 0 && (count as f64) < bound);
        assert_eq!(count, 39);
        assert_eq!(sync.hold_counter(), 39);
        assert_eq!(sync.result().ticks, vec![200, 20, 2]);

        // One advance every five fastest ticks, starting at the sixth
        assert_eq!(advances[0].0, 6);
        assert_eq!(advances[1].0, 11);
        assert_eq!(advances[38].0, 196);
        assert!(advances.iter().all(|(_, a)| a.trigger_index == 0));

        // Hold counter is strictly increasing by one
        for (n, (_, advance)) in advances.iter().enumerate() {
            assert_eq!(advance.hold_counter, n as u64 + 1);
        }

        // Everything published was drained
        for index in 0..ctx.queues.len() {
            assert_eq!(ctx.queues.depth(index), 0);
        }
    }

    #[tokio::test]
    async fn test_threaded_run_stops_on_quit() {
        let config = rig("stub://threaded?fps=200", vec![0.001, 0.005], 0.005);
        let ctx = RigContext::new(config.tick_count());
        let mut sync = Synchronizer::from_config(&config).unwrap();
        let mut renderer = Renderer::new(
            Box::new(LogSurface::new("log")),
            config.settings.window_name.clone(),
            config.settings.overlay,
        );

        let ticks: Vec<_> = config
            .settings
            .tick_delays_s
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let sensor = TickSensor::with_delay_secs(RigConfig::tick_name(i), *d).unwrap();
                spawn_producer(sensor, i, &ctx).unwrap()
            })
            .collect();
        let camera = spawn_producer(
            frame_sensor("stub://threaded?fps=200"),
            ctx.frame_index(),
            &ctx,
        )
        .unwrap();

        let mut quit = QuitAfter { polls: 0, limit: 200 };
        let options = ConsumerOptions {
            poll_interval: config.settings.poll_interval(),
            max_iterations: None,
        };
        let report = run_consumer(&ctx, &mut sync, &mut quit, |rv| renderer.render(rv), &options)
            .await
            .unwrap();

        assert_eq!(report.reason, Some(CancelReason::QuitKey));
        assert_eq!(report.iterations, 199);
        assert_eq!(ctx.cancel.state(), RigState::Cancelling);

        for handle in ticks {
            let (_sensor, exit) = join(handle).await;
            assert!(matches!(exit, ProducerExit::Cancelled));
        }
        let (mut camera, exit) = join(camera).await;
        assert!(matches!(exit, ProducerExit::Cancelled));
        assert!(!camera.is_released());
        camera.release();
        assert!(camera.is_released());

        renderer.close();
        ctx.cancel.mark_stopped();
        assert_eq!(ctx.cancel.state(), RigState::Stopped);
        assert_eq!(renderer.frames_shown(), 199);
        assert!(report.readings_drained[0] > 0);
    }

    #[tokio::test]
    async fn test_device_failure_cancels_all_producers() {
        let camera_id = "stub://dying?fps=0&disconnect_after=5";
        let config = rig(camera_id, vec![0.001, 0.002], 0.002);
        let ctx = RigContext::new(config.tick_count());
        let mut sync = Synchronizer::from_config(&config).unwrap();

        let ticks: Vec<_> = config
            .settings
            .tick_delays_s
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let sensor = TickSensor::with_delay_secs(RigConfig::tick_name(i), *d).unwrap();
                spawn_producer(sensor, i, &ctx).unwrap()
            })
            .collect();
        let camera = spawn_producer(frame_sensor(camera_id), ctx.frame_index(), &ctx).unwrap();

        let mut quit = contracts::NeverQuit;
        let report = run_consumer(
            &ctx,
            &mut sync,
            &mut quit,
            |_| Ok::<(), ContractError>(()),
            &ConsumerOptions::default(),
        )
        .await
        .unwrap();

        match &report.reason {
            Some(CancelReason::DeviceFailure { sensor, .. }) => assert_eq!(sensor, "camera"),
            other => panic!("unexpected reason {other:?}"),
        }

        for handle in ticks {
            let (_sensor, exit) = join(handle).await;
            assert!(matches!(exit, ProducerExit::Cancelled));
        }
        let (mut camera, exit) = join(camera).await;
        assert!(matches!(exit, ProducerExit::Fatal(ref e) if e.is_fatal()));
        assert_eq!(camera.frames_captured(), 5);
        camera.release();

        ctx.cancel.mark_stopped();
        assert_eq!(ctx.cancel.state(), RigState::Stopped);
        assert_eq!(ctx.metrics.snapshot().sensors[ctx.frame_index()].fatal_errors, 1);
    }

    #[test]
    fn test_frequency_below_fastest_tick_rejected() {
        let err = config_loader::ConfigLoader::build("0", "640x480", 0.005, RigSettings::default())
            .unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_unsupported_camera_is_fatal() {
        let err = open_device("not-a-camera://nowhere").err().unwrap();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_marked_gap_outlines_held_frame() {
        let mut config = rig("stub://gap?fps=0", vec![0.01], 0.01);
        config.settings.stale_frame_policy = StaleFramePolicy::Mark;
        let ctx = RigContext::new(config.tick_count());
        let mut sync = Synchronizer::from_config(&config).unwrap();

        let tick = ctx.queues.publisher(0, "tick_0").unwrap();
        let frames = ctx.queues.publisher(ctx.frame_index(), "camera").unwrap();

        // Fresh frame, then a gap before the next advance
        tick.publish(Reading::Tick(2)).unwrap();
        frames.publish(frame_sensor("stub://gap?fps=0").produce().unwrap()).unwrap();
        assert!(sync.step(&ctx.queues).advance.is_some());
        assert!(!sync.result().held_stale);

        tick.publish(Reading::Tick(3)).unwrap();
        frames.publish(Reading::Gap).unwrap();
        let outcome = sync.step(&ctx.queues);
        assert!(outcome.gap);
        assert!(outcome.advance.is_some());
        assert!(sync.result().held_stale);

        let result = sync.result();
        let composed = compose_overlay(
            &result.held,
            &result.ticks,
            &config.settings.overlay,
            result.held_stale,
        );
        assert_eq!(composed.get_pixel(0, 0).0, [255, 0, 0]);
    }
}
