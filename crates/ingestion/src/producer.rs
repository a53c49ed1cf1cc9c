//! ProducerLoop - one sampling thread per sensor
//!
//! produce -> publish -> repeat, until the cancellation token is set.
//! Fatal sensor errors cancel the whole run from inside the loop.

use std::any::Any;
use std::thread::{self, JoinHandle};

use contracts::{CancelReason, Reading, Sensor, SensorError};
use metrics::counter;
use tracing::{debug, error, info, instrument, warn};

use crate::context::RigContext;
use crate::error::{IngestionError, Result};
use crate::queue::QueuePublisher;

/// Why a producer loop returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducerExit {
    /// Cancellation observed at the top of an iteration
    Cancelled,
    /// The sensor failed fatally and cancelled the run
    Fatal(SensorError),
    /// The consumer closed the queue
    QueueClosed,
}

/// Drive `sensor` until cancellation
///
/// Runs on the calling thread; `spawn_producer` wraps it in a dedicated one.
#[instrument(
    name = "producer_loop",
    skip_all,
    fields(sensor = %sensor.name(), index = publisher.index())
)]
pub fn run_producer<S: Sensor + ?Sized>(
    sensor: &mut S,
    publisher: &QueuePublisher,
    ctx: &RigContext,
) -> ProducerExit {
    let index = publisher.index();
    debug!("producer started");

    while !ctx.cancel.is_cancelled() {
        let reading = match sensor.produce() {
            Ok(reading) => {
                ctx.metrics.record_reading(index);
                counter!("rate_sync_readings_total", "sensor" => sensor.name().to_string())
                    .increment(1);
                reading
            }
            Err(err @ SensorError::Transient { .. }) => {
                error!(critical = true, error = %err, "transient sensor failure");
                ctx.metrics.record_transient(index);
                counter!(
                    "rate_sync_transient_errors_total",
                    "sensor" => sensor.name().to_string()
                )
                .increment(1);
                Reading::Gap
            }
            Err(err) => {
                error!(critical = true, error = %err, "fatal sensor failure, cancelling run");
                ctx.metrics.record_fatal(index);
                ctx.cancel.cancel(CancelReason::DeviceFailure {
                    sensor: sensor.name().to_string(),
                    message: err.to_string(),
                });
                return ProducerExit::Fatal(err);
            }
        };

        if let Err(err) = publisher.publish(reading) {
            warn!(error = %err, "queue closed, producer exiting");
            return ProducerExit::QueueClosed;
        }
    }

    debug!("producer observed cancellation");
    ProducerExit::Cancelled
}

/// Handle to a running producer thread
///
/// Joining hands the sensor back so that its resources are released by the
/// caller once every producer has stopped.
pub struct ProducerHandle<S> {
    name: String,
    handle: JoinHandle<(S, ProducerExit)>,
}

impl<S> ProducerHandle<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the producer thread to exit
    pub fn join(self) -> Result<(S, ProducerExit)> {
        self.handle
            .join()
            .map_err(|payload| IngestionError::ProducerPanicked {
                sensor: self.name,
                message: panic_message(payload.as_ref()),
            })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Start a producer thread for the sensor at queue `index`
#[instrument(name = "spawn_producer", skip(sensor, ctx), fields(sensor = %sensor.name()))]
pub fn spawn_producer<S>(mut sensor: S, index: usize, ctx: &RigContext) -> Result<ProducerHandle<S>>
where
    S: Sensor + 'static,
{
    let name = sensor.name().to_string();
    let publisher = ctx.queues.publisher(index, &name)?;
    let thread_ctx = ctx.clone();

    let handle = thread::Builder::new()
        .name(format!("producer-{name}"))
        .spawn(move || {
            let exit = run_producer(&mut sensor, &publisher, &thread_ctx);
            (sensor, exit)
        })
        .map_err(|source| IngestionError::SpawnFailed {
            sensor: name.clone(),
            source,
        })?;

    info!(sensor = %name, index, "producer spawned");
    Ok(ProducerHandle { name, handle })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::open_device;
    use crate::clock::ManualClock;
    use crate::frame::FrameSensor;
    use crate::tick::TickSensor;
    use contracts::SensorKind;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    /// Sensor that cancels the run itself after a fixed number of readings
    struct CountingSensor {
        produced: u64,
        stop_after: u64,
        ctx: RigContext,
    }

    impl Sensor for CountingSensor {
        fn name(&self) -> &str {
            "counting"
        }

        fn kind(&self) -> SensorKind {
            SensorKind::Tick
        }

        fn produce(&mut self) -> std::result::Result<Reading, SensorError> {
            self.produced += 1;
            if self.produced == self.stop_after {
                self.ctx.cancel.cancel(CancelReason::EndOfRun);
            }
            Ok(Reading::Tick(self.produced))
        }
    }

    struct PanickingSensor;

    impl Sensor for PanickingSensor {
        fn name(&self) -> &str {
            "panicking"
        }

        fn kind(&self) -> SensorKind {
            SensorKind::Tick
        }

        fn produce(&mut self) -> std::result::Result<Reading, SensorError> {
            panic!("sensor exploded");
        }
    }

    #[test]
    fn test_run_until_cancelled() {
        let ctx = RigContext::new(1);
        let publisher = ctx.queues.publisher(0, "counting").unwrap();
        let mut sensor = CountingSensor {
            produced: 0,
            stop_after: 5,
            ctx: ctx.clone(),
        };

        let exit = run_producer(&mut sensor, &publisher, &ctx);
        assert_eq!(exit, ProducerExit::Cancelled);

        let values: Vec<u64> = std::iter::from_fn(|| ctx.queues.try_pop(0))
            .filter_map(|r| r.as_tick())
            .collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
        assert_eq!(ctx.metrics.snapshot().sensors[0].readings, 5);
    }

    #[test]
    fn test_already_cancelled_produces_nothing() {
        let ctx = RigContext::new(1);
        ctx.cancel.cancel(CancelReason::QuitKey);
        let publisher = ctx.queues.publisher(0, "tick").unwrap();
        let mut sensor =
            TickSensor::new("tick", Duration::from_millis(1), Arc::new(ManualClock::new()));

        assert_eq!(
            run_producer(&mut sensor, &publisher, &ctx),
            ProducerExit::Cancelled
        );
        assert_eq!(sensor.counter(), 0);
    }

    #[test]
    fn test_transient_failure_publishes_gap() {
        let ctx = RigContext::new(0);
        let device = open_device("stub://cam?fps=0&fail_every=2&disconnect_after=4").unwrap();
        let mut sensor = FrameSensor::new("camera", device).unwrap();
        sensor.configure(4, 4).unwrap();
        let publisher = ctx.queues.publisher(ctx.frame_index(), "camera").unwrap();

        let exit = run_producer(&mut sensor, &publisher, &ctx);
        assert!(matches!(exit, ProducerExit::Fatal(_)));
        assert!(ctx.cancel.is_cancelled());
        assert!(matches!(
            ctx.cancel.reason(),
            Some(CancelReason::DeviceFailure { .. })
        ));

        let readings: Vec<Reading> = std::iter::from_fn(|| ctx.queues.try_pop(0)).collect();
        let gaps: Vec<bool> = readings.iter().map(Reading::is_gap).collect();
        assert_eq!(gaps, vec![false, true, false, true]);

        let snap = ctx.metrics.snapshot();
        assert_eq!(snap.sensors[0].readings, 2);
        assert_eq!(snap.sensors[0].transient_errors, 2);
        assert_eq!(snap.sensors[0].fatal_errors, 1);
    }

    #[test]
    fn test_spawned_producer_stops_on_cancel() {
        let ctx = RigContext::new(1);
        let sensor = TickSensor::with_delay_secs("tick_0", 0.001).unwrap();
        let handle = spawn_producer(sensor, 0, &ctx).unwrap();
        assert_eq!(handle.name(), "tick_0");

        std::thread::sleep(Duration::from_millis(20));
        let cancelled_at = Instant::now();
        ctx.cancel.cancel(CancelReason::EndOfRun);

        let (sensor, exit) = handle.join().unwrap();
        assert!(cancelled_at.elapsed() < Duration::from_secs(1));
        assert_eq!(exit, ProducerExit::Cancelled);
        assert!(sensor.counter() > 0);

        let values: Vec<u64> = std::iter::from_fn(|| ctx.queues.try_pop(0))
            .filter_map(|r| r.as_tick())
            .collect();
        let expected: Vec<u64> = (1..=sensor.counter()).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_panic_reported_on_join() {
        let ctx = RigContext::new(1);
        let handle = spawn_producer(PanickingSensor, 0, &ctx).unwrap();
        let err = handle.join().err().unwrap();
        match err {
            IngestionError::ProducerPanicked { sensor, message } => {
                assert_eq!(sensor, "panicking");
                assert!(message.contains("sensor exploded"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_queue_closed_stops_producer() {
        let ctx = RigContext::new(1);
        let publisher = ctx.queues.publisher(0, "tick").unwrap();
        ctx.queues.close();
        let mut sensor =
            TickSensor::new("tick", Duration::from_millis(1), Arc::new(ManualClock::new()));
        assert_eq!(
            run_producer(&mut sensor, &publisher, &ctx),
            ProducerExit::QueueClosed
        );
    }
}
