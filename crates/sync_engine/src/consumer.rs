//! Consumer loop
//!
//! Single execution context that polls the quit listener, steps the
//! synchronizer and renders. Between iterations it waits on the queue
//! notifier, bounded by the poll interval, instead of spinning.

use std::fmt::Display;
use std::time::Duration;

use contracts::{CancelReason, QuitListener, ResultVector};
use ingestion::RigContext;
use observability::HoldStats;
use tracing::{debug, error, info, instrument};

use crate::error::{Result, SyncError};
use crate::synchronizer::Synchronizer;

/// Consumer loop options
#[derive(Debug, Clone)]
pub struct ConsumerOptions {
    /// Upper bound on the wait between iterations
    pub poll_interval: Duration,

    /// Stop with `EndOfRun` after this many iterations
    pub max_iterations: Option<u64>,
}

impl Default for ConsumerOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1),
            max_iterations: None,
        }
    }
}

/// Summary of a finished consumer loop
#[derive(Debug, Clone, Default)]
pub struct ConsumerReport {
    pub iterations: u64,
    pub hold_advances: u64,
    /// Readings drained per queue index (ticks..., frame)
    pub readings_drained: Vec<u64>,
    pub gaps: u64,
    pub reason: Option<CancelReason>,
    pub stats: HoldStats,
}

/// Run the consumer until the context is cancelled
///
/// Quit requests, render failures and `max_iterations` cancel the context
/// themselves; producer failures are observed on the next iteration.
#[instrument(name = "consumer_loop", skip_all, fields(ticks = sync.tick_count()))]
pub async fn run_consumer<Q, R, E>(
    ctx: &RigContext,
    sync: &mut Synchronizer,
    quit: &mut Q,
    mut render: R,
    options: &ConsumerOptions,
) -> Result<ConsumerReport>
where
    Q: QuitListener + ?Sized,
    R: FnMut(&ResultVector) -> std::result::Result<(), E>,
    E: Display,
{
    if ctx.tick_count() != sync.tick_count() {
        return Err(SyncError::LayoutMismatch {
            expected: sync.tick_count(),
            actual: ctx.tick_count(),
        });
    }

    let notify = ctx.queues.notifier();
    let mut stats = HoldStats::new();
    info!(
        poll_interval_ms = options.poll_interval.as_millis() as u64,
        max_iterations = ?options.max_iterations,
        "consumer started"
    );

    while !ctx.cancel.is_cancelled() {
        match quit.is_quit_pressed() {
            Ok(true) => {
                info!("quit requested");
                ctx.cancel.cancel(CancelReason::QuitKey);
                break;
            }
            Ok(false) => {}
            Err(e) => debug!(error = %e, "quit listener poll failed"),
        }

        let outcome = sync.step(&ctx.queues);
        if outcome.gap {
            observability::record_frame_gap();
        }
        stats.record_iteration(outcome.advance.as_ref(), outcome.gap);
        observability::record_consumer_iteration(outcome.drained);

        if let Err(e) = render(sync.result()) {
            error!(critical = true, error = %e, "render failed, cancelling run");
            ctx.cancel.cancel(CancelReason::RenderFailure(e.to_string()));
            break;
        }

        if options
            .max_iterations
            .is_some_and(|max| stats.iterations >= max)
        {
            info!(iterations = stats.iterations, "iteration limit reached");
            ctx.cancel.cancel(CancelReason::EndOfRun);
            break;
        }

        if has_backlog(ctx) {
            tokio::task::yield_now().await;
        } else {
            // Timeout is the normal idle path
            let _ = tokio::time::timeout(options.poll_interval, notify.notified()).await;
        }
    }

    for index in 0..ctx.queues.len() {
        observability::record_queue_depth(&queue_label(ctx, index), ctx.queues.depth(index));
    }

    let drained = sync.drained();
    let mut readings_drained = drained.ticks.clone();
    readings_drained.push(drained.frames + drained.gaps);

    let report = ConsumerReport {
        iterations: stats.iterations,
        hold_advances: stats.advances,
        readings_drained,
        gaps: stats.gaps,
        reason: ctx.cancel.reason(),
        stats,
    };
    info!(
        iterations = report.iterations,
        hold_advances = report.hold_advances,
        reason = ?report.reason,
        "consumer stopped"
    );
    Ok(report)
}

fn has_backlog(ctx: &RigContext) -> bool {
    (0..ctx.queues.len()).any(|index| ctx.queues.depth(index) > 0)
}

fn queue_label(ctx: &RigContext, index: usize) -> String {
    if index == ctx.frame_index() {
        "camera".to_string()
    } else {
        contracts::RigConfig::tick_name(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratios::FrequencyRatios;
    use contracts::{ContractError, NeverQuit, Reading, StaleFramePolicy};

    fn synchronizer(tick_count: usize) -> Synchronizer {
        let delays: Vec<f64> = (0..tick_count).map(|i| 0.01 * 10f64.powi(i as i32)).collect();
        let ratios = FrequencyRatios::new(&delays, 0.05).unwrap();
        Synchronizer::new(ratios, 4, 4, StaleFramePolicy::Hold)
    }

    struct QuitAfter {
        polls: u32,
        quit_at: u32,
    }

    impl QuitListener for QuitAfter {
        fn is_quit_pressed(&mut self) -> std::result::Result<bool, ContractError> {
            self.polls += 1;
            Ok(self.polls >= self.quit_at)
        }
    }

    struct BrokenListener;

    impl QuitListener for BrokenListener {
        fn is_quit_pressed(&mut self) -> std::result::Result<bool, ContractError> {
            Err(ContractError::quit_listener("terminal unavailable"))
        }
    }

    fn ok_render(_: &ResultVector) -> std::result::Result<(), String> {
        Ok(())
    }

    #[tokio::test]
    async fn test_max_iterations_ends_run() {
        let ctx = RigContext::new(3);
        let mut sync = synchronizer(3);
        let options = ConsumerOptions {
            max_iterations: Some(25),
            ..Default::default()
        };

        let publisher = ctx.queues.publisher(0, "tick_0").unwrap();
        for n in 1..=20 {
            publisher.publish(Reading::Tick(n)).unwrap();
        }

        let mut rendered = 0u64;
        let report = run_consumer(
            &ctx,
            &mut sync,
            &mut NeverQuit,
            |_: &ResultVector| -> std::result::Result<(), String> {
                rendered += 1;
                Ok(())
            },
            &options,
        )
        .await
        .unwrap();

        assert_eq!(report.iterations, 25);
        assert_eq!(rendered, 25);
        assert_eq!(report.reason, Some(CancelReason::EndOfRun));
        assert_eq!(report.readings_drained, vec![20, 0, 0, 0]);
        // 20 fastest ticks at f = 5: advances at 6, 11, 16
        assert_eq!(report.hold_advances, 3);
        assert_eq!(sync.hold_counter(), 3);
    }

    #[tokio::test]
    async fn test_quit_key_cancels() {
        let ctx = RigContext::new(1);
        let mut sync = synchronizer(1);
        let mut quit = QuitAfter {
            polls: 0,
            quit_at: 3,
        };

        let report = run_consumer(&ctx, &mut sync, &mut quit, ok_render, &Default::default())
            .await
            .unwrap();

        assert_eq!(report.iterations, 2);
        assert_eq!(report.reason, Some(CancelReason::QuitKey));
        assert!(ctx.cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_quit_listener_errors_are_swallowed() {
        let ctx = RigContext::new(1);
        let mut sync = synchronizer(1);
        let options = ConsumerOptions {
            max_iterations: Some(5),
            ..Default::default()
        };

        let report = run_consumer(&ctx, &mut sync, &mut BrokenListener, ok_render, &options)
            .await
            .unwrap();
        assert_eq!(report.iterations, 5);
        assert_eq!(report.reason, Some(CancelReason::EndOfRun));
    }

    #[tokio::test]
    async fn test_render_failure_cancels() {
        let ctx = RigContext::new(1);
        let mut sync = synchronizer(1);

        let report = run_consumer(
            &ctx,
            &mut sync,
            &mut NeverQuit,
            |_: &ResultVector| Err("surface gone"),
            &Default::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.iterations, 1);
        assert!(matches!(
            report.reason,
            Some(CancelReason::RenderFailure(ref m)) if m == "surface gone"
        ));
    }

    #[tokio::test]
    async fn test_exits_when_already_cancelled() {
        let ctx = RigContext::new(1);
        ctx.cancel.cancel(CancelReason::DeviceFailure {
            sensor: "camera".into(),
            message: "gone".into(),
        });
        let mut sync = synchronizer(1);

        let report = run_consumer(&ctx, &mut sync, &mut NeverQuit, ok_render, &Default::default())
            .await
            .unwrap();
        assert_eq!(report.iterations, 0);
        assert!(matches!(
            report.reason,
            Some(CancelReason::DeviceFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_observes_cancel_from_another_thread() {
        let ctx = RigContext::new(1);
        let mut sync = synchronizer(1);
        let cancel = ctx.cancel.clone();

        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            cancel.cancel(CancelReason::Signal);
        });

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            run_consumer(&ctx, &mut sync, &mut NeverQuit, ok_render, &Default::default()),
        )
        .await
        .expect("consumer should stop after cancellation")
        .unwrap();
        canceller.join().unwrap();

        assert!(report.iterations > 0);
        assert_eq!(report.reason, Some(CancelReason::Signal));
    }

    #[tokio::test]
    async fn test_layout_mismatch() {
        let ctx = RigContext::new(2);
        let mut sync = synchronizer(3);
        let err = run_consumer(&ctx, &mut sync, &mut NeverQuit, ok_render, &Default::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SyncError::LayoutMismatch {
                expected: 3,
                actual: 2
            }
        );
    }
}
