//! Per-sensor queues
//!
//! One unbounded FIFO per sensor index plus a shared notifier that wakes the
//! consumer whenever any producer publishes.

use std::sync::Arc;

use async_channel::{unbounded, Receiver, Sender, TrySendError};
use contracts::Reading;
use tokio::sync::Notify;
use tracing::trace;

use crate::error::{IngestionError, Result};

/// Queue set shared by producers and the consumer
#[derive(Debug)]
pub struct SensorQueues {
    senders: Vec<Sender<Reading>>,
    receivers: Vec<Receiver<Reading>>,
    notify: Arc<Notify>,
}

impl SensorQueues {
    /// Create `count` empty queues
    pub fn new(count: usize) -> Self {
        let (senders, receivers) = (0..count).map(|_| unbounded()).unzip();
        Self {
            senders,
            receivers,
            notify: Arc::new(Notify::new()),
        }
    }

    /// Number of queues
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Publishing handle for the queue at `index`
    pub fn publisher(&self, index: usize, sensor: &str) -> Result<QueuePublisher> {
        let tx = self.senders.get(index).ok_or(IngestionError::UnknownQueue {
            index,
            count: self.len(),
        })?;
        Ok(QueuePublisher {
            index,
            sensor: sensor.to_string(),
            tx: tx.clone(),
            notify: self.notify.clone(),
        })
    }

    /// Non-blocking pop; None when the queue is empty or unknown
    pub fn try_pop(&self, index: usize) -> Option<Reading> {
        self.receivers.get(index)?.try_recv().ok()
    }

    /// Readings waiting in the queue at `index`
    pub fn depth(&self, index: usize) -> usize {
        self.receivers.get(index).map(|rx| rx.len()).unwrap_or(0)
    }

    /// Notifier signalled on every publish
    pub fn notifier(&self) -> Arc<Notify> {
        self.notify.clone()
    }

    /// Close every queue; later publishes fail with `QueueClosed`
    pub fn close(&self) {
        for tx in &self.senders {
            tx.close();
        }
        self.notify.notify_one();
    }
}

/// Producer side of one queue
#[derive(Debug, Clone)]
pub struct QueuePublisher {
    index: usize,
    sensor: String,
    tx: Sender<Reading>,
    notify: Arc<Notify>,
}

impl QueuePublisher {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Push a reading; never blocks
    pub fn publish(&self, reading: Reading) -> Result<()> {
        match self.tx.try_send(reading) {
            Ok(()) => {
                trace!(sensor = %self.sensor, index = self.index, "reading queued");
                self.notify.notify_one();
                Ok(())
            }
            Err(TrySendError::Closed(_)) | Err(TrySendError::Full(_)) => {
                Err(IngestionError::QueueClosed {
                    sensor: self.sensor.clone(),
                    index: self.index,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_per_queue() {
        let queues = SensorQueues::new(2);
        let p0 = queues.publisher(0, "tick_0").unwrap();
        let p1 = queues.publisher(1, "tick_1").unwrap();

        for n in 1..=3 {
            p0.publish(Reading::Tick(n)).unwrap();
        }
        p1.publish(Reading::Tick(10)).unwrap();

        assert_eq!(queues.depth(0), 3);
        assert_eq!(queues.try_pop(0).and_then(|r| r.as_tick()), Some(1));
        assert_eq!(queues.try_pop(0).and_then(|r| r.as_tick()), Some(2));
        assert_eq!(queues.try_pop(1).and_then(|r| r.as_tick()), Some(10));
        assert!(queues.try_pop(1).is_none());
        assert_eq!(queues.depth(0), 1);
    }

    #[test]
    fn test_unknown_index() {
        let queues = SensorQueues::new(1);
        assert!(matches!(
            queues.publisher(1, "x"),
            Err(IngestionError::UnknownQueue { index: 1, count: 1 })
        ));
        assert!(queues.try_pop(5).is_none());
        assert_eq!(queues.depth(5), 0);
    }

    #[test]
    fn test_publish_after_close() {
        let queues = SensorQueues::new(1);
        let publisher = queues.publisher(0, "tick_0").unwrap();
        queues.close();
        assert!(matches!(
            publisher.publish(Reading::Tick(1)),
            Err(IngestionError::QueueClosed { .. })
        ));
    }

    #[tokio::test]
    async fn test_publish_wakes_consumer() {
        let queues = Arc::new(SensorQueues::new(1));
        let notify = queues.notifier();
        let publisher = queues.publisher(0, "tick_0").unwrap();

        let handle = std::thread::spawn(move || publisher.publish(Reading::Tick(1)));
        tokio::time::timeout(std::time::Duration::from_secs(5), notify.notified())
            .await
            .expect("publish should notify");
        handle.join().unwrap().unwrap();
        assert!(queues.try_pop(0).is_some());
    }
}
