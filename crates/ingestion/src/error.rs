//! Ingestion error types

use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Producer thread could not be started
    #[error("failed to spawn producer for sensor {sensor}: {source}")]
    SpawnFailed {
        sensor: String,
        #[source]
        source: std::io::Error,
    },

    /// Producer thread panicked instead of returning its sensor
    #[error("producer for sensor {sensor} panicked: {message}")]
    ProducerPanicked { sensor: String, message: String },

    /// Queue has been closed by the consumer side
    #[error("queue {index} closed for sensor {sensor}")]
    QueueClosed { sensor: String, index: usize },

    /// No queue exists at the given index
    #[error("no queue at index {index} (have {count})")]
    UnknownQueue { index: usize, count: usize },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
