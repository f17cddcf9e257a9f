//! Thread pool submission and completion errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("Pool is shutting down; submission rejected")]
    ShuttingDown,

    #[error("Task queue is full")]
    QueueFull,

    #[error("Task panicked: {0}")]
    TaskPanicked(String),

    /// The task's result channel closed without a value
    #[error("Task result unavailable")]
    Disconnected,
}
