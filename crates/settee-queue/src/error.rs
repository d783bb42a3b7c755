use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("number of consumers must be greater than 0, got {0}")]
    InvalidConsumers(usize),

    /// Every consumer has stopped, so nothing would drain new items.
    #[error("queue is closed")]
    Closed,

    #[error("consumer task failed: {0}")]
    Worker(String),
}

pub type QueueResult<T> = Result<T, QueueError>;
