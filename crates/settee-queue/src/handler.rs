use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{QueueError, QueueResult};

/// Producer side of the shared queue, handed to [`QueueHandler::populate`].
#[derive(Clone, Debug)]
pub struct QueueSender<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> QueueSender<T> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<T>) -> Self {
        Self { tx }
    }

    pub fn send(&self, item: T) -> QueueResult<()> {
        self.tx.send(item).map_err(|_| QueueError::Closed)
    }
}

/// The work a queue process does.
///
/// Errors from either method are logged by the runner and do not stop it.
#[async_trait]
pub trait QueueHandler: Send + Sync + 'static {
    type Item: Send + 'static;

    /// Push any newly available work onto the queue.
    async fn populate(&self, queue: &QueueSender<Self::Item>) -> anyhow::Result<()>;

    async fn process_item(&self, item: Self::Item) -> anyhow::Result<()>;
}
