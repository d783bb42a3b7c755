use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::QueueConfig;
use crate::error::{QueueError, QueueResult};
use crate::handler::{QueueHandler, QueueSender};

/// Counts reported once the runner has shut down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub processed: usize,
    pub failed: usize,
}

#[derive(Default)]
struct Counters {
    processed: AtomicUsize,
    failed: AtomicUsize,
}

/// Drives a [`QueueHandler`]: one populate loop and `num_consumers`
/// consumer tasks sharing a single queue.
pub struct QueueRunner<H: QueueHandler> {
    handler: Arc<H>,
    config: QueueConfig,
}

impl<H: QueueHandler> QueueRunner<H> {
    pub fn new(handler: H, config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;
        Ok(Self {
            handler: Arc::new(handler),
            config,
        })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Run until Ctrl-C or SIGTERM, then shut down warmly.
    pub async fn run(self) -> QueueResult<QueueStats> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `shutdown` resolves, then shut down warmly.
    ///
    /// A populate call still running when `shutdown` resolves is dropped;
    /// items it already enqueued are drained by the consumers.
    pub async fn run_until<F>(self, shutdown: F) -> QueueResult<QueueStats>
    where
        F: Future<Output = ()>,
    {
        info!(consumers = self.config.num_consumers, "starting queue");
        let (tx, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));
        let running = Arc::new(AtomicBool::new(true));
        let counters = Arc::new(Counters::default());

        let workers: Vec<JoinHandle<()>> = (0..self.config.num_consumers)
            .map(|worker| {
                tokio::spawn(consume(
                    worker,
                    self.handler.clone(),
                    rx.clone(),
                    running.clone(),
                    counters.clone(),
                    self.config.clone(),
                ))
            })
            .collect();

        let sender = QueueSender::new(tx);
        let mut ticker = tokio::time::interval(self.config.populate_interval);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                _ = &mut shutdown => {
                    warn!("shutdown requested during populate");
                    break;
                }
                result = self.handler.populate(&sender) => {
                    if let Err(e) = result {
                        error!(error = %e, "failed to populate queue");
                    }
                }
            }
        }

        info!("beginning warm shutdown");
        running.store(false, Ordering::SeqCst);
        drop(sender);
        let mut panicked = None;
        for handle in workers {
            if let Err(e) = handle.await {
                panicked = Some(e.to_string());
            }
        }
        if let Some(reason) = panicked {
            return Err(QueueError::Worker(reason));
        }

        let stats = QueueStats {
            processed: counters.processed.load(Ordering::SeqCst),
            failed: counters.failed.load(Ordering::SeqCst),
        };
        info!(processed = stats.processed, failed = stats.failed, "warm shutdown complete");
        Ok(stats)
    }
}

async fn consume<H: QueueHandler>(
    worker: usize,
    handler: Arc<H>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<H::Item>>>,
    running: Arc<AtomicBool>,
    counters: Arc<Counters>,
    config: QueueConfig,
) {
    debug!(worker, "starting worker");
    while running.load(Ordering::SeqCst) {
        let next = tokio::time::timeout(config.poll_timeout, async {
            rx.lock().await.recv().await
        })
        .await;
        match next {
            Ok(Some(item)) => match handler.process_item(item).await {
                Ok(()) => {
                    counters.processed.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::SeqCst);
                    error!(worker, error = %e, "failed to process queue item");
                }
            },
            // Sender dropped and queue drained.
            Ok(None) => break,
            Err(_elapsed) => {}
        }
    }
    debug!(worker, "exiting worker");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
