//! Long-running populate/consume worker queue.
//!
//! A [`QueueHandler`] fills a shared queue on a fixed interval and a pool
//! of consumer tasks drains it. Shutdown is warm: consumers finish the
//! item in hand before the runner returns.

pub mod config;
pub mod error;
pub mod handler;
pub mod runner;

pub use config::{QueueArgs, QueueConfig};
pub use error::{QueueError, QueueResult};
pub use handler::{QueueHandler, QueueSender};
pub use runner::{QueueRunner, QueueStats};
