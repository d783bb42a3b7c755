use std::time::Duration;

use clap::Parser;

use crate::error::{QueueError, QueueResult};

/// Runner tuning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueConfig {
    pub num_consumers: usize,
    /// How long an idle consumer waits for an item before rechecking
    /// whether it should stop.
    pub poll_timeout: Duration,
    /// Pause between calls to [`crate::QueueHandler::populate`].
    pub populate_interval: Duration,
}

impl QueueConfig {
    pub fn validate(&self) -> QueueResult<()> {
        if self.num_consumers < 1 {
            return Err(QueueError::InvalidConsumers(self.num_consumers));
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            num_consumers: 1,
            poll_timeout: Duration::from_secs(5),
            populate_interval: Duration::from_secs(60),
        }
    }
}

/// Command-line options for a queue worker process.
#[derive(Clone, Debug, Parser)]
#[command(about = "Run a queue worker")]
pub struct QueueArgs {
    /// Number of queue consumers to use.
    #[arg(short = 'c', long = "num-consumers", alias = "num_consumers", default_value_t = 1)]
    pub num_consumers: usize,
}

impl From<QueueArgs> for QueueConfig {
    fn from(args: QueueArgs) -> Self {
        Self {
            num_consumers: args.num_consumers,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = QueueConfig::default();
        assert_eq!(c.num_consumers, 1);
        assert_eq!(c.poll_timeout, Duration::from_secs(5));
        assert_eq!(c.populate_interval, Duration::from_secs(60));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn zero_consumers_rejected() {
        let c = QueueConfig {
            num_consumers: 0,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(QueueError::InvalidConsumers(0))));
    }

    #[test]
    fn args_parse() {
        let args = QueueArgs::try_parse_from(["worker"]).unwrap();
        assert_eq!(args.num_consumers, 1);

        let args = QueueArgs::try_parse_from(["worker", "-c", "4"]).unwrap();
        assert_eq!(QueueConfig::from(args).num_consumers, 4);

        let args = QueueArgs::try_parse_from(["worker", "--num_consumers", "2"]).unwrap();
        assert_eq!(args.num_consumers, 2);

        assert!(QueueArgs::try_parse_from(["worker", "-c", "many"]).is_err());
    }
}
