use std::time::Duration;

use settee_store::StoreResult;
use tracing::warn;

/// Fixed-delay retry for transient store failures.
///
/// No backoff: every retry waits the same `delay`. Only errors for which
/// [`settee_store::StoreError::is_transient`] holds are retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; `0` behaves like `1`.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(30);

    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// A single attempt.
    pub const fn none() -> Self {
        Self::fixed(1, Self::DEFAULT_DELAY)
    }

    /// Run `op`, retrying transient failures.
    pub fn run<T, F>(&self, mut op: F) -> StoreResult<T>
    where
        F: FnMut() -> StoreResult<T>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(attempt, max_attempts = attempts, error = %e, "retrying after transient store error");
                    std::thread::sleep(self.delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    /// Five attempts, thirty seconds apart.
    fn default() -> Self {
        Self::fixed(5, Self::DEFAULT_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settee_store::StoreError;
    use std::cell::Cell;

    fn quick(attempts: u32) -> RetryPolicy {
        RetryPolicy::fixed(attempts, Duration::ZERO)
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result = quick(3).run(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(StoreError::Transport("reset".into()))
            } else {
                Ok(calls.get())
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result: StoreResult<()> = quick(2).run(|| {
            calls.set(calls.get() + 1);
            Err(StoreError::Transport("down".into()))
        });
        assert!(matches!(result, Err(StoreError::Transport(_))));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: StoreResult<()> = quick(5).run(|| {
            calls.set(calls.get() + 1);
            Err(StoreError::Conflict { id: "a".into() })
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let calls = Cell::new(0);
        let _ = quick(0).run(|| {
            calls.set(calls.get() + 1);
            Ok::<_, StoreError>(())
        });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn defaults() {
        assert_eq!(RetryPolicy::default().max_attempts, 5);
        assert_eq!(RetryPolicy::none().max_attempts, 1);
        assert_eq!(RetryPolicy::default().delay, Duration::from_secs(30));
    }
}
