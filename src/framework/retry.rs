use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error};

/// Decides how often, and for how long, an operation is repeated.
///
/// Both bounds are optional; a policy without any bound repeats forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// The pause between two attempts.
    pub interval: Duration,
    /// The maximum number of attempts, the first one included.
    pub max_attempts: Option<u32>,
    /// The maximum time spent, measured from the first attempt.
    pub max_wait: Option<Duration>,
}

impl RetryPolicy {
    /// Creates an unbounded [`RetryPolicy`] pausing `interval` between attempts.
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            max_wait: None,
        }
    }

    /// Bounds the number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Bounds the time spent.
    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Starts counting attempts against this policy.
    pub fn start(&self) -> Attempts {
        Attempts {
            policy: *self,
            attempt: 0,
            started: Instant::now(),
        }
    }
}

/// Counts attempts made under a [`RetryPolicy`].
#[derive(Debug)]
pub struct Attempts {
    policy: RetryPolicy,
    attempt: u32,
    started: Instant,
}

impl Attempts {
    /// The number of finished attempts.
    pub const fn count(&self) -> u32 {
        self.attempt
    }

    /// Records a finished attempt and decides whether another one is allowed.
    ///
    /// Another attempt is refused once [`RetryPolicy::max_attempts`] attempts were made, or when
    /// waiting one more interval would exceed [`RetryPolicy::max_wait`].
    pub fn retry_if_possible(&mut self) -> bool {
        self.attempt += 1;

        if self
            .policy
            .max_attempts
            .is_some_and(|max_attempts| self.attempt >= max_attempts)
        {
            error!("attempted for too many times ({}), stopping!", self.attempt);
            return false;
        }

        if self
            .policy
            .max_wait
            .is_some_and(|max_wait| {
                self.started.elapsed().saturating_add(self.policy.interval) > max_wait
            })
        {
            error!("waited for too long ({:?}), stopping!", self.started.elapsed());
            return false;
        }

        match self.policy.max_attempts {
            Some(max_attempts) => debug!("retrying… ({} / {max_attempts})", self.attempt + 1),
            None => debug!("retrying… ({})", self.attempt + 1),
        }
        true
    }

    /// The time left until [`RetryPolicy::max_wait`] is reached, [`None`] if the policy has no time bound.
    pub fn remaining(&self) -> Option<Duration> {
        self.policy
            .max_wait
            .map(|max_wait| max_wait.saturating_sub(self.started.elapsed()))
    }

    /// Sleeps for one interval of the policy.
    pub async fn wait(&self) {
        tokio::time::sleep(self.policy.interval).await;
    }
}
