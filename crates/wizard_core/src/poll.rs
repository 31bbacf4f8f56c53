//! Poll decisions for asynchronous analysis jobs
//!
//! [`PollTracker`] decides what happens after each "still processing" answer.
//! It owns no timers; drivers (tokio in `api_client`, browser timers in the
//! frontend) sleep for the returned delay and ask again.

use std::time::Duration;

/// Progress shown while the start request is in flight
pub const PROGRESS_STARTING: u8 = 10;
/// Progress once the server accepted the job
pub const PROGRESS_ACCEPTED: u8 = 30;
pub const PROGRESS_DONE: u8 = 100;

const PROGRESS_POLL_BASE: u8 = 40;
const PROGRESS_POLL_SPAN: f64 = 50.0;

/// Poll interval and overall time budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    interval: Duration,
    timeout: Duration,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Interval is clamped to at least one millisecond so elapsed time grows
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            timeout,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Upper bound on status queries for a job that never finishes
    pub fn max_attempts(&self) -> u32 {
        let ratio = self.timeout.as_nanos().div_ceil(self.interval.as_nanos());
        u32::try_from(ratio.max(1)).unwrap_or(u32::MAX)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, Self::DEFAULT_TIMEOUT)
    }
}

/// What to do after the job reported it is still processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// Ask again after the given delay
    Retry { after: Duration },
    /// Budget exhausted; stop and report a timeout
    TimedOut,
}

/// Elapsed-time bookkeeping for one analysis job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTracker {
    policy: PollPolicy,
    elapsed: Duration,
    processing_answers: u32,
}

impl PollTracker {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            elapsed: Duration::ZERO,
            processing_answers: 0,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Delay before the first status query
    pub fn first_delay(&self) -> Duration {
        self.policy.interval
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn processing_answers(&self) -> u32 {
        self.processing_answers
    }

    pub fn record_processing(&mut self) -> PollDecision {
        self.processing_answers += 1;
        self.elapsed += self.policy.interval;

        if self.elapsed >= self.policy.timeout {
            PollDecision::TimedOut
        } else {
            PollDecision::Retry {
                after: self.policy.interval,
            }
        }
    }

    /// Progress percentage while polling, between 40 and 90
    pub fn progress(&self) -> u8 {
        let timeout = self.policy.timeout.as_secs_f64();
        let fraction = if timeout > 0.0 {
            (self.elapsed.as_secs_f64() / timeout).min(1.0)
        } else {
            1.0
        };
        PROGRESS_POLL_BASE + (fraction * PROGRESS_POLL_SPAN).round() as u8
    }

    pub fn status_message(&self) -> String {
        format!("Analysis running... ({}s)", self.elapsed.as_secs())
    }
}
