//! Periodic snapshot acquisition.
//!
//! The [`Poller`] wraps a [`SnapshotSource`] with the rules the dashboard
//! depends on:
//!
//! - a timer-driven [`poll`](Poller::poll) never overlaps a fetch that is
//!   still in flight; it returns the last good snapshot instead
//! - every fetch gets a generation number, and only the latest generation may
//!   replace the last good snapshot
//! - transport failures are retried with exponential backoff, then the poller
//!   reports itself degraded and keeps serving the last good snapshot
//!
//! State lives in `Cell`/`RefCell`: the poller is driven from a
//! single-threaded runtime and no borrow is held across an await point.

use std::cell::{Cell, RefCell};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::data::MetricSnapshot;
use crate::error::SourceError;
use crate::source::{RawSnapshot, SnapshotSource};

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per fetch, including the first.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Factor applied to the delay after each further failure.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        self.initial_delay.mul_f64(self.multiplier.powi(exponent))
    }
}

/// How a poll was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus {
    /// A new snapshot from this poll's fetch.
    Fresh,
    /// A fetch was already in flight; no request was made.
    Deduplicated,
    /// The fetch finished after a newer one was issued and was discarded.
    Stale,
    /// The fetch failed or the source reported an error.
    Degraded { reason: String },
}

/// Result of one [`Poller::poll`] or [`Poller::refresh`].
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// Generation of the fetch, or the latest issued one for a deduplicated poll.
    pub generation: u64,
    pub status: PollStatus,
    /// The snapshot to display: fresh on success, last good otherwise.
    pub snapshot: Arc<MetricSnapshot>,
}

impl PollOutcome {
    pub fn is_fresh(&self) -> bool {
        self.status == PollStatus::Fresh
    }
}

/// Holds the in-flight count up while a fetch runs, including when the
/// fetch future is dropped mid-way.
struct InFlight<'a>(&'a Cell<usize>);

impl<'a> InFlight<'a> {
    fn enter(count: &'a Cell<usize>) -> Self {
        count.set(count.get() + 1);
        Self(count)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

/// Polls a snapshot source with dedup, staleness and retry handling.
#[derive(Debug)]
pub struct Poller {
    source: Box<dyn SnapshotSource>,
    retry: RetryPolicy,
    latest_generation: Cell<u64>,
    in_flight: Cell<usize>,
    last_good: RefCell<Arc<MetricSnapshot>>,
    degraded: RefCell<Option<String>>,
    interval_minutes: Cell<u32>,
}

impl Poller {
    pub fn new(source: Box<dyn SnapshotSource>, retry: RetryPolicy, interval_minutes: u32) -> Self {
        Self {
            source,
            retry,
            latest_generation: Cell::new(0),
            in_flight: Cell::new(0),
            last_good: RefCell::new(Arc::new(MetricSnapshot::empty())),
            degraded: RefCell::new(None),
            interval_minutes: Cell::new(interval_minutes),
        }
    }

    /// Timer-driven poll. Skipped while another fetch is in flight.
    pub async fn poll(&self) -> PollOutcome {
        if self.is_fetching() {
            debug!(
                generation = self.latest_generation.get(),
                "fetch in flight, skipping poll"
            );
            return PollOutcome {
                generation: self.latest_generation.get(),
                status: PollStatus::Deduplicated,
                snapshot: self.last_good(),
            };
        }
        self.fetch().await
    }

    /// User-initiated fetch (manual reload, history window change).
    ///
    /// Runs even while another fetch is in flight; whichever was issued last
    /// wins.
    pub async fn refresh(&self) -> PollOutcome {
        self.fetch().await
    }

    async fn fetch(&self) -> PollOutcome {
        let generation = self.latest_generation.get() + 1;
        self.latest_generation.set(generation);
        let _guard = InFlight::enter(&self.in_flight);

        let result = self.fetch_with_retry(self.interval_minutes.get()).await;

        if generation != self.latest_generation.get() {
            debug!(
                generation,
                latest = self.latest_generation.get(),
                "discarding stale response"
            );
            return self.outcome(generation, PollStatus::Stale);
        }

        match result {
            Ok(raw) => match raw.error {
                Some(reason) => {
                    warn!(generation, %reason, "source reported an error");
                    self.degrade(generation, reason)
                }
                None => {
                    let snapshot = Arc::new(MetricSnapshot::from_raw(raw));
                    *self.last_good.borrow_mut() = Arc::clone(&snapshot);
                    if self.degraded.borrow_mut().take().is_some() {
                        debug!(generation, "source recovered");
                    }
                    PollOutcome {
                        generation,
                        status: PollStatus::Fresh,
                        snapshot,
                    }
                }
            },
            Err(err) => {
                warn!(
                    generation,
                    attempts = self.retry.max_attempts,
                    error = %err,
                    "snapshot fetch failed"
                );
                self.degrade(generation, err.to_string())
            }
        }
    }

    async fn fetch_with_retry(&self, interval_minutes: u32) -> Result<RawSnapshot, SourceError> {
        let mut attempt = 1;
        loop {
            match self.source.fetch(interval_minutes).await {
                Ok(raw) => return Ok(raw),
                Err(err) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(attempt, ?delay, error = %err, "fetch failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn degrade(&self, generation: u64, reason: String) -> PollOutcome {
        *self.degraded.borrow_mut() = Some(reason.clone());
        self.outcome(generation, PollStatus::Degraded { reason })
    }

    fn outcome(&self, generation: u64, status: PollStatus) -> PollOutcome {
        PollOutcome {
            generation,
            status,
            snapshot: self.last_good(),
        }
    }

    /// Whether any fetch is currently in flight.
    pub fn is_fetching(&self) -> bool {
        self.in_flight.get() > 0
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest_generation.get()
    }

    /// The most recent snapshot accepted from the source, or the empty
    /// snapshot before the first success.
    pub fn last_good(&self) -> Arc<MetricSnapshot> {
        Arc::clone(&self.last_good.borrow())
    }

    /// Reason the source is currently degraded, if it is.
    pub fn degraded(&self) -> Option<String> {
        self.degraded.borrow().clone()
    }

    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes.get()
    }

    /// Change the history window used by subsequent fetches.
    pub fn set_interval_minutes(&self, minutes: u32) {
        self.interval_minutes.set(minutes);
    }

    pub fn description(&self) -> &str {
        self.source.description()
    }
}
