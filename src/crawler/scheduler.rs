//! Bounded-concurrency batch scheduler for detail fetches
//!
//! Items are processed in fixed-size windows. Every item in a window runs
//! concurrently and the window settles completely before the next one
//! starts; a fixed delay separates windows. Results come back in input
//! order no matter which item finished first.

use crate::config::HarvesterConfig;
use futures::future::join_all;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Result of a fallible batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<R> {
    /// One result per input item, in input order
    pub results: Vec<R>,

    /// Input positions whose call failed and hold the default sentinel
    pub failed: Vec<usize>,
}

/// Scheduler that runs windows of concurrent calls
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    concurrency: usize,
    window_delay: Duration,
}

impl BatchScheduler {
    /// Creates a scheduler
    ///
    /// A concurrency of zero is treated as one.
    pub fn new(concurrency: usize, window_delay: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            window_delay,
        }
    }

    pub fn from_config(config: &HarvesterConfig) -> Self {
        Self::new(
            config.detail_concurrency,
            Duration::from_millis(config.batch_delay_ms),
        )
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs `f` over every item, one window at a time
    ///
    /// `f` must not fail; callers that can fail should use
    /// [`process_with_fallback`](Self::process_with_fallback). The result
    /// buffer is owned here and only extended once a window has settled.
    ///
    /// # Arguments
    ///
    /// * `items` - Items to process
    /// * `f` - Per-item call
    ///
    /// # Returns
    ///
    /// One result per item, index-aligned with `items`.
    pub async fn process<'a, T, R, F, Fut>(&self, items: &'a [T], f: F) -> Vec<R>
    where
        F: Fn(&'a T) -> Fut,
        Fut: Future<Output = R>,
    {
        let mut results = Vec::with_capacity(items.len());

        for (index, window) in items.chunks(self.concurrency).enumerate() {
            if index > 0 && !self.window_delay.is_zero() {
                tokio::time::sleep(self.window_delay).await;
            }

            tracing::debug!(
                "Processing window {} ({} items)",
                index + 1,
                window.len()
            );

            let settled = join_all(window.iter().map(&f)).await;
            results.extend(settled);
        }

        results
    }

    /// Runs a fallible call over every item
    ///
    /// A failed call is logged and replaced by `R::default()`; it never
    /// cancels the other calls in its window.
    pub async fn process_with_fallback<'a, T, R, E, F, Fut>(
        &self,
        items: &'a [T],
        f: F,
    ) -> BatchOutcome<R>
    where
        F: Fn(&'a T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        R: Default,
        E: fmt::Display,
    {
        let settled = self.process(items, f).await;

        let mut outcome = BatchOutcome {
            results: Vec::with_capacity(settled.len()),
            failed: Vec::new(),
        };

        for (index, result) in settled.into_iter().enumerate() {
            match result {
                Ok(value) => outcome.results.push(value),
                Err(e) => {
                    tracing::warn!("Batch item {} failed: {}", index, e);
                    outcome.failed.push(index);
                    outcome.results.push(R::default());
                }
            }
        }

        outcome
    }
}
