//! Batch dispatch with periodic barriers.
//!
//! Items are processed in order. Every item whose index is a multiple of the
//! batch modulus is a barrier: everything started before it is joined, then
//! it runs alone. The items between two barriers run concurrently.
//!
//! After each item the [`RateGovernor`] is consulted with the last quota
//! Shopify reported. Quotas flow back through the joined results rather
//! than through shared state.

mod governor;

pub use governor::{DEFAULT_PAUSE, DEFAULT_THRESHOLD, RateGovernor};

use std::future::Future;

use tokio::task::{JoinError, JoinSet};
use tracing::instrument;

use crate::shopify::Quota;

/// Result of processing one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemReport {
    /// Quota reported by the last upstream call the item made.
    pub quota: Option<Quota>,
    pub succeeded: bool,
}

impl ItemReport {
    #[must_use]
    pub const fn success(quota: Option<Quota>) -> Self {
        Self {
            quota,
            succeeded: true,
        }
    }

    #[must_use]
    pub const fn failure(quota: Option<Quota>) -> Self {
        Self {
            quota,
            succeeded: false,
        }
    }
}

/// Statistics of a completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    /// Items that ran as barriers.
    pub barriers: usize,
    /// Items that failed or panicked.
    pub failed: usize,
    /// Times the governor paused.
    pub throttled: usize,
    /// Last quota seen.
    pub quota: Option<Quota>,
}

impl BatchSummary {
    fn record(&mut self, outcome: Result<ItemReport, JoinError>) {
        match outcome {
            Ok(report) => {
                if report.quota.is_some() {
                    self.quota = report.quota;
                }
                if !report.succeeded {
                    self.failed += 1;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "batch item task did not complete");
                self.failed += 1;
            }
        }
    }
}

/// Runs batches of items against the upstream API.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchDispatcher {
    governor: RateGovernor,
}

impl BatchDispatcher {
    #[must_use]
    pub const fn new(governor: RateGovernor) -> Self {
        Self { governor }
    }

    /// Process `items` with a barrier every `modulus` items.
    ///
    /// `op` is called once per item. A failing or panicking item is counted
    /// and the batch continues. A `modulus` of zero is treated as one.
    #[instrument(skip_all, fields(batch = label, items = items.len(), modulus = modulus))]
    pub async fn run<T, F, Fut>(
        &self,
        label: &'static str,
        items: Vec<T>,
        modulus: usize,
        op: F,
    ) -> BatchSummary
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = ItemReport> + Send + 'static,
    {
        let modulus = modulus.max(1);
        let mut summary = BatchSummary {
            total: items.len(),
            ..BatchSummary::default()
        };
        let mut in_flight = JoinSet::new();

        for (index, item) in items.into_iter().enumerate() {
            if index % modulus == 0 {
                summary.barriers += 1;
                while let Some(outcome) = in_flight.join_next().await {
                    summary.record(outcome);
                }
                tracing::debug!(index, "running barrier item");
                summary.record(tokio::spawn(op(item)).await);
            } else {
                in_flight.spawn(op(item));
            }

            while let Some(outcome) = in_flight.try_join_next() {
                summary.record(outcome);
            }

            if self.governor.throttle(summary.quota).await {
                summary.throttled += 1;
            }
        }

        while let Some(outcome) = in_flight.join_next().await {
            summary.record(outcome);
        }

        tracing::info!(
            total = summary.total,
            barriers = summary.barriers,
            failed = summary.failed,
            throttled = summary.throttled,
            quota = ?summary.quota.map(Quota::available),
            "batch complete"
        );

        summary
    }
}
