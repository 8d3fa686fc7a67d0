use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::task::JoinSet;

use super::report::{BatchReport, DatasetInfo};
use super::task::{TaskStatus, YearTask};
use super::{YearError, YearProcessor};
use crate::control::CancelToken;
use crate::convert::ConvertReport;
use crate::retry::{RoundDecision, RoundPolicy};

/// Granularity of cancellation checks while waiting between rounds.
const CANCEL_POLL: Duration = Duration::from_millis(100);

/// Drives a `YearProcessor` over a set of years for up to `max_rounds` rounds.
pub struct RetryScheduler<P> {
    processor: Arc<P>,
    policy: RoundPolicy,
    concurrency: usize,
    cancel: CancelToken,
}

impl<P: YearProcessor> RetryScheduler<P> {
    pub fn new(processor: P, policy: RoundPolicy) -> Self {
        Self {
            processor: Arc::new(processor),
            policy: RoundPolicy {
                max_rounds: policy.max_rounds.max(1),
                ..policy
            },
            concurrency: 1,
            cancel: CancelToken::new(),
        }
    }

    /// Years processed at once within a round (clamped to at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs the batch. Duplicate years are attempted once.
    pub async fn run(&self, years: &[u16]) -> BatchReport {
        let mut tasks: Vec<YearTask> = Vec::with_capacity(years.len());
        for &year in years {
            if !tasks.iter().any(|t| t.year == year) {
                tasks.push(YearTask::new(year));
            }
        }
        let mut datasets = std::collections::BTreeMap::new();
        let mut round = 0u32;

        loop {
            round += 1;
            let pending: Vec<usize> = (0..tasks.len()).filter(|&i| tasks[i].is_pending()).collect();
            tracing::info!(round, pending = pending.len(), max_rounds = self.policy.max_rounds, "starting round");

            for (idx, result) in self.run_round(&tasks, &pending).await {
                let task = &mut tasks[idx];
                task.attempts += 1;
                match result {
                    Ok(report) => {
                        tracing::info!(year = task.year, round, rows = report.rows, "year succeeded");
                        task.status = TaskStatus::Succeeded;
                        task.last_error = None;
                        datasets.insert(
                            task.year,
                            DatasetInfo {
                                path: report.path,
                                rows: report.rows,
                                columns: report.columns,
                                codec: report.codec.to_string(),
                            },
                        );
                    }
                    Err(e) if e.is_cancelled() => {
                        tracing::warn!(year = task.year, round, "year cancelled");
                        task.status = TaskStatus::Cancelled;
                    }
                    Err(e) => {
                        tracing::warn!(year = task.year, round, attempt = task.attempts, error = %e, "year attempt failed");
                        task.last_error = Some(e.to_string());
                    }
                }
            }

            if self.cancel.is_cancelled() {
                for task in tasks.iter_mut().filter(|t| t.is_pending()) {
                    task.status = TaskStatus::Cancelled;
                }
                tracing::warn!(round, "batch cancelled");
                break;
            }

            let still_pending = tasks.iter().filter(|t| t.is_pending()).count();
            match self.policy.decide(round, still_pending) {
                RoundDecision::Stop => break,
                RoundDecision::NextAfter(delay) => {
                    tracing::info!(round, pending = still_pending, delay_secs = delay.as_secs_f64(), "waiting before next round");
                    if !self.pause(delay).await {
                        for task in tasks.iter_mut().filter(|t| t.is_pending()) {
                            task.status = TaskStatus::Cancelled;
                        }
                        tracing::warn!(round, "batch cancelled during pause");
                        break;
                    }
                }
            }
        }

        for task in tasks.iter_mut().filter(|t| t.is_pending()) {
            tracing::warn!(year = task.year, attempts = task.attempts, "year failed after all rounds");
            task.status = TaskStatus::Failed;
        }

        let finished_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        BatchReport {
            finished_at,
            rounds: round,
            tasks,
            datasets,
        }
    }

    /// Attempts each pending year once, keeping at most `concurrency` in flight.
    /// Years not started before cancellation are left out of the result.
    async fn run_round(
        &self,
        tasks: &[YearTask],
        pending: &[usize],
    ) -> Vec<(usize, Result<ConvertReport, YearError>)> {
        let mut results = Vec::with_capacity(pending.len());
        let mut set = JoinSet::new();
        let mut next = 0;

        loop {
            while next < pending.len() && set.len() < self.concurrency && !self.cancel.is_cancelled() {
                let idx = pending[next];
                let year = tasks[idx].year;
                let processor = Arc::clone(&self.processor);
                let cancel = self.cancel.clone();
                tracing::debug!(year, attempt = tasks[idx].attempts + 1, "attempting year");
                set.spawn_blocking(move || {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| processor.process(year, &cancel)))
                        .unwrap_or_else(|_| Err(YearError::Worker(format!("processing {year} panicked"))));
                    (idx, result)
                });
                next += 1;
            }
            match set.join_next().await {
                Some(Ok(done)) => results.push(done),
                Some(Err(e)) => tracing::error!(error = %e, "year worker lost"),
                None => break,
            }
        }
        results
    }

    /// Sleeps for `delay`; returns false if cancelled meanwhile.
    async fn pause(&self, delay: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + delay;
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return true;
            }
            tokio::time::sleep((deadline - now).min(CANCEL_POLL)).await;
        }
    }
}
