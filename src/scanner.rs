//! Scan orchestration.
//!
//! [`Scanner::scan`] probes every configured source, runs the update checks
//! of the present ones concurrently, and returns a [`Batch`] in configured
//! order. [`Scanner::watch`] repeats that on a fixed interval.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use upd8::runner::ExecRunner;
//! use upd8::source::all_sources;
//! use upd8::Scanner;
//!
//! #[tokio::main]
//! async fn main() {
//!     let scanner = Scanner::new(all_sources(Arc::new(ExecRunner::default())));
//!     let batch = scanner.scan(&CancellationToken::new()).await;
//!     for result in &batch {
//!         println!("{}: {} outdated", result.source, result.outdated_count());
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{CheckError, ConfigError};
use crate::model::{Batch, CheckResult};
use crate::source::Source;

/// Runs update checks across a fixed, ordered list of sources.
pub struct Scanner {
    sources: Vec<Arc<dyn Source>>,
}

impl Scanner {
    pub fn new(sources: Vec<Arc<dyn Source>>) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &[Arc<dyn Source>] {
        &self.sources
    }

    /// Sources whose tool is present right now, in configured order.
    pub fn detect(&self) -> Vec<Arc<dyn Source>> {
        self.sources
            .iter()
            .filter(|source| {
                let present = source.detect();
                if !present {
                    debug!(source = source.name(), "not detected, skipping");
                }
                present
            })
            .cloned()
            .collect()
    }

    /// Performs one scan.
    ///
    /// Each present source is checked in its own task. A failing or
    /// panicking check only affects its own entry. If `cancel` fires, checks
    /// still in flight are dropped from the batch and their processes are
    /// killed; checks that already finished are kept.
    pub async fn scan(&self, cancel: &CancellationToken) -> Batch {
        let start = Instant::now();

        // Cancelled when this future completes or is dropped, so no task
        // outlives the scan.
        let scan_token = cancel.child_token();
        let _guard = scan_token.clone().drop_guard();

        let present = self.detect();
        info!(
            configured = self.sources.len(),
            present = present.len(),
            "scan started"
        );

        let handles: Vec<_> = present
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let token = scan_token.clone();
                tokio::spawn(async move {
                    let started = Instant::now();
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => None,
                        result = source.check_updates(&token) => Some(finish(result, started.elapsed())),
                    }
                })
            })
            .collect();

        let outcomes = join_all(handles).await;

        let mut results = Vec::with_capacity(outcomes.len());
        for (source, outcome) in present.iter().zip(outcomes) {
            match outcome {
                Ok(Some(result)) if scan_token.is_cancelled() && is_cancelled(&result) => {
                    debug!(source = source.name(), "check cancelled, omitting");
                }
                Ok(Some(result)) => {
                    if let Some(error) = &result.error {
                        warn!(source = source.name(), error = %error, "update check failed");
                    }
                    results.push(result);
                }
                Ok(None) => debug!(source = source.name(), "check cancelled, omitting"),
                Err(e) => {
                    warn!(source = source.name(), error = %e, "update check task failed");
                    results.push(CheckResult::failed(
                        source.name(),
                        source.update_command(),
                        CheckError::Panicked(e.to_string()),
                    ));
                }
            }
        }

        info!(
            results = results.len(),
            elapsed = ?start.elapsed(),
            "scan finished"
        );

        Batch::new(results)
    }

    /// Scans immediately, then once per `interval`, handing each batch to
    /// `on_batch` until `cancel` fires.
    ///
    /// `on_batch` runs to completion before the next scan starts, so scans
    /// never overlap. A tick that comes due while a scan is still running is
    /// delayed, not queued. Nothing is delivered once `cancel` has fired.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositiveInterval`] for a zero interval,
    /// before any scan runs.
    pub async fn watch<F>(
        &self,
        interval: Duration,
        cancel: &CancellationToken,
        mut on_batch: F,
    ) -> Result<(), ConfigError>
    where
        F: FnMut(Batch),
    {
        if interval.is_zero() {
            return Err(ConfigError::NonPositiveInterval);
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        let mut scans = 0u64;
        loop {
            if cancel.is_cancelled() {
                break;
            }

            let batch = self.scan(cancel).await;
            if cancel.is_cancelled() {
                break;
            }
            scans += 1;
            on_batch(batch);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => debug!(scans, "interval elapsed"),
            }
        }

        info!(scans, "watch stopped");
        Ok(())
    }
}

/// Fills in the elapsed time when the source did not measure it.
fn finish(mut result: CheckResult, elapsed: Duration) -> CheckResult {
    if result.duration.is_zero() {
        result.duration = elapsed;
    }
    result
}

fn is_cancelled(result: &CheckResult) -> bool {
    result.error.as_ref().is_some_and(CheckError::is_cancelled)
}
