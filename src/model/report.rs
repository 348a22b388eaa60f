use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::Duration;

use super::Item;
use crate::config::IgnoreConfig;
use crate::error::CheckError;

/// The outcome of one source's update check.
///
/// When `error` is set the `items` must not be read as "nothing outdated";
/// consumers treat the entry as a failure.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub source: String,
    pub items: Vec<Item>,
    pub update_command: String,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<CheckError>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl CheckResult {
    pub fn new(source: impl Into<String>, update_command: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            items: Vec::new(),
            update_command: update_command.into(),
            error: None,
            duration: Duration::ZERO,
        }
    }

    /// Builds a result for a check that failed outright.
    pub fn failed(source: impl Into<String>, update_command: impl Into<String>, error: CheckError) -> Self {
        Self::new(source, update_command).with_error(error)
    }

    pub fn with_items(mut self, items: Vec<Item>) -> Self {
        self.items = items;
        self
    }

    /// Sets the error and drops any items, which are unreliable from here on.
    pub fn with_error(mut self, error: CheckError) -> Self {
        self.items.clear();
        self.error = Some(error);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Number of outdated packages, or zero when the check failed.
    pub fn outdated_count(&self) -> usize {
        if self.is_ok() {
            self.items.len()
        } else {
            0
        }
    }

    /// True if the entry carries nothing worth showing outside verbose mode.
    pub fn is_quiet(&self) -> bool {
        self.is_ok() && self.items.is_empty()
    }
}

fn serialize_error<S: Serializer>(error: &Option<CheckError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// The ordered results of one scan, one entry per detected source.
///
/// Order follows the configured source order, never completion order.
#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    pub scanned_at: DateTime<Utc>,
    pub results: Vec<CheckResult>,
}

impl Batch {
    pub fn new(results: Vec<CheckResult>) -> Self {
        Self {
            scanned_at: Utc::now(),
            results,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CheckResult> {
        self.results.iter()
    }

    /// True if any source failed. Drives the non-zero process exit code.
    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|r| !r.is_ok())
    }

    pub fn total_outdated(&self) -> usize {
        self.results.iter().map(CheckResult::outdated_count).sum()
    }

    /// Drops sources that have neither an error nor any outdated items.
    pub fn only_notable(mut self) -> Self {
        self.results.retain(|r| !r.is_quiet());
        self
    }

    /// Removes items whose names match the ignore list.
    pub fn without_ignored(mut self, ignore: &IgnoreConfig) -> Self {
        if ignore.packages.is_empty() {
            return self;
        }
        for result in &mut self.results {
            result
                .items
                .retain(|item| !ignore.should_ignore_package(&item.name));
        }
        self
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a CheckResult;
    type IntoIter = std::slice::Iter<'a, CheckResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
