use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{run_check, Source};
use crate::model::{CheckResult, Item, SourceKind};
use crate::platform;
use crate::runner::CommandRunner;

pub struct NpmSource {
    runner: Arc<dyn CommandRunner>,
}

impl NpmSource {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[derive(Deserialize)]
struct NpmOutdatedEntry {
    #[serde(default)]
    current: Option<String>,
    #[serde(default)]
    wanted: Option<String>,
    #[serde(default)]
    latest: Option<String>,
}

/// Parses `npm outdated --json`: an object keyed by package name.
fn parse_outdated(payload: &str) -> Result<Vec<Item>, String> {
    if payload.is_empty() || payload == "null" {
        return Ok(Vec::new());
    }

    let entries: HashMap<String, NpmOutdatedEntry> =
        serde_json::from_str(payload).map_err(|e| e.to_string())?;

    let items = entries
        .into_iter()
        .map(|(name, entry)| {
            // npm leaves latest empty for some registries; wanted is the next best.
            let latest = entry
                .latest
                .filter(|v| !v.is_empty())
                .or(entry.wanted)
                .unwrap_or_default();
            Item::new(name, entry.current.unwrap_or_default(), latest)
        })
        .collect();

    Ok(items)
}

#[async_trait]
impl Source for NpmSource {
    fn name(&self) -> &str {
        "npm"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Npm
    }

    fn update_command(&self) -> String {
        "npm update -g".to_string()
    }

    fn detect(&self) -> bool {
        self.is_supported() && platform::has_executables(&["npm"])
    }

    async fn check_updates(&self, cancel: &CancellationToken) -> CheckResult {
        // npm exits 1 when it found outdated packages.
        run_check(
            self,
            self.runner.as_ref(),
            "npm",
            &["outdated", "-g", "--json"],
            &[0, 1],
            cancel,
            parse_outdated,
        )
        .await
    }
}
