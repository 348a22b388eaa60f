use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{run_check, Source};
use crate::model::{CheckResult, Item, Platform, SourceKind};
use crate::platform;
use crate::runner::CommandRunner;

pub struct SnapSource {
    runner: Arc<dyn CommandRunner>,
}

impl SnapSource {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

/// Parses `snap refresh --list`: `Name  Version  Rev  Size  Publisher  Notes`.
///
/// The first line is the header when it mentions "version". Lines with
/// fewer than two fields are skipped.
fn parse_refresh_list(payload: &str) -> Vec<Item> {
    payload
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .filter(|(idx, line)| !(*idx == 0 && line.to_lowercase().contains("version")))
        .filter_map(|(_, line)| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let latest = fields.next()?;
            Some(Item::new(name, "", latest))
        })
        .collect()
}

#[async_trait]
impl Source for SnapSource {
    fn name(&self) -> &str {
        "snap"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Snap
    }

    fn update_command(&self) -> String {
        "snap refresh".to_string()
    }

    fn supported_platforms(&self) -> &[Platform] {
        &[Platform::Linux]
    }

    fn detect(&self) -> bool {
        self.is_supported() && platform::has_executables(&["snap"])
    }

    async fn check_updates(&self, cancel: &CancellationToken) -> CheckResult {
        run_check(
            self,
            self.runner.as_ref(),
            "snap",
            &["refresh", "--list"],
            &[0],
            cancel,
            |payload| Ok(parse_refresh_list(payload)),
        )
        .await
    }
}
