use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{run_check, Source};
use crate::model::{CheckResult, Item, Platform, SourceKind};
use crate::platform;
use crate::runner::CommandRunner;

pub struct FlatpakSource {
    runner: Arc<dyn CommandRunner>,
}

impl FlatpakSource {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

fn is_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("ref") && lower.contains("version")
}

/// Parses `flatpak remote-ls --updates --columns=ref,version`.
///
/// The version column is often blank, so the latest version is taken from
/// the last field only when there is more than one.
fn parse_remote_ls(payload: &str) -> Vec<Item> {
    payload
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_header(line))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let name = fields.first()?;
            let latest = if fields.len() > 1 { fields[fields.len() - 1] } else { "" };
            Some(Item::new(*name, "", latest))
        })
        .collect()
}

#[async_trait]
impl Source for FlatpakSource {
    fn name(&self) -> &str {
        "flatpak"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Flatpak
    }

    fn update_command(&self) -> String {
        "flatpak update".to_string()
    }

    fn supported_platforms(&self) -> &[Platform] {
        &[Platform::Linux]
    }

    fn detect(&self) -> bool {
        self.is_supported() && platform::has_executables(&["flatpak"])
    }

    async fn check_updates(&self, cancel: &CancellationToken) -> CheckResult {
        run_check(
            self,
            self.runner.as_ref(),
            "flatpak",
            &["remote-ls", "--updates", "--columns=ref,version"],
            &[0],
            cancel,
            |payload| Ok(parse_remote_ls(payload)),
        )
        .await
    }
}
