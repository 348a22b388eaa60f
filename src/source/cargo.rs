use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tokio_util::sync::CancellationToken;

use super::{run_check, Source};
use crate::model::{CheckResult, Item, SourceKind};
use crate::platform;
use crate::runner::CommandRunner;

// `<name> v<current> -> v<latest>`, anywhere on the line.
static UPDATE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<name>\S+)\s+v?(?P<current>[0-9]\S*)\s+->\s+v?(?P<latest>[0-9]\S*)").unwrap()
});

/// Binaries installed with `cargo install`, checked through the
/// `cargo-update` subcommand.
pub struct CargoSource {
    runner: Arc<dyn CommandRunner>,
}

impl CargoSource {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

/// Parses `cargo install-update --list`.
///
/// The format belongs to a third-party tool and is matched heuristically.
/// Lines that do not match are skipped, never reported.
fn parse_update_list(payload: &str) -> Vec<Item> {
    payload
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| UPDATE_LINE.captures(line))
        .map(|caps| Item::new(&caps["name"], &caps["current"], &caps["latest"]))
        .collect()
}

#[async_trait]
impl Source for CargoSource {
    fn name(&self) -> &str {
        "cargo"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Cargo
    }

    fn update_command(&self) -> String {
        "cargo install-update -a".to_string()
    }

    fn detect(&self) -> bool {
        self.is_supported() && platform::has_executables(&["cargo", "cargo-install-update"])
    }

    async fn check_updates(&self, cancel: &CancellationToken) -> CheckResult {
        run_check(
            self,
            self.runner.as_ref(),
            "cargo",
            &["install-update", "--list"],
            &[0],
            cancel,
            |payload| Ok(parse_update_list(payload)),
        )
        .await
    }
}
