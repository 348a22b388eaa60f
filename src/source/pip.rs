use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{run_check, Source};
use crate::model::{CheckResult, Item, SourceKind};
use crate::platform;
use crate::runner::CommandRunner;

/// pip or pip3, depending on the binary it was created for.
pub struct PipSource {
    binary: &'static str,
    runner: Arc<dyn CommandRunner>,
}

impl PipSource {
    /// `binary` is `"pip"` or `"pip3"`.
    pub fn new(binary: &'static str, runner: Arc<dyn CommandRunner>) -> Self {
        Self { binary, runner }
    }
}

#[derive(Deserialize)]
struct PipOutdatedEntry {
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    latest_version: String,
}

/// Parses `pip list --outdated --format=json`: an array of entries.
fn parse_outdated(payload: &str) -> Result<Vec<Item>, String> {
    if payload.is_empty() || payload == "null" || payload == "[]" {
        return Ok(Vec::new());
    }

    let entries: Vec<PipOutdatedEntry> = serde_json::from_str(payload).map_err(|e| e.to_string())?;

    Ok(entries
        .into_iter()
        .map(|e| Item::new(e.name, e.version, e.latest_version))
        .collect())
}

#[async_trait]
impl Source for PipSource {
    fn name(&self) -> &str {
        self.binary
    }

    fn kind(&self) -> SourceKind {
        if self.binary == "pip3" {
            SourceKind::Pip3
        } else {
            SourceKind::Pip
        }
    }

    fn update_command(&self) -> String {
        format!("{} install --upgrade -r requirements.txt", self.binary)
    }

    fn detect(&self) -> bool {
        self.is_supported() && platform::has_executables(&[self.binary])
    }

    async fn check_updates(&self, cancel: &CancellationToken) -> CheckResult {
        run_check(
            self,
            self.runner.as_ref(),
            self.binary,
            &["list", "--outdated", "--format=json"],
            &[0],
            cancel,
            parse_outdated,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckError;
    use crate::runner::testing::FakeRunner;

    #[test]
    fn test_parse_entries() {
        let payload = r#"[
            {"name": "requests", "version": "2.30.0", "latest_version": "2.31.0", "latest_filetype": "wheel"},
            {"name": "black", "version": "23.1.0", "latest_version": "24.2.0", "latest_filetype": "wheel"}
        ]"#;
        let items = parse_outdated(payload).unwrap();
        assert_eq!(
            items,
            vec![
                Item::new("requests", "2.30.0", "2.31.0"),
                Item::new("black", "23.1.0", "24.2.0"),
            ]
        );
    }

    #[test]
    fn test_parse_empty_payloads() {
        assert!(parse_outdated("").unwrap().is_empty());
        assert!(parse_outdated("[]").unwrap().is_empty());
        assert!(parse_outdated("null").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_null_output_is_up_to_date() {
        let runner = Arc::new(FakeRunner::new().with_stdout("pip list --outdated --format=json", 0, "null\n"));
        let result = PipSource::new("pip", runner)
            .check_updates(&CancellationToken::new())
            .await;

        assert!(result.is_ok());
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_parse_object_is_malformed() {
        assert!(parse_outdated(r#"{"name": "requests"}"#).is_err());
    }

    #[tokio::test]
    async fn test_pip3_uses_its_own_binary() {
        let payload = r#"[{"name": "setuptools", "version": "68.0.0", "latest_version": "69.1.0"}]"#;
        let runner = Arc::new(FakeRunner::new().with_stdout(
            "pip3 list --outdated --format=json",
            0,
            payload,
        ));
        let source = PipSource::new("pip3", runner.clone());

        let result = source.check_updates(&CancellationToken::new()).await;

        assert_eq!(result.source, "pip3");
        assert_eq!(result.update_command, "pip3 install --upgrade -r requirements.txt");
        assert_eq!(result.items, vec![Item::new("setuptools", "68.0.0", "69.1.0")]);
        assert_eq!(source.kind(), SourceKind::Pip3);
    }

    #[tokio::test]
    async fn test_items_sorted_by_name() {
        let payload = r#"[
            {"name": "urllib3", "version": "1.26.0", "latest_version": "2.2.1"},
            {"name": "certifi", "version": "2023.7.22", "latest_version": "2024.2.2"}
        ]"#;
        let runner = Arc::new(FakeRunner::new().with_stdout(
            "pip list --outdated --format=json",
            0,
            payload,
        ));
        let result = PipSource::new("pip", runner)
            .check_updates(&CancellationToken::new())
            .await;

        let names: Vec<_> = result.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["certifi", "urllib3"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_fails() {
        let runner = Arc::new(FakeRunner::new().with(
            "pip list --outdated --format=json",
            crate::runner::CommandOutput::completed(1, "", "ERROR: externally-managed-environment"),
        ));
        let result = PipSource::new("pip", runner)
            .check_updates(&CancellationToken::new())
            .await;

        let err = result.error.expect("exit 1 should be an error");
        assert!(matches!(err, CheckError::Exit { code: 1, .. }));
        assert!(err.to_string().contains("externally-managed-environment"));
    }
}
