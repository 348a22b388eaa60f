use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{run_check, Source};
use crate::model::{CheckResult, Item, Platform, SourceKind};
use crate::platform;
use crate::runner::CommandRunner;

pub struct BrewSource {
    runner: Arc<dyn CommandRunner>,
}

impl BrewSource {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[derive(Deserialize, Default)]
struct BrewOutdated {
    #[serde(default)]
    formulae: Vec<BrewFormula>,
    #[serde(default)]
    casks: Vec<BrewCask>,
}

#[derive(Deserialize)]
struct BrewFormula {
    #[serde(default)]
    name: String,
    #[serde(default)]
    installed_versions: Vec<String>,
    #[serde(default)]
    current_version: String,
}

#[derive(Deserialize)]
struct BrewCask {
    #[serde(default)]
    name: String,
    #[serde(default)]
    installed_version: String,
    #[serde(default)]
    current_version: String,
}

/// Parses `brew outdated --json=v2`, merging formulae and casks.
fn parse_outdated(payload: &str) -> Result<Vec<Item>, String> {
    let parsed: Option<BrewOutdated> = serde_json::from_str(payload).map_err(|e| e.to_string())?;
    let Some(parsed) = parsed else {
        return Ok(Vec::new());
    };

    let formulae = parsed.formulae.into_iter().map(|f| {
        // The newest installed keg is the one in use.
        let current = f.installed_versions.last().cloned().unwrap_or_default();
        Item::new(f.name, current, f.current_version)
    });
    let casks = parsed
        .casks
        .into_iter()
        .map(|c| Item::new(c.name, c.installed_version, c.current_version));

    Ok(formulae
        .chain(casks)
        .filter(|item| !item.name.is_empty())
        .collect())
}

#[async_trait]
impl Source for BrewSource {
    fn name(&self) -> &str {
        "brew"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Brew
    }

    fn update_command(&self) -> String {
        "brew upgrade".to_string()
    }

    fn supported_platforms(&self) -> &[Platform] {
        &[Platform::Linux, Platform::MacOS]
    }

    fn detect(&self) -> bool {
        self.is_supported() && platform::has_executables(&["brew"])
    }

    async fn check_updates(&self, cancel: &CancellationToken) -> CheckResult {
        run_check(
            self,
            self.runner.as_ref(),
            "brew",
            &["outdated", "--json=v2"],
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
    use crate::runner::testing::FakeRunner;

    const PAYLOAD: &str = r#"{
        "formulae": [
            {
                "name": "wget",
                "installed_versions": ["1.21.3", "1.21.4"],
                "current_version": "1.24.5",
                "pinned": false,
                "pinned_version": null
            },
            {
                "name": "",
                "installed_versions": ["0.1"],
                "current_version": "0.2"
            }
        ],
        "casks": [
            {
                "name": "firefox",
                "installed_versions": ["122.0"],
                "installed_version": "122.0",
                "current_version": "123.0"
            }
        ]
    }"#;

    #[test]
    fn test_parse_formulae_and_casks() {
        let items = parse_outdated(PAYLOAD).unwrap();
        assert_eq!(
            items,
            vec![
                Item::new("wget", "1.21.4", "1.24.5"),
                Item::new("firefox", "122.0", "123.0"),
            ]
        );
    }

    #[test]
    fn test_formula_without_installed_versions() {
        let items =
            parse_outdated(r#"{"formulae":[{"name":"jq","installed_versions":[],"current_version":"1.7.1"}],"casks":[]}"#)
                .unwrap();
        assert_eq!(items, vec![Item::new("jq", "", "1.7.1")]);
    }

    #[test]
    fn test_parse_empty_lists() {
        assert!(parse_outdated(r#"{"formulae":[],"casks":[]}"#).unwrap().is_empty());
        assert!(parse_outdated("null").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_null_output_is_up_to_date() {
        let runner = Arc::new(FakeRunner::new().with_stdout("brew outdated --json=v2", 0, "null"));
        let result = BrewSource::new(runner)
            .check_updates(&CancellationToken::new())
            .await;

        assert!(result.is_ok());
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_parse_wrong_shape_is_malformed() {
        assert!(parse_outdated(r#"{"formulae": "wget"}"#).is_err());
        assert!(parse_outdated(r#""wget""#).is_err());
    }

    #[tokio::test]
    async fn test_check_sorts_across_formulae_and_casks() {
        let runner = Arc::new(FakeRunner::new().with_stdout("brew outdated --json=v2", 0, PAYLOAD));
        let result = BrewSource::new(runner)
            .check_updates(&CancellationToken::new())
            .await;

        assert!(result.is_ok());
        let names: Vec<_> = result.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["firefox", "wget"]);
    }

    #[tokio::test]
    async fn test_blank_output_is_up_to_date() {
        let runner = Arc::new(FakeRunner::new().with_stdout("brew outdated --json=v2", 0, "\n"));
        let result = BrewSource::new(runner)
            .check_updates(&CancellationToken::new())
            .await;

        assert!(result.is_ok());
        assert!(result.items.is_empty());
    }
}
