//! Package manager sources.
//!
//! This module provides the [`Source`] trait and one implementation per
//! supported package manager. Each source knows how to detect its tool and
//! how to turn the tool's "outdated" output into [`Item`]s.
//!
//! # Available Sources
//!
//! | Source | Command | Platforms |
//! |--------|---------|-----------|
//! | [`NpmSource`] | `npm outdated -g --json` | All |
//! | [`PipSource`] | `pip list --outdated --format=json` | All |
//! | [`BrewSource`] | `brew outdated --json=v2` | Linux, macOS |
//! | [`CargoSource`] | `cargo install-update --list` | All |
//! | [`FlatpakSource`] | `flatpak remote-ls --updates` | Linux |
//! | [`SnapSource`] | `snap refresh --list` | Linux |
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use upd8::runner::ExecRunner;
//! use upd8::source::all_sources;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cancel = CancellationToken::new();
//!     for source in all_sources(Arc::new(ExecRunner::default())) {
//!         if source.detect() {
//!             let result = source.check_updates(&cancel).await;
//!             println!("{}: {} outdated", source.name(), result.items.len());
//!         }
//!     }
//! }
//! ```

mod brew;
mod cargo;
mod flatpak;
mod npm;
mod pip;
mod snap;

pub use brew::BrewSource;
pub use cargo::CargoSource;
pub use flatpak::FlatpakSource;
pub use npm::NpmSource;
pub use pip::PipSource;
pub use snap::SnapSource;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::CheckError;
use crate::model::{CheckResult, Item, Platform, SourceKind};
use crate::runner::CommandRunner;

/// A package manager that can report outdated packages.
///
/// Sources must keep three outcomes apart:
///
/// - tool absent: [`detect`](Self::detect) returns false and the source is
///   left out of the batch
/// - tool present but the query failed: the result carries an error
/// - nothing outdated: the result has no items and no error
#[async_trait]
pub trait Source: Send + Sync {
    /// Stable identifier shown in reports, e.g. `"npm"`.
    fn name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Advisory command the user can run to apply the updates.
    fn update_command(&self) -> String;

    /// Returns the platforms this tool exists on.
    fn supported_platforms(&self) -> &[Platform] {
        Platform::ALL
    }

    /// Returns true if this source can exist on the current platform.
    fn is_supported(&self) -> bool {
        self.supported_platforms().contains(&Platform::current())
    }

    /// Cheap presence probe. Never runs the slow query and never errors.
    fn detect(&self) -> bool;

    /// Queries the tool and normalizes its output.
    ///
    /// Failures are reported inside the returned [`CheckResult`].
    async fn check_updates(&self, cancel: &CancellationToken) -> CheckResult;
}

/// Runs one command and parses its stdout into a [`CheckResult`].
///
/// `accepted` lists the exit codes that count as success for this tool.
/// Blank output means nothing is outdated. Items come back sorted by name.
pub(crate) async fn run_check<F>(
    source: &dyn Source,
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
    accepted: &[i32],
    cancel: &CancellationToken,
    parse: F,
) -> CheckResult
where
    F: FnOnce(&str) -> Result<Vec<Item>, String>,
{
    let result = CheckResult::new(source.name(), source.update_command());
    let command = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");

    let output = runner.run(program, args, cancel).await;
    if let Err(e) = output.check(&command, accepted) {
        return result.with_error(e);
    }

    if !output.has_output() {
        return result;
    }

    match parse(output.stdout_text().trim()) {
        Ok(mut items) => {
            crate::model::sort_items(&mut items);
            result.with_items(items)
        }
        Err(reason) => result.with_error(CheckError::Malformed { command, reason }),
    }
}

/// Returns every source, in the default report order.
pub fn all_sources(runner: Arc<dyn CommandRunner>) -> Vec<Arc<dyn Source>> {
    sources_for(&SourceKind::all(), runner)
}

/// Returns the sources for `kinds`, keeping the given order.
pub fn sources_for(kinds: &[SourceKind], runner: Arc<dyn CommandRunner>) -> Vec<Arc<dyn Source>> {
    kinds
        .iter()
        .map(|kind| get_source(*kind, runner.clone()))
        .collect()
}

/// Returns the source for a specific kind.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use upd8::model::SourceKind;
/// use upd8::runner::ExecRunner;
/// use upd8::source::get_source;
///
/// let source = get_source(SourceKind::Pip3, Arc::new(ExecRunner::default()));
/// assert_eq!(source.name(), "pip3");
/// ```
pub fn get_source(kind: SourceKind, runner: Arc<dyn CommandRunner>) -> Arc<dyn Source> {
    match kind {
        SourceKind::Npm => Arc::new(NpmSource::new(runner)),
        SourceKind::Pip => Arc::new(PipSource::new("pip", runner)),
        SourceKind::Pip3 => Arc::new(PipSource::new("pip3", runner)),
        SourceKind::Brew => Arc::new(BrewSource::new(runner)),
        SourceKind::Cargo => Arc::new(CargoSource::new(runner)),
        SourceKind::Flatpak => Arc::new(FlatpakSource::new(runner)),
        SourceKind::Snap => Arc::new(SnapSource::new(runner)),
    }
}
