use serde::{Deserialize, Serialize};

/// A single outdated package as reported by one source.
///
/// `current` and `latest` are left empty when the tool does not report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub current: String,
    pub latest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Item {
    pub fn new(name: impl Into<String>, current: impl Into<String>, latest: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current: current.into(),
            latest: latest.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Sorts items by name so every source displays in a stable order.
pub fn sort_items(items: &mut [Item]) {
    items.sort_by(|a, b| a.name.cmp(&b.name));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Npm,
    Pip,
    Pip3,
    Brew,
    Cargo,
    Flatpak,
    Snap,
}

impl SourceKind {
    /// Every supported source, in the fixed order batches are reported in.
    pub fn all() -> Vec<SourceKind> {
        vec![
            SourceKind::Npm,
            SourceKind::Pip,
            SourceKind::Pip3,
            SourceKind::Brew,
            SourceKind::Cargo,
            SourceKind::Flatpak,
            SourceKind::Snap,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Npm => "npm",
            SourceKind::Pip => "pip",
            SourceKind::Pip3 => "pip3",
            SourceKind::Brew => "brew",
            SourceKind::Cargo => "cargo",
            SourceKind::Flatpak => "flatpak",
            SourceKind::Snap => "snap",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SourceKind::Npm => "npm global packages",
            SourceKind::Pip => "pip packages",
            SourceKind::Pip3 => "pip3 packages",
            SourceKind::Brew => "Homebrew formulae and casks",
            SourceKind::Cargo => "cargo-installed binaries (needs cargo-update)",
            SourceKind::Flatpak => "Flatpak applications and runtimes",
            SourceKind::Snap => "Snap packages",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    MacOS,
    Windows,
}

impl Platform {
    pub const ALL: &'static [Platform] = &[Platform::Linux, Platform::MacOS, Platform::Windows];

    pub fn current() -> Self {
        #[cfg(target_os = "macos")]
        return Platform::MacOS;
        #[cfg(target_os = "windows")]
        return Platform::Windows;
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        return Platform::Linux;
    }
}
