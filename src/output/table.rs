use chrono::{Local, SecondsFormat};
use std::io::{self, Write};
use tabled::{builder::Builder, settings::Style};

use crate::model::{Batch, CheckResult};

const RESET: &str = "\x1b[0m";
const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const BRIGHT_MAGENTA: &str = "\x1b[95m";
const BRIGHT_YELLOW: &str = "\x1b[93m";

/// Names shown in the package preview before collapsing into "+N more".
const PREVIEW_LIMIT: usize = 3;
const ERROR_WIDTH: usize = 60;
/// Packages cell when there is nothing to preview.
const NO_PREVIEW: &str = "-";

pub const NO_MANAGERS_MESSAGE: &str = "No supported package managers detected.";
pub const NO_UPDATES_MESSAGE: &str = "No updates found. (Use --verbose to show all managers.)";

/// Renders batches as an aligned table.
#[derive(Debug, Clone)]
pub struct Renderer {
    /// Emit ANSI colors.
    pub color: bool,
    /// Fill the Packages column with a preview of outdated names.
    pub show_packages: bool,
    /// Print a `[timestamp]` banner before each batch (watch mode).
    pub timestamp: bool,
    /// Printed instead of a table when the batch is empty.
    pub empty_message: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            color: true,
            show_packages: false,
            timestamp: false,
            empty_message: NO_MANAGERS_MESSAGE.to_string(),
        }
    }
}

impl Renderer {
    pub fn render(&self, batch: &Batch, out: &mut dyn Write) -> io::Result<()> {
        if self.timestamp {
            let local = batch.scanned_at.with_timezone(&Local);
            writeln!(out)?;
            writeln!(out, "[{}]", local.to_rfc3339_opts(SecondsFormat::Secs, false))?;
        }

        if batch.is_empty() {
            writeln!(out, "{}", self.empty_message)?;
            return Ok(());
        }

        let mut builder = Builder::default();
        builder.push_record(["Manager", "Outdated", "Packages", "Update Command"]);
        for result in batch {
            builder.push_record(self.row(result));
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        writeln!(out, "{}", table)?;

        if !batch.has_errors() && batch.total_outdated() == 0 {
            writeln!(out)?;
            writeln!(out, "All supported package managers look up to date.")?;
        }

        Ok(())
    }

    fn row(&self, result: &CheckResult) -> [String; 4] {
        if let Some(error) = &result.error {
            return [
                self.paint(&result.source, BRIGHT_YELLOW),
                self.paint("error", RED),
                truncate(&error.to_string(), ERROR_WIDTH),
                result.update_command.clone(),
            ];
        }

        let count = result.items.len();
        let count_text = if count == 0 {
            self.paint("0", GREEN)
        } else {
            self.paint(&count.to_string(), BRIGHT_MAGENTA)
        };

        let packages = if count > 0 && self.show_packages {
            preview(result)
        } else {
            NO_PREVIEW.to_string()
        };

        let mut manager = self.paint(&result.source, CYAN);
        let millis = result.duration.as_millis();
        if millis > 0 {
            manager.push_str(&format!(" ({}ms)", millis));
        }

        [manager, count_text, packages, result.update_command.clone()]
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || text.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", code, text, RESET)
        }
    }
}

fn preview(result: &CheckResult) -> String {
    let mut names: Vec<String> = result
        .items
        .iter()
        .take(PREVIEW_LIMIT)
        .map(|item| item.name.clone())
        .collect();
    if result.items.len() > PREVIEW_LIMIT {
        names.push(format!("+{} more", result.items.len() - PREVIEW_LIMIT));
    }
    names.join(", ")
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CheckError, RunError};
    use crate::model::Item;
    use std::time::Duration;

    fn plain() -> Renderer {
        Renderer {
            color: false,
            ..Renderer::default()
        }
    }

    fn render(renderer: &Renderer, batch: &Batch) -> String {
        let mut out = Vec::new();
        renderer.render(batch, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn npm_with(names: &[&str]) -> CheckResult {
        CheckResult::new("npm", "npm update -g")
            .with_items(names.iter().map(|n| Item::new(*n, "1.0.0", "2.0.0")).collect())
    }

    #[test]
    fn test_empty_batch_prints_message() {
        let renderer = Renderer {
            empty_message: NO_UPDATES_MESSAGE.to_string(),
            ..plain()
        };
        let text = render(&renderer, &Batch::new(vec![]));
        assert_eq!(text, format!("{}\n", NO_UPDATES_MESSAGE));
    }

    #[test]
    fn test_table_has_headers_and_rows() {
        let batch = Batch::new(vec![
            npm_with(&["eslint", "typescript"]).with_duration(Duration::from_millis(812)),
            CheckResult::new("pip3", "pip3 install --upgrade -r requirements.txt"),
        ]);
        let text = render(&plain(), &batch);

        for header in ["Manager", "Outdated", "Packages", "Update Command"] {
            assert!(text.contains(header), "missing {header} in\n{text}");
        }
        assert!(text.contains("npm (812ms)"));
        assert!(text.contains("npm update -g"));
        assert!(text.contains("pip3 install --upgrade -r requirements.txt"));
        assert!(!text.contains("eslint"));
        assert!(text.contains("│ -"));
        assert!(!text.contains("up to date"));
    }

    #[test]
    fn test_rows_keep_batch_order() {
        let batch = Batch::new(vec![
            CheckResult::new("snap", "snap refresh"),
            CheckResult::new("brew", "brew upgrade"),
        ]);
        let text = render(&plain(), &batch);
        let snap = text.find("snap refresh").unwrap();
        let brew = text.find("brew upgrade").unwrap();
        assert!(snap < brew);
    }

    #[test]
    fn test_package_preview() {
        let renderer = Renderer {
            show_packages: true,
            ..plain()
        };
        let batch = Batch::new(vec![npm_with(&["a", "b", "c", "d", "e"])]);
        let text = render(&renderer, &batch);
        assert!(text.contains("a, b, c, +2 more"));
    }

    #[test]
    fn test_up_to_date_row_has_no_preview() {
        let renderer = Renderer {
            show_packages: true,
            ..plain()
        };
        let result = CheckResult::new("snap", "snap refresh");
        assert_eq!(renderer.row(&result)[2], NO_PREVIEW);

        let result = npm_with(&["eslint"]);
        assert_eq!(Renderer { show_packages: false, ..plain() }.row(&result)[2], NO_PREVIEW);
    }

    #[test]
    fn test_error_row() {
        let error = CheckError::Run {
            command: "flatpak remote-ls --updates --columns=ref,version".to_string(),
            source: RunError::Timeout {
                timeout: Duration::from_secs(60),
            },
        };
        let batch = Batch::new(vec![CheckResult::failed("flatpak", "flatpak update", error)]);
        let text = render(&plain(), &batch);

        assert!(text.contains("error"));
        assert!(text.contains("flatpak remote-ls --updates --columns=ref,version failed:..."));
        assert!(!text.contains("timed out"));
        assert!(!text.contains("up to date"));
    }

    #[test]
    fn test_all_up_to_date_footer() {
        let batch = Batch::new(vec![CheckResult::new("npm", "npm update -g")]);
        let text = render(&plain(), &batch);
        assert!(text.contains("All supported package managers look up to date."));
    }

    #[test]
    fn test_timestamp_banner_precedes_empty_message() {
        let renderer = Renderer {
            timestamp: true,
            ..plain()
        };
        let text = render(&renderer, &Batch::new(vec![]));
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(""));
        let banner = lines.next().unwrap();
        assert!(banner.starts_with('[') && banner.ends_with(']'));
        assert_eq!(lines.next(), Some(NO_MANAGERS_MESSAGE));
    }

    #[test]
    fn test_color_codes() {
        let batch = Batch::new(vec![npm_with(&["eslint"]), CheckResult::new("pip", "pip upgrade")]);
        let text = render(&Renderer::default(), &batch);
        assert!(text.contains("\x1b[36mnpm\x1b[0m"));
        assert!(text.contains("\x1b[95m1\x1b[0m"));
        assert!(text.contains("\x1b[32m0\x1b[0m"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        assert_eq!(truncate("ééééé", 4), "é...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }
}
