use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use upd8::{
    config::{Config, IgnoreConfig},
    error::ConfigError,
    model::{Batch, SourceKind},
    output::{print_batch, OutputFormat, Renderer, NO_MANAGERS_MESSAGE, NO_UPDATES_MESSAGE},
    runner::{CommandRunner, ExecRunner},
    source::{get_source, sources_for},
    Scanner,
};

/// Exit codes for scripting
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const USAGE: u8 = 2;
}

#[derive(Parser)]
#[command(name = "upd8")]
#[command(
    author,
    version,
    about = "Report outdated packages across every installed package manager"
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan once and print a summary (default)
    Scan {
        #[command(flatten)]
        report: ReportArgs,
    },

    /// Rescan on a fixed interval until interrupted
    Watch {
        /// Scan interval (e.g. 90s, 30m, 6h, 1d)
        #[arg(short, long, value_parser = parse_interval)]
        interval: Option<Duration>,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// List supported sources and whether they are installed
    ListSources,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Args, Default)]
struct ReportArgs {
    /// Show a short list of outdated packages per manager
    #[arg(long)]
    packages: bool,

    /// Disable ANSI colors in the output
    #[arg(long)]
    no_color: bool,

    /// Include managers even when no updates are found
    #[arg(long)]
    verbose: bool,

    /// Output format (table, json)
    #[arg(short, long)]
    format: Option<String>,

    /// Only check these sources (comma separated)
    #[arg(short, long, value_enum, value_delimiter = ',')]
    source: Vec<SourceKind>,

    /// Per-command timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

/// Config file values with command-line overrides applied.
struct ReportOptions {
    format: OutputFormat,
    renderer: Renderer,
    verbose: bool,
    sources: Vec<SourceKind>,
    timeout: Duration,
    ignore: IgnoreConfig,
}

impl ReportOptions {
    fn resolve(config: &Config, args: ReportArgs) -> Result<Self> {
        let format = args
            .format
            .unwrap_or_else(|| config.default_format.clone())
            .parse::<OutputFormat>()
            .map_err(|e| anyhow::anyhow!(e))?;
        let verbose = args.verbose || config.verbose;

        let renderer = Renderer {
            color: config.color && !args.no_color,
            show_packages: args.packages || config.show_packages,
            timestamp: false,
            empty_message: if verbose {
                NO_MANAGERS_MESSAGE.to_string()
            } else {
                NO_UPDATES_MESSAGE.to_string()
            },
        };

        let sources = if args.source.is_empty() {
            config.sources.clone()
        } else {
            args.source
        };

        Ok(Self {
            format,
            renderer,
            verbose,
            sources,
            timeout: args
                .timeout
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.command_timeout()),
            ignore: config.ignore.clone(),
        })
    }

    fn scanner(&self) -> Scanner {
        let runner: Arc<dyn CommandRunner> = Arc::new(ExecRunner::new(self.timeout));
        Scanner::new(sources_for(&self.sources, runner))
    }

    /// Consumer-side filtering: ignore list, then hide quiet sources unless verbose.
    fn prepare(&self, batch: Batch) -> Batch {
        let batch = batch.without_ignored(&self.ignore);
        if self.verbose {
            batch
        } else {
            batch.only_notable()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, path = %Config::config_path().display(), "using default configuration");
        Config::default()
    });

    match cli.command.unwrap_or(Commands::Scan {
        report: ReportArgs::default(),
    }) {
        Commands::Scan { report } => run_scan(&config, report).await,
        Commands::Watch { interval, report } => run_watch(&config, interval, report).await,
        Commands::ListSources => {
            list_sources();
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("upd8=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Returns a token cancelled on Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, exiting...");
            token.cancel();
        }
    });
    cancel
}

async fn run_scan(config: &Config, args: ReportArgs) -> Result<u8> {
    let options = ReportOptions::resolve(config, args)?;
    let scanner = options.scanner();
    let cancel = cancel_on_interrupt();

    let progress = if options.format == OutputFormat::Table {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Checking package managers...");
        Some(pb)
    } else {
        None
    };

    let batch = scanner.scan(&cancel).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let batch = options.prepare(batch);
    print_batch(&batch, options.format, &options.renderer, false)?;

    if batch.has_errors() {
        Ok(exit_codes::ERROR)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

async fn run_watch(config: &Config, interval: Option<Duration>, args: ReportArgs) -> Result<u8> {
    let interval = match interval.map(Ok).unwrap_or_else(|| config.interval()) {
        Ok(interval) => interval,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(exit_codes::USAGE);
        }
    };

    let mut options = ReportOptions::resolve(config, args)?;
    options.renderer.timestamp = true;
    let scanner = options.scanner();
    let cancel = cancel_on_interrupt();

    let banner = format!(
        "Watching for updates every {}. Press Ctrl+C to stop.",
        format_interval(interval)
    );
    if options.format == OutputFormat::Table {
        println!("{}", banner);
    } else {
        eprintln!("{}", banner);
    }

    let result = scanner
        .watch(interval, &cancel, |batch| {
            let batch = options.prepare(batch);
            if let Err(e) = print_batch(&batch, options.format, &options.renderer, true) {
                warn!(error = %e, "failed to print batch");
            }
        })
        .await;

    match result {
        Ok(()) => Ok(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(exit_codes::USAGE)
        }
    }
}

fn list_sources() {
    println!("Available sources:");
    println!();

    let runner: Arc<dyn CommandRunner> = Arc::new(ExecRunner::default());
    for kind in SourceKind::all() {
        let source = get_source(kind, runner.clone());
        let detected = if source.detect() { "yes" } else { "no" };

        println!("  {:<8} {:<46} [detected: {}]", kind, kind.description(), detected);
        println!("  {:<8} Update: {}", "", source.update_command());
        println!();
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'upd8 config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}

/// Longest accepted `--interval`.
const MAX_INTERVAL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Parses an interval such as `500ms`, `90s`, `30m`, `6h` or `1d`. A bare
/// number is seconds. Zero and anything over a year are rejected.
fn parse_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let invalid = || ConfigError::InvalidDuration(s.to_string()).to_string();

    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (num_str, unit) = s.split_at(split);
    let num: u64 = num_str.parse().map_err(|_| invalid())?;

    let duration = match unit {
        "ms" => Some(Duration::from_millis(num)),
        "" | "s" => Some(Duration::from_secs(num)),
        "m" => num.checked_mul(60).map(Duration::from_secs),
        "h" => num.checked_mul(60 * 60).map(Duration::from_secs),
        "d" => num.checked_mul(24 * 60 * 60).map(Duration::from_secs),
        _ => None,
    }
    .filter(|d| *d <= MAX_INTERVAL)
    .ok_or_else(invalid)?;

    if duration.is_zero() {
        return Err(ConfigError::NonPositiveInterval.to_string());
    }
    Ok(duration)
}

/// Formats an interval compactly, e.g. `24h`, `1h30m`, `45s`, `500ms`.
fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs == 0 {
        return format!("{}ms", interval.as_millis());
    }

    let (hours, minutes, seconds) = (secs / 3600, secs % 3600 / 60, secs % 60);
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 || out.is_empty() {
        out.push_str(&format!("{}s", seconds));
    }
    out
}
