pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod platform;
pub mod runner;
pub mod scanner;
pub mod source;

pub use config::Config;
pub use error::{CheckError, ConfigError, RunError};
pub use model::{Batch, CheckResult, Item, SourceKind};
pub use scanner::Scanner;
pub use source::Source;
