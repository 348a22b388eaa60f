//! Core data types for outdated-package reports.
//!
//! This module contains the fundamental types used throughout upd8:
//!
//! - [`Item`] - One outdated package
//! - [`SourceKind`] - The package manager an item was reported by
//! - [`Platform`] - Operating system platform
//! - [`CheckResult`] - One source's outcome for a single scan
//! - [`Batch`] - The ordered results of one complete scan
//!
//! # Example
//!
//! ```
//! use upd8::model::{Batch, CheckResult, Item};
//!
//! let result = CheckResult::new("npm", "npm update -g")
//!     .with_items(vec![Item::new("typescript", "5.3.3", "5.4.2")]);
//! let batch = Batch::new(vec![result]);
//!
//! assert_eq!(batch.total_outdated(), 1);
//! assert!(!batch.has_errors());
//! ```

mod package;
mod report;

pub use package::*;
pub use report::*;
