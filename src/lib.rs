//! Repatch - CLI tool for batch-rewriting source files against a schema
//! migration plan.
//!
//! This library provides the core functionality for repatch, including:
//! - Migration plan (TOML) parsing and validation
//! - Rule compilation, match-span location, and single-pass rewriting
//! - Per-file patching with atomic write-back
//! - Session orchestration over the full set of target files
//!
//! # Example
//!
//! ```no_run
//! use repatch_cli::patch::{WriteMode, run_plan};
//! use repatch_cli::plan::parse_plan_file;
//! use std::path::Path;
//!
//! let plan = parse_plan_file(Path::new("repatch.toml")).unwrap();
//! let result = run_plan(&plan, WriteMode::Apply);
//! assert!(result.ok());
//! ```

pub mod error;
pub mod patch;
pub mod plan;
pub mod rules;

pub use error::{RepatchError, Result};
