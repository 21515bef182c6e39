//! Migration plan loading and parsing for repatch.
//!
//! This module handles:
//! - TOML plan file parsing
//! - Construction-time rule validation

pub mod parser;
pub mod types;

pub use parser::{parse_plan_file, parse_plan_str};
pub use types::{Extent, FileEntry, Plan, RuleConfig, RuleMode};
