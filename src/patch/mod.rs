//! File patching and session orchestration for repatch.
//!
//! This module handles:
//! - Per-file read → rewrite → advisory validate → atomic write-back
//! - Driving the patcher over the full set of target files

pub mod patcher;
pub mod session;

pub use patcher::{PatchResult, WriteMode, patch_file, rewrite_buffer};
pub use session::{FileReport, SessionResult, run_plan, run_session};
