use crate::error::RepatchError;
use crate::patch::patcher::{PatchResult, WriteMode, patch_file};
use crate::plan::types::Plan;
use crate::rules::matcher::RuleSet;
use std::path::PathBuf;

/// What happened to one target file.
#[derive(Debug)]
pub enum FileReport {
	/// The file was processed (possibly as a no-op).
	Patched(PatchResult),

	/// The file could not be processed. Fatal for this file only.
	Failed { path: PathBuf, error: RepatchError },
}

/// Aggregate outcome of a full session run, in input order.
#[derive(Debug, Default)]
pub struct SessionResult {
	pub reports: Vec<FileReport>,
}

impl SessionResult {
	/// True iff no file failed.
	pub fn ok(&self) -> bool {
		self.failure_count() == 0
	}

	pub fn failure_count(&self) -> usize {
		self.reports
			.iter()
			.filter(|r| matches!(r, FileReport::Failed { .. }))
			.count()
	}

	pub fn changed_count(&self) -> usize {
		self.reports
			.iter()
			.filter(|r| matches!(r, FileReport::Patched(p) if !p.unchanged))
			.count()
	}

	pub fn unchanged_count(&self) -> usize {
		self.reports
			.iter()
			.filter(|r| matches!(r, FileReport::Patched(p) if p.unchanged))
			.count()
	}
}

/// Drive the patcher over every rule set, in order.
///
/// Each file is processed independently: one file's failure is recorded and
/// the remaining files still run. The caller decides overall pass/fail from
/// `SessionResult::ok()`.
pub fn run_session(rule_sets: &[RuleSet], mode: WriteMode) -> SessionResult {
	let mut result = SessionResult::default();

	for rule_set in rule_sets {
		match patch_file(rule_set, mode) {
			Ok(patch) => result.reports.push(FileReport::Patched(patch)),
			Err(error) => result.reports.push(FileReport::Failed {
				path: rule_set.path.clone(),
				error,
			}),
		}
	}

	result
}

/// Compile and run every file entry of a plan, in order.
///
/// Compilation happens per entry: a bad pattern or inconsistent rule config
/// is fatal to that rule set only. The entry is recorded as a failure for
/// its path and the remaining files still compile and run.
pub fn run_plan(plan: &Plan, mode: WriteMode) -> SessionResult {
	let mut result = SessionResult::default();

	for entry in &plan.files {
		match RuleSet::from_entry(entry) {
			Ok(rule_set) => match patch_file(&rule_set, mode) {
				Ok(patch) => result.reports.push(FileReport::Patched(patch)),
				Err(error) => result.reports.push(FileReport::Failed {
					path: rule_set.path.clone(),
					error,
				}),
			},
			Err(error) => result.reports.push(FileReport::Failed {
				path: entry.path.clone(),
				error,
			}),
		}
	}

	result
}
