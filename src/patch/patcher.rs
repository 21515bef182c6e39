use crate::error::{RepatchError, Result};
use crate::rules::matcher::RuleSet;
use crate::rules::rewriter::apply_spans;
use std::io::Write;
use std::path::Path;

/// Whether a patch run writes results back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
	/// Write changed buffers back via atomic temp-write-then-rename.
	Apply,

	/// Full match/rewrite pass, but nothing touches the disk.
	DryRun,
}

/// Outcome of patching one file.
#[derive(Debug, Clone)]
pub struct PatchResult {
	/// The target file.
	pub path: std::path::PathBuf,

	/// Per-rule application counts, in rule order.
	pub rules_applied: Vec<(String, usize)>,

	/// Buffer size before rewriting.
	pub bytes_before: usize,

	/// Buffer size after rewriting.
	pub bytes_after: usize,

	/// True when the rewritten buffer is byte-identical to the original
	/// (the write-back is skipped in that case).
	pub unchanged: bool,

	/// Advisory notes: expectation mismatches and structural drift.
	/// Logged, never blocking.
	pub notes: Vec<String>,
}

impl PatchResult {
	/// Total substitutions across all rules.
	pub fn total_applications(&self) -> usize {
		self.rules_applied.iter().map(|(_, n)| n).sum()
	}
}

/// Apply a rule set to an in-memory buffer.
///
/// Pure: rules run in declared order, each against the buffer produced by
/// the previous rule. A rule producing zero matches is not an error: rules
/// are allowed to be no-ops against already-migrated input, which is what
/// makes re-runs safe. Returns the final buffer, per-rule counts, and any
/// advisory notes.
pub fn rewrite_buffer(
	rule_set: &RuleSet,
	buffer: &str,
) -> (String, Vec<(String, usize)>, Vec<String>) {
	let mut current = buffer.to_string();
	let mut counts = Vec::with_capacity(rule_set.rules.len());
	let mut notes = Vec::new();

	for rule in &rule_set.rules {
		let spans = rule.find_spans(&current);

		if let Some(expected) = rule.config.expect_matches
			&& spans.len() != expected
		{
			notes.push(format!(
				"rule '{}' matched {} span(s), expected {}",
				rule.config.id,
				spans.len(),
				expected
			));
		}

		let (next, applied) = apply_spans(&current, rule, &spans);
		counts.push((rule.config.id.clone(), applied));
		current = next;
	}

	(current, counts, notes)
}

/// Patch one file: read, rewrite in memory, advisory-validate, write back.
///
/// The file is read fresh from disk, transformed purely in memory, and
/// either fully replaces the on-disk content or is discarded. There is no
/// partial write of a half-processed buffer. Failures here are fatal for
/// this file only; the session keeps processing other files.
pub fn patch_file(rule_set: &RuleSet, mode: WriteMode) -> Result<PatchResult> {
	let original =
		std::fs::read_to_string(&rule_set.path).map_err(|source| RepatchError::ReadFailed {
			path: rule_set.path.clone(),
			source,
		})?;

	let (patched, rules_applied, mut notes) = rewrite_buffer(rule_set, &original);

	if let Some(note) = structural_drift(&original, &patched) {
		notes.push(note);
	}

	let unchanged = patched == original;
	if !unchanged && mode == WriteMode::Apply {
		atomic_write(&rule_set.path, &patched)?;
	}

	Ok(PatchResult {
		path: rule_set.path.clone(),
		rules_applied,
		bytes_before: original.len(),
		bytes_after: patched.len(),
		unchanged,
		notes,
	})
}

/// Cheap structural check: flag a change in net brace balance.
///
/// Purely advisory: the engine has no semantic model of the target
/// language, so this can only hint that a rule removed an unbalanced
/// fragment, never prove the output is valid.
fn structural_drift(before: &str, after: &str) -> Option<String> {
	let balance = |s: &str| {
		s.chars().fold(0i64, |acc, c| match c {
			'{' => acc + 1,
			'}' => acc - 1,
			_ => acc,
		})
	};

	let delta = balance(after) - balance(before);
	if delta != 0 {
		Some(format!("net brace balance changed by {delta}"))
	} else {
		None
	}
}

/// Atomic write: temp file in the same directory, then rename over the
/// original. A crash mid-write leaves the original untouched and at worst
/// an abandoned temp file.
fn atomic_write(path: &Path, content: &str) -> Result<()> {
	let dir = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};

	let write = || -> std::io::Result<()> {
		let mut temp = tempfile::NamedTempFile::new_in(dir)?;
		temp.write_all(content.as_bytes())?;
		temp.as_file().sync_all()?;
		temp.persist(path).map_err(|e| e.error)?;
		Ok(())
	};

	write().map_err(|source| RepatchError::WriteFailed {
		path: path.to_path_buf(),
		source,
	})
}
