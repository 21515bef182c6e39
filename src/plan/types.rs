use serde::Deserialize;
use std::path::PathBuf;

/// Top-level migration plan from a `repatch.toml` file.
///
/// A plan is static configuration: it lists each target file together with
/// the ordered rules to run against it. Nothing in a plan is derived from
/// the target files' contents at runtime.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Plan {
	/// Target files, processed in declaration order.
	#[serde(default)]
	pub files: Vec<FileEntry>,
}

/// One target file and its ordered rules.
///
/// Ordering is significant: later rules may assume earlier ones already ran.
#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
	/// Path to a single concrete file. Never a glob.
	pub path: PathBuf,

	/// Rules applied in order. Must be non-empty.
	#[serde(default)]
	pub rules: Vec<RuleConfig>,
}

/// How a rule locates its matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleMode {
	/// Scan the whole buffer with a regex; replacement expands capture groups.
	#[default]
	Regex,

	/// Match whole lines by textual guard; replacement substitutes or
	/// deletes the matched line (or brace-balanced block).
	Line,
}

/// How far a matched line extends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Extent {
	/// Just the guard line itself.
	#[default]
	Line,

	/// From the guard line through the close of the `{}` block it opens.
	BraceBlock,
}

/// One declarative transformation as written in the plan file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuleConfig {
	/// Stable identifier, used in reports and per-rule application counts.
	pub id: String,

	/// Matching mode. Defaults to regex.
	#[serde(default)]
	pub mode: RuleMode,

	/// Regex pattern (regex mode only).
	pub pattern: Option<String>,

	/// Replacement text. For regex mode, `$1`/`${10}` expand capture groups
	/// and `$$` is a literal dollar. For line mode, the empty string deletes
	/// the matched lines outright.
	#[serde(default)]
	pub replacement: String,

	/// Cap on how many matches are replaced, in buffer order. 0 = unbounded.
	#[serde(default)]
	pub max_applications: usize,

	/// Line-mode guard: the line must contain this needle
	/// (mutually exclusive with `equals`).
	pub contains: Option<String>,

	/// Line-mode guard: the trimmed line must equal this text
	/// (mutually exclusive with `contains`).
	pub equals: Option<String>,

	/// Line-mode context guard: some line within the lookback window must
	/// contain this needle for the guard to hold.
	pub near: Option<String>,

	/// Lookback window (in lines) for the `near` guard.
	#[serde(default = "default_window")]
	pub window: usize,

	/// How far a line-mode match extends.
	#[serde(default)]
	pub extent: Extent,

	/// Advisory expected match count. A mismatch is logged, never fatal.
	pub expect_matches: Option<usize>,
}

fn default_window() -> usize {
	10
}

impl Default for RuleConfig {
	fn default() -> Self {
		RuleConfig {
			id: String::new(),
			mode: RuleMode::default(),
			pattern: None,
			replacement: String::new(),
			max_applications: 0,
			contains: None,
			equals: None,
			near: None,
			window: default_window(),
			extent: Extent::default(),
			expect_matches: None,
		}
	}
}

impl RuleConfig {
	/// Validate mode/field consistency at construction time.
	pub fn validate(&self) -> Result<(), crate::error::RepatchError> {
		use crate::error::RepatchError;

		match self.mode {
			RuleMode::Regex => {
				if self.pattern.is_none() {
					return Err(RepatchError::InvalidRule {
						rule_id: self.id.clone(),
						reason: "regex mode requires a pattern".to_string(),
					});
				}
				if self.contains.is_some() || self.equals.is_some() || self.near.is_some() {
					return Err(RepatchError::InvalidRule {
						rule_id: self.id.clone(),
						reason: "line guards (contains/equals/near) are not valid in regex mode"
							.to_string(),
					});
				}
				if self.extent == Extent::BraceBlock {
					return Err(RepatchError::InvalidRule {
						rule_id: self.id.clone(),
						reason: "brace-block extent is only valid in line mode".to_string(),
					});
				}
			}
			RuleMode::Line => {
				if self.pattern.is_some() {
					return Err(RepatchError::InvalidRule {
						rule_id: self.id.clone(),
						reason: "pattern is not valid in line mode".to_string(),
					});
				}
				match (&self.contains, &self.equals) {
					(None, None) => {
						return Err(RepatchError::InvalidRule {
							rule_id: self.id.clone(),
							reason: "line mode requires a contains or equals guard".to_string(),
						});
					}
					(Some(_), Some(_)) => {
						return Err(RepatchError::InvalidRule {
							rule_id: self.id.clone(),
							reason: "contains and equals are mutually exclusive".to_string(),
						});
					}
					_ => {}
				}
			}
		}

		Ok(())
	}
}

impl FileEntry {
	/// Validate this entry and all its rules.
	pub fn validate(&self) -> Result<(), crate::error::RepatchError> {
		use crate::error::RepatchError;

		if self.rules.is_empty() {
			return Err(RepatchError::EmptyRuleSet {
				path: self.path.clone(),
			});
		}

		let path_str = self.path.to_string_lossy();
		if path_str.contains('*') || path_str.contains('?') || path_str.contains('[') {
			return Err(RepatchError::GlobTargetPath {
				path: self.path.clone(),
			});
		}

		for rule in &self.rules {
			rule.validate()?;
		}

		Ok(())
	}
}

impl Plan {
	/// Validate all file entries in this plan.
	pub fn validate(&self) -> Result<(), crate::error::RepatchError> {
		for entry in &self.files {
			entry.validate()?;
		}
		Ok(())
	}
}
