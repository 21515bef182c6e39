use std::path::PathBuf;

/// Library-level structured errors for repatch.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum RepatchError {
	#[error("Plan file not found: {path}")]
	PlanNotFound { path: PathBuf },

	#[error("Failed to read plan file: {path}")]
	PlanReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse plan file: {path}")]
	PlanParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid regex pattern in rule '{rule_id}': {pattern}")]
	InvalidPattern {
		rule_id: String,
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Invalid rule '{rule_id}': {reason}")]
	InvalidRule { rule_id: String, reason: String },

	#[error("Rule set for {path} has no rules")]
	EmptyRuleSet { path: PathBuf },

	#[error("Target path must be a concrete file, not a glob: {path}")]
	GlobTargetPath { path: PathBuf },

	#[error("Failed to read target file: {path}")]
	ReadFailed {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write target file: {path}")]
	WriteFailed {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Result type alias using RepatchError.
pub type Result<T> = std::result::Result<T, RepatchError>;
