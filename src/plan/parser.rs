use crate::error::{RepatchError, Result};
use crate::plan::types::Plan;
use std::path::Path;

/// Parse a plan file from the given path.
pub fn parse_plan_file(path: &Path) -> Result<Plan> {
	if !path.exists() {
		return Err(RepatchError::PlanNotFound {
			path: path.to_path_buf(),
		});
	}

	let content = std::fs::read_to_string(path).map_err(|source| RepatchError::PlanReadError {
		path: path.to_path_buf(),
		source,
	})?;

	parse_plan_str(&content, path)
}

/// Parse a plan from a string (useful for testing).
pub fn parse_plan_str(content: &str, path: &Path) -> Result<Plan> {
	let plan: Plan = toml::from_str(content).map_err(|source| RepatchError::PlanParseError {
		path: path.to_path_buf(),
		source,
	})?;

	// Validate the parsed plan
	plan.validate()?;

	Ok(plan)
}
