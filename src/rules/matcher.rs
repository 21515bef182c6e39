use crate::error::{RepatchError, Result};
use crate::plan::types::{Extent, FileEntry, Plan, RuleConfig, RuleMode};
use crate::rules::scanner::brace_block;
use regex::Regex;
use std::path::PathBuf;

/// A compiled rule ready for matching.
///
/// Construction validates the config and compiles the pattern, so an invalid
/// rule can never reach a buffer. Immutable once built.
#[derive(Debug, Clone)]
pub struct CompiledRule {
	/// The rule as written in the plan.
	pub config: RuleConfig,

	/// Compiled pattern (regex mode only).
	pub regex: Option<Regex>,
}

/// A located match plus the data needed to compute its replacement.
///
/// `start`/`end` are byte offsets into the buffer the matcher was invoked on.
/// Spans produced by one invocation never overlap and are ordered ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
	pub start: usize,
	pub end: usize,
	pub data: SpanData,
}

/// Mode-specific match data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanData {
	/// Captured groups in order; `None` for groups that did not participate.
	Regex { groups: Vec<Option<String>> },

	/// One or more whole lines, newline included in the span.
	Lines { line_index: usize, line_count: usize },
}

impl CompiledRule {
	/// Compile a rule from its plan config.
	pub fn from_config(config: &RuleConfig) -> Result<Self> {
		config.validate()?;

		let regex = match config.mode {
			RuleMode::Regex => {
				// validate() guarantees the pattern is present
				let pattern = config.pattern.as_deref().unwrap_or_default();
				Some(compile_regex(&config.id, pattern)?)
			}
			RuleMode::Line => None,
		};

		Ok(CompiledRule {
			config: config.clone(),
			regex,
		})
	}

	/// Find all match spans for this rule in `buffer`.
	///
	/// Pure function of `(buffer, rule)`; never touches the file system.
	pub fn find_spans(&self, buffer: &str) -> Vec<MatchSpan> {
		match self.config.mode {
			RuleMode::Regex => self.find_regex_spans(buffer),
			RuleMode::Line => self.find_line_spans(buffer),
		}
	}

	/// All non-overlapping regex matches, left to right. Scanning resumes
	/// strictly after each consumed span.
	fn find_regex_spans(&self, buffer: &str) -> Vec<MatchSpan> {
		let Some(ref regex) = self.regex else {
			return Vec::new();
		};

		regex
			.captures_iter(buffer)
			.map(|caps| {
				let whole = caps.get(0).expect("group 0 always participates");
				let groups = caps
					.iter()
					.map(|m| m.map(|m| m.as_str().to_string()))
					.collect();
				MatchSpan {
					start: whole.start(),
					end: whole.end(),
					data: SpanData::Regex { groups },
				}
			})
			.collect()
	}

	/// Guard-driven line matching with optional brace-block extent.
	fn find_line_spans(&self, buffer: &str) -> Vec<MatchSpan> {
		let lines = index_lines(buffer);
		let texts: Vec<&str> = lines.iter().map(|l| l.text).collect();

		let mut spans = Vec::new();
		let mut i = 0;
		while i < lines.len() {
			if !self.guard_holds(&texts, i) {
				i += 1;
				continue;
			}

			let end_line = match self.config.extent {
				Extent::Line => i,
				Extent::BraceBlock => match brace_block(&texts, i) {
					Some(block) => block.end_line,
					// Unterminated block: refuse to guess, skip the line.
					None => {
						i += 1;
						continue;
					}
				},
			};

			spans.push(MatchSpan {
				start: lines[i].start,
				end: lines[end_line].next,
				data: SpanData::Lines {
					line_index: i,
					line_count: end_line - i + 1,
				},
			});

			// Resume strictly after the consumed span
			i = end_line + 1;
		}

		spans
	}

	/// The guard predicate: a cheap textual test over the line itself plus
	/// an optional `near` needle within the bounded lookback window.
	fn guard_holds(&self, texts: &[&str], line: usize) -> bool {
		let line_ok = if let Some(ref needle) = self.config.contains {
			texts[line].contains(needle.as_str())
		} else if let Some(ref exact) = self.config.equals {
			texts[line].trim() == exact
		} else {
			false
		};

		if !line_ok {
			return false;
		}

		if let Some(ref near) = self.config.near {
			let from = line.saturating_sub(self.config.window);
			return texts[from..=line].iter().any(|t| t.contains(near.as_str()));
		}

		true
	}
}

/// Byte-offset record for one line of a buffer.
#[derive(Debug, Clone, Copy)]
struct LineRec<'a> {
	/// Offset of the first byte of the line.
	start: usize,

	/// Offset of the first byte of the following line (past the newline).
	next: usize,

	/// The line's text, trailing newline excluded.
	text: &'a str,
}

/// Split a buffer into lines, keeping byte offsets.
fn index_lines(buffer: &str) -> Vec<LineRec<'_>> {
	let mut lines = Vec::new();
	let mut start = 0;

	while start < buffer.len() {
		let next = match buffer[start..].find('\n') {
			Some(rel) => start + rel + 1,
			None => buffer.len(),
		};
		let text_end = if buffer[start..next].ends_with('\n') {
			next - 1
		} else {
			next
		};
		lines.push(LineRec {
			start,
			next,
			text: &buffer[start..text_end],
		});
		start = next;
	}

	lines
}

/// Compile a regex pattern string.
fn compile_regex(rule_id: &str, pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| RepatchError::InvalidPattern {
		rule_id: rule_id.to_string(),
		pattern: pattern.to_string(),
		source,
	})
}

/// Ordered rules bound to one target file.
#[derive(Debug, Clone)]
pub struct RuleSet {
	/// The single concrete file these rules apply to.
	pub path: PathBuf,

	/// Rules in application order.
	pub rules: Vec<CompiledRule>,
}

impl RuleSet {
	/// Compile a rule set from a plan file entry.
	pub fn from_entry(entry: &FileEntry) -> Result<Self> {
		entry.validate()?;

		let rules = entry
			.rules
			.iter()
			.map(CompiledRule::from_config)
			.collect::<Result<Vec<_>>>()?;

		Ok(RuleSet {
			path: entry.path.clone(),
			rules,
		})
	}
}

/// Compile every file entry in a plan, preserving order.
pub fn compile_plan(plan: &Plan) -> Result<Vec<RuleSet>> {
	plan.files.iter().map(RuleSet::from_entry).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn regex_rule(id: &str, pattern: &str, replacement: &str) -> CompiledRule {
		CompiledRule::from_config(&RuleConfig {
			id: id.to_string(),
			pattern: Some(pattern.to_string()),
			replacement: replacement.to_string(),
			..Default::default()
		})
		.unwrap()
	}

	fn line_rule(id: &str, contains: &str) -> RuleConfig {
		RuleConfig {
			id: id.to_string(),
			mode: RuleMode::Line,
			contains: Some(contains.to_string()),
			..Default::default()
		}
	}

	#[test]
	fn test_compile_invalid_regex() {
		let config = RuleConfig {
			id: "bad".to_string(),
			pattern: Some("[invalid".to_string()),
			..Default::default()
		};
		let result = CompiledRule::from_config(&config);
		match result.unwrap_err() {
			RepatchError::InvalidPattern { rule_id, pattern, .. } => {
				assert_eq!(rule_id, "bad");
				assert_eq!(pattern, "[invalid");
			}
			other => panic!("Expected InvalidPattern error, got {other:?}"),
		}
	}

	#[test]
	fn test_regex_spans_ascending_non_overlapping() {
		let rule = regex_rule("r", "foo", "bar");
		let spans = rule.find_spans("foo foo foofoo");

		assert_eq!(spans.len(), 4);
		for pair in spans.windows(2) {
			assert!(pair[0].end <= pair[1].start);
		}
	}

	#[test]
	fn test_regex_spans_capture_groups() {
		let rule = regex_rule("r", r"userId: (\w+)\.id", "recipientUserId: $1.id");
		let spans = rule.find_spans("userId: newUser.id");

		assert_eq!(spans.len(), 1);
		match &spans[0].data {
			SpanData::Regex { groups } => {
				assert_eq!(groups.len(), 2);
				assert_eq!(groups[1].as_deref(), Some("newUser"));
			}
			other => panic!("Expected regex span data, got {other:?}"),
		}
	}

	#[test]
	fn test_regex_absent_group_is_none() {
		let rule = regex_rule("r", r"(a)|(b)", "$1$2");
		let spans = rule.find_spans("a");

		match &spans[0].data {
			SpanData::Regex { groups } => {
				assert_eq!(groups[1].as_deref(), Some("a"));
				assert!(groups[2].is_none());
			}
			other => panic!("Expected regex span data, got {other:?}"),
		}
	}

	#[test]
	fn test_line_span_contains_guard() {
		let rule = CompiledRule::from_config(&line_rule("r", "status: true")).unwrap();
		let buffer = "id: true,\nstatus: true,\nrole: true,\n";
		let spans = rule.find_spans(buffer);

		assert_eq!(spans.len(), 1);
		assert_eq!(&buffer[spans[0].start..spans[0].end], "status: true,\n");
		assert_eq!(
			spans[0].data,
			SpanData::Lines { line_index: 1, line_count: 1 }
		);
	}

	#[test]
	fn test_line_span_equals_guard() {
		let config = RuleConfig {
			id: "r".to_string(),
			mode: RuleMode::Line,
			equals: Some("status: true,".to_string()),
			..Default::default()
		};
		let rule = CompiledRule::from_config(&config).unwrap();
		let buffer = "  status: true,\nnested status: true, here\n";
		let spans = rule.find_spans(buffer);

		// Trimmed exact match hits line 0 only
		assert_eq!(spans.len(), 1);
		assert_eq!(
			spans[0].data,
			SpanData::Lines { line_index: 0, line_count: 1 }
		);
	}

	#[test]
	fn test_line_span_near_guard_within_window() {
		let mut config = line_rule("r", "orderBy: { createdAt:");
		config.near = Some("activityLog".to_string());
		config.window = 3;
		let rule = CompiledRule::from_config(&config).unwrap();

		let hit = "activityLog: {\n  take: 20,\n  orderBy: { createdAt: 'desc' }\n";
		assert_eq!(rule.find_spans(hit).len(), 1);

		// Same guard line, but context is out of the lookback window
		let miss = "activityLog: {\n  a\n  b\n  c\n  orderBy: { createdAt: 'desc' }\n";
		assert_eq!(rule.find_spans(miss).len(), 0);
	}

	#[test]
	fn test_line_span_brace_block_extent() {
		let mut config = line_rule("r", "_count:");
		config.extent = Extent::BraceBlock;
		let rule = CompiledRule::from_config(&config).unwrap();

		let buffer = "\
select: {
  _count: {
    select: {
      createdDocuments: true
    }
  },
  role: true,
}
";
		let spans = rule.find_spans(buffer);
		assert_eq!(spans.len(), 1);
		match &spans[0].data {
			SpanData::Lines { line_index, line_count } => {
				assert_eq!(*line_index, 1);
				assert_eq!(*line_count, 5);
			}
			other => panic!("Expected line span data, got {other:?}"),
		}
		assert!(buffer[spans[0].start..spans[0].end].ends_with("},\n"));
	}

	#[test]
	fn test_line_span_unterminated_block_skipped() {
		let mut config = line_rule("r", "_count:");
		config.extent = Extent::BraceBlock;
		let rule = CompiledRule::from_config(&config).unwrap();

		let buffer = "_count: {\n  select: {\n";
		assert_eq!(rule.find_spans(buffer).len(), 0);
	}

	#[test]
	fn test_line_span_final_line_without_newline() {
		let rule = CompiledRule::from_config(&line_rule("r", "status")).unwrap();
		let buffer = "role: true,\nstatus: true";
		let spans = rule.find_spans(buffer);

		assert_eq!(spans.len(), 1);
		assert_eq!(spans[0].end, buffer.len());
	}

	#[test]
	fn test_compile_plan_preserves_order() {
		let entry = FileEntry {
			path: PathBuf::from("a.ts"),
			rules: vec![
				RuleConfig {
					id: "first".to_string(),
					pattern: Some("a".to_string()),
					..Default::default()
				},
				RuleConfig {
					id: "second".to_string(),
					pattern: Some("b".to_string()),
					..Default::default()
				},
			],
		};
		let plan = Plan { files: vec![entry] };
		let rule_sets = compile_plan(&plan).unwrap();

		assert_eq!(rule_sets.len(), 1);
		assert_eq!(rule_sets[0].rules[0].config.id, "first");
		assert_eq!(rule_sets[0].rules[1].config.id, "second");
	}
}
