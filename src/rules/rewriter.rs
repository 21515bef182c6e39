use crate::rules::matcher::{CompiledRule, MatchSpan, SpanData};

/// Apply a rule's replacements to a buffer.
///
/// Spans must come from one matcher invocation against this same buffer:
/// non-overlapping and ascending. The new buffer is assembled in a single
/// linear pass over original-buffer offsets (copy-unmatched, splice
/// replacement, repeat). Already-mutated text is never re-scanned, so
/// earlier replacements cannot invalidate later offsets.
///
/// `max_applications` caps how many leading spans are replaced; the rest are
/// copied through untouched. Returns the new buffer and the number of
/// substitutions actually made.
pub fn apply_spans(buffer: &str, rule: &CompiledRule, spans: &[MatchSpan]) -> (String, usize) {
	let budget = match rule.config.max_applications {
		0 => usize::MAX,
		n => n,
	};

	let mut out = String::with_capacity(buffer.len());
	let mut cursor = 0;
	let mut applied = 0;

	for span in spans {
		if applied >= budget {
			break;
		}

		out.push_str(&buffer[cursor..span.start]);

		match &span.data {
			SpanData::Regex { groups } => {
				out.push_str(&expand_template(&rule.config.replacement, groups));
			}
			SpanData::Lines { .. } => {
				let matched = &buffer[span.start..span.end];
				let replacement = &rule.config.replacement;
				if !replacement.is_empty() {
					out.push_str(replacement);
					// Preserve the line terminator the matched lines carried;
					// a deletion (empty replacement) drops it so no blank
					// line is left behind.
					if matched.ends_with('\n') {
						out.push('\n');
					}
				}
			}
		}

		cursor = span.end;
		applied += 1;
	}

	out.push_str(&buffer[cursor..]);
	(out, applied)
}

/// Expand a regex replacement template against captured groups.
///
/// `$k` and `${k}` substitute group `k`; a group that did not participate
/// expands to the empty string, as does an out-of-range index. `$$` is a
/// literal dollar sign.
fn expand_template(template: &str, groups: &[Option<String>]) -> String {
	let mut out = String::with_capacity(template.len());
	let mut chars = template.chars().peekable();

	while let Some(c) = chars.next() {
		if c != '$' {
			out.push(c);
			continue;
		}

		match chars.peek() {
			Some('$') => {
				chars.next();
				out.push('$');
			}
			Some('{') => {
				chars.next();
				let mut digits = String::new();
				let mut closed = false;
				while let Some(&d) = chars.peek() {
					if d.is_ascii_digit() {
						digits.push(d);
						chars.next();
					} else if d == '}' {
						chars.next();
						closed = true;
						break;
					} else {
						break;
					}
				}
				if closed && !digits.is_empty() {
					push_group(&mut out, &digits, groups);
				} else {
					// Malformed reference; emit it literally
					out.push_str("${");
					out.push_str(&digits);
				}
			}
			Some(d) if d.is_ascii_digit() => {
				let mut digits = String::new();
				while let Some(&d) = chars.peek() {
					if d.is_ascii_digit() {
						digits.push(d);
						chars.next();
					} else {
						break;
					}
				}
				push_group(&mut out, &digits, groups);
			}
			_ => out.push('$'),
		}
	}

	out
}

fn push_group(out: &mut String, digits: &str, groups: &[Option<String>]) {
	if let Ok(index) = digits.parse::<usize>()
		&& let Some(Some(text)) = groups.get(index)
	{
		out.push_str(text);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::plan::types::{Extent, RuleConfig, RuleMode};

	fn regex_rule(pattern: &str, replacement: &str) -> CompiledRule {
		CompiledRule::from_config(&RuleConfig {
			id: "test".to_string(),
			pattern: Some(pattern.to_string()),
			replacement: replacement.to_string(),
			..Default::default()
		})
		.unwrap()
	}

	fn line_rule(contains: &str, replacement: &str, extent: Extent) -> CompiledRule {
		CompiledRule::from_config(&RuleConfig {
			id: "test".to_string(),
			mode: RuleMode::Line,
			contains: Some(contains.to_string()),
			replacement: replacement.to_string(),
			extent,
			..Default::default()
		})
		.unwrap()
	}

	fn run(rule: &CompiledRule, buffer: &str) -> (String, usize) {
		let spans = rule.find_spans(buffer);
		apply_spans(buffer, rule, &spans)
	}

	#[test]
	fn test_simple_substitution() {
		let rule = regex_rule(
			r"orderBy: \{ createdAt: 'desc' \}",
			"orderBy: { timestamp: 'desc' }",
		);
		let (out, count) = run(&rule, "take: 20, orderBy: { createdAt: 'desc' },");

		assert_eq!(out, "take: 20, orderBy: { timestamp: 'desc' },");
		assert_eq!(count, 1);
	}

	#[test]
	fn test_capture_group_substitution() {
		let rule = regex_rule(r"userId: (\w+\.id)", "recipientUserId: $1");
		let (out, count) = run(&rule, "userId: newUser.id,\nuserId: existingUser.id,\n");

		assert_eq!(
			out,
			"recipientUserId: newUser.id,\nrecipientUserId: existingUser.id,\n"
		);
		assert_eq!(count, 2);
	}

	#[test]
	fn test_braced_group_reference() {
		let rule = regex_rule(r"(\w+)", "${1}X");
		let (out, _) = run(&rule, "ab cd");

		assert_eq!(out, "abX cdX");
	}

	#[test]
	fn test_absent_group_expands_empty() {
		let rule = regex_rule(r"(a)|(b)", "[$1$2]");
		let (out, count) = run(&rule, "a b");

		assert_eq!(out, "[a] [b]");
		assert_eq!(count, 2);
	}

	#[test]
	fn test_literal_dollar() {
		let rule = regex_rule("price", "$$9.99");
		let (out, _) = run(&rule, "price");

		assert_eq!(out, "$9.99");
	}

	#[test]
	fn test_max_applications_caps_leading_spans() {
		let mut config = RuleConfig {
			id: "test".to_string(),
			pattern: Some("foo".to_string()),
			replacement: "bar".to_string(),
			..Default::default()
		};
		config.max_applications = 2;
		let rule = CompiledRule::from_config(&config).unwrap();
		let (out, count) = run(&rule, "foo foo foo");

		assert_eq!(out, "bar bar foo");
		assert_eq!(count, 2);
	}

	#[test]
	fn test_line_deletion_removes_newline() {
		let rule = line_rule("status: true", "", Extent::Line);
		let (out, count) = run(&rule, "id: true,\nstatus: true,\nrole: true,\n");

		assert_eq!(out, "id: true,\nrole: true,\n");
		assert_eq!(count, 1);
	}

	#[test]
	fn test_line_replacement_keeps_newline() {
		let rule = line_rule("status: 'ACTIVE'", "  isActive: true,", Extent::Line);
		let (out, count) = run(&rule, "  role,\n  status: 'ACTIVE',\n  id,\n");

		assert_eq!(out, "  role,\n  isActive: true,\n  id,\n");
		assert_eq!(count, 1);
	}

	#[test]
	fn test_block_deletion_preserves_brace_balance() {
		let rule = line_rule("_count:", "", Extent::BraceBlock);
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
		let (out, count) = run(&rule, buffer);

		assert_eq!(out, "select: {\n  role: true,\n}\n");
		assert_eq!(count, 1);

		let balance = |s: &str| {
			s.chars().filter(|c| *c == '{').count() as i64
				- s.chars().filter(|c| *c == '}').count() as i64
		};
		assert_eq!(balance(buffer), 0);
		assert_eq!(balance(&out), 0);
	}

	#[test]
	fn test_idempotent_rule_second_pass_finds_nothing() {
		let rule = regex_rule(
			r"orderBy: \{ createdAt: 'desc' \}",
			"orderBy: { timestamp: 'desc' }",
		);
		let (once, count1) = run(&rule, "orderBy: { createdAt: 'desc' }");
		assert_eq!(count1, 1);

		let (twice, count2) = run(&rule, &once);
		assert_eq!(count2, 0);
		assert_eq!(once, twice);
	}

	#[test]
	fn test_zero_spans_is_identity() {
		let rule = regex_rule("absent", "x");
		let (out, count) = run(&rule, "nothing to see");

		assert_eq!(out, "nothing to see");
		assert_eq!(count, 0);
	}

	#[test]
	fn test_malformed_braced_reference_is_literal() {
		let rule = regex_rule("x", "${oops");
		let (out, _) = run(&rule, "x");

		assert_eq!(out, "${oops");
	}
}
