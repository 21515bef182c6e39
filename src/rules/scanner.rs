/// A brace-balanced block located by line index (both ends inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
	/// Line opening the block.
	pub start_line: usize,

	/// Line on which the block's depth returns to zero.
	pub end_line: usize,
}

/// Locate the `{}` block opened on `start_line`.
///
/// Walks lines from `start_line`, counting every `{` and `}` character.
/// Returns the span ending on the line where depth first returns to zero.
///
/// - If `start_line` opens no block, the span is the single start line.
/// - If the block never closes before the end of input, returns `None`;
///   the caller must not guess at an unterminated block.
pub fn brace_block(lines: &[&str], start_line: usize) -> Option<BlockSpan> {
	if start_line >= lines.len() {
		return None;
	}

	if !lines[start_line].contains('{') {
		return Some(BlockSpan {
			start_line,
			end_line: start_line,
		});
	}

	let mut depth: i64 = 0;
	for (offset, line) in lines[start_line..].iter().enumerate() {
		for ch in line.chars() {
			match ch {
				'{' => depth += 1,
				'}' => depth -= 1,
				_ => {}
			}
		}

		if depth <= 0 {
			return Some(BlockSpan {
				start_line,
				end_line: start_line + offset,
			});
		}
	}

	None
}
