//! Rule matching and rewriting for repatch.
//!
//! This module handles:
//! - Compiling plan rules and locating match spans in a text buffer
//! - Single-pass span replacement with capture-group templates
//! - Brace-depth block scanning for line-mode rules

pub mod matcher;
pub mod rewriter;
pub mod scanner;

pub use matcher::{CompiledRule, MatchSpan, RuleSet, SpanData, compile_plan};
pub use rewriter::apply_spans;
pub use scanner::{BlockSpan, brace_block};
