use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use repatch_cli::patch::{FileReport, WriteMode, run_plan};
use repatch_cli::plan::parse_plan_file;
use repatch_cli::rules::compile_plan;

#[derive(Parser)]
#[command(name = "repatch")]
#[command(
	author,
	version,
	about = "CLI tool for batch-rewriting source files against a schema migration plan"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Create a template repatch.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing repatch.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,

	/// Match and rewrite, but write nothing back to disk
	#[arg(long)]
	dry_run: bool,

	/// Migration plan to run
	#[arg(value_name = "PLAN")]
	plan: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
	/// Migration plan management commands
	Plan {
		#[command(subcommand)]
		action: PlanAction,
	},
}

#[derive(Subcommand)]
enum PlanAction {
	/// Display a plan with per-rule details
	Show {
		/// Plan file to display
		plan: PathBuf,
	},
	/// Check a plan file for errors without touching any target file
	Validate {
		/// Plan file to check
		plan: PathBuf,
	},
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	// Handle --init
	if cli.init {
		return handle_init(cli.force);
	}

	// Handle subcommands
	if let Some(command) = cli.command {
		return match command {
			Commands::Plan { action } => match action {
				PlanAction::Show { plan } => handle_plan_show(&plan),
				PlanAction::Validate { plan } => handle_plan_validate(&plan),
			},
		};
	}

	// Handle a plan run
	if let Some(ref plan) = cli.plan {
		let mode = if cli.dry_run {
			WriteMode::DryRun
		} else {
			WriteMode::Apply
		};
		return handle_run(plan, mode);
	}

	// No plan specified - this shouldn't happen due to arg_required_else_help
	Ok(ExitCode::SUCCESS)
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let plan_path = PathBuf::from("repatch.toml");

	if plan_path.exists() && !force {
		anyhow::bail!("repatch.toml already exists. Use --force to overwrite.");
	}

	std::fs::write(&plan_path, init_template())
		.with_context(|| format!("Failed to write {}", plan_path.display()))?;

	println!("Created repatch.toml");
	Ok(ExitCode::SUCCESS)
}

fn handle_plan_show(plan_path: &Path) -> Result<ExitCode> {
	let plan = parse_plan_file(plan_path)
		.with_context(|| format!("Failed to load plan: {}", plan_path.display()))?;

	println!("# Plan: {}", plan_path.display());
	println!("# files: {}", plan.files.len());
	println!();

	for entry in &plan.files {
		println!("{}", entry.path.display());
		for (i, rule) in entry.rules.iter().enumerate() {
			println!("  Rule {} ({}):", i + 1, rule.id);
			println!("    mode: {:?}", rule.mode);
			if let Some(ref pattern) = rule.pattern {
				println!("    pattern: {}", pattern);
			}
			if let Some(ref needle) = rule.contains {
				println!("    contains: {}", needle);
			}
			if let Some(ref exact) = rule.equals {
				println!("    equals: {}", exact);
			}
			if let Some(ref near) = rule.near {
				println!("    near: {} (window: {})", near, rule.window);
			}
			println!("    extent: {:?}", rule.extent);
			println!("    replacement: {:?}", rule.replacement);
			if rule.max_applications > 0 {
				println!("    max_applications: {}", rule.max_applications);
			}
			if let Some(expected) = rule.expect_matches {
				println!("    expect_matches: {}", expected);
			}
		}
		println!();
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_plan_validate(plan_path: &Path) -> Result<ExitCode> {
	let plan = match parse_plan_file(plan_path) {
		Ok(plan) => plan,
		Err(e) => {
			eprintln!("Plan error: {}", e);
			return Ok(ExitCode::FAILURE);
		}
	};

	// Compile every rule so bad patterns are caught here, not mid-run
	match compile_plan(&plan) {
		Ok(rule_sets) => {
			println!("Plan is valid:");
			for rule_set in &rule_sets {
				println!(
					"  {} ({} rules)",
					rule_set.path.display(),
					rule_set.rules.len()
				);
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Plan error: {}", e);
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_run(plan_path: &Path, mode: WriteMode) -> Result<ExitCode> {
	let plan = parse_plan_file(plan_path)
		.with_context(|| format!("Failed to load plan: {}", plan_path.display()))?;

	// Rule sets compile per file: a bad pattern fails that file alone
	let result = run_plan(&plan, mode);

	// Every attempted file produces exactly one line; failures are never silent
	for report in &result.reports {
		match report {
			FileReport::Patched(patch) => {
				for note in &patch.notes {
					eprintln!("warning: {}: {}", patch.path.display(), note);
				}
				if patch.unchanged {
					println!("Unchanged {}", patch.path.display());
				} else if mode == WriteMode::DryRun {
					println!(
						"Would fix {} ({} substitutions)",
						patch.path.display(),
						patch.total_applications()
					);
				} else {
					println!("Fixed {}", patch.path.display());
				}
			}
			FileReport::Failed { path, error } => {
				eprintln!("error: {}: {}", path.display(), error);
			}
		}
	}

	println!(
		"\n{} fixed, {} unchanged, {} failed",
		result.changed_count(),
		result.unchanged_count(),
		result.failure_count()
	);

	if result.ok() {
		Ok(ExitCode::SUCCESS)
	} else {
		Ok(ExitCode::FAILURE)
	}
}

fn init_template() -> &'static str {
	r#"# repatch migration plan
#
# Each [[files]] entry targets one concrete file; its rules run in order.

[[files]]
path = "backend/src/controllers/statusController.ts"

[[files.rules]]
id = "activity-log-order"
pattern = "orderBy: \\{ createdAt: 'desc' \\}"
replacement = "orderBy: { timestamp: 'desc' }"

# Line-mode rule: delete the brace-balanced _count block near a select.
#
# [[files.rules]]
# id = "drop-count-block"
# mode = "line"
# contains = "_count:"
# near = "select:"
# window = 5
# extent = "brace-block"
# replacement = ""
# expect_matches = 1
"#
}
