use std::fs;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use metarule_core::parse::{parse_rule_set, parse_sentence};
use metarule_core::{Context, Token};
use metarule_provers::{backward, Budget, Weight};
use metarule_rules::IndexedRuleSet;

/// Prove a goal sentence against a weighted rule set by goal-directed
/// backward search.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// File of premises/---/conclusion rules, blank-line separated.
	#[arg(short, long)]
	rules: PathBuf,

	/// File of concrete assumption sentences, one per line.
	#[arg(short, long)]
	assumptions: Option<PathBuf>,

	/// The sentence to prove, in the same text syntax as the rule files.
	goal: String,

	/// Total weight the search may spend across one proof path.
	#[arg(long, default_value_t = 1.0)]
	budget: f64,

	/// Weight charged for using any one rule (uniform for every loaded
	/// rule, since the rule file carries no per-rule weight column).
	#[arg(long = "rule-weight", default_value_t = 0.1)]
	rule_weight: f64,

	/// Rewrite steps unify may take per variable-growth chain.
	#[arg(long = "unify-depth", default_value_t = 10)]
	unify_depth: u32,

	/// Recursion depth cap, independent of the weight budget.
	#[arg(long = "max-depth", default_value_t = 32)]
	max_depth: u32,

	/// Allow self-satisfying a concrete goal with a zero-premise proposal.
	#[arg(long = "on-the-fly")]
	on_the_fly: bool,

	/// Vocabulary checkpoint to load before parsing any input.
	#[arg(long = "load-checkpoint")]
	load_checkpoint: Option<PathBuf>,

	/// Vocabulary checkpoint to write after the run.
	#[arg(long = "save-checkpoint")]
	save_checkpoint: Option<PathBuf>,

	#[arg(short, long = "verbose", action = clap::ArgAction::Count)]
	verbosity: u8,
}

fn main() -> ExitCode {
	let args = Args::parse();

	stderrlog::new()
		.verbosity(args.verbosity as usize)
		.init()
		.expect("unable to initialize logger");

	let mut ctx = Context::new();

	if let Some(path) = &args.load_checkpoint {
		let file = match fs::File::open(path) {
			Ok(f) => f,
			Err(e) => {
				eprintln!("error: unable to open checkpoint {}: {e}", path.display());
				return ExitCode::FAILURE;
			}
		};
		let mut reader = std::io::BufReader::new(file);
		if let Err(e) = metarule_store::load(&mut ctx, &mut reader) {
			eprintln!("error: unable to load checkpoint: {e}");
			return ExitCode::FAILURE;
		}
	}

	let rules_text = match fs::read_to_string(&args.rules) {
		Ok(t) => t,
		Err(e) => {
			eprintln!("error: unable to read {}: {e}", args.rules.display());
			return ExitCode::FAILURE;
		}
	};
	let parsed_rules = match parse_rule_set(&mut ctx, &rules_text) {
		Ok(r) => r,
		Err(e) => {
			eprintln!("error: malformed rule file: {e}");
			return ExitCode::FAILURE;
		}
	};
	// Normalize and close the loaded rules under anti-unification before
	// handing them to the prover, so the search also sees whatever shared
	// generalizations the rule file's own rules imply.
	let join_id = ctx.specials.intern("__RULE_JOIN__").expect("reserved delimiter name is valid");
	let delimiter = Token::special(join_id);
	let mut rule_set = IndexedRuleSet::new(delimiter);
	for rule in parsed_rules {
		let normalized = rule.normalize(&mut ctx.fresh);
		if normalized.isvalid() {
			rule_set.insert(normalized, &mut ctx.fresh);
		} else {
			eprintln!("warning: skipping invalid rule from {}", args.rules.display());
		}
	}

	let weight = Weight::new(args.rule_weight);
	let rules: Vec<(metarule_core::Rule, Weight)> =
		rule_set.rules().map(|(_, rule)| (rule.clone(), weight)).collect();

	let mut assumptions = Vec::new();
	if let Some(path) = &args.assumptions {
		let text = match fs::read_to_string(path) {
			Ok(t) => t,
			Err(e) => {
				eprintln!("error: unable to read {}: {e}", path.display());
				return ExitCode::FAILURE;
			}
		};
		for line in text.lines() {
			if line.trim().is_empty() {
				continue;
			}
			match parse_sentence(&mut ctx, line) {
				Ok(s) => assumptions.push(s),
				Err(e) => {
					eprintln!("error: malformed assumption `{line}`: {e}");
					return ExitCode::FAILURE;
				}
			}
		}
	}

	let goal = match parse_sentence(&mut ctx, &args.goal) {
		Ok(g) => g,
		Err(e) => {
			eprintln!("error: malformed goal: {e}");
			return ExitCode::FAILURE;
		}
	};

	let params = backward::Params {
		rules: &rules,
		assumptions: &assumptions,
		on_the_fly_proposal: args.on_the_fly,
		unify_depth_limit: args.unify_depth,
		max_depth: args.max_depth,
	};
	let mut results: Vec<_> = backward::prove(&goal, Budget::new(args.budget), &params, &mut ctx.fresh)
		.into_iter()
		.collect();
	results.sort_by_key(|(_, entry)| entry.depth());

	if results.is_empty() {
		println!("no proof found within the given budget");
	}
	for (sigma, entry) in &results {
		let rendered = metarule_core::parse::DisplaySentence { sentence: &sigma.apply(&goal), ctx: &ctx };
		println!("{rendered}  (depth {}, {} proof path(s))", entry.depth(), entry.paths.len());
	}

	if let Some(path) = &args.save_checkpoint {
		let file = match fs::File::create(path) {
			Ok(f) => f,
			Err(e) => {
				eprintln!("error: unable to create {}: {e}", path.display());
				return ExitCode::FAILURE;
			}
		};
		let mut writer = BufWriter::new(file);
		if let Err(e) = metarule_store::save(&ctx, &mut writer) {
			eprintln!("error: unable to save checkpoint: {e}");
			return ExitCode::FAILURE;
		}
	}

	ExitCode::SUCCESS
}
