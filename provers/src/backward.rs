//! Goal-directed, weight-budgeted backward prover (Russell-Norvig OR/AND
//! search over rules and assumptions).

use indexmap::IndexMap;
use log::debug;
use metarule_core::vocab::FreshVariables;
use metarule_core::{AlphaConversion, Rule, Sentence, Substitution};
use metarule_match::{find_substitutions, unify};

use crate::weight::{Budget, Weight};

/// A proof path: the set of concrete rules a particular derivation used.
/// Kept as a sorted, deduplicated `Vec` (rules have no total order of their
/// own; `invariant_hash` gives a stable sort key) rather than a hash set, so
/// two paths with the same rules in different discovery order compare
/// equal.
pub type ProofPath = Vec<Rule>;

fn canonical_path(mut rules: ProofPath) -> ProofPath {
	rules.sort_by_key(Rule::invariant_hash);
	rules.dedup();
	rules
}

/// The accumulated evidence for one answer substitution: every distinct
/// proof path found for it, and the shallowest (spec: "minimum depth across
/// combined paths").
#[derive(Debug, Clone, Default)]
pub struct ProofEntry {
	pub paths: Vec<ProofPath>,
}

impl ProofEntry {
	pub fn depth(&self) -> usize {
		self.paths.iter().map(Vec::len).min().unwrap_or(0)
	}
}

/// Knobs threaded through every recursive call of [`prove`].
pub struct Params<'a> {
	pub rules: &'a [(Rule, Weight)],
	pub assumptions: &'a [Sentence],
	pub on_the_fly_proposal: bool,
	pub unify_depth_limit: u32,
	/// Hard cap on OR/AND recursion depth, independent of the weight
	/// budget: a zero-weight rule that matches its own conclusion would
	/// otherwise recurse forever.
	pub max_depth: u32,
}

/// Prove `goal` under `weight_limit`, returning every substitution that
/// closes it, each with the proof paths that derive it and their shallowest
/// depth. Results are restricted to `goal`'s own variables.
pub fn prove(
	goal: &Sentence,
	weight_limit: Budget,
	params: &Params,
	fresh: &mut FreshVariables,
) -> IndexMap<Substitution, ProofEntry> {
	or_prove(goal, weight_limit, params, params.max_depth, fresh)
}

fn insert_path(out: &mut IndexMap<Substitution, ProofEntry>, key: Substitution, path: ProofPath) {
	let entry = out.entry(key).or_default();
	let canon = canonical_path(path);
	if !entry.paths.contains(&canon) {
		entry.paths.push(canon);
	}
}

fn or_prove(
	goal: &Sentence,
	budget: Budget,
	params: &Params,
	depth_remaining: u32,
	fresh: &mut FreshVariables,
) -> IndexMap<Substitution, ProofEntry> {
	let mut out = IndexMap::new();

	if params.on_the_fly_proposal && goal.is_concrete() {
		let proposed = Rule::new(Vec::new(), goal.clone());
		insert_path(&mut out, Substitution::new(), vec![proposed]);
	}

	let mut matched_assumption = false;
	for assumption in params.assumptions {
		for sigma in find_substitutions(goal, assumption) {
			let restricted = sigma.restrict_to(&goal.variables());
			insert_path(&mut out, restricted, Vec::new());
			matched_assumption = true;
		}
	}
	if matched_assumption {
		return out;
	}

	if depth_remaining == 0 {
		return out;
	}

	for (rule, weight) in params.rules {
		if !budget.affords(*weight) {
			continue;
		}
		let mut alpha = AlphaConversion::new();
		let renamed_goal = alpha.rename(goal, fresh);
		let reduced_budget = budget.spend(*weight);

		for sigma_unify in unify(rule.conclusion(), &renamed_goal, params.unify_depth_limit, fresh) {
			let remaining_goals: Vec<Sentence> = rule.premises().iter().map(|p| sigma_unify.apply(p)).collect();
			let and_results = and_prove(&remaining_goals, reduced_budget, params, depth_remaining - 1, fresh);

			for (sub_sigma, entry) in and_results {
				let full = sigma_unify.compose(&sub_sigma);
				let restricted = restrict_through_alpha(&full, &alpha);

				let conclusion_concrete = full.apply(rule.conclusion());
				let premises_concrete: Vec<Sentence> = rule.premises().iter().map(|p| full.apply(p)).collect();
				let concrete_rule = Rule::new(premises_concrete, conclusion_concrete);
				debug!("applying rule {concrete_rule:?} at remaining budget {:?}", reduced_budget);

				for path in &entry.paths {
					let mut new_path = path.clone();
					new_path.push(concrete_rule.clone());
					insert_path(&mut out, restricted.clone(), new_path);
				}
			}
		}
	}

	out
}

/// Translate a substitution expressed over a goal's alpha-renamed (fresh)
/// variables back to its original variables, which is exactly "restrict to
/// the original goal's variables" once the renaming is undone.
fn restrict_through_alpha(sigma: &Substitution, alpha: &AlphaConversion) -> Substitution {
	let mut restricted = Substitution::new();
	for (original, renamed) in alpha.entries() {
		if let Some(value) = sigma.get(renamed) {
			let value = sigma.apply(value);
			if let Ok(next) = restricted.bind(original, value) {
				restricted = next;
			}
		}
	}
	restricted
}

/// Solve a conjunction of goals left to right, applying each goal's
/// substitution to the remaining goals before recursing, and combining
/// proof paths by Cartesian product.
fn and_prove(
	goals: &[Sentence],
	budget: Budget,
	params: &Params,
	depth_remaining: u32,
	fresh: &mut FreshVariables,
) -> IndexMap<Substitution, ProofEntry> {
	let Some((first, rest)) = goals.split_first() else {
		let mut base = IndexMap::new();
		insert_path(&mut base, Substitution::new(), Vec::new());
		return base;
	};

	let mut out = IndexMap::new();
	let first_results = or_prove(first, budget, params, depth_remaining, fresh);
	for (sigma1, entry1) in first_results {
		let rest_applied: Vec<Sentence> = rest.iter().map(|g| sigma1.apply(g)).collect();
		let rest_results = and_prove(&rest_applied, budget, params, depth_remaining, fresh);
		for (sigma2, entry2) in rest_results {
			let combined = sigma1.compose(&sigma2);
			for path1 in &entry1.paths {
				for path2 in &entry2.paths {
					let mut joined = path1.clone();
					joined.extend(path2.iter().cloned());
					insert_path(&mut out, combined.clone(), joined);
				}
			}
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use metarule_core::parse::{parse_rule, parse_sentence};
	use metarule_core::Context;

	fn s(ctx: &mut Context, text: &str) -> Sentence {
		parse_sentence(ctx, text).unwrap()
	}

	fn r(ctx: &mut Context, text: &str) -> Rule {
		parse_rule(ctx, text).unwrap()
	}

	#[test]
	fn assumption_match_short_circuits_with_an_empty_proof_path() {
		let mut ctx = Context::new();
		let goal = s(&mut ctx, "harry be nice");
		let assumptions = vec![goal.clone()];
		let params = Params {
			rules: &[],
			assumptions: &assumptions,
			on_the_fly_proposal: false,
			unify_depth_limit: 10,
			max_depth: 10,
		};
		let result = prove(&goal, Budget::new(1.0), &params, &mut ctx.fresh);
		assert_eq!(result.len(), 1);
		let (sigma, entry) = result.get_index(0).unwrap();
		assert!(sigma.is_empty());
		assert_eq!(entry.paths, vec![Vec::new()]);
	}

	#[test]
	fn a_single_rule_is_used_to_close_an_otherwise_unprovable_goal() {
		let mut ctx = Context::new();
		let rule = r(&mut ctx, "harry is rough\nrough people be nice\n---\nharry be nice");
		let assumption1 = s(&mut ctx, "harry is rough");
		let assumption2 = s(&mut ctx, "rough people be nice");
		let goal = s(&mut ctx, "harry be nice");
		let assumptions = vec![assumption1, assumption2];
		let rules = vec![(rule.clone(), Weight::new(0.1))];
		let params = Params {
			rules: &rules,
			assumptions: &assumptions,
			on_the_fly_proposal: false,
			unify_depth_limit: 10,
			max_depth: 10,
		};
		let result = prove(&goal, Budget::new(1.0), &params, &mut ctx.fresh);
		let (sigma, entry) = result.get_index(0).unwrap();
		assert!(sigma.is_empty());
		assert_eq!(entry.paths.len(), 1);
		assert_eq!(entry.paths[0], vec![rule]);
	}

	#[test]
	fn insufficient_budget_leaves_the_goal_unproved() {
		let mut ctx = Context::new();
		let rule = r(&mut ctx, "harry is rough\nrough people be nice\n---\nharry be nice");
		let assumption1 = s(&mut ctx, "harry is rough");
		let assumption2 = s(&mut ctx, "rough people be nice");
		let goal = s(&mut ctx, "harry be nice");
		let assumptions = vec![assumption1, assumption2];
		let rules = vec![(rule, Weight::new(0.9))];
		let params = Params {
			rules: &rules,
			assumptions: &assumptions,
			on_the_fly_proposal: false,
			unify_depth_limit: 10,
			max_depth: 10,
		};
		let result = prove(&goal, Budget::new(0.5), &params, &mut ctx.fresh);
		assert!(result.is_empty());
	}

	#[test]
	fn on_the_fly_proposal_self_satisfies_a_concrete_goal() {
		let mut ctx = Context::new();
		let goal = s(&mut ctx, "nothing known about this");
		let params = Params {
			rules: &[],
			assumptions: &[],
			on_the_fly_proposal: true,
			unify_depth_limit: 10,
			max_depth: 10,
		};
		let result = prove(&goal, Budget::new(1.0), &params, &mut ctx.fresh);
		assert_eq!(result.len(), 1);
		let (_, entry) = result.get_index(0).unwrap();
		assert_eq!(entry.paths[0][0].conclusion(), &goal);
		assert!(entry.paths[0][0].premises().is_empty());
	}
}
