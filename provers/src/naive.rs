//! Naive forward prover: a reference saturation loop used to check the
//! Rete network's results against, not to scale.

use indexmap::IndexMap;
use metarule_core::{Rule, Sentence, Substitution};
use metarule_match::find_substitutions;

use crate::weight::Weight;

/// Every substitution that simultaneously matches each of `premises` against
/// some fact already in `facts`, combined left to right.
fn simultaneous_matches(premises: &[Sentence], facts: &IndexMap<Sentence, Weight>) -> Vec<Substitution> {
	let Some((first, rest)) = premises.split_first() else {
		return vec![Substitution::new()];
	};
	let mut out = Vec::new();
	for fact in facts.keys() {
		for sigma in find_substitutions(first, fact) {
			let rest_applied: Vec<Sentence> = rest.iter().map(|p| sigma.apply(p)).collect();
			for tail in simultaneous_matches(&rest_applied, facts) {
				out.push(sigma.compose(&tail));
			}
		}
	}
	out
}

/// Saturate `facts` (already containing the assumptions, all at weight 1)
/// under `rules`, one pass at a time, until a pass derives nothing new or
/// no pass improves a weight already on record. Returns the final fact
/// weights, insertion-ordered by first derivation.
pub fn saturate(facts: &mut IndexMap<Sentence, Weight>, rules: &[(Rule, Weight)]) {
	loop {
		let mut progressed = false;
		for (rule, rule_weight) in rules {
			for sigma in simultaneous_matches(rule.premises(), facts) {
				let conclusion = sigma.apply(rule.conclusion());
				if !conclusion.is_concrete() {
					continue;
				}
				let join_weight = rule
					.premises()
					.iter()
					.map(|p| facts.get(&sigma.apply(p)).copied().unwrap_or(Weight::zero()))
					.fold(Weight::one(), |acc, w| acc.min(w));
				let conclusion_weight = Weight::new((join_weight.value()).min(1.0) - rule_weight.value());

				match facts.get(&conclusion).copied() {
					Some(existing) if existing.value() >= conclusion_weight.value() => {}
					_ => {
						facts.insert(conclusion, conclusion_weight);
						progressed = true;
					}
				}
			}
		}
		if !progressed {
			break;
		}
	}
}
