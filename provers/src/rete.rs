//! A Rete-style discrimination network: one shared alpha-node per
//! alpha-equivalence class of premise, joined through a chain of beta-nodes
//! (shared across rules with an identical premise prefix) rooted at a
//! dummy empty-prefix node.
//!
//! Network topology is fixed once [`ReteNetwork::build`] runs; nothing adds
//! a rule afterward, so there is no need for new nodes to "catch up" with
//! facts already seen — every fact is fed in through [`ReteNetwork::run`]
//! after the network exists.

use hashbrown::HashMap;
use indexmap::IndexMap;
use log::trace;
use metarule_core::{Rule, Sentence, Substitution, Token};
use metarule_match::find_substitutions;

use crate::weight::Weight;

/// Rename every variable of `s` to a De-Bruijn token keyed by order of
/// first occurrence, local to this call; two calls on alpha-equivalent
/// sentences produce identical output, which is what lets unrelated rules
/// share one alpha-node. Also returns, per canonical position, which of
/// `s`'s original variables it stood in for.
fn canonicalize_with_origin(s: &Sentence) -> (Sentence, Vec<Token>) {
	let mut mapping: HashMap<Token, Token> = HashMap::new();
	let mut origin = Vec::new();
	let mut next = -1i32;
	let tokens = s
		.as_slice()
		.iter()
		.map(|t| {
			if t.is_variable() {
				*mapping.entry(*t).or_insert_with(|| {
					origin.push(*t);
					let canon = Token::fresh_variable(next);
					next -= 1;
					canon
				})
			} else {
				*t
			}
		})
		.collect();
	(Sentence::new(tokens), origin)
}

#[derive(educe::Educe)]
#[educe(Debug)]
struct AlphaNode {
	condition: Sentence,
	arity: usize,
	#[educe(Debug(ignore))]
	instantiations: IndexMap<Vec<Sentence>, f64>,
}

/// How a beta-node's right-parent (alpha) instantiation extends its
/// left-parent's combined binding vector: either the alpha's position `p`
/// must equal an already-bound combined position, or it introduces one.
#[derive(Debug, Clone, PartialEq, Eq)]
enum JoinSlot {
	Shared(usize),
	New,
}

#[derive(educe::Educe)]
#[educe(Debug)]
struct BetaNode {
	left: usize,
	right: usize,
	join: Vec<JoinSlot>,
	#[educe(Debug(ignore))]
	instantiations: IndexMap<Vec<Sentence>, f64>,
	children: Vec<usize>,
}

const DUMMY_BETA: usize = 0;

struct Attachment {
	beta_leaf: usize,
	combined_vars: Vec<Token>,
	rule: Rule,
	weight: Weight,
}

/// An alpha/beta join network built once from a fixed weighted rule set.
pub struct ReteNetwork {
	alpha_nodes: Vec<AlphaNode>,
	alpha_index: HashMap<Sentence, usize>,
	beta_nodes: Vec<BetaNode>,
	attachments: Vec<Attachment>,
}

fn join_step(combined_vars: &[Token], origin: &[Token]) -> (Vec<JoinSlot>, Vec<Token>) {
	let mut slots = Vec::with_capacity(origin.len());
	let mut combined = combined_vars.to_vec();
	for &var in origin {
		if let Some(pos) = combined.iter().position(|&v| v == var) {
			slots.push(JoinSlot::Shared(pos));
		} else {
			slots.push(JoinSlot::New);
			combined.push(var);
		}
	}
	(slots, combined)
}

impl ReteNetwork {
	pub fn build(rules: &[(Rule, Weight)]) -> Self {
		let mut net = ReteNetwork {
			alpha_nodes: Vec::new(),
			alpha_index: HashMap::new(),
			beta_nodes: vec![BetaNode {
				left: DUMMY_BETA,
				right: usize::MAX,
				join: Vec::new(),
				instantiations: IndexMap::from_iter([(Vec::new(), f64::INFINITY)]),
				children: Vec::new(),
			}],
			attachments: Vec::new(),
		};

		for (rule, weight) in rules {
			let mut beta = DUMMY_BETA;
			let mut combined_vars: Vec<Token> = Vec::new();
			for premise in rule.premises() {
				let (canonical, origin) = canonicalize_with_origin(premise);
				let alpha = net.alpha_id(canonical, origin.len());
				let (slots, next_combined) = join_step(&combined_vars, &origin);

				let existing = net.beta_nodes.iter().position(|b| {
					b.left == beta && b.right == alpha && b.join == slots
				});
				beta = match existing {
					Some(id) => id,
					None => {
						let id = net.beta_nodes.len();
						net.beta_nodes.push(BetaNode {
							left: beta,
							right: alpha,
							join: slots,
							instantiations: IndexMap::new(),
							children: Vec::new(),
						});
						net.beta_nodes[beta].children.push(id);
						id
					}
				};
				combined_vars = next_combined;
			}
			net.attachments.push(Attachment {
				beta_leaf: beta,
				combined_vars,
				rule: rule.clone(),
				weight: *weight,
			});
		}
		net
	}

	fn alpha_id(&mut self, condition: Sentence, arity: usize) -> usize {
		if let Some(&id) = self.alpha_index.get(&condition) {
			return id;
		}
		let id = self.alpha_nodes.len();
		self.alpha_nodes.push(AlphaNode { condition: condition.clone(), arity, instantiations: IndexMap::new() });
		self.alpha_index.insert(condition, id);
		id
	}

	/// Match `fact` against every alpha-node and propagate through the
	/// network, returning every newly-activated concrete rule (conclusion,
	/// weight, the grounded rule) discovered as a result.
	pub fn add_wme(&mut self, fact: &Sentence, weight: f64) -> Vec<(Sentence, Weight, Rule)> {
		let mut activated = Vec::new();
		let alpha_ids: Vec<usize> = (0..self.alpha_nodes.len()).collect();
		for ai in alpha_ids {
			let sigmas = find_substitutions(&self.alpha_nodes[ai].condition.clone(), fact);
			for sigma in sigmas {
				let vector = alpha_binding_vector(&self.alpha_nodes[ai], &sigma);
				let entry = self.alpha_nodes[ai].instantiations.entry(vector.clone()).or_insert(f64::NEG_INFINITY);
				if *entry >= weight {
					continue;
				}
				*entry = weight;
				trace!("admitted wme {fact:?} into alpha node {ai} as {vector:?}");
				let children: Vec<usize> = self
					.beta_nodes
					.iter()
					.enumerate()
					.filter(|(_, b)| b.right == ai)
					.map(|(id, _)| id)
					.collect();
				for beta_id in children {
					self.right_activate(beta_id, &vector, weight, &mut activated);
				}
			}
		}
		activated
	}

	fn right_activate(&mut self, beta_id: usize, right_vec: &[Sentence], right_weight: f64, activated: &mut Vec<(Sentence, Weight, Rule)>) {
		let left_id = self.beta_nodes[beta_id].left;
		let left_instantiations: Vec<(Vec<Sentence>, f64)> =
			self.beta_nodes[left_id].instantiations.iter().map(|(k, v)| (k.clone(), *v)).collect();
		for (left_vec, left_weight) in left_instantiations {
			if let Some(combined) = self.try_join(beta_id, &left_vec, right_vec) {
				self.store_and_propagate(beta_id, combined, left_weight.min(right_weight), activated);
			}
		}
	}

	fn try_join(&self, beta_id: usize, left_vec: &[Sentence], right_vec: &[Sentence]) -> Option<Vec<Sentence>> {
		let join = &self.beta_nodes[beta_id].join;
		let mut combined = left_vec.to_vec();
		for (slot, value) in join.iter().zip(right_vec.iter()) {
			match slot {
				JoinSlot::Shared(pos) => {
					if &combined[*pos] != value {
						return None;
					}
				}
				JoinSlot::New => combined.push(value.clone()),
			}
		}
		Some(combined)
	}

	fn store_and_propagate(&mut self, beta_id: usize, combined: Vec<Sentence>, weight: f64, activated: &mut Vec<(Sentence, Weight, Rule)>) {
		let entry = self.beta_nodes[beta_id].instantiations.entry(combined.clone()).or_insert(f64::NEG_INFINITY);
		if *entry >= weight {
			return;
		}
		*entry = weight;

		for attachment_idx in 0..self.attachments.len() {
			if self.attachments[attachment_idx].beta_leaf != beta_id {
				continue;
			}
			if let (Some(conclusion), w) = self.evaluate_attachment(attachment_idx, &combined, weight) {
				activated.push((conclusion, w, self.attachments[attachment_idx].rule.clone()));
			}
		}

		let children: Vec<usize> = self.beta_nodes[beta_id].children.clone();
		for child in children {
			let alpha_id = self.beta_nodes[child].right;
			let alpha_instantiations: Vec<(Vec<Sentence>, f64)> =
				self.alpha_nodes[alpha_id].instantiations.iter().map(|(k, v)| (k.clone(), *v)).collect();
			for (right_vec, right_weight) in alpha_instantiations {
				if let Some(next_combined) = self.try_join(child, &combined, &right_vec) {
					self.store_and_propagate(child, next_combined, weight.min(right_weight), activated);
				}
			}
		}
	}

	fn evaluate_attachment(&self, idx: usize, combined: &[Sentence], join_weight: f64) -> (Option<Sentence>, Weight) {
		let attachment = &self.attachments[idx];
		let mut sigma = Substitution::new();
		for (&var, value) in attachment.combined_vars.iter().zip(combined.iter()) {
			sigma = match sigma.bind(var, value.clone()) {
				Ok(s) => s,
				Err(_) => return (None, Weight::zero()),
			};
		}
		let conclusion = sigma.apply(attachment.rule.conclusion());
		if !conclusion.is_concrete() {
			return (None, Weight::zero());
		}
		let weight = Weight::new(join_weight.min(1.0) - attachment.weight.value());
		(Some(conclusion), weight)
	}
}

fn alpha_binding_vector(node: &AlphaNode, sigma: &Substitution) -> Vec<Sentence> {
	(1..=node.arity)
		.map(|i| {
			let var = Token::fresh_variable(-(i as i32));
			sigma.get(var).cloned().unwrap_or_else(Sentence::empty)
		})
		.collect()
}

/// Drive the network over `assumptions`, then repeatedly apply activated
/// concrete rules (each at most once) until a pass makes no progress.
/// `on_fact` is invoked for every newly-proved conclusion (assumptions
/// included, with `None` as their producing rule); returning `false`
/// aborts the run immediately.
pub fn run(
	net: &mut ReteNetwork,
	rules: &[(Rule, Weight)],
	assumptions: &[Sentence],
	mut on_fact: impl FnMut(&Sentence, Option<&Rule>) -> bool,
) {
	let mut applied: hashbrown::HashSet<Rule> = hashbrown::HashSet::new();
	let mut pending: Vec<(Sentence, Weight, Rule)> = Vec::new();

	for (rule, weight) in rules {
		if rule.premises().is_empty() {
			pending.push((rule.conclusion().clone(), *weight, rule.clone()));
		}
	}

	for assumption in assumptions {
		if !on_fact(assumption, None) {
			return;
		}
		pending.extend(net.add_wme(assumption, 1.0));
	}

	loop {
		let batch = std::mem::take(&mut pending);
		if batch.is_empty() {
			break;
		}
		let mut progressed = false;
		for (conclusion, weight, rule) in batch {
			if applied.contains(&rule) || weight.value() <= 0.0 {
				continue;
			}
			applied.insert(rule.clone());
			progressed = true;
			if !on_fact(&conclusion, Some(&rule)) {
				return;
			}
			pending.extend(net.add_wme(&conclusion, weight.value()));
		}
		if !progressed {
			break;
		}
	}
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
	fn a_two_premise_rule_fires_once_both_premises_are_known() {
		let mut ctx = Context::new();
		let rule = r(&mut ctx, "[A] is rough\nrough people be nice\n---\n[A] be nice");
		let rules = vec![(rule, Weight::new(0.1))];
		let mut net = ReteNetwork::build(&rules);
		let assumptions = vec![s(&mut ctx, "harry is rough"), s(&mut ctx, "rough people be nice")];
		let mut seen = Vec::new();
		run(&mut net, &rules, &assumptions, |fact, _| {
			seen.push(fact.clone());
			true
		});
		assert!(seen.contains(&s(&mut ctx, "harry be nice")));
	}

	#[test]
	fn callback_returning_false_aborts_the_run() {
		let mut ctx = Context::new();
		let rule = r(&mut ctx, "[A] is rough\nrough people be nice\n---\n[A] be nice");
		let rules = vec![(rule, Weight::new(0.1))];
		let mut net = ReteNetwork::build(&rules);
		let assumptions = vec![s(&mut ctx, "harry is rough"), s(&mut ctx, "rough people be nice")];
		let mut calls = 0;
        run(&mut net, &rules, &assumptions, |_, _| {
            calls += 1;
            false
        });
		assert_eq!(calls, 1);
	}
}
