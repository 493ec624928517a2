//! A bipartite proof DAG: concrete-sentence vertices and concrete
//! rule-application vertices, arena-indexed so cyclic back-references are
//! plain integers rather than shared pointers.

use hashbrown::HashSet;
use indexmap::IndexMap;
use metarule_core::{Error, Result, Rule, Sentence};
use slab::Slab;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SentenceId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleAppId(usize);

struct SentenceNode {
	sentence: Sentence,
	/// Rule applications that use this sentence as a premise (out-edges).
	used_by: Vec<RuleAppId>,
	/// The rule application that derived this sentence, if any.
	produced_by: Option<RuleAppId>,
}

struct RuleAppNode {
	rule: Rule,
	premises: Vec<SentenceId>,
	conclusion: SentenceId,
}

/// A bipartite sentence/rule-application DAG. Built up by [`Proof::apply`];
/// always acyclic (`apply` refuses an edge that would close a cycle).
pub struct Proof {
	sentences: Slab<SentenceNode>,
	by_sentence: IndexMap<Sentence, SentenceId>,
	rule_apps: Slab<RuleAppNode>,
}

impl Default for Proof {
	fn default() -> Self {
		Self::new()
	}
}

impl Proof {
	pub fn new() -> Self {
		Proof { sentences: Slab::new(), by_sentence: IndexMap::new(), rule_apps: Slab::new() }
	}

	/// A proof containing only the given assumptions, as source vertices
	/// with no incoming rule.
	pub fn from_assumptions(assumptions: &[Sentence]) -> Self {
		let mut proof = Self::new();
		for a in assumptions {
			proof.intern_sentence(a.clone());
		}
		proof
	}

	pub fn sentence(&self, id: SentenceId) -> &Sentence {
		&self.sentences[id.0].sentence
	}

	pub fn rule_application(&self, id: RuleAppId) -> &Rule {
		&self.rule_apps[id.0].rule
	}

	pub fn contains(&self, sentence: &Sentence) -> Option<SentenceId> {
		self.by_sentence.get(sentence).copied()
	}

	fn intern_sentence(&mut self, sentence: Sentence) -> SentenceId {
		if let Some(&id) = self.by_sentence.get(&sentence) {
			return id;
		}
		let id = SentenceId(self.sentences.insert(SentenceNode {
			sentence: sentence.clone(),
			used_by: Vec::new(),
			produced_by: None,
		}));
		self.by_sentence.insert(sentence, id);
		id
	}

	/// Apply a fully concrete rule whose premises must already be present
	/// as sentence vertices. Adds a rule vertex with edges from each
	/// premise to it and from it to the (possibly new) conclusion vertex.
	/// Fails if a premise is missing, or if the new edges would close a
	/// cycle.
	pub fn apply(&mut self, rule: &Rule) -> Result<SentenceId> {
		if !rule.is_concrete() {
			return Err(Error::MalformedRule("apply requires a fully concrete rule".to_string()));
		}
		let mut premise_ids = Vec::with_capacity(rule.premises().len());
		for p in rule.premises() {
			let id = self
				.by_sentence
				.get(p)
				.copied()
				.ok_or_else(|| Error::MissingPremise(format!("premise not present in proof: {p:?}")))?;
			premise_ids.push(id);
		}

		// A brand-new conclusion has no outgoing edges yet and so cannot
		// possibly close a cycle; only an already-present conclusion needs
		// the check, and only it is worth the traversal.
		if let Some(&existing) = self.by_sentence.get(rule.conclusion()) {
			for &premise in &premise_ids {
				if self.reaches(existing, premise) {
					return Err(Error::WouldCycle);
				}
			}
		}
		let conclusion_id = self.intern_sentence(rule.conclusion().clone());

		let app_id = RuleAppId(self.rule_apps.insert(RuleAppNode {
			rule: rule.clone(),
			premises: premise_ids.clone(),
			conclusion: conclusion_id,
		}));
		for premise in premise_ids {
			self.sentences[premise.0].used_by.push(app_id);
		}
		let conclusion = &mut self.sentences[conclusion_id.0];
		if conclusion.produced_by.is_none() {
			conclusion.produced_by = Some(app_id);
		}
		Ok(conclusion_id)
	}

	/// Does a forward path (sentence -[premise-of]-> rule -[concludes]->
	/// sentence) lead from `from` to `to`?
	fn reaches(&self, from: SentenceId, to: SentenceId) -> bool {
		if from == to {
			return true;
		}
		let mut seen = HashSet::new();
		let mut queue = VecDeque::new();
		queue.push_back(from);
		while let Some(id) = queue.pop_front() {
			for &app in &self.sentences[id.0].used_by {
				let next = self.rule_apps[app.0].conclusion;
				if next == to {
					return true;
				}
				if seen.insert(next) {
					queue.push_back(next);
				}
			}
		}
		false
	}

	/// A valid proof has exactly one sink sentence (no sentence depends on
	/// it as a premise) and no cycle. Every rule application's in/out edges
	/// already respect its premises/conclusion by construction.
	pub fn isvalid(&self) -> bool {
		let sinks = self.sentences.iter().filter(|(_, n)| n.used_by.is_empty()).count();
		sinks == 1 && !self.has_cycle()
	}

	fn has_cycle(&self) -> bool {
		self.sentences.iter().any(|(id, _)| self.nontrivially_self_reaches(SentenceId(id)))
	}

	/// Does `start` reach itself via at least one rule-application edge
	/// (as opposed to the trivial zero-edge path every sentence has to
	/// itself)?
	fn nontrivially_self_reaches(&self, start: SentenceId) -> bool {
		let mut seen = HashSet::new();
		let mut queue = VecDeque::new();
		for &app in &self.sentences[start.0].used_by {
			queue.push_back(self.rule_apps[app.0].conclusion);
		}
		while let Some(id) = queue.pop_front() {
			if id == start {
				return true;
			}
			if !seen.insert(id) {
				continue;
			}
			for &app in &self.sentences[id.0].used_by {
				queue.push_back(self.rule_apps[app.0].conclusion);
			}
		}
		false
	}

	/// The sub-DAG reachable backward from `goal` (the goal, its producing
	/// rule, that rule's premises, recursively).
	pub fn trim(&self, goal: SentenceId) -> Proof {
		let mut keep_sentences = HashSet::new();
		let mut keep_apps = HashSet::new();
		let mut queue = VecDeque::new();
		queue.push_back(goal);
		keep_sentences.insert(goal);
		while let Some(id) = queue.pop_front() {
			if let Some(app) = self.sentences[id.0].produced_by {
				if keep_apps.insert(app) {
					for &premise in &self.rule_apps[app.0].premises {
						if keep_sentences.insert(premise) {
							queue.push_back(premise);
						}
					}
				}
			}
		}

		let mut trimmed = Proof::new();
		for &old in &keep_sentences {
			trimmed.intern_sentence(self.sentences[old.0].sentence.clone());
		}
		for &app in &keep_apps {
			let node = &self.rule_apps[app.0];
			let _ = trimmed.apply(&node.rule);
		}
		trimmed
	}

	/// Copy `other`'s vertices into `self`, de-duplicating sentences (by
	/// value) but keeping every rule application from both proofs, then
	/// verifying the result stayed acyclic.
	pub fn merge(&self, other: &Proof) -> Result<Proof> {
		let mut merged = Proof::new();
		for (_, node) in self.sentences.iter() {
			merged.intern_sentence(node.sentence.clone());
		}
		for (_, node) in other.sentences.iter() {
			merged.intern_sentence(node.sentence.clone());
		}
		for (_, app) in self.rule_apps.iter() {
			merged.apply(&app.rule)?;
		}
		for (_, app) in other.rule_apps.iter() {
			merged.apply(&app.rule)?;
		}
		if merged.has_cycle() {
			return Err(Error::WouldCycle);
		}
		Ok(merged)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use metarule_core::Context;
	use metarule_core::parse::parse_sentence;

	fn s(ctx: &mut Context, text: &str) -> Sentence {
		parse_sentence(ctx, text).unwrap()
	}

	#[test]
	fn applying_a_rule_over_present_premises_yields_a_valid_proof() {
		let mut ctx = Context::new();
		let s1 = s(&mut ctx, "harry is rough");
		let s2 = s(&mut ctx, "rough people be nice");
		let s3 = s(&mut ctx, "harry be nice");
		let mut proof = Proof::from_assumptions(&[s1.clone(), s2.clone()]);
		let rule = Rule::new(vec![s1, s2], s3.clone());
		let sink = proof.apply(&rule).unwrap();
		assert_eq!(proof.sentence(sink), &s3);
		assert!(proof.isvalid());
	}

	#[test]
	fn applying_a_rule_over_a_missing_premise_fails() {
		let mut ctx = Context::new();
		let s1 = s(&mut ctx, "harry is rough");
		let s3 = s(&mut ctx, "harry be nice");
		let mut proof = Proof::new();
		let rule = Rule::new(vec![s1], s3);
		assert!(proof.apply(&rule).is_err());
	}

	#[test]
	fn trim_keeps_only_the_goals_ancestry() {
		let mut ctx = Context::new();
		let s1 = s(&mut ctx, "a");
		let s2 = s(&mut ctx, "b");
		let s3 = s(&mut ctx, "c");
		let unrelated = s(&mut ctx, "z");
		let mut proof = Proof::from_assumptions(&[s1.clone(), s2.clone(), unrelated]);
		let rule = Rule::new(vec![s1, s2], s3.clone());
		let goal = proof.apply(&rule).unwrap();
		let trimmed = proof.trim(goal);
		assert!(trimmed.contains(&s3).is_some());
		assert_eq!(trimmed.sentences.len(), 3);
	}
}
