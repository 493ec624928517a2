use std::collections::VecDeque;

use hashbrown::HashSet;
use indexmap::IndexMap;
use log::{debug, trace};
use metarule_core::vocab::FreshVariables;
use metarule_core::{Rule, Template, Token};
use metarule_match::{anti_unify_rule, is_more_general};
use slab::Slab;

/// A stable handle into an [`IndexedRuleSet`]. Ids are never reused within
/// the lifetime of one set, even after hypothetical removal, so they remain
/// valid keys for external bookkeeping (e.g. a proof graph's rule-node
/// labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

struct Entry {
	rule: Rule,
	template: Template,
	generalizes: Vec<RuleId>,
	generalized_by: Vec<RuleId>,
}

/// A rule set bucketed by conclusion template (spec/4.4's cheap pre-filter,
/// reused from [`metarule_match`]) and closed under pairwise
/// anti-unification: whenever two stored rules' anti-unification yields a
/// new, strictly more general, structurally valid rule, that rule is added
/// too and the closure continues until no more candidates appear.
///
/// Closure is driven by a worklist rather than eager recursion, and every
/// unordered pair of rules is anti-unified at most once, which bounds the
/// process even though it is quadratic in the number of rules ultimately
/// discovered.
pub struct IndexedRuleSet {
	entries: Slab<Entry>,
	by_template: IndexMap<Template, Vec<RuleId>>,
	delimiter: Token,
	tried_pairs: HashSet<(RuleId, RuleId)>,
}

impl IndexedRuleSet {
	/// `delimiter` is a special token reserved to join a rule's conclusion
	/// and premises into one sentence for rule-to-rule matching; it must not
	/// otherwise occur in any rule this set will hold.
	pub fn new(delimiter: Token) -> Self {
		IndexedRuleSet {
			entries: Slab::new(),
			by_template: IndexMap::new(),
			delimiter,
			tried_pairs: HashSet::new(),
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn rule(&self, id: RuleId) -> &Rule {
		&self.entries[id.0].rule
	}

	pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
		self.entries.iter().map(|(i, e)| (RuleId(i), &e.rule))
	}

	/// Rules whose conclusion template equals `template` — a cheap,
	/// necessary-not-sufficient pre-filter a prover should apply before the
	/// real (expensive) match against a goal.
	pub fn candidates_for_template(&self, template: &Template) -> &[RuleId] {
		self.by_template.get(template).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn is_ancestor(&self, candidate: RuleId, of: RuleId) -> bool {
		self.reachable(candidate, |e| &e.generalizes).contains(&of)
	}

	pub fn is_descendant(&self, candidate: RuleId, of: RuleId) -> bool {
		self.reachable(candidate, |e| &e.generalized_by).contains(&of)
	}

	fn reachable(&self, from: RuleId, edges: impl Fn(&Entry) -> &Vec<RuleId>) -> HashSet<RuleId> {
		let mut seen = HashSet::new();
		let mut queue = VecDeque::new();
		queue.push_back(from);
		while let Some(id) = queue.pop_front() {
			for &next in edges(&self.entries[id.0]) {
				if seen.insert(next) {
					queue.push_back(next);
				}
			}
		}
		seen
	}

	/// Insert `rule` (after normalizing it), closing the set under
	/// anti-unification against everything already present. Returns the
	/// rule's id, whether newly inserted or already present as an
	/// equivalent rule.
	pub fn insert(&mut self, rule: Rule, fresh: &mut FreshVariables) -> Option<RuleId> {
		let rule = rule.normalize(fresh);
		if !rule.isvalid() {
			return None;
		}
		if let Some(existing) = self.find_equivalent(&rule) {
			return Some(existing);
		}

		let mut queue = VecDeque::new();
		let first = self.insert_raw(rule);
		queue.push_back(first);

		while let Some(id) = queue.pop_front() {
			debug!("worklist: propagating rule {id:?}, {} remaining", queue.len());
			let template = self.entries[id.0].template.clone();
			let others: Vec<RuleId> = self.candidates_for_template(&template).iter().copied().filter(|&o| o != id).collect();
			for other in others {
				let pair = if id.0 < other.0 { (id, other) } else { (other, id) };
				if !self.tried_pairs.insert(pair) {
					continue;
				}
				let (a, b) = (self.rule(id).clone(), self.rule(other).clone());
				if let Some((generalization, _, _)) = anti_unify_rule(&a, &b, fresh) {
					let generalization = generalization.normalize(fresh);
					if !generalization.isvalid() {
						continue;
					}
					if self.find_equivalent(&generalization).is_some() {
						continue;
					}
					let new_id = self.insert_raw(generalization);
					trace!("worklist: discovered generalization {new_id:?} of {id:?} and {other:?}");
					queue.push_back(new_id);
				}
			}
			self.link_generality(id);
		}

		Some(first)
	}

	fn find_equivalent(&self, rule: &Rule) -> Option<RuleId> {
		let target_hash = rule.invariant_hash();
		self.entries
			.iter()
			.find(|(_, e)| e.rule.invariant_hash() == target_hash && e.rule.is_equivalent(rule))
			.map(|(i, _)| RuleId(i))
	}

	fn insert_raw(&mut self, rule: Rule) -> RuleId {
		let template = Template::of(rule.conclusion());
		let id = RuleId(self.entries.insert(Entry {
			rule,
			template: template.clone(),
			generalizes: Vec::new(),
			generalized_by: Vec::new(),
		}));
		self.by_template.entry(template).or_default().push(id);
		id
	}

	/// Recompute generality edges between `id` and every other rule sharing
	/// its conclusion template. Run once per inserted rule, after the set
	/// has stabilized enough that comparing against all current
	/// template-equal members is meaningful; rules with differing
	/// conclusion templates can never be more general than one another
	/// (`is_more_general` requires a matching template), so comparing
	/// outside the bucket would only waste work.
	fn link_generality(&mut self, id: RuleId) {
		let rule = self.rule(id).clone();
		let template = self.entries[id.0].template.clone();
		let others: Vec<RuleId> = self.candidates_for_template(&template).iter().copied().filter(|&o| o != id).collect();
		for other in others {
			let other_rule = self.rule(other).clone();
			if is_more_general(&rule, &other_rule, self.delimiter) {
				self.add_edge(id, other);
			}
			if is_more_general(&other_rule, &rule, self.delimiter) {
				self.add_edge(other, id);
			}
		}
	}

	fn add_edge(&mut self, general: RuleId, specific: RuleId) {
		let gen_entry = &mut self.entries[general.0];
		if !gen_entry.generalizes.contains(&specific) {
			gen_entry.generalizes.push(specific);
		}
		let spec_entry = &mut self.entries[specific.0];
		if !spec_entry.generalized_by.contains(&general) {
			spec_entry.generalized_by.push(general);
		}
	}
}
