//! Unification: find every substitution that makes two (possibly
//! non-concrete) sentences identical, up to a bound on how many rewriting
//! steps a single variable pair may take.
//!
//! If either side is concrete, unification reduces to matching the other
//! side against it. Otherwise both sides are decomposed by their template
//! (which must be equal) and each segment pair is solved independently by a
//! breadth-first search over a classic word-equation rewrite system, with
//! results across segments combined exactly as in [`crate::matching`].

use metarule_core::{decompose, Sentence, Substitution, Token};
use metarule_core::vocab::FreshVariables;

use crate::matching::find_substitutions;

/// Unify `a` and `b`, exploring at most `depth_limit` rewrite steps per
/// variable-growth chain. `fresh` mints the De-Bruijn variables the growth
/// rules (`X -> Y X'`) introduce.
pub fn unify(a: &Sentence, b: &Sentence, depth_limit: u32, fresh: &mut FreshVariables) -> Vec<Substitution> {
	if a.is_concrete() {
		return find_substitutions(b, a);
	}
	if b.is_concrete() {
		return find_substitutions(a, b);
	}

	let (ta, sa) = decompose(a);
	let (tb, sb) = decompose(b);
	if ta != tb {
		return Vec::new();
	}

	let mut acc = vec![Substitution::new()];
	for (sega, segb) in sa.iter().zip(sb.iter()) {
		let local = unify_segment(sega, segb, depth_limit, fresh);
		if local.is_empty() {
			return Vec::new();
		}
		let mut next = Vec::new();
		for base in &acc {
			for candidate in &local {
				if let Ok(merged) = base.merge(candidate) {
					next.push(merged);
				}
			}
		}
		acc = next;
		if acc.is_empty() {
			return Vec::new();
		}
	}
	acc
}

/// Unify a sequence of sentence pairs left to right, applying each partial
/// result to the remaining tails before recursing into them — used by the
/// provers to unify a whole premise list against a set of known facts.
pub fn unify_sequence(
	pairs: &[(Sentence, Sentence)],
	depth_limit: u32,
	fresh: &mut FreshVariables,
) -> Vec<Substitution> {
	unify_sequence_from(pairs, &Substitution::new(), depth_limit, fresh)
}

fn unify_sequence_from(
	pairs: &[(Sentence, Sentence)],
	subst: &Substitution,
	depth_limit: u32,
	fresh: &mut FreshVariables,
) -> Vec<Substitution> {
	let Some(((a, b), rest)) = pairs.split_first() else {
		return vec![subst.clone()];
	};
	let a = subst.apply(a);
	let b = subst.apply(b);
	let mut out = Vec::new();
	for step in unify(&a, &b, depth_limit, fresh) {
		if let Ok(next) = subst.compose(&step).merge(&step) {
			out.extend(unify_sequence_from(rest, &next, depth_limit, fresh));
		}
	}
	out
}

struct Subproblem {
	left: Vec<Token>,
	right: Vec<Token>,
	subst: Substitution,
	depth: u32,
}

fn unify_segment(a: &Sentence, b: &Sentence, depth_limit: u32, fresh: &mut FreshVariables) -> Vec<Substitution> {
	let mut queue = std::collections::VecDeque::new();
	queue.push_back(Subproblem {
		left: a.as_slice().to_vec(),
		right: b.as_slice().to_vec(),
		subst: Substitution::new(),
		depth: 0,
	});

	let mut results = Vec::new();
	while let Some(problem) = queue.pop_front() {
		let (mut left, mut right) = (problem.left, problem.right);
		strip_common_ends(&mut left, &mut right);

		if left.is_empty() && right.is_empty() {
			results.push(problem.subst);
			continue;
		}
		if left.is_empty() || right.is_empty() {
			continue;
		}
		if problem.depth >= depth_limit {
			continue;
		}

		if let Some((var, other)) = singleton_unbound_variable(&left, &right) {
			if let Ok(value) = Substitution::new().bind(var, Sentence::new(other.to_vec())) {
				if let Ok(subst) = problem.subst.compose(&value).merge(&value) {
					queue.push_back(Subproblem { left: Vec::new(), right: Vec::new(), subst, depth: problem.depth + 1 });
				}
			}
			continue;
		}

		let head_a = left[0];
		let head_b = right[0];
		match (head_a.is_variable(), head_b.is_variable()) {
			(true, true) => {
				for inc in grow_choices(head_a, head_b, fresh) {
					push_candidate(&mut queue, &problem.subst, &left, &right, &inc, problem.depth);
				}
			}
			(true, false) => {
				for inc in match_choices(head_a, head_b, fresh) {
					push_candidate(&mut queue, &problem.subst, &left, &right, &inc, problem.depth);
				}
			}
			(false, true) => {
				for inc in match_choices(head_b, head_a, fresh) {
					push_candidate(&mut queue, &problem.subst, &left, &right, &inc, problem.depth);
				}
			}
			(false, false) => {
				// Leading words differ (equal ones were already stripped): dead end.
			}
		}
	}
	results
}

fn push_candidate(
	queue: &mut std::collections::VecDeque<Subproblem>,
	subst: &Substitution,
	left: &[Token],
	right: &[Token],
	inc: &Substitution,
	depth: u32,
) {
	let Ok(merged) = subst.compose(inc).merge(inc) else { return };
	let new_left = inc.apply(&Sentence::new(left.to_vec())).as_slice().to_vec();
	let new_right = inc.apply(&Sentence::new(right.to_vec())).as_slice().to_vec();
	queue.push_back(Subproblem { left: new_left, right: new_right, subst: merged, depth: depth + 1 });
}

/// `X -> Y`, `X -> Y X'` for distinct variables `X` (=`a`), `Y` (=`b`).
fn grow_choices(a: Token, b: Token, fresh: &mut FreshVariables) -> Vec<Substitution> {
	let mut out = Vec::new();
	if let Ok(s) = Substitution::new().bind(a, Sentence::single(b)) {
		out.push(s);
	}
	let fresh_var = Token::fresh_variable(fresh.next());
	if let Ok(s) = Substitution::new().bind(a, Sentence::new(vec![b, fresh_var])) {
		out.push(s);
	}
	out
}

/// `X -> t`, `X -> t X'` for variable `x` and non-variable word `t`.
fn match_choices(x: Token, t: Token, fresh: &mut FreshVariables) -> Vec<Substitution> {
	let mut out = Vec::new();
	if let Ok(s) = Substitution::new().bind(x, Sentence::single(t)) {
		out.push(s);
	}
	let fresh_var = Token::fresh_variable(fresh.next());
	if let Ok(s) = Substitution::new().bind(x, Sentence::new(vec![t, fresh_var])) {
		out.push(s);
	}
	out
}

/// If one side is exactly one variable not occurring anywhere in the other
/// side, it can be bound to the other side wholesale without further
/// branching.
fn singleton_unbound_variable<'a>(left: &'a [Token], right: &'a [Token]) -> Option<(Token, &'a [Token])> {
	if left.len() == 1 && left[0].is_variable() && !right.contains(&left[0]) {
		return Some((left[0], right));
	}
	if right.len() == 1 && right[0].is_variable() && !left.contains(&right[0]) {
		return Some((right[0], left));
	}
	None
}

fn strip_common_ends(left: &mut Vec<Token>, right: &mut Vec<Token>) {
	let mut prefix = 0;
	while prefix < left.len() && prefix < right.len() && left[prefix] == right[prefix] {
		prefix += 1;
	}
	left.drain(..prefix);
	right.drain(..prefix);

	let mut suffix = 0;
	while suffix < left.len() && suffix < right.len() && left[left.len() - 1 - suffix] == right[right.len() - 1 - suffix] {
		suffix += 1;
	}
	left.truncate(left.len() - suffix);
	right.truncate(right.len() - suffix);
}

#[cfg(test)]
mod tests {
	use super::*;
	use metarule_core::Context;
	use metarule_core::parse::parse_sentence;

	#[test]
	fn bounded_growth_yields_depth_limit_many_solutions() {
		let mut ctx = Context::new();
		let mut fresh = FreshVariables::new();
		let a = parse_sentence(&mut ctx, "hello [X]").unwrap();
		let b = parse_sentence(&mut ctx, "[X] hello").unwrap();
		let results = unify(&a, &b, 10, &mut fresh);
		assert_eq!(results.len(), 10);
	}

	#[test]
	fn concrete_sides_reduce_to_matching() {
		let mut ctx = Context::new();
		let mut fresh = FreshVariables::new();
		let a = parse_sentence(&mut ctx, "wif kiki").unwrap();
		let b = parse_sentence(&mut ctx, "wif kiki").unwrap();
		assert_eq!(unify(&a, &b, 5, &mut fresh).len(), 1);
	}

	#[test]
	fn disjoint_literals_never_unify() {
		let mut ctx = Context::new();
		let mut fresh = FreshVariables::new();
		let a = parse_sentence(&mut ctx, "wif").unwrap();
		let b = parse_sentence(&mut ctx, "lug").unwrap();
		assert!(unify(&a, &b, 5, &mut fresh).is_empty());
	}
}
