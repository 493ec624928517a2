//! Matching: find every way a pattern (possibly containing variables) lines
//! up with a concrete sentence, producing one substitution per way.
//!
//! Specials can never be bound, so a pattern and a concrete sentence can
//! only match when their [`Template`]s are equal; `decompose` then reduces
//! the whole problem to matching each pair of segments independently and
//! merging the results, since no variable's span can cross a special
//! boundary once the templates line up.

use hashbrown::HashSet;
use metarule_core::{compose, decompose, Rule, Sentence, Substitution, Template, Token};

/// Every substitution `sigma` such that `sigma(pattern) == concrete`.
pub fn find_substitutions(pattern: &Sentence, concrete: &Sentence) -> Vec<Substitution> {
	let (pattern_template, pattern_segments) = decompose(pattern);
	let (concrete_template, concrete_segments) = decompose(concrete);
	if pattern_template != concrete_template {
		return Vec::new();
	}
	let mut acc = vec![Substitution::new()];
	for (p, c) in pattern_segments.iter().zip(concrete_segments.iter()) {
		let local = match_segment(p.as_slice(), c.as_slice());
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

/// `true` iff `pattern` matches `concrete` at least once.
pub fn matches(pattern: &Sentence, concrete: &Sentence) -> bool {
	!find_substitutions(pattern, concrete).is_empty()
}

/// A segment contains no specials (they have already been stripped out by
/// [`decompose`]), so matching reduces to a straightforward backtracking
/// walk: literal tokens must align position for position, and a variable
/// may consume any non-empty run of the remaining concrete tokens, with
/// repeat occurrences of the same variable forced to agree.
fn match_segment(pattern: &[Token], concrete: &[Token]) -> Vec<Substitution> {
	let mut out = Vec::new();
	walk(pattern, concrete, &Substitution::new(), &mut out);
	out
}

fn walk(pattern: &[Token], concrete: &[Token], subst: &Substitution, out: &mut Vec<Substitution>) {
	let Some((head, rest)) = pattern.split_first() else {
		if concrete.is_empty() {
			out.push(subst.clone());
		}
		return;
	};
	if head.is_variable() {
		if let Some(bound) = subst.get(*head) {
			let bound = bound.as_slice();
			if concrete.len() >= bound.len() && &concrete[..bound.len()] == bound {
				walk(rest, &concrete[bound.len()..], subst, out);
			}
			return;
		}
		for l in 1..=concrete.len() {
			let value = Sentence::new(concrete[..l].to_vec());
			if let Ok(next) = subst.bind(*head, value) {
				walk(rest, &concrete[l..], &next, out);
			}
		}
	} else {
		if concrete.first() != Some(head) {
			return;
		}
		walk(rest, &concrete[1..], subst, out);
	}
}

/// Matching between two rules: the conclusion plus every permutation of the
/// concrete rule's premises are joined into one sentence by a reserved
/// delimiter special, and the problem delegates to sentence matching.
/// Duplicate substitutions across permutations are removed.
pub fn find_rule_substitutions(pattern: &Rule, concrete: &Rule, delimiter: Token) -> Vec<Substitution> {
	if pattern.premises().len() != concrete.premises().len() {
		return Vec::new();
	}
	let pattern_seq = join(pattern.conclusion(), pattern.premises(), delimiter);
	let mut seen = HashSet::new();
	let mut results = Vec::new();
	for perm in permutations(concrete.premises()) {
		let concrete_seq = join(concrete.conclusion(), &perm, delimiter);
		for subst in find_substitutions(&pattern_seq, &concrete_seq) {
			if seen.insert(subst.clone()) {
				results.push(subst);
			}
		}
	}
	results
}

/// `true` iff `general` matches `specific` under some premise permutation,
/// i.e. `general` subsumes `specific`.
pub fn is_more_general(general: &Rule, specific: &Rule, delimiter: Token) -> bool {
	!find_rule_substitutions(general, specific, delimiter).is_empty()
}

fn join(conclusion: &Sentence, premises: &[Sentence], delimiter: Token) -> Sentence {
	let mut tokens = Vec::new();
	tokens.extend_from_slice(conclusion.as_slice());
	for p in premises {
		tokens.push(delimiter);
		tokens.extend_from_slice(p.as_slice());
	}
	Sentence::new(tokens)
}

fn permutations(items: &[Sentence]) -> Vec<Vec<Sentence>> {
	if items.is_empty() {
		return vec![Vec::new()];
	}
	let mut out = Vec::new();
	for i in 0..items.len() {
		let mut rest = items.to_vec();
		let head = rest.remove(i);
		for mut tail in permutations(&rest) {
			tail.insert(0, head.clone());
			out.push(tail);
		}
	}
	out
}

/// Every segment-boundary-respecting template shared by `pattern` and
/// `concrete` is a necessary (not sufficient) condition for a match; exposed
/// so callers (e.g. an indexed rule set) can cheaply rule out a whole bucket
/// before calling [`find_substitutions`].
pub fn same_template(pattern: &Sentence, concrete: &Sentence) -> bool {
	Template::of(pattern) == Template::of(concrete)
}

#[cfg(test)]
mod tests {
	use super::*;
	use metarule_core::Context;
	use metarule_core::parse::parse_sentence;

	fn parse(ctx: &mut Context, text: &str) -> Sentence {
		parse_sentence(ctx, text).unwrap()
	}

	#[test]
	fn three_way_split_across_trailing_variables() {
		let mut ctx = Context::new();
		let pattern = parse(&mut ctx, "[A] kiki [C] $MAPS_TO$ [D] [B]");
		let concrete = parse(&mut ctx, "wif kiki dax blicket lug $MAPS_TO$ RED BLUE RED GREEN");
		let results = find_substitutions(&pattern, &concrete);
		assert_eq!(results.len(), 3);
	}

	#[test]
	fn literal_mismatch_yields_no_match() {
		let mut ctx = Context::new();
		let pattern = parse(&mut ctx, "[A] kiki");
		let concrete = parse(&mut ctx, "wif dax");
		assert!(find_substitutions(&pattern, &concrete).is_empty());
	}

	#[test]
	fn differing_templates_never_match() {
		let mut ctx = Context::new();
		let pattern = parse(&mut ctx, "[A] $X$ [B]");
		let concrete = parse(&mut ctx, "a $Y$ b");
		assert!(find_substitutions(&pattern, &concrete).is_empty());
	}

	#[test]
	fn repeated_variable_forces_agreement() {
		let mut ctx = Context::new();
		let pattern = parse(&mut ctx, "[A] and [A]");
		assert!(matches(&pattern, &parse(&mut ctx, "red and red")));
		assert!(!matches(&pattern, &parse(&mut ctx, "red and blue")));
	}
}
