//! Anti-unification: the dual of unification. Given two sentences, find
//! their least general common generalization — a pattern `g` together with
//! two substitutions `sigma_a`, `sigma_b` such that `sigma_a(g) == a` and
//! `sigma_b(g) == b` — and the same for rules.
//!
//! Shared literal prefixes and suffixes are kept as-is; the differing
//! middle is generalized by anchoring on its longest common subsequence
//! (LCS) of tokens and introducing one fresh variable per gap between
//! anchors, so two sentences differing only in a few places stay mostly
//! concrete rather than collapsing to one all-consuming variable. When a
//! middle shares no anchor tokens at all but is moderate-sized and the two
//! sides have equal length, it is generalized position by position instead
//! (one fresh variable per aligned pair, reusing the same variable for
//! recurring pairs) rather than collapsing to one variable for the whole
//! span. If the two sides' gaps don't line up (one side has content at a
//! gap the other doesn't), or the sentences' templates differ, or the
//! middle is too long to enumerate position-wise, generalization falls
//! back to a single fresh variable spanning the whole differing region.

use hashbrown::HashMap;
use metarule_core::vocab::FreshVariables;
use metarule_core::{compose, decompose, Rule, Sentence, Substitution, Template, Token};

/// A generalization of two sentences (or rules): the common pattern and the
/// substitution back to each original.
#[derive(Debug, Clone)]
pub struct Generalization {
	pub pattern: Sentence,
	pub from_a: Substitution,
	pub from_b: Substitution,
}

/// Variables already minted for a recurring `(gap_a, gap_b)` pair within one
/// anti-unification call are reused, so that a gap appearing more than once
/// becomes one non-free variable shared across its occurrences rather than
/// several unrelated free ones.
type VarCache = HashMap<(Sentence, Sentence), Token>;

pub fn anti_unify(a: &Sentence, b: &Sentence, fresh: &mut FreshVariables) -> Generalization {
	let mut cache = VarCache::new();
	anti_unify_cached(a, b, fresh, &mut cache)
}

fn anti_unify_cached(a: &Sentence, b: &Sentence, fresh: &mut FreshVariables, cache: &mut VarCache) -> Generalization {
	if a == b {
		return Generalization { pattern: a.clone(), from_a: Substitution::new(), from_b: Substitution::new() };
	}

	if Template::of(a) == Template::of(b) {
		let (template, segments_a) = decompose(a);
		let (_, segments_b) = decompose(b);
		let mut pattern_segments = Vec::with_capacity(segments_a.len());
		let mut from_a = Substitution::new();
		let mut from_b = Substitution::new();
		let mut ok = true;
		for (sa, sb) in segments_a.iter().zip(segments_b.iter()) {
			match generalize_segment(sa.as_slice(), sb.as_slice(), fresh, cache) {
				Some((seg, bind_a, bind_b)) => {
					pattern_segments.push(seg);
					from_a = match from_a.merge(&bind_a) {
						Ok(m) => m,
						Err(_) => {
							ok = false;
							break;
						}
					};
					from_b = match from_b.merge(&bind_b) {
						Ok(m) => m,
						Err(_) => {
							ok = false;
							break;
						}
					};
				}
				None => {
					ok = false;
					break;
				}
			}
		}
		if ok {
			let pattern = compose(&template, &pattern_segments);
			return Generalization { pattern, from_a, from_b };
		}
	}

	whole_sentence_fallback(a, b, fresh, cache)
}

fn whole_sentence_fallback(a: &Sentence, b: &Sentence, fresh: &mut FreshVariables, cache: &mut VarCache) -> Generalization {
	let var = var_for(a, b, fresh, cache);
	let from_a = Substitution::new().bind(var, a.clone()).expect("non-empty sentence");
	let from_b = Substitution::new().bind(var, b.clone()).expect("non-empty sentence");
	Generalization { pattern: Sentence::single(var), from_a, from_b }
}

fn var_for(a: &Sentence, b: &Sentence, fresh: &mut FreshVariables, cache: &mut VarCache) -> Token {
	*cache.entry((a.clone(), b.clone())).or_insert_with(|| Token::fresh_variable(fresh.next()))
}

/// Generalize one special-free segment pair. Returns `None` if the segments
/// cannot be aligned by a gap-respecting LCS anchoring (the caller then
/// retries at a coarser granularity).
fn generalize_segment(
	a: &[Token],
	b: &[Token],
	fresh: &mut FreshVariables,
	cache: &mut VarCache,
) -> Option<(Sentence, Substitution, Substitution)> {
	if a == b {
		return Some((Sentence::new(a.to_vec()), Substitution::new(), Substitution::new()));
	}
	if a.is_empty() || b.is_empty() {
		// One side is empty and the other isn't: no variable can bridge
		// "nothing" and "something", so this segment can't be generalized
		// any finer than the caller's fallback.
		return None;
	}

	let anchors = lcs_pairs(a, b);
	if anchors.is_empty() && a.len() == b.len() && a.len() <= MODERATE_MIDDLE_LEN {
		return generalize_position_wise(a, b, fresh, cache);
	}

	let mut out = Vec::new();
	let mut from_a = Substitution::new();
	let mut from_b = Substitution::new();

	let mut prev = (0usize, 0usize);
	let push_gap = |gap_a: &[Token],
	                gap_b: &[Token],
	                out: &mut Vec<Token>,
	                from_a: &mut Substitution,
	                from_b: &mut Substitution,
	                fresh: &mut FreshVariables,
	                cache: &mut VarCache|
	 -> bool {
		match (gap_a.is_empty(), gap_b.is_empty()) {
			(true, true) => true,
			(false, false) => {
				let sa = Sentence::new(gap_a.to_vec());
				let sb = Sentence::new(gap_b.to_vec());
				let v = var_for(&sa, &sb, fresh, cache);
				out.push(v);
				*from_a = match from_a.merge(&Substitution::new().bind(v, sa).unwrap()) {
					Ok(m) => m,
					Err(_) => return false,
				};
				*from_b = match from_b.merge(&Substitution::new().bind(v, sb).unwrap()) {
					Ok(m) => m,
					Err(_) => return false,
				};
				true
			}
			_ => false,
		}
	};

	for &(i, j) in &anchors {
		if !push_gap(&a[prev.0..i], &b[prev.1..j], &mut out, &mut from_a, &mut from_b, fresh, cache) {
			return None;
		}
		out.push(a[i]);
		prev = (i + 1, j + 1);
	}
	if !push_gap(&a[prev.0..], &b[prev.1..], &mut out, &mut from_a, &mut from_b, fresh, cache) {
		return None;
	}

	Some((Sentence::new(out), from_a, from_b))
}

/// Above this length an anchor-less middle falls back to one variable for
/// the whole span rather than enumerating a prefix-length pair per
/// position.
const MODERATE_MIDDLE_LEN: usize = 8;

/// Generalize equal-length, anchor-less segments by enumerating the
/// trivial prefix-length pair `(1, 1)` at every position: each aligned pair
/// of tokens either matches literally or becomes its own fresh variable,
/// so e.g. `RED RED RED` vs `BLUE BLUE BLUE` generalizes to `[X] [X] [X]`
/// instead of the single, coarser `[X]`.
fn generalize_position_wise(
	a: &[Token],
	b: &[Token],
	fresh: &mut FreshVariables,
	cache: &mut VarCache,
) -> Option<(Sentence, Substitution, Substitution)> {
	let mut out = Vec::with_capacity(a.len());
	let mut from_a = Substitution::new();
	let mut from_b = Substitution::new();
	for (&ta, &tb) in a.iter().zip(b.iter()) {
		if ta == tb {
			out.push(ta);
			continue;
		}
		let sa = Sentence::single(ta);
		let sb = Sentence::single(tb);
		let v = var_for(&sa, &sb, fresh, cache);
		out.push(v);
		from_a = from_a.merge(&Substitution::new().bind(v, sa).unwrap()).ok()?;
		from_b = from_b.merge(&Substitution::new().bind(v, sb).unwrap()).ok()?;
	}
	Some((Sentence::new(out), from_a, from_b))
}

/// Index pairs `(i, j)` of one longest common subsequence of `a` and `b`,
/// in increasing order on both coordinates.
fn lcs_pairs(a: &[Token], b: &[Token]) -> Vec<(usize, usize)> {
	let (n, m) = (a.len(), b.len());
	let mut dp = vec![vec![0u32; m + 1]; n + 1];
	for i in (0..n).rev() {
		for j in (0..m).rev() {
			dp[i][j] = if a[i] == b[j] {
				dp[i + 1][j + 1] + 1
			} else {
				dp[i + 1][j].max(dp[i][j + 1])
			};
		}
	}
	let mut pairs = Vec::new();
	let (mut i, mut j) = (0, 0);
	while i < n && j < m {
		if a[i] == b[j] {
			pairs.push((i, j));
			i += 1;
			j += 1;
		} else if dp[i + 1][j] >= dp[i][j + 1] {
			i += 1;
		} else {
			j += 1;
		}
	}
	pairs
}

/// Anti-unify two rules: try every permutation of `b`'s premises against
/// `a`'s fixed order, generalizing the conclusion and paired-up premises
/// pointwise, and keep whichever permutation yields the most concrete
/// (fewest fresh-variable) result.
pub fn anti_unify_rule(a: &Rule, b: &Rule, fresh: &mut FreshVariables) -> Option<(Rule, Substitution, Substitution)> {
	if a.premises().len() != b.premises().len() {
		return None;
	}
	let mut best: Option<(Rule, Substitution, Substitution, usize)> = None;
	for perm in permutations(b.premises()) {
		let mut cache = VarCache::new();
		let conclusion_gen = anti_unify_cached(a.conclusion(), b.conclusion(), fresh, &mut cache);
		let mut premises = Vec::with_capacity(perm.len());
		let mut from_a = conclusion_gen.from_a.clone();
		let mut from_b = conclusion_gen.from_b.clone();
		let mut ok = true;
		for (pa, pb) in a.premises().iter().zip(perm.iter()) {
			let gen = anti_unify_cached(pa, pb, fresh, &mut cache);
			premises.push(gen.pattern);
			from_a = match from_a.merge(&gen.from_a) {
				Ok(m) => m,
				Err(_) => {
					ok = false;
					break;
				}
			};
			from_b = match from_b.merge(&gen.from_b) {
				Ok(m) => m,
				Err(_) => {
					ok = false;
					break;
				}
			};
		}
		if !ok {
			continue;
		}
		let rule = Rule::new(premises, conclusion_gen.pattern);
		let cost = rule
			.premises()
			.iter()
			.chain(std::iter::once(rule.conclusion()))
			.flat_map(|s| s.as_slice().iter())
			.filter(|t| t.is_variable())
			.count();
		if best.as_ref().map(|(_, _, _, best_cost)| cost < *best_cost).unwrap_or(true) {
			best = Some((rule, from_a, from_b, cost));
		}
	}
	best.map(|(rule, from_a, from_b, _)| (rule, from_a, from_b))
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

#[cfg(test)]
mod tests {
	use super::*;
	use metarule_core::parse::parse_sentence;
	use metarule_core::Context;

	#[test]
	fn identical_sentences_generalize_to_themselves() {
		let mut ctx = Context::new();
		let mut fresh = FreshVariables::new();
		let s = parse_sentence(&mut ctx, "dax $MAPS_TO$ RED").unwrap();
		let g = anti_unify(&s, &s, &mut fresh);
		assert_eq!(g.pattern, s);
		assert!(g.from_a.is_empty());
	}

	#[test]
	fn single_differing_word_generalizes_to_one_variable() {
		let mut ctx = Context::new();
		let mut fresh = FreshVariables::new();
		let a = parse_sentence(&mut ctx, "dax $MAPS_TO$ RED").unwrap();
		let b = parse_sentence(&mut ctx, "lug $MAPS_TO$ RED").unwrap();
		let g = anti_unify(&a, &b, &mut fresh);
		assert_eq!(g.from_a.apply(&g.pattern), a);
		assert_eq!(g.from_b.apply(&g.pattern), b);
		assert_eq!(g.pattern.variables().len(), 1);
	}

	#[test]
	fn recurring_gap_reuses_one_variable() {
		let mut ctx = Context::new();
		let mut fresh = FreshVariables::new();
		let a = parse_sentence(&mut ctx, "zup fep $MAPS_TO$ YELLOW").unwrap();
		let b = parse_sentence(&mut ctx, "wif fep $MAPS_TO$ RED").unwrap();
		let g = anti_unify(&a, &b, &mut fresh);
		assert_eq!(g.from_a.apply(&g.pattern), a);
		assert_eq!(g.from_b.apply(&g.pattern), b);
	}
}
