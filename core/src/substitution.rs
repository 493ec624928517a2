use crate::error::{Error, Result};
use crate::sentence::Sentence;
use crate::token::Token;

/// A partial map `variable -> non-empty sentence containing no special
/// symbol`. Substitutions are built functionally: composition and merge
/// always return a fresh value rather than mutating either operand, so
/// there is no aliasing between a substitution and its ancestors.
#[derive(Debug, Clone, Default)]
pub struct Substitution(im::HashMap<Token, Sentence>);

impl Substitution {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn get(&self, var: Token) -> Option<&Sentence> {
		self.0.get(&var)
	}

	pub fn contains(&self, var: Token) -> bool {
		self.0.contains_key(&var)
	}

	/// Bind `var` to `value`, checking the substitution invariants. Returns
	/// a new substitution; `self` is untouched.
	pub fn bind(&self, var: Token, value: Sentence) -> Result<Substitution> {
		if value.is_empty() {
			return Err(Error::EmptySubstitutionValue);
		}
		if value.contains_special() {
			return Err(Error::SubstitutionContainsSpecial);
		}
		let mut next = self.0.clone();
		next.insert(var, value);
		Ok(Substitution(next))
	}

	/// Variables bound by this substitution, in an arbitrary but
	/// deterministic (sorted) order — used only for display and testing;
	/// the ordering guarantees of spec/5 apply to the *lists* of
	/// substitutions returned by match/unify, not to the internal order of
	/// one substitution's bindings.
	pub fn bindings_sorted(&self) -> Vec<(Token, &Sentence)> {
		let mut v: Vec<_> = self.0.iter().map(|(k, v)| (*k, v)).collect();
		v.sort_by_key(|(k, _)| (k.kind(), k.raw_id()));
		v
	}

	/// Replace every variable of `sentence` that this substitution binds.
	/// Variables with no binding are left untouched.
	pub fn apply(&self, sentence: &Sentence) -> Sentence {
		let mut out = Vec::with_capacity(sentence.len());
		for t in sentence.as_slice() {
			if t.is_variable() {
				if let Some(value) = self.0.get(t) {
					out.extend_from_slice(value.as_slice());
					continue;
				}
			}
			out.push(*t);
		}
		Sentence::new(out)
	}

	/// `(self ∘ other)(t) = other(self(t))`: apply `other` to every value
	/// bound by `self`, then add `other`'s own bindings (a binding already
	/// present via the first step for the same variable is kept from
	/// `self`, matching the definition in which `self`'s bindings are
	/// reduced by `other`, not replaced by it).
	pub fn compose(&self, other: &Substitution) -> Substitution {
		let mut next: im::HashMap<Token, Sentence> =
			self.0.iter().map(|(k, v)| (*k, other.apply(v))).collect();
		for (k, v) in other.0.iter() {
			next.entry(*k).or_insert_with(|| v.clone());
		}
		Substitution(next)
	}

	/// Disjoint merge: every variable shared between `self` and `other`
	/// must be bound to an identical sentence, or the merge fails.
	pub fn merge(&self, other: &Substitution) -> Result<Substitution> {
		let mut next = self.0.clone();
		for (k, v) in other.0.iter() {
			match next.get(k) {
				Some(existing) if existing != v => return Err(Error::MergeConflict),
				_ => {
					next.insert(*k, v.clone());
				}
			}
		}
		Ok(Substitution(next))
	}

	/// Restrict this substitution to a set of variables of interest
	/// (spec/4.6: the backward prover restricts returned substitutions to
	/// the original goal's variables).
	pub fn restrict_to(&self, vars: &[Token]) -> Substitution {
		let mut next = im::HashMap::new();
		for v in vars {
			if let Some(value) = self.0.get(v) {
				next.insert(*v, value.clone());
			}
		}
		Substitution(next)
	}
}

impl PartialEq for Substitution {
	fn eq(&self, other: &Self) -> bool {
		self.0.len() == other.0.len() && self.0.iter().all(|(k, v)| other.0.get(k) == Some(v))
	}
}
impl Eq for Substitution {}

impl std::hash::Hash for Substitution {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		// Hash a sorted view so that equal substitutions (which may store
		// their bindings in different internal orders) hash equally.
		let mut v: Vec<_> = self.0.iter().collect();
		v.sort_by_key(|(k, _)| (k.kind(), k.raw_id()));
		v.hash(state);
	}
}

/// A single-pair substitution, used to avoid allocating a map for the
/// (very common) case of binding exactly one variable.
#[derive(Debug, Clone)]
pub struct VariableBinding {
	pub var: Token,
	pub value: Sentence,
}

impl VariableBinding {
	pub fn new(var: Token, value: Sentence) -> Self {
		Self { var, value }
	}

	pub fn into_substitution(self) -> Result<Substitution> {
		Substitution::new().bind(self.var, self.value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn w(id: u32) -> Token {
		Token::word(id)
	}
	fn v(id: u32) -> Token {
		Token::variable(id)
	}

	#[test]
	fn compose_applies_second_to_values_of_first() {
		let s1 = Substitution::new().bind(v(0), Sentence::single(v(1))).unwrap();
		let s2 = Substitution::new().bind(v(1), Sentence::single(w(1))).unwrap();
		let composed = s1.compose(&s2);
		assert_eq!(composed.get(v(0)), Some(&Sentence::single(w(1))));
		assert_eq!(composed.get(v(1)), Some(&Sentence::single(w(1))));
	}

	#[test]
	fn merge_rejects_conflicting_bindings() {
		let s1 = Substitution::new().bind(v(0), Sentence::single(w(1))).unwrap();
		let s2 = Substitution::new().bind(v(0), Sentence::single(w(2))).unwrap();
		assert!(s1.merge(&s2).is_err());
	}

	#[test]
	fn merge_accepts_identical_shared_binding() {
		let s1 = Substitution::new().bind(v(0), Sentence::single(w(1))).unwrap();
		let s2 = Substitution::new().bind(v(0), Sentence::single(w(1))).unwrap();
		assert!(s1.merge(&s2).is_ok());
	}

	#[test]
	fn bind_rejects_empty_value() {
		assert!(Substitution::new().bind(v(0), Sentence::empty()).is_err());
	}

	#[test]
	fn bind_rejects_special_in_value() {
		assert!(Substitution::new().bind(v(0), Sentence::single(Token::special(0))).is_err());
	}
}
