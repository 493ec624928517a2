use std::hash::{Hash, Hasher};
use std::rc::Rc;

use hashbrown::HashMap;

use crate::token::Token;

/// An immutable ordered sequence of tokens, cheaply shareable by reference
/// count. Two sentences are *identical* iff `==`; `is_equivalent` checks
/// the weaker alpha-equivalence relation instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sentence(Rc<[Token]>);

impl Sentence {
	pub fn new(tokens: Vec<Token>) -> Self {
		Sentence(Rc::from(tokens))
	}

	pub fn single(token: Token) -> Self {
		Sentence(Rc::from(vec![token]))
	}

	pub fn empty() -> Self {
		Sentence(Rc::from(Vec::new()))
	}

	pub fn as_slice(&self) -> &[Token] {
		&self.0
	}

	pub fn view(&self) -> SentenceView {
		SentenceView(&self.0)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn is_concrete(&self) -> bool {
		self.0.iter().all(|t| !t.is_variable())
	}

	pub fn contains_special(&self) -> bool {
		self.0.iter().any(|t| t.is_special())
	}

	/// Every distinct variable token in this sentence, in order of first
	/// occurrence.
	pub fn variables(&self) -> Vec<Token> {
		let mut seen = hashbrown::HashSet::new();
		let mut out = Vec::new();
		for t in self.0.iter() {
			if t.is_variable() && seen.insert(*t) {
				out.push(*t);
			}
		}
		out
	}

	pub fn slice(&self, range: std::ops::Range<usize>) -> Sentence {
		Sentence::new(self.0[range].to_vec())
	}

	pub fn concat(parts: &[Sentence]) -> Sentence {
		let mut out = Vec::new();
		for p in parts {
			out.extend_from_slice(&p.0);
		}
		Sentence::new(out)
	}

	/// Is `self` alpha-equivalent to `other`: same length and structure,
	/// with some bijective renaming of variables making them identical.
	pub fn is_equivalent(&self, other: &Sentence) -> bool {
		canonical_stream(&self.0) == canonical_stream(&other.0)
	}

	/// A hash that agrees on alpha-equivalent sentences.
	pub fn alpha_invariant_hash(&self) -> u64 {
		use std::collections::hash_map::DefaultHasher;
		let mut hasher = DefaultHasher::new();
		canonical_stream(&self.0).hash(&mut hasher);
		hasher.finish()
	}
}

impl std::ops::Index<usize> for Sentence {
	type Output = Token;

	fn index(&self, index: usize) -> &Token {
		&self.0[index]
	}
}

/// A non-owning contiguous slice of a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SentenceView<'a>(&'a [Token]);

impl<'a> SentenceView<'a> {
	pub fn as_slice(&self) -> &'a [Token] {
		self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn to_sentence(&self) -> Sentence {
		Sentence::new(self.0.to_vec())
	}
}

impl<'a> From<&'a [Token]> for SentenceView<'a> {
	fn from(tokens: &'a [Token]) -> Self {
		SentenceView(tokens)
	}
}

/// A token stream with variables renamed to the index of their first
/// occurrence. Two sentences are alpha-equivalent iff their canonical
/// streams are equal, and the canonical stream hashes to the same value
/// for every member of an alpha-equivalence class.
#[derive(Debug, PartialEq, Eq, Hash)]
enum Canon {
	Fixed(Token),
	Var(usize),
}

fn canonical_stream(tokens: &[Token]) -> Vec<Canon> {
	let mut next = 0usize;
	let mut assigned: HashMap<Token, usize> = HashMap::new();
	tokens
		.iter()
		.map(|t| {
			if t.is_variable() {
				let idx = *assigned.entry(*t).or_insert_with(|| {
					let i = next;
					next += 1;
					i
				});
				Canon::Var(idx)
			} else {
				Canon::Fixed(*t)
			}
		})
		.collect()
}

/// A bijection `variable -> variable`, used to rename a sentence (or rule)
/// into fresh variables disjoint from another sentence's variables.
#[derive(Debug, Default, Clone)]
pub struct AlphaConversion(HashMap<Token, Token>);

impl AlphaConversion {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, var: Token) -> Option<Token> {
		self.0.get(&var).copied()
	}

	pub fn insert(&mut self, from: Token, to: Token) {
		self.0.insert(from, to);
	}

	/// The `(original, renamed)` pairs recorded so far, in no particular
	/// order.
	pub fn entries(&self) -> impl Iterator<Item = (Token, Token)> + '_ {
		self.0.iter().map(|(&k, &v)| (k, v))
	}

	/// Rename every variable of `sentence` to a fresh De-Bruijn variable,
	/// reusing the same fresh variable for repeated occurrences of the
	/// same source variable, and disjoint from any variable already bound
	/// in this conversion.
	pub fn rename(&mut self, sentence: &Sentence, fresh: &mut crate::vocab::FreshVariables) -> Sentence {
		let tokens = sentence
			.as_slice()
			.iter()
			.map(|t| {
				if t.is_variable() {
					*self.0.entry(*t).or_insert_with(|| Token::fresh_variable(fresh.next()))
				} else {
					*t
				}
			})
			.collect();
		Sentence::new(tokens)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::token::Token;

	#[test]
	fn identical_implies_equivalent() {
		let s = Sentence::new(vec![Token::word(1), Token::variable(0)]);
		assert!(s.is_equivalent(&s));
	}

	#[test]
	fn equivalent_under_renaming() {
		// "hello [X] [X]" ~ "hello [Y] [Y]" but not ~ "hello [X] [Y]"
		let a = Sentence::new(vec![Token::word(1), Token::variable(0), Token::variable(0)]);
		let b = Sentence::new(vec![Token::word(1), Token::variable(1), Token::variable(1)]);
		let c = Sentence::new(vec![Token::word(1), Token::variable(0), Token::variable(1)]);
		assert!(a.is_equivalent(&b));
		assert!(!a.is_equivalent(&c));
		assert_eq!(a.alpha_invariant_hash(), b.alpha_invariant_hash());
	}
}
