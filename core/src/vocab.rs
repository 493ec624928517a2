use lasso::{Key, Rodeo, Spur};

use crate::error::{Error, Result};

/// Which admissibility rule and seeding policy a vocabulary enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabKind {
	/// Words and special-symbol names: `^[^\s\[\]$]+$`.
	WordOrSpecial,
	/// User-facing variable names: `^[A-Z]+$`.
	Variable,
}

impl VocabKind {
	fn validate(&self, s: &str) -> Result<()> {
		if s.is_empty() {
			return Err(invalid(*self, s));
		}
		let ok = match self {
			VocabKind::WordOrSpecial => s
				.chars()
				.all(|c| !c.is_whitespace() && c != '[' && c != ']' && c != '$'),
			VocabKind::Variable => s.chars().all(|c| c.is_ascii_uppercase()),
		};
		if ok {
			Ok(())
		} else {
			Err(invalid(*self, s))
		}
	}
}

fn invalid(kind: VocabKind, s: &str) -> Error {
	match kind {
		VocabKind::WordOrSpecial => Error::InvalidWordOrSpecial(s.to_string()),
		VocabKind::Variable => Error::InvalidVariableName(s.to_string()),
	}
}

/// A process-wide bijection `{string <-> positive integer}`, one per token
/// kind. Interning is append-only for the lifetime of a run; `reset` (used
/// when loading a checkpoint) is the only operation allowed to replace its
/// contents, and only by strictly extending the current prefix.
pub struct Vocabulary {
	kind: VocabKind,
	interner: Rodeo,
}

fn id_of(spur: Spur) -> u32 {
	spur.into_usize() as u32
}

fn spur_of(id: u32) -> Spur {
	Spur::try_from_usize(id as usize).expect("id out of range for this vocabulary")
}

impl Vocabulary {
	pub fn new(kind: VocabKind) -> Self {
		Vocabulary { kind, interner: Rodeo::new() }
	}

	/// A variable vocabulary pre-seeded with single-letter names `A..Z` so
	/// that they receive stable, low ids.
	pub fn new_variables() -> Self {
		let mut v = Self::new(VocabKind::Variable);
		for c in 'A'..='Z' {
			v.interner.get_or_intern(c.to_string());
		}
		v
	}

	pub fn kind(&self) -> VocabKind {
		self.kind
	}

	pub fn len(&self) -> usize {
		self.interner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.interner.is_empty()
	}

	/// Validate `s` against this vocabulary's admissibility rule and intern
	/// it, returning its (stable, append-only) id.
	pub fn intern(&mut self, s: &str) -> Result<u32> {
		self.kind.validate(s)?;
		Ok(id_of(self.interner.get_or_intern(s)))
	}

	pub fn get(&self, s: &str) -> Option<u32> {
		self.interner.get(s).map(id_of)
	}

	pub fn resolve(&self, id: u32) -> Option<&str> {
		if (id as usize) < self.interner.len() {
			Some(self.interner.resolve(&spur_of(id)))
		} else {
			None
		}
	}

	/// Ordered list of strings, in id order starting from 0 — the shape
	/// persisted by a vocabulary checkpoint.
	pub fn ordered_strings(&self) -> Vec<&str> {
		(0..self.interner.len() as u32)
			.map(|id| self.resolve(id).unwrap())
			.collect()
	}

	/// Replace the vocabulary's contents, requiring that `strings` strictly
	/// extends the current ordered prefix (the checkpoint-load contract).
	pub fn reset(&mut self, strings: &[String]) -> Result<()> {
		let current = self.ordered_strings();
		if strings.len() < current.len() || current.iter().ne(strings[..current.len()].iter()) {
			return Err(Error::MalformedSentence(
				"checkpoint does not extend the in-memory vocabulary".to_string(),
			));
		}
		for s in &strings[current.len()..] {
			self.intern(s)?;
		}
		Ok(())
	}
}

/// Mints fresh, unnamed (De-Bruijn) variable ids — strictly negative,
/// never touching a vocabulary. Used by alpha-conversion and
/// anti-unification, which therefore can never collide with a user-named
/// variable regardless of what the user's variable vocabulary contains.
#[derive(Debug, Default, Clone)]
pub struct FreshVariables {
	next: i32,
}

impl FreshVariables {
	pub fn new() -> Self {
		Self { next: -1 }
	}

	pub fn next(&mut self) -> i32 {
		let id = self.next;
		self.next -= 1;
		id
	}
}

/// The three process-wide vocabularies bundled together, plus a fresh
/// variable minter. Passed explicitly into every constructor that needs to
/// intern or resolve a token, per the "no implicit globals" design note.
pub struct Context {
	pub words: Vocabulary,
	pub variables: Vocabulary,
	pub specials: Vocabulary,
	pub fresh: FreshVariables,
}

impl Default for Context {
	fn default() -> Self {
		Self::new()
	}
}

impl Context {
	pub fn new() -> Self {
		Context {
			words: Vocabulary::new(VocabKind::WordOrSpecial),
			variables: Vocabulary::new_variables(),
			specials: Vocabulary::new(VocabKind::WordOrSpecial),
			fresh: FreshVariables::new(),
		}
	}
}
