use crate::sentence::Sentence;
use crate::token::Token;

/// The structural skeleton of a sentence: its special-symbol tokens, in
/// order, with every maximal run of words/variables between them
/// collapsed away. Two sentences with unequal templates can never match
/// or unify, which makes the template a cheap pre-filter ahead of the
/// real (more expensive) algorithms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Template(Vec<Token>);

impl Template {
	pub fn of(sentence: &Sentence) -> Self {
		Template(sentence.as_slice().iter().copied().filter(|t| t.is_special()).collect())
	}

	pub fn specials(&self) -> &[Token] {
		&self.0
	}
}

/// Split `sentence` into its template and the (len(template) + 1) segments
/// of words/variables that lie between (and around) the specials. Segments
/// may be empty, including the leading and trailing ones.
pub fn decompose(sentence: &Sentence) -> (Template, Vec<Sentence>) {
	let mut specials = Vec::new();
	let mut segments = Vec::new();
	let mut current = Vec::new();
	for t in sentence.as_slice() {
		if t.is_special() {
			specials.push(*t);
			segments.push(Sentence::new(std::mem::take(&mut current)));
		} else {
			current.push(*t);
		}
	}
	segments.push(Sentence::new(current));
	(Template(specials), segments)
}

/// Inverse of [`decompose`]: interleave `segments` with the template's
/// specials. Panics if `segments.len() != template.specials().len() + 1`,
/// which would mean the caller built the segments for a different
/// template.
pub fn compose(template: &Template, segments: &[Sentence]) -> Sentence {
	assert_eq!(segments.len(), template.0.len() + 1, "segment count does not match template");
	let mut out = Vec::new();
	for (i, special) in template.0.iter().enumerate() {
		out.extend_from_slice(segments[i].as_slice());
		out.push(*special);
	}
	out.extend_from_slice(segments[template.0.len()].as_slice());
	Sentence::new(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn w(id: u32) -> Token {
		Token::word(id)
	}
	fn sp(id: u32) -> Token {
		Token::special(id)
	}

	#[test]
	fn decompose_compose_roundtrip() {
		let s = Sentence::new(vec![w(1), w(2), sp(0), w(3), sp(1), w(4), w(5)]);
		let (template, segments) = decompose(&s);
		assert_eq!(segments.len(), 3);
		let rebuilt = compose(&template, &segments);
		assert_eq!(rebuilt, s);
	}

	#[test]
	fn unequal_templates() {
		let a = Sentence::new(vec![w(1), sp(0), w(2)]);
		let b = Sentence::new(vec![w(1), sp(1), w(2)]);
		assert_ne!(Template::of(&a), Template::of(&b));
	}
}
